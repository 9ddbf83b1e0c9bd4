pub mod normalize;
pub mod release;

use std::collections::HashMap;
use std::time::Instant;

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::fanart::{FanartClient, FanartError};
use crate::api::musicbrainz::{
    ArtistRecord, MusicBrainzClient, MusicBrainzError, RecordingRecord, ReleaseBrowseResponse,
    ReleaseGroupBrowseResponse, ReleaseGroupRecord,
};
use crate::api::wikipedia::WikipediaClient;
use crate::cache::EnrichmentCache;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fanout;
use crate::models::{
    Album, Artist, DataKind, DataRequest, Discography, DiscographyKind, EntityKind, Image, Lookup,
    SearchOutput, Song, TrackList,
};

/// A failure in one sub-fetch of a lookup batch. Each batch slot carries its
/// own instance; the lookup decides which slots are fatal.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Catalog(#[from] MusicBrainzError),
    #[error(transparent)]
    Images(#[from] FanartError),
    #[error("batch slot held {found} where {expected} was expected")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl From<FetchError> for EngineError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Catalog(err) => EngineError::Catalog(err),
            other => EngineError::Batch(other.to_string()),
        }
    }
}

/// The result of one sub-fetch. `Skipped` marks a slot whose value comes
/// from the enrichment cache instead of the network.
#[derive(Debug)]
pub enum FetchPayload {
    Artist(Box<ArtistRecord>),
    ReleaseGroup(Box<ReleaseGroupRecord>),
    Recording(Box<RecordingRecord>),
    ReleaseGroups(ReleaseGroupBrowseResponse),
    Releases(ReleaseBrowseResponse),
    ArtistImages(Vec<Image>),
    AlbumImages(HashMap<String, Vec<Image>>),
    Skipped,
}

impl FetchPayload {
    fn kind_name(&self) -> &'static str {
        match self {
            FetchPayload::Artist(_) => "an artist record",
            FetchPayload::ReleaseGroup(_) => "a release group record",
            FetchPayload::Recording(_) => "a recording record",
            FetchPayload::ReleaseGroups(_) => "a release group browse",
            FetchPayload::Releases(_) => "a release browse",
            FetchPayload::ArtistImages(_) => "artist images",
            FetchPayload::AlbumImages(_) => "album images",
            FetchPayload::Skipped => "a skipped slot",
        }
    }

    fn into_artist_record(self) -> Result<Box<ArtistRecord>, FetchError> {
        match self {
            FetchPayload::Artist(record) => Ok(record),
            other => Err(FetchError::Mismatch {
                expected: "an artist record",
                found: other.kind_name(),
            }),
        }
    }

    fn into_release_group(self) -> Result<Box<ReleaseGroupRecord>, FetchError> {
        match self {
            FetchPayload::ReleaseGroup(record) => Ok(record),
            other => Err(FetchError::Mismatch {
                expected: "a release group record",
                found: other.kind_name(),
            }),
        }
    }

    fn into_recording(self) -> Result<Box<RecordingRecord>, FetchError> {
        match self {
            FetchPayload::Recording(record) => Ok(record),
            other => Err(FetchError::Mismatch {
                expected: "a recording record",
                found: other.kind_name(),
            }),
        }
    }

    fn into_release_groups(self) -> Result<ReleaseGroupBrowseResponse, FetchError> {
        match self {
            FetchPayload::ReleaseGroups(response) => Ok(response),
            other => Err(FetchError::Mismatch {
                expected: "a release group browse",
                found: other.kind_name(),
            }),
        }
    }

    fn into_releases(self) -> Result<ReleaseBrowseResponse, FetchError> {
        match self {
            FetchPayload::Releases(response) => Ok(response),
            other => Err(FetchError::Mismatch {
                expected: "a release browse",
                found: other.kind_name(),
            }),
        }
    }

    fn into_artist_images(self) -> Vec<Image> {
        match self {
            FetchPayload::ArtistImages(images) => images,
            _ => Vec::new(),
        }
    }

    fn into_album_images(self) -> HashMap<String, Vec<Image>> {
        match self {
            FetchPayload::AlbumImages(images) => images,
            _ => HashMap::new(),
        }
    }
}

/// Aggregates MusicBrainz catalog data with fanart.tv images and Wikipedia
/// descriptions into the canonical output entities.
pub struct MusicBrainzProvider {
    catalog: MusicBrainzClient,
    images: FanartClient,
    descriptions: WikipediaClient,
    cache: EnrichmentCache,
}

impl MusicBrainzProvider {
    pub fn new(config: &EngineConfig, cache: EnrichmentCache) -> Result<Self> {
        Ok(Self {
            catalog: MusicBrainzClient::new(config)?,
            images: FanartClient::new(config)?,
            descriptions: WikipediaClient::new(config)?,
            cache,
        })
    }

    pub async fn run_search(
        &self,
        kind: EntityKind,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<SearchOutput, EngineError> {
        let offset = page.saturating_sub(1) * page_size;
        let begin = Instant::now();

        let results = match kind {
            EntityKind::Artist => {
                let data = self.catalog.search_artists(query, page_size, offset).await?;
                normalize::build_artist_search(&data)
            }
            EntityKind::Album => {
                let data = self
                    .catalog
                    .search_release_groups(query, page_size, offset)
                    .await?;
                normalize::build_album_search(&data)
            }
            EntityKind::Song => {
                let data = self
                    .catalog
                    .search_recordings(query, page_size, offset)
                    .await?;
                normalize::build_song_search(&data)
            }
        };

        debug!(kind = %kind, elapsed = ?begin.elapsed(), "search complete");
        Ok(results)
    }

    pub async fn run_lookup(
        &self,
        kind: EntityKind,
        entity_id: &str,
        secondary_id: Option<&str>,
        page_size: u32,
    ) -> Result<Lookup, EngineError> {
        let begin = Instant::now();

        let result = match kind {
            EntityKind::Artist => {
                let artist = self.lookup_artist(entity_id, page_size).await?;
                Lookup::Artist(Box::new(artist))
            }
            EntityKind::Album => {
                let album = self.lookup_album(entity_id, secondary_id).await?;
                Lookup::Album(Box::new(album))
            }
            EntityKind::Song => {
                let song = self.lookup_song(entity_id, page_size).await?;
                Lookup::Song(Box::new(song))
            }
        };

        debug!(kind = %kind, entity_id, elapsed = ?begin.elapsed(), "lookup complete");
        Ok(result)
    }

    pub async fn run_discography_lookup(
        &self,
        discog_kind: DiscographyKind,
        entity_id: &str,
        entity_kind: EntityKind,
        page: u32,
        page_size: u32,
    ) -> Result<Discography, EngineError> {
        let begin = Instant::now();
        let offset = page.saturating_sub(1) * page_size;

        let browse_kind = if entity_kind == EntityKind::Song {
            DataKind::SongAlbums
        } else {
            DataKind::Discography
        };

        let mut discog_request = DataRequest::new(browse_kind, entity_id);
        discog_request.release_types = discog_kind
            .release_types()
            .iter()
            .map(|kind| kind.to_string())
            .collect();
        discog_request.limit = page_size;
        discog_request.offset = offset;

        let mut images_request = discog_request.clone();
        images_request.kind = DataKind::AlbumImages;

        let cached_album_images = self.cache.album_images(entity_id);
        if cached_album_images.is_some() {
            images_request.use_cache = true;
        }

        let mut data = fanout::run_batch(vec![discog_request, images_request], |request| {
            self.fetch(request)
        })
        .await;

        let (groups, total) = match take_slot(&mut data)? {
            FetchPayload::ReleaseGroups(response) => {
                (response.release_groups, response.release_group_count)
            }
            FetchPayload::Releases(response) => {
                // A song's browse returns releases; collapse them to their
                // distinct release groups before building rows.
                let groups = normalize::dedup_release_groups(&response.releases);
                let total = groups.len() as u32;
                (groups, total)
            }
            other => {
                return Err(FetchError::Mismatch {
                    expected: "a discography browse",
                    found: other.kind_name(),
                }
                .into());
            }
        };

        let album_images =
            self.resolve_album_images(Some(entity_id), cached_album_images, take_slot(&mut data));

        let discography = normalize::build_discography(
            &groups,
            total,
            discog_kind.album_only(),
            &album_images,
        );

        debug!(entity_id, elapsed = ?begin.elapsed(), "discography lookup complete");
        Ok(discography)
    }

    async fn lookup_artist(&self, entity_id: &str, page_size: u32) -> Result<Artist, EngineError> {
        let artist_request = DataRequest::new(DataKind::Artist, entity_id);

        let mut albums_request = artist_request.clone();
        albums_request.kind = DataKind::ArtistAlbums;
        albums_request.release_types = vec!["album".to_string()];
        albums_request.limit = page_size;

        let mut artist_images_request = artist_request.clone();
        artist_images_request.kind = DataKind::ArtistImages;

        let mut album_images_request = artist_request.clone();
        album_images_request.kind = DataKind::AlbumImages;

        let cached_artist_images = self.cache.artist_images(entity_id);
        let cached_album_images = self.cache.album_images(entity_id);

        if cached_artist_images.is_some() {
            artist_images_request.use_cache = true;
        }

        if cached_album_images.is_some() {
            album_images_request.use_cache = true;
        }

        let mut data = fanout::run_batch(
            vec![
                artist_request,
                albums_request,
                artist_images_request,
                album_images_request,
            ],
            |request| self.fetch(request),
        )
        .await;

        let record = take_slot(&mut data)?.into_artist_record()?;
        let albums_record = take_slot(&mut data)?.into_release_groups()?;
        let artist_images =
            self.resolve_artist_images(entity_id, cached_artist_images, take_slot(&mut data));
        let album_images =
            self.resolve_album_images(Some(entity_id), cached_album_images, take_slot(&mut data));

        let curated = normalize::build_link_list(&record.relations);
        let description = self.fetch_description(curated.wikidata_url.as_deref()).await;

        Ok(normalize::build_artist(
            &record,
            &albums_record,
            artist_images,
            &album_images,
            curated.links,
            description,
        ))
    }

    async fn lookup_album(
        &self,
        entity_id: &str,
        secondary_id: Option<&str>,
    ) -> Result<Album, EngineError> {
        let album_request = DataRequest::new(DataKind::Album, entity_id);

        let mut images_request = album_request.clone();
        images_request.kind = DataKind::AlbumImages;
        images_request.secondary_id = secondary_id.map(String::from);

        // Album image buckets are keyed by artist, so the cache only
        // participates when the caller passed the owning artist along.
        let cached_album_images =
            secondary_id.and_then(|artist_id| self.cache.album_images(artist_id));
        if cached_album_images.is_some() {
            images_request.use_cache = true;
        }

        let mut data = fanout::run_batch(vec![album_request, images_request], |request| {
            self.fetch(request)
        })
        .await;

        let record = take_slot(&mut data)?.into_release_group()?;
        let album_images =
            self.resolve_album_images(secondary_id, cached_album_images, take_slot(&mut data));

        let curated = normalize::build_link_list(&record.relations);
        let description = self.fetch_description(curated.wikidata_url.as_deref()).await;

        let mut album = normalize::build_album(&record, &album_images, curated.links, description);
        album.track_list = self.resolve_track_list(&record).await?;

        Ok(album)
    }

    async fn lookup_song(&self, entity_id: &str, page_size: u32) -> Result<Song, EngineError> {
        let song_request = DataRequest::new(DataKind::Song, entity_id);

        let mut albums_request = song_request.clone();
        albums_request.kind = DataKind::SongAlbums;
        albums_request.limit = page_size;

        let mut data = fanout::run_batch(vec![song_request, albums_request], |request| {
            self.fetch(request)
        })
        .await;

        let record = take_slot(&mut data)?.into_recording()?;
        let releases = take_slot(&mut data)?.into_releases()?;

        let curated = normalize::build_link_list(&record.relations);
        let description = self.fetch_description(curated.wikidata_url.as_deref()).await;

        Ok(normalize::build_song(
            &record,
            &releases.releases,
            curated.links,
            description,
        ))
    }

    /// Resolves the canonical release for a release group and builds one
    /// track list per medium. An empty release list yields no track lists.
    async fn resolve_track_list(
        &self,
        record: &ReleaseGroupRecord,
    ) -> Result<Vec<TrackList>, EngineError> {
        let Some(release_id) = release::pick_release(record) else {
            return Ok(Vec::new());
        };

        let release = self.catalog.release_by_id(release_id).await?;

        Ok(release.media.iter().map(normalize::build_track_list).collect())
    }

    /// Dispatches one sub-request to the client its kind belongs to.
    /// Requests satisfied by the cache never reach the network.
    async fn fetch(&self, request: DataRequest) -> Result<FetchPayload, FetchError> {
        if request.use_cache {
            return Ok(FetchPayload::Skipped);
        }

        match request.kind {
            DataKind::Artist => {
                let record = self.catalog.artist_by_id(&request.entity_id).await?;
                Ok(FetchPayload::Artist(Box::new(record)))
            }
            DataKind::Album => {
                let record = self.catalog.release_group_by_id(&request.entity_id).await?;
                Ok(FetchPayload::ReleaseGroup(Box::new(record)))
            }
            DataKind::Song => {
                let record = self.catalog.recording_by_id(&request.entity_id).await?;
                Ok(FetchPayload::Recording(Box::new(record)))
            }
            DataKind::ArtistAlbums | DataKind::Discography => {
                let response = self
                    .catalog
                    .browse_release_groups(
                        &request.entity_id,
                        &request.release_types,
                        request.limit,
                        request.offset,
                    )
                    .await?;
                Ok(FetchPayload::ReleaseGroups(response))
            }
            DataKind::SongAlbums => {
                let response = self
                    .catalog
                    .browse_releases(
                        &request.entity_id,
                        &request.release_types,
                        request.limit,
                        request.offset,
                    )
                    .await?;
                Ok(FetchPayload::Releases(response))
            }
            DataKind::ArtistImages => {
                let images = self.images.artist_images(&request.entity_id).await?;
                Ok(FetchPayload::ArtistImages(images))
            }
            DataKind::AlbumImages => {
                let entity_id = request
                    .secondary_id
                    .as_deref()
                    .unwrap_or(&request.entity_id);
                let images = self.images.album_images(entity_id).await?;
                Ok(FetchPayload::AlbumImages(images))
            }
        }
    }

    /// Settles the artist-image slot: a warm cache value wins outright, a
    /// fresh fetch is written back (even when empty), and a failed fetch
    /// degrades to no images.
    fn resolve_artist_images(
        &self,
        entity_id: &str,
        cached: Option<Vec<Image>>,
        slot: Result<FetchPayload, FetchError>,
    ) -> Vec<Image> {
        if let Some(images) = cached {
            return images;
        }

        match slot {
            Ok(payload) => {
                let images = payload.into_artist_images();
                self.cache.set_artist_images(entity_id, &images);
                images
            }
            Err(err) => {
                warn!(entity_id, error = %err, "artist image fetch failed");
                Vec::new()
            }
        }
    }

    /// Settles an album-image slot the same way; `cache_key` is the bucket
    /// entry to write fresh results under, when there is one.
    fn resolve_album_images(
        &self,
        cache_key: Option<&str>,
        cached: Option<HashMap<String, Vec<Image>>>,
        slot: Result<FetchPayload, FetchError>,
    ) -> HashMap<String, Vec<Image>> {
        if let Some(images) = cached {
            return images;
        }

        match slot {
            Ok(payload) => {
                let images = payload.into_album_images();
                if let Some(key) = cache_key {
                    self.cache.set_album_images(key, &images);
                }
                images
            }
            Err(err) => {
                warn!(error = %err, "album image fetch failed");
                HashMap::new()
            }
        }
    }

    async fn fetch_description(&self, wikidata_url: Option<&str>) -> String {
        let Some(url) = wikidata_url else {
            return String::new();
        };

        match self.descriptions.entity_description(url).await {
            Ok(description) => description,
            Err(err) => {
                warn!(wikidata_url = url, error = %err, "entity description fetch failed");
                String::new()
            }
        }
    }
}

fn take_slot(
    data: &mut Vec<Result<FetchPayload, FetchError>>,
) -> Result<FetchPayload, FetchError> {
    if data.is_empty() {
        Ok(FetchPayload::Skipped)
    } else {
        data.remove(0)
    }
}
