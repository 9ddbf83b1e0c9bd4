use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode, Url, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::config::EngineConfig;

const ARTIST_INCLUDES: &str = "tags+genres+artist-rels+url-rels+annotation";
const RELEASE_GROUP_INCLUDES: &str =
    "tags+genres+releases+media+artist-credits+url-rels+annotation";
const RECORDING_INCLUDES: &str =
    "tags+genres+artist-credits+releases+release-groups+url-rels+annotation";
const RELEASE_INCLUDES: &str = "recordings+artist-credits";

#[derive(Debug, Error)]
pub enum MusicBrainzError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("failed to parse response: {0}")]
    Parse(String),
    #[error("record not found")]
    NotFound,
}

/// Client for the MusicBrainz JSON web service. Requests are spaced to honor
/// the one-request-per-second upstream policy.
#[derive(Clone)]
pub struct MusicBrainzClient {
    http: Client,
    base_url: String,
    throttle: Arc<Mutex<Option<Instant>>>,
}

impl MusicBrainzClient {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            "X-Client-Id",
            header::HeaderValue::from_str(config.client_id())
                .context("invalid client identifier header value")?,
        );

        let http = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent())
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("unable to construct http client")?;

        Ok(Self {
            http,
            base_url: config.musicbrainz_url().to_string(),
            throttle: Arc::new(Mutex::new(None)),
        })
    }

    pub async fn search_artists(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<ArtistSearchResponse, MusicBrainzError> {
        let limit = limit.to_string();
        let offset = offset.to_string();
        let url = Url::parse_with_params(
            &format!("{}/artist", self.base_url),
            [
                ("query", query),
                ("fmt", "json"),
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
            ],
        )
        .map_err(|err| MusicBrainzError::Parse(err.to_string()))?;

        self.get_json(url).await
    }

    pub async fn search_release_groups(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<ReleaseGroupSearchResponse, MusicBrainzError> {
        let filtered = format!("{query} AND primarytype:album AND status:official");
        let limit = limit.to_string();
        let offset = offset.to_string();
        let url = Url::parse_with_params(
            &format!("{}/release-group", self.base_url),
            [
                ("query", filtered.as_str()),
                ("fmt", "json"),
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
            ],
        )
        .map_err(|err| MusicBrainzError::Parse(err.to_string()))?;

        self.get_json(url).await
    }

    pub async fn search_recordings(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<RecordingSearchResponse, MusicBrainzError> {
        let filtered = format!("{query} AND primarytype:album AND status:official");
        let limit = limit.to_string();
        let offset = offset.to_string();
        let url = Url::parse_with_params(
            &format!("{}/recording", self.base_url),
            [
                ("query", filtered.as_str()),
                ("fmt", "json"),
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
            ],
        )
        .map_err(|err| MusicBrainzError::Parse(err.to_string()))?;

        self.get_json(url).await
    }

    pub async fn artist_by_id(&self, artist_id: &str) -> Result<ArtistRecord, MusicBrainzError> {
        let url = Url::parse_with_params(
            &format!("{}/artist/{artist_id}", self.base_url),
            [("fmt", "json"), ("inc", ARTIST_INCLUDES)],
        )
        .map_err(|err| MusicBrainzError::Parse(err.to_string()))?;

        self.get_json(url).await
    }

    pub async fn release_group_by_id(
        &self,
        release_group_id: &str,
    ) -> Result<ReleaseGroupRecord, MusicBrainzError> {
        let url = Url::parse_with_params(
            &format!("{}/release-group/{release_group_id}", self.base_url),
            [("fmt", "json"), ("inc", RELEASE_GROUP_INCLUDES)],
        )
        .map_err(|err| MusicBrainzError::Parse(err.to_string()))?;

        self.get_json(url).await
    }

    pub async fn recording_by_id(
        &self,
        recording_id: &str,
    ) -> Result<RecordingRecord, MusicBrainzError> {
        let url = Url::parse_with_params(
            &format!("{}/recording/{recording_id}", self.base_url),
            [("fmt", "json"), ("inc", RECORDING_INCLUDES)],
        )
        .map_err(|err| MusicBrainzError::Parse(err.to_string()))?;

        self.get_json(url).await
    }

    /// Fetches one release with its full medium and track data.
    pub async fn release_by_id(&self, release_id: &str) -> Result<ReleaseRecord, MusicBrainzError> {
        let url = Url::parse_with_params(
            &format!("{}/release/{release_id}", self.base_url),
            [("fmt", "json"), ("inc", RELEASE_INCLUDES)],
        )
        .map_err(|err| MusicBrainzError::Parse(err.to_string()))?;

        self.get_json(url).await
    }

    /// Browses the release groups credited to an artist, filtered to the
    /// given release-group types.
    pub async fn browse_release_groups(
        &self,
        artist_id: &str,
        release_types: &[String],
        limit: u32,
        offset: u32,
    ) -> Result<ReleaseGroupBrowseResponse, MusicBrainzError> {
        let types = release_types.join("|");
        let limit = limit.to_string();
        let offset = offset.to_string();
        let url = Url::parse_with_params(
            &format!("{}/release-group", self.base_url),
            [
                ("artist", artist_id),
                ("fmt", "json"),
                ("type", types.as_str()),
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
            ],
        )
        .map_err(|err| MusicBrainzError::Parse(err.to_string()))?;

        self.get_json(url).await
    }

    /// Browses the releases a recording appears on, with their owning
    /// release groups attached.
    pub async fn browse_releases(
        &self,
        recording_id: &str,
        release_types: &[String],
        limit: u32,
        offset: u32,
    ) -> Result<ReleaseBrowseResponse, MusicBrainzError> {
        let mut params = vec![
            ("recording", recording_id.to_string()),
            ("fmt", "json".to_string()),
            ("inc", "release-groups".to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];

        if !release_types.is_empty() {
            params.push(("type", release_types.join("|")));
        }

        let url = Url::parse_with_params(&format!("{}/release", self.base_url), params)
            .map_err(|err| MusicBrainzError::Parse(err.to_string()))?;

        self.get_json(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, MusicBrainzError> {
        self.await_throttle().await;

        let response = self.http.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(MusicBrainzError::NotFound);
        }

        let response = response.error_for_status()?;
        response
            .json()
            .await
            .map_err(|err| MusicBrainzError::Parse(err.to_string()))
    }

    async fn await_throttle(&self) {
        let mut guard = self.throttle.lock().await;
        if let Some(last) = *guard {
            let elapsed = last.elapsed();
            if elapsed < Duration::from_millis(1100) {
                sleep(Duration::from_millis(1100) - elapsed).await;
            }
        }
        *guard = Some(Instant::now());
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtistSearchResponse {
    pub artists: Vec<ArtistItem>,
    pub count: u32,
}

impl Default for ArtistSearchResponse {
    fn default() -> Self {
        Self {
            artists: Vec::new(),
            count: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReleaseGroupSearchResponse {
    #[serde(rename = "release-groups")]
    pub release_groups: Vec<ReleaseGroupItem>,
    pub count: u32,
}

impl Default for ReleaseGroupSearchResponse {
    fn default() -> Self {
        Self {
            release_groups: Vec::new(),
            count: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingSearchResponse {
    pub recordings: Vec<RecordingItem>,
    pub count: u32,
}

impl Default for RecordingSearchResponse {
    fn default() -> Self {
        Self {
            recordings: Vec::new(),
            count: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReleaseGroupBrowseResponse {
    #[serde(rename = "release-groups")]
    pub release_groups: Vec<ReleaseGroupItem>,
    #[serde(rename = "release-group-count")]
    pub release_group_count: u32,
}

impl Default for ReleaseGroupBrowseResponse {
    fn default() -> Self {
        Self {
            release_groups: Vec::new(),
            release_group_count: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReleaseBrowseResponse {
    pub releases: Vec<ReleaseItem>,
    #[serde(rename = "release-count")]
    pub release_count: u32,
}

impl Default for ReleaseBrowseResponse {
    fn default() -> Self {
        Self {
            releases: Vec::new(),
            release_count: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtistItem {
    pub id: String,
    pub name: String,
    pub disambiguation: String,
    pub score: i32,
    pub tags: Vec<TagItem>,
}

impl Default for ArtistItem {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            disambiguation: String::new(),
            score: 0,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtistRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub artist_type: Option<String>,
    #[serde(rename = "life-span")]
    pub life_span: LifeSpanField,
    pub area: Option<AreaField>,
    #[serde(rename = "begin-area")]
    pub begin_area: Option<AreaField>,
    #[serde(rename = "end-area")]
    pub end_area: Option<AreaField>,
    pub disambiguation: String,
    pub annotation: Option<String>,
    pub tags: Vec<TagItem>,
    pub genres: Vec<TagItem>,
    pub relations: Vec<RelationItem>,
}

impl Default for ArtistRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            artist_type: None,
            life_span: LifeSpanField::default(),
            area: None,
            begin_area: None,
            end_area: None,
            disambiguation: String::new(),
            annotation: None,
            tags: Vec::new(),
            genres: Vec::new(),
            relations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReleaseGroupItem {
    pub id: String,
    pub title: String,
    #[serde(rename = "primary-type")]
    pub primary_type: Option<String>,
    #[serde(rename = "first-release-date")]
    pub first_release_date: Option<String>,
    pub score: i32,
    #[serde(rename = "artist-credit")]
    pub artist_credit: Vec<ArtistCredit>,
    pub tags: Vec<TagItem>,
}

impl Default for ReleaseGroupItem {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            primary_type: None,
            first_release_date: None,
            score: 0,
            artist_credit: Vec::new(),
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReleaseGroupRecord {
    pub id: String,
    pub title: String,
    #[serde(rename = "primary-type")]
    pub primary_type: Option<String>,
    #[serde(rename = "first-release-date")]
    pub first_release_date: Option<String>,
    pub annotation: Option<String>,
    #[serde(rename = "artist-credit")]
    pub artist_credit: Vec<ArtistCredit>,
    pub tags: Vec<TagItem>,
    pub genres: Vec<TagItem>,
    pub releases: Vec<ReleaseItem>,
    pub relations: Vec<RelationItem>,
}

impl Default for ReleaseGroupRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            primary_type: None,
            first_release_date: None,
            annotation: None,
            artist_credit: Vec::new(),
            tags: Vec::new(),
            genres: Vec::new(),
            releases: Vec::new(),
            relations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingItem {
    pub id: String,
    pub title: String,
    pub score: i32,
    pub length: Option<i64>,
    #[serde(rename = "artist-credit")]
    pub artist_credit: Vec<ArtistCredit>,
    pub releases: Vec<ReleaseItem>,
    pub tags: Vec<TagItem>,
}

impl Default for RecordingItem {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            score: 0,
            length: None,
            artist_credit: Vec::new(),
            releases: Vec::new(),
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingRecord {
    pub id: String,
    pub title: String,
    pub length: Option<i64>,
    pub annotation: Option<String>,
    #[serde(rename = "artist-credit")]
    pub artist_credit: Vec<ArtistCredit>,
    pub tags: Vec<TagItem>,
    pub genres: Vec<TagItem>,
    pub releases: Vec<ReleaseItem>,
    pub relations: Vec<RelationItem>,
}

impl Default for RecordingRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            length: None,
            annotation: None,
            artist_credit: Vec::new(),
            tags: Vec::new(),
            genres: Vec::new(),
            releases: Vec::new(),
            relations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReleaseItem {
    pub id: String,
    pub title: String,
    pub status: Option<String>,
    pub country: Option<String>,
    pub date: Option<String>,
    #[serde(rename = "release-group")]
    pub release_group: Option<ReleaseGroupItem>,
    pub media: Vec<Medium>,
}

impl Default for ReleaseItem {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            status: None,
            country: None,
            date: None,
            release_group: None,
            media: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReleaseRecord {
    pub id: String,
    pub title: String,
    pub media: Vec<Medium>,
}

impl Default for ReleaseRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            media: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Medium {
    pub position: u32,
    pub format: Option<String>,
    #[serde(rename = "track-count")]
    pub track_count: u32,
    pub tracks: Vec<TrackItem>,
}

impl Default for Medium {
    fn default() -> Self {
        Self {
            position: 0,
            format: None,
            track_count: 0,
            tracks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackItem {
    pub id: String,
    pub position: u32,
    pub length: Option<i64>,
    pub recording: RecordingStub,
    #[serde(rename = "artist-credit")]
    pub artist_credit: Vec<ArtistCredit>,
}

impl Default for TrackItem {
    fn default() -> Self {
        Self {
            id: String::new(),
            position: 0,
            length: None,
            recording: RecordingStub::default(),
            artist_credit: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingStub {
    pub id: String,
    pub title: String,
    pub length: Option<i64>,
}

impl Default for RecordingStub {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            length: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtistCredit {
    pub name: String,
    pub joinphrase: String,
    pub artist: ArtistRef,
}

impl Default for ArtistCredit {
    fn default() -> Self {
        Self {
            name: String::new(),
            joinphrase: String::new(),
            artist: ArtistRef::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub artist_type: Option<String>,
}

impl Default for ArtistRef {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            artist_type: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelationItem {
    #[serde(rename = "type")]
    pub relation_type: String,
    #[serde(rename = "target-type")]
    pub target_type: Option<String>,
    #[serde(rename = "source-credit")]
    pub source_credit: Option<String>,
    pub begin: Option<String>,
    pub end: Option<String>,
    pub ended: Option<bool>,
    pub url: Option<UrlResource>,
    pub artist: Option<ArtistRef>,
}

impl Default for RelationItem {
    fn default() -> Self {
        Self {
            relation_type: String::new(),
            target_type: None,
            source_credit: None,
            begin: None,
            end: None,
            ended: None,
            url: None,
            artist: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UrlResource {
    pub resource: String,
}

impl Default for UrlResource {
    fn default() -> Self {
        Self {
            resource: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TagItem {
    pub id: Option<String>,
    pub name: String,
    pub count: u32,
}

impl Default for TagItem {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            count: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LifeSpanField {
    pub begin: Option<String>,
    pub end: Option<String>,
    pub ended: Option<bool>,
}

impl Default for LifeSpanField {
    fn default() -> Self {
        Self {
            begin: None,
            end: None,
            ended: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AreaField {
    pub name: String,
}

impl Default for AreaField {
    fn default() -> Self {
        Self {
            name: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artist_record_parses_relations_and_lifespan() {
        let body = r#"{
            "id": "a1",
            "name": "The Example Band",
            "type": "Group",
            "life-span": {"begin": "1981-04", "end": null, "ended": false},
            "area": {"name": "United Kingdom"},
            "disambiguation": "UK group",
            "annotation": "Formed in Sheffield.",
            "tags": [{"name": "rock", "count": 4}],
            "genres": [{"id": "g1", "name": "synth-pop", "count": 7}],
            "relations": [
                {
                    "type": "member of band",
                    "target-type": "artist",
                    "begin": "1981",
                    "ended": true,
                    "artist": {"id": "m1", "name": "Alex Example", "type": "Person"}
                },
                {
                    "type": "wikidata",
                    "target-type": "url",
                    "url": {"resource": "https://www.wikidata.org/wiki/Q42"}
                }
            ]
        }"#;

        let record: ArtistRecord = serde_json::from_str(body).unwrap();
        assert_eq!(record.name, "The Example Band");
        assert_eq!(record.artist_type.as_deref(), Some("Group"));
        assert_eq!(record.life_span.begin.as_deref(), Some("1981-04"));
        assert_eq!(record.genres[0].id.as_deref(), Some("g1"));
        assert_eq!(record.relations.len(), 2);
        assert_eq!(
            record.relations[0].artist.as_ref().unwrap().artist_type.as_deref(),
            Some("Person")
        );
        assert_eq!(
            record.relations[1].url.as_ref().unwrap().resource,
            "https://www.wikidata.org/wiki/Q42"
        );
    }

    #[test]
    fn release_group_record_parses_releases_with_media() {
        let body = r#"{
            "id": "rg1",
            "title": "First Album",
            "primary-type": "Album",
            "first-release-date": "1990-06-11",
            "releases": [
                {
                    "id": "r1",
                    "title": "First Album",
                    "status": "Official",
                    "country": "US",
                    "date": "1990-06-11",
                    "media": [{"format": "CD", "track-count": 10}]
                }
            ]
        }"#;

        let record: ReleaseGroupRecord = serde_json::from_str(body).unwrap();
        assert_eq!(record.releases.len(), 1);
        assert_eq!(record.releases[0].media[0].format.as_deref(), Some("CD"));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let record: RecordingRecord = serde_json::from_str(r#"{"id": "rec1"}"#).unwrap();
        assert_eq!(record.id, "rec1");
        assert!(record.length.is_none());
        assert!(record.releases.is_empty());
    }
}
