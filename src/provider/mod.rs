pub mod musicbrainz;

use anyhow::Result;

use crate::cache::EnrichmentCache;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::models::{Discography, DiscographyKind, EntityKind, Lookup, SearchOutput};

use self::musicbrainz::MusicBrainzProvider;

/// The closed set of upstream catalogs the engine can aggregate from. One
/// variant is selected at startup from configuration; every operation
/// dispatches through it.
pub enum Provider {
    MusicBrainz(MusicBrainzProvider),
}

impl Provider {
    pub fn from_config(config: &EngineConfig, cache: EnrichmentCache) -> Result<Self> {
        match config.data_provider() {
            "music-brainz" => Ok(Self::MusicBrainz(MusicBrainzProvider::new(config, cache)?)),
            other => Err(EngineError::UnsupportedProvider(other.to_string()).into()),
        }
    }

    /// Runs a paged search for entities matching a query. Pages are
    /// 1-based.
    pub async fn run_search(
        &self,
        kind: EntityKind,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<SearchOutput, EngineError> {
        match self {
            Provider::MusicBrainz(provider) => {
                provider.run_search(kind, query, page, page_size).await
            }
        }
    }

    /// Looks up one entity by its catalog id. For album lookups the
    /// secondary id is the owning artist, which keys the album-image cache.
    pub async fn run_lookup(
        &self,
        kind: EntityKind,
        entity_id: &str,
        secondary_id: Option<&str>,
        page_size: u32,
    ) -> Result<Lookup, EngineError> {
        match self {
            Provider::MusicBrainz(provider) => {
                provider
                    .run_lookup(kind, entity_id, secondary_id, page_size)
                    .await
            }
        }
    }

    /// Pages through one section of an entity's discography.
    pub async fn run_discography_lookup(
        &self,
        discog_kind: DiscographyKind,
        entity_id: &str,
        entity_kind: EntityKind,
        page: u32,
        page_size: u32,
    ) -> Result<Discography, EngineError> {
        match self {
            Provider::MusicBrainz(provider) => {
                provider
                    .run_discography_lookup(discog_kind, entity_id, entity_kind, page, page_size)
                    .await
            }
        }
    }
}
