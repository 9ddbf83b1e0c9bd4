use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// The entity kinds callers can search for and look up. Unrecognized kind
/// strings are rejected before any upstream call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Artist,
    Album,
    Song,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Artist => "artist",
            EntityKind::Album => "album",
            EntityKind::Song => "song",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "artist" => Ok(EntityKind::Artist),
            "album" => Ok(EntityKind::Album),
            "song" => Ok(EntityKind::Song),
            other => Err(EngineError::UnsupportedEntityKind(other.to_string())),
        }
    }
}

/// The discography sections a caller can page through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscographyKind {
    Album,
    SingleEp,
    Compilation,
    Live,
    Demo,
}

impl DiscographyKind {
    /// The release-group type filter sent to the catalog service.
    pub fn release_types(&self) -> &'static [&'static str] {
        match self {
            DiscographyKind::Album => &["album"],
            DiscographyKind::SingleEp => &["single", "ep"],
            DiscographyKind::Compilation => &["compilation"],
            DiscographyKind::Live => &["live"],
            DiscographyKind::Demo => &["demo"],
        }
    }

    /// Only the album section filters rows down to plain albums; the other
    /// sections surface every row the type filter returns.
    pub fn album_only(&self) -> bool {
        matches!(self, DiscographyKind::Album)
    }
}

impl FromStr for DiscographyKind {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "album" => Ok(DiscographyKind::Album),
            "single-ep" => Ok(DiscographyKind::SingleEp),
            "compilation" => Ok(DiscographyKind::Compilation),
            "live" => Ok(DiscographyKind::Live),
            "demo" => Ok(DiscographyKind::Demo),
            other => Err(EngineError::UnsupportedDiscographyKind(other.to_string())),
        }
    }
}

/// What one sub-fetch of a lookup batch should retrieve. A closed set so the
/// dispatch match stays exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Artist,
    ArtistAlbums,
    ArtistImages,
    AlbumImages,
    Album,
    Song,
    SongAlbums,
    Discography,
}

/// One sub-fetch of a lookup. A lookup operation constructs two to four of
/// these and dispatches them together through the fan-out orchestrator.
#[derive(Debug, Clone)]
pub struct DataRequest {
    pub kind: DataKind,
    pub entity_id: String,
    pub secondary_id: Option<String>,
    pub limit: u32,
    pub offset: u32,
    pub release_types: Vec<String>,
    /// Set when the enrichment cache already holds this request's result;
    /// the fetch is skipped and the cached value substituted after the join.
    pub use_cache: bool,
}

impl DataRequest {
    pub fn new(kind: DataKind, entity_id: impl Into<String>) -> Self {
        Self {
            kind,
            entity_id: entity_id.into(),
            secondary_id: None,
            limit: 0,
            offset: 0,
            release_types: Vec::new(),
            use_cache: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn entity_kinds_parse_from_wire_strings() {
        assert_eq!("artist".parse::<EntityKind>().unwrap(), EntityKind::Artist);
        assert_eq!("album".parse::<EntityKind>().unwrap(), EntityKind::Album);
        assert_eq!("song".parse::<EntityKind>().unwrap(), EntityKind::Song);
    }

    #[test]
    fn unknown_entity_kinds_are_rejected() {
        let err = "podcast".parse::<EntityKind>().unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedEntityKind(kind) if kind == "podcast"));
    }

    #[test]
    fn unknown_discography_kinds_are_rejected() {
        let err = "bootlegs".parse::<DiscographyKind>().unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedDiscographyKind(kind) if kind == "bootlegs"));
    }

    #[test]
    fn single_ep_filters_on_both_release_types() {
        let kind: DiscographyKind = "single-ep".parse().unwrap();
        assert_eq!(kind.release_types(), ["single", "ep"]);
        assert!(!kind.album_only());
        assert!("album".parse::<DiscographyKind>().unwrap().album_only());
    }
}
