use thiserror::Error;

use crate::api::musicbrainz::MusicBrainzError;

/// Failures a caller of the engine can observe. Image, description and cache
/// failures never surface here; they degrade the affected fields instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unsupported entity kind `{0}`")]
    UnsupportedEntityKind(String),
    #[error("unsupported discography kind `{0}`")]
    UnsupportedDiscographyKind(String),
    #[error("unsupported data provider `{0}`")]
    UnsupportedProvider(String),
    #[error(transparent)]
    Catalog(#[from] MusicBrainzError),
    #[error("lookup batch error: {0}")]
    Batch(String),
}
