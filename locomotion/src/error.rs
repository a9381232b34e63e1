use std::path::PathBuf;

use thiserror::Error;

use crate::gravity::SourceId;

/// Misuse of the gravity source registry. Always a caller bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GravityError {
    #[error("duplicate registration of gravity source {0:?}")]
    DuplicateSource(SourceId),
    #[error("unregistration of unknown gravity source {0:?}")]
    UnknownSource(SourceId),
}

/// A surface layer index outside the representable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayerError {
    #[error("layer index {0} out of range (max {max})", max = crate::layers::LAYER_COUNT - 1)]
    OutOfRange(u8),
}

/// Failure to load settings or a scene description.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid RON: {0}")]
    Parse(#[from] ron::error::SpannedError),
}
