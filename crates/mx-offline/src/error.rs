//! Error types for mixdown and export

use mx_core::{CoreError, TrackId};
use thiserror::Error;

/// Export pipeline errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No active tracks to mix (all muted, silenced by solo, or failed)")]
    NoActiveTracks,

    #[error("Track {track} has not finished decoding")]
    DecodeUnavailable { track: TrackId },

    #[error("Failed to dispatch encoder worker: {0}")]
    WorkerDispatch(String),

    #[error("Encoder worker failed: {0}")]
    WorkerEncoding(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Export result was already taken")]
    ResultTaken,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(CoreError),
}

impl From<CoreError> for ExportError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DecodeUnavailable(track) => Self::DecodeUnavailable { track },
            other => Self::Core(other),
        }
    }
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;
