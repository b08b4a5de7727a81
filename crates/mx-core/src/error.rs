//! Error types for the sample buffer model

use thiserror::Error;

use crate::TrackId;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("Decoded audio has no channels")]
    EmptyBuffer,

    #[error("Invalid buffer: {0}")]
    InvalidBuffer(String),

    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    #[error("Track {0} has not finished decoding")]
    DecodeUnavailable(TrackId),
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
