//! Error types for Viover

use thiserror::Error;

/// Core error type.
///
/// No variant is fatal to the engine: the worst case for any of these is
/// that one clip stays silent. Callers log and continue.
#[derive(Error, Debug)]
pub enum VoError {
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Mixing graph error: {0}")]
    Graph(String),

    #[error("Playback rejected: {0}")]
    PlaybackRejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),
}

/// Result type alias
pub type VoResult<T> = Result<T, VoError>;
