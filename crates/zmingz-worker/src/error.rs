//! Worker error types.

use thiserror::Error;
use zmingz_media::MediaError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Engine cancelled the transform")]
    EngineCancelled,

    #[error("Engine failed with return code {0}")]
    EngineFailed(i32),

    #[error("Media error: {0}")]
    Media(MediaError),

    #[error("No Tokio runtime available: {0}")]
    Runtime(String),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Whether this is caller misuse rather than a runtime engine condition.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, WorkerError::InvalidRequest(_))
    }
}

impl From<MediaError> for WorkerError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidRequest(msg) => WorkerError::InvalidRequest(msg),
            other => WorkerError::Media(other),
        }
    }
}
