//! Backend error type.

use std::time::Duration;

/// Backend operation result.
pub type BackendResult<T> = Result<T, BackendError>;

/// Failure reported by a single tier.
///
/// A missing key is not an error; backends report it as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The tier could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// The tier did not answer in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The tier rejected or failed a command.
    #[error("command error: {0}")]
    Command(String),

    /// Any other adapter-specific failure.
    #[error("{0}")]
    Custom(String),
}

impl BackendError {
    /// Create an adapter-specific error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Whether retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}
