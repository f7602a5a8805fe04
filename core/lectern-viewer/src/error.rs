//! Viewer error types.

use lectern_content::ContentError;
use lectern_session::{LogoutReason, SessionError};
use thiserror::Error;

/// Result type for viewer operations.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// What went wrong while showing a lecture.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewerError {
    /// Network or rasterization failure. Worth retrying.
    #[error("content could not be loaded: {0}")]
    Transient(String),

    /// The document failed to parse. Retrying yields the same failure.
    #[error("document could not be read: {0}")]
    Malformed(String),

    /// The lecture has no protected content, or it is of a kind we can't
    /// show.
    #[error("no content is available for this lecture")]
    Unavailable,

    /// The session ended while loading; the user is being sent to login.
    #[error("session ended: {0}")]
    SessionEnded(LogoutReason),
}

impl ViewerError {
    /// Returns true if offering a retry makes sense.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ViewerError::Transient(_))
    }
}

impl From<ContentError> for ViewerError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Session(SessionError::Terminated(reason)) => {
                ViewerError::SessionEnded(reason)
            }
            other => ViewerError::Transient(other.to_string()),
        }
    }
}
