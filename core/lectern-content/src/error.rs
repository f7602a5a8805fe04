//! Content resolution error types.

use lectern_session::SessionError;
use thiserror::Error;

/// Result type for content operations.
pub type ContentResult<T> = Result<T, ContentError>;

/// Errors that can occur while resolving protected content.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The session layer failed (network, status, or terminal logout).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The backend answered with something we can't interpret.
    #[error("malformed content response: {0}")]
    Malformed(String),
}

impl ContentError {
    /// Returns true if the session ended while resolving.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ContentError::Session(e) if e.is_terminal())
    }
}
