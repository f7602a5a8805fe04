//! Session error types.

use crate::violation::LogoutReason;
use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors surfaced by the session controller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session ended; credentials were purged and the user was sent to
    /// the login screen.
    #[error("session terminated: {0}")]
    Terminated(LogoutReason),

    /// A non-success response that is not a session failure.
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// Transport-level failure. Passed through untouched.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] lectern_storage::StorageError),

    #[error("device identity error: {0}")]
    Device(#[from] lectern_device::DeviceError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SessionError {
    /// Returns true if the session has ended and re-authentication is
    /// required.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionError::Terminated(_))
    }

    /// Returns the HTTP status of a status error.
    pub fn status(&self) -> Option<u16> {
        match self {
            SessionError::Status { status, .. } => Some(*status),
            SessionError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true for a 404 response.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
