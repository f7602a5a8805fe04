//! Core type definitions for Lectern.
//!
//! This crate defines the small value types shared by every layer of the
//! protected-content client:
//! - Lecture and device identifiers
//! - The declared content kind of a lecture
//! - The viewer identity used for watermark text
//!
//! Nothing in here performs I/O.

mod ids;
mod identity;
mod lecture;

pub use identity::ViewerIdentity;
pub use ids::{DeviceId, LectureId};
pub use lecture::{ContentKind, LectureRef};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("unknown content kind: {0}")]
    UnknownContentKind(String),
}
