//! Protected content resolution for Lectern.
//!
//! The gateway turns a lecture selection into something a renderer can use:
//! - **Video**: a short-lived signed playback URL from the backend
//! - **Document**: the PDF bytes, fetched through the authorized session and
//!   wrapped in a local [`BlobHandle`] so no backend URL ever reaches the
//!   renderer
//!
//! Lectures without content resolve to [`ContentRef::Unavailable`], which is
//! a state, not an error.

mod blob;
mod error;
mod gateway;

pub use blob::{BlobHandle, BlobRegistry, BLOB_SCHEME};
pub use error::{ContentError, ContentResult};
pub use gateway::{ContentGateway, ContentRef, ContentSource, DocumentBlob, SignedUrl};
