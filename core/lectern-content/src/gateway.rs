//! Signed-URL gateway client.
//!
//! Uses the backend streaming API through the session controller, so every
//! call carries the bearer token and device fingerprint.

use crate::blob::{BlobHandle, BlobRegistry};
use crate::error::{ContentError, ContentResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lectern_session::{ApiRequest, SessionController, SessionError};
use lectern_types::{ContentKind, LectureId, LectureRef, ViewerIdentity};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

const VIDEO_PATH: &str = "/streaming/video";
const PDF_PATH: &str = "/streaming/stream/pdf";
const WATERMARK_PATH: &str = "/streaming/watermark";

/// A time-limited playback URL. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SignedUrl {
    /// Returns true if the backend-declared expiry has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// A fetched document, reachable only through its local blob handle.
#[derive(Debug)]
pub struct DocumentBlob {
    pub lecture_id: LectureId,
    pub handle: BlobHandle,
}

/// What a lecture resolves to.
#[derive(Debug)]
pub enum ContentRef {
    Video(SignedUrl),
    Document(DocumentBlob),
    /// No protected content is attached to this lecture.
    Unavailable,
}

impl ContentRef {
    pub fn is_available(&self) -> bool {
        !matches!(self, ContentRef::Unavailable)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoUrlResponse {
    #[serde(default, alias = "signedUrl")]
    url: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

/// Source of protected content for the viewer.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Resolves a lecture to a content reference.
    async fn resolve(&self, lecture: &LectureRef) -> ContentResult<ContentRef>;

    /// Fetches the identity to watermark content with.
    async fn viewer_identity(&self) -> ContentResult<ViewerIdentity>;
}

/// Backend-backed [`ContentSource`].
pub struct ContentGateway {
    session: Arc<SessionController>,
    blobs: BlobRegistry,
}

impl ContentGateway {
    pub fn new(session: Arc<SessionController>, blobs: BlobRegistry) -> Self {
        Self { session, blobs }
    }

    /// Registry holding the document blobs this gateway hands out.
    pub fn blobs(&self) -> &BlobRegistry {
        &self.blobs
    }

    async fn resolve_video(&self, id: &LectureId) -> ContentResult<ContentRef> {
        let path = format!("{VIDEO_PATH}/{}", urlencoding::encode(id.as_str()));
        let response = match self.session.execute(&ApiRequest::get(path)).await {
            Ok(r) => r,
            Err(e) if e.is_not_found() => return Ok(ContentRef::Unavailable),
            Err(e) => return Err(e.into()),
        };

        let body: VideoUrlResponse = serde_json::from_slice(&response.body)
            .map_err(|e| ContentError::Malformed(format!("video url response: {e}")))?;

        match body.url.filter(|u| !u.trim().is_empty()) {
            Some(url) => {
                debug!("Resolved signed video url for lecture {id}");
                Ok(ContentRef::Video(SignedUrl {
                    url,
                    expires_at: body.expires_at,
                }))
            }
            None => Ok(ContentRef::Unavailable),
        }
    }

    async fn resolve_document(&self, id: &LectureId) -> ContentResult<ContentRef> {
        let path = format!("{PDF_PATH}/{}", urlencoding::encode(id.as_str()));
        let bytes = match self.session.execute(&ApiRequest::get(path)).await {
            Ok(r) => r.into_bytes(),
            Err(e) if e.is_not_found() => return Ok(ContentRef::Unavailable),
            Err(e) => return Err(e.into()),
        };

        if bytes.is_empty() {
            return Ok(ContentRef::Unavailable);
        }

        info!("Fetched document for lecture {id} ({} bytes)", bytes.len());
        Ok(ContentRef::Document(DocumentBlob {
            lecture_id: id.clone(),
            handle: self.blobs.register(bytes),
        }))
    }
}

#[async_trait]
impl ContentSource for ContentGateway {
    async fn resolve(&self, lecture: &LectureRef) -> ContentResult<ContentRef> {
        match lecture.kind {
            None => Ok(ContentRef::Unavailable),
            Some(ContentKind::Video) => self.resolve_video(&lecture.id).await,
            Some(ContentKind::Document) => self.resolve_document(&lecture.id).await,
        }
    }

    async fn viewer_identity(&self) -> ContentResult<ViewerIdentity> {
        self.session
            .get_json(WATERMARK_PATH)
            .await
            .map_err(|e| match e {
                SessionError::Serialization(e) => {
                    ContentError::Malformed(format!("watermark response: {e}"))
                }
                other => other.into(),
            })
    }
}
