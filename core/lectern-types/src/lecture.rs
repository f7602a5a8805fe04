//! Lecture references as seen by the viewer.

use crate::{Error, LectureId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared kind of a lecture's protected content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Video,
    Document,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Video => f.write_str("video"),
            ContentKind::Document => f.write_str("document"),
        }
    }
}

impl FromStr for ContentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(ContentKind::Video),
            "document" | "pdf" => Ok(ContentKind::Document),
            other => Err(Error::UnknownContentKind(other.to_string())),
        }
    }
}

/// A lecture selected in the UI.
///
/// `kind` is `None` when the lecture has no protected content attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LectureRef {
    pub id: LectureId,
    pub kind: Option<ContentKind>,
}

impl LectureRef {
    /// Creates a reference to a lecture with declared content.
    pub fn new(id: LectureId, kind: ContentKind) -> Self {
        Self {
            id,
            kind: Some(kind),
        }
    }

    /// Creates a reference to a lecture without protected content.
    pub fn without_content(id: LectureId) -> Self {
        Self { id, kind: None }
    }
}
