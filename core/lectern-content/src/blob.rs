//! In-memory object references for fetched content.
//!
//! Each registered payload gets an opaque `blob:lectern/<uuid>` reference
//! that is only meaningful inside this process. Handles revoke their entry
//! when dropped, so switching lectures can't leak buffers.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use tracing::debug;
use uuid::Uuid;

/// URL scheme prefix of local blob references.
pub const BLOB_SCHEME: &str = "blob:lectern/";

type Entries = Mutex<HashMap<String, Arc<[u8]>>>;

/// Table of live blob references.
#[derive(Clone, Default)]
pub struct BlobRegistry {
    entries: Arc<Entries>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `bytes` and returns the owning handle.
    pub fn register(&self, bytes: Vec<u8>) -> BlobHandle {
        let url = format!("{BLOB_SCHEME}{}", Uuid::new_v4());
        let bytes: Arc<[u8]> = bytes.into();
        self.lock().insert(url.clone(), bytes.clone());
        debug!("Registered {url} ({} bytes)", bytes.len());
        BlobHandle {
            url,
            bytes,
            registry: Arc::downgrade(&self.entries),
        }
    }

    /// Looks up a live reference.
    pub fn resolve(&self, url: &str) -> Option<Arc<[u8]>> {
        self.lock().get(url).cloned()
    }

    /// Number of references not yet revoked.
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<[u8]>>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl fmt::Debug for BlobRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobRegistry")
            .field("live", &self.live_count())
            .finish()
    }
}

/// Owning handle to a registered blob. Revoked on drop.
pub struct BlobHandle {
    url: String,
    bytes: Arc<[u8]>,
    registry: Weak<Entries>,
}

impl BlobHandle {
    /// The opaque local reference.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The payload.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared payload, for engines that need to own it.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        self.bytes.clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Revokes the reference now.
    pub fn revoke(self) {
        drop(self);
    }
}

impl Drop for BlobHandle {
    fn drop(&mut self) {
        if let Some(entries) = self.registry.upgrade() {
            let mut entries = entries.lock().unwrap_or_else(|p| p.into_inner());
            if entries.remove(&self.url).is_some() {
                debug!("Revoked {}", self.url);
            }
        }
    }
}

impl fmt::Debug for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobHandle")
            .field("url", &self.url)
            .field("len", &self.bytes.len())
            .finish()
    }
}
