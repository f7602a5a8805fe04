//! Client-side key/value storage for Lectern.
//!
//! Two scopes exist, mirroring what a browser offers:
//! - **Durable** storage survives restarts (credentials, device fingerprint)
//! - **Session** storage lives only as long as the process
//!
//! Both are reached through the [`KeyValueStore`] trait so the session and
//! device layers can be tested against [`MemoryStore`] instead of touching
//! the user's real profile.

mod error;
mod file;
mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;

/// Well-known durable storage keys.
pub mod keys {
    /// Short-lived bearer token.
    pub const ACCESS_TOKEN: &str = "accessToken";
    /// Longer-lived token used only against the refresh endpoint.
    pub const REFRESH_TOKEN: &str = "refreshToken";
    /// Persisted device fingerprint.
    pub const DEVICE_ID: &str = "deviceId";
}

/// A flat string key/value store.
pub trait KeyValueStore: Send + Sync {
    /// Reads a value.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Writes a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Removes every key not listed in `keep`.
    fn retain(&self, keep: &[&str]) -> StorageResult<()>;

    /// Returns all keys currently stored.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Removes everything.
    fn clear(&self) -> StorageResult<()> {
        self.retain(&[])
    }
}

/// Default location of the durable store file.
///
/// `<data dir>/lectern/store.json`, or `./lectern-store.json` when the
/// platform has no data directory.
pub fn default_store_path() -> std::path::PathBuf {
    dirs::data_dir()
        .map(|d| d.join("lectern").join("store.json"))
        .unwrap_or_else(|| std::path::PathBuf::from("lectern-store.json"))
}
