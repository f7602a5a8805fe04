//! Session credentials and their durable storage.

use lectern_storage::{keys, KeyValueStore, StorageResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Bearer access token plus the refresh token that renews it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCredentials {
    pub access_token: String,
    pub refresh_token: String,
}

impl SessionCredentials {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

// Tokens never reach logs.
impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Reads and writes [`SessionCredentials`] in durable storage.
///
/// Both tokens are written and removed together. A store holding only one
/// of them is reported as having no credentials.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Loads the stored credential pair.
    pub fn load(&self) -> StorageResult<Option<SessionCredentials>> {
        let access = self.store.get(keys::ACCESS_TOKEN)?;
        let refresh = self.store.get(keys::REFRESH_TOKEN)?;
        Ok(match (access, refresh) {
            (Some(a), Some(r)) if !a.is_empty() && !r.is_empty() => {
                Some(SessionCredentials::new(a, r))
            }
            _ => None,
        })
    }

    /// Stores both tokens.
    pub fn save(&self, credentials: &SessionCredentials) -> StorageResult<()> {
        self.store.set(keys::ACCESS_TOKEN, &credentials.access_token)?;
        self.store.set(keys::REFRESH_TOKEN, &credentials.refresh_token)
    }

    /// Removes both tokens.
    pub fn clear(&self) -> StorageResult<()> {
        self.store.remove(keys::ACCESS_TOKEN)?;
        self.store.remove(keys::REFRESH_TOKEN)
    }
}
