//! Device fingerprint management.
//!
//! Generates a random identifier once, stores it in durable storage and
//! hands the same value back on every later call.

use crate::error::DeviceResult;
use lectern_storage::{keys, KeyValueStore};
use lectern_types::DeviceId;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Header carrying the fingerprint on authenticated requests.
pub const DEVICE_ID_HEADER: &str = "X-Device-ID";

/// Proof that a device reset was requested on purpose.
///
/// Only constructible through [`ResetAcknowledgement::user_confirmed`], so a
/// reset cannot be triggered as a side effect of some other flow.
#[derive(Debug)]
pub struct ResetAcknowledgement {
    _private: (),
}

impl ResetAcknowledgement {
    /// Records that the user acknowledged an administrator's reset request.
    #[must_use]
    pub fn user_confirmed() -> Self {
        Self { _private: () }
    }
}

/// Creates, caches and resets the installation's device fingerprint.
pub struct DeviceIdentityManager {
    store: Arc<dyn KeyValueStore>,
    /// Serializes create/reset so two callers never mint different ids.
    cached: Mutex<Option<DeviceId>>,
}

impl DeviceIdentityManager {
    /// Creates a manager over the given durable store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            cached: Mutex::new(None),
        }
    }

    /// Returns the persisted fingerprint, creating and persisting one on
    /// first use.
    pub fn get_or_create_device_id(&self) -> DeviceResult<DeviceId> {
        let mut cached = self.cached.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }

        if let Some(id) = self.read_stored()? {
            debug!("Loaded device id from storage");
            *cached = Some(id.clone());
            return Ok(id);
        }

        let id = DeviceId::generate();
        self.store.set(keys::DEVICE_ID, id.as_str())?;
        info!("Generated new device id {}", id);
        *cached = Some(id.clone());
        Ok(id)
    }

    /// Returns the fingerprint if one exists, without creating it.
    pub fn current(&self) -> DeviceResult<Option<DeviceId>> {
        let cached = self.cached.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(id) = cached.as_ref() {
            return Ok(Some(id.clone()));
        }
        drop(cached);
        self.read_stored()
    }

    /// Forgets the fingerprint. The next call to
    /// [`get_or_create_device_id`](Self::get_or_create_device_id) mints a
    /// new one.
    pub fn reset(&self, _ack: ResetAcknowledgement) -> DeviceResult<()> {
        let mut cached = self.cached.lock().unwrap_or_else(|p| p.into_inner());
        self.store.remove(keys::DEVICE_ID)?;
        let previous = cached.take();
        info!(
            "Device id reset (previous: {})",
            previous.as_ref().map_or("none", |d| d.as_str())
        );
        Ok(())
    }

    fn read_stored(&self) -> DeviceResult<Option<DeviceId>> {
        Ok(self
            .store
            .get(keys::DEVICE_ID)?
            .and_then(|v| DeviceId::from_stored(&v)))
    }
}
