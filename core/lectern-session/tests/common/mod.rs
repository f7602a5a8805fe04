//! Shared test helpers for session tests.

#![allow(dead_code)]

use lectern_device::DeviceIdentityManager;
use lectern_session::{Navigator, SessionConfig, SessionController, SessionCredentials};
use lectern_storage::{keys, KeyValueStore, MemoryStore};
use std::sync::{Arc, Mutex};
use wiremock::MockServer;

/// Navigator that records every redirect target.
#[derive(Default)]
pub struct RecordingNavigator {
    targets: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, target: &str) {
        self.targets.lock().unwrap().push(target.to_string());
    }
}

pub struct Harness {
    pub controller: Arc<SessionController>,
    pub durable: Arc<MemoryStore>,
    pub session: Arc<MemoryStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub device_id: String,
}

pub fn mock_config(server: &MockServer) -> SessionConfig {
    SessionConfig {
        api_base_url: server.uri(),
        request_timeout_secs: 5,
        ..Default::default()
    }
}

/// Controller against `server` with `old-access` / `refresh-1` stored.
pub fn harness(server: &MockServer) -> Harness {
    let durable = Arc::new(MemoryStore::new());
    let session = Arc::new(MemoryStore::new());
    let navigator = Arc::new(RecordingNavigator::default());
    let devices = Arc::new(DeviceIdentityManager::new(durable.clone()));
    let device_id = devices.get_or_create_device_id().unwrap().to_string();

    let controller = SessionController::new(
        mock_config(server),
        durable.clone(),
        session.clone(),
        devices,
        navigator.clone(),
    )
    .unwrap();
    controller
        .establish(&SessionCredentials::new("old-access", "refresh-1"))
        .unwrap();
    session.set("lastLecture", "lec-1").unwrap();

    Harness {
        controller: Arc::new(controller),
        durable,
        session,
        navigator,
        device_id,
    }
}

pub fn stored_access(store: &MemoryStore) -> Option<String> {
    store.get(keys::ACCESS_TOKEN).unwrap()
}
