use lectern_device::{DeviceError, DeviceIdentityManager, ResetAcknowledgement, DEVICE_ID_HEADER};
use lectern_storage::{keys, FileStore, KeyValueStore, MemoryStore, StorageError};
use std::sync::Arc;

fn manager() -> (Arc<MemoryStore>, DeviceIdentityManager) {
    let store = Arc::new(MemoryStore::new());
    let manager = DeviceIdentityManager::new(store.clone());
    (store, manager)
}

#[test]
fn header_name() {
    assert_eq!(DEVICE_ID_HEADER, "X-Device-ID");
}

#[test]
fn first_call_persists_id() {
    let (store, manager) = manager();
    assert!(manager.current().unwrap().is_none());

    let id = manager.get_or_create_device_id().unwrap();
    assert_eq!(store.get(keys::DEVICE_ID).unwrap().as_deref(), Some(id.as_str()));
    assert_eq!(manager.current().unwrap(), Some(id));
}

#[test]
fn repeated_calls_return_same_id() {
    let (_store, manager) = manager();
    let first = manager.get_or_create_device_id().unwrap();
    for _ in 0..10 {
        assert_eq!(manager.get_or_create_device_id().unwrap(), first);
    }
}

#[test]
fn new_manager_over_same_store_sees_same_id() {
    let store = Arc::new(MemoryStore::new());
    let first = DeviceIdentityManager::new(store.clone())
        .get_or_create_device_id()
        .unwrap();
    let second = DeviceIdentityManager::new(store)
        .get_or_create_device_id()
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn stored_legacy_value_is_kept() {
    let (store, manager) = manager();
    store.set(keys::DEVICE_ID, "legacy-fingerprint").unwrap();
    assert_eq!(
        manager.get_or_create_device_id().unwrap().as_str(),
        "legacy-fingerprint"
    );
}

#[test]
fn empty_stored_value_is_replaced() {
    let (store, manager) = manager();
    store.set(keys::DEVICE_ID, "").unwrap();
    let id = manager.get_or_create_device_id().unwrap();
    assert!(!id.as_str().is_empty());
    assert_eq!(store.get(keys::DEVICE_ID).unwrap().as_deref(), Some(id.as_str()));
}

#[test]
fn blank_stored_value_is_absent_and_padding_is_trimmed() {
    let (store, manager) = manager();
    store.set(keys::DEVICE_ID, "   ").unwrap();
    assert!(manager.current().unwrap().is_none());
    let fresh = manager.get_or_create_device_id().unwrap();
    assert_ne!(fresh.as_str().trim(), "");

    store.set(keys::DEVICE_ID, "  legacy-fingerprint\n").unwrap();
    let reopened = DeviceIdentityManager::new(store);
    assert_eq!(
        reopened.current().unwrap().unwrap().as_str(),
        "legacy-fingerprint"
    );
}

#[test]
fn reset_produces_distinct_id() {
    let (store, manager) = manager();
    let before = manager.get_or_create_device_id().unwrap();

    manager.reset(ResetAcknowledgement::user_confirmed()).unwrap();
    assert!(store.get(keys::DEVICE_ID).unwrap().is_none());
    assert!(manager.current().unwrap().is_none());

    let after = manager.get_or_create_device_id().unwrap();
    assert_ne!(before, after);
    assert_eq!(manager.get_or_create_device_id().unwrap(), after);
}

#[test]
fn reset_leaves_other_keys_alone() {
    let (store, manager) = manager();
    store.set(keys::ACCESS_TOKEN, "a").unwrap();
    manager.get_or_create_device_id().unwrap();
    manager.reset(ResetAcknowledgement::user_confirmed()).unwrap();
    assert_eq!(store.get(keys::ACCESS_TOKEN).unwrap().as_deref(), Some("a"));
}

#[test]
fn id_survives_file_store_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let first = {
        let store = Arc::new(FileStore::open(&path).unwrap());
        DeviceIdentityManager::new(store).get_or_create_device_id().unwrap()
    };
    let store = Arc::new(FileStore::open(&path).unwrap());
    let second = DeviceIdentityManager::new(store).get_or_create_device_id().unwrap();
    assert_eq!(first, second);
}

#[test]
fn error_display() {
    let err = DeviceError::from(StorageError::Poisoned);
    assert!(format!("{err}").contains("device storage error"));
}
