//! Integration Tests for the Cache Engine
//!
//! Exercises the engine against both storage areas, including engines that
//! share one area.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use local_stash::{
    CacheEngine, Config, FileBackend, MemoryBackend, SetOptions, StorageBackend, StorageType,
};
use serde_json::json;

fn session_area() -> Arc<dyn StorageBackend> {
    Arc::new(MemoryBackend::new())
}

fn engine(backend: Arc<dyn StorageBackend>, encrypt: bool) -> CacheEngine {
    CacheEngine::new(&Config::default().with_encrypt(encrypt), backend)
}

// == Merge ==

#[tokio::test]
async fn test_merge_mapping() {
    let engine = engine(session_area(), true);

    engine.set_state("k", json!({"a": 1}), SetOptions::default());
    engine.set_state("k", json!({"b": 2}), SetOptions::persistent());

    assert_eq!(engine.get_state("k"), Some(json!({"a": 1, "b": 2})));
}

#[tokio::test]
async fn test_merge_list() {
    let engine = engine(session_area(), true);

    engine.set_state("k", json!([1, 2]), SetOptions::default());
    engine.set_state("k", json!([3]), SetOptions::persistent());

    assert_eq!(engine.get_state("k"), Some(json!([1, 2, 3])));
}

#[tokio::test]
async fn test_merge_type_mismatch() {
    let engine = engine(session_area(), true);

    engine.set_state("k", json!({"a": 1}), SetOptions::default());
    engine.set_state("k", json!("x"), SetOptions::persistent());

    assert_eq!(engine.get_state("k"), Some(json!("x")));
}

// == Obfuscation ==

#[tokio::test]
async fn test_toggling_obfuscation_keeps_records_readable() {
    let area = session_area();
    let obfuscating = engine(area.clone(), true);
    let plain = engine(area.clone(), false);

    obfuscating.set_state("secret", json!({"pin": 1234}), SetOptions::persistent());
    assert!(area.get_item("secret").unwrap().unwrap().starts_with('#'));
    assert_eq!(plain.get_state("secret"), Some(json!({"pin": 1234})));

    // A plain writer merges into the obfuscated record and stores it plain
    plain.set_state("secret", json!({"otp": 9}), SetOptions::persistent());
    assert!(area.get_item("secret").unwrap().unwrap().starts_with('{'));
    assert_eq!(
        obfuscating.get_state("secret"),
        Some(json!({"pin": 1234, "otp": 9}))
    );
}

// == Expiry ==

#[tokio::test]
async fn test_expiry_after_cache_time() {
    let engine = engine(session_area(), true);

    engine.set_state(
        "k",
        json!("v"),
        SetOptions::expire_after(Duration::from_millis(50)),
    );
    assert_eq!(engine.get_state("k"), Some(json!("v")));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(engine.get_state("k"), None);
}

#[tokio::test]
async fn test_overlapping_timers_both_fire() {
    let engine = engine(session_area(), false);

    engine.set_state("k", json!([1]), SetOptions::expire_after(Duration::from_millis(40)));
    engine.set_state("k", json!([2]), SetOptions::expire_after(Duration::from_millis(400)));
    assert_eq!(engine.pending_expiries(), 2);

    // The first timer erases the merged value long before the second one is due
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(engine.get_state("k"), None);
    assert_eq!(engine.pending_expiries(), 1);

    engine.set_state("k", json!([3]), SetOptions::persistent());
    tokio::time::sleep(Duration::from_millis(400)).await;

    // The second timer still fires and erases the newer write
    assert_eq!(engine.get_state("k"), None);
    assert_eq!(engine.stats().expirations, 2);
}

#[tokio::test]
async fn test_expiry_fires_after_writer_is_dropped() {
    let area = session_area();

    {
        let writer = engine(area.clone(), false);
        writer.set_state(
            "k",
            json!({"a": 1}),
            SetOptions::expire_after(Duration::from_millis(30)),
        );
    }

    let reader = engine(area.clone(), false);
    assert_eq!(reader.get_state("k"), Some(json!({"a": 1})));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(reader.get_state("k"), None);
    assert_eq!(area.get_item("k").unwrap().as_deref(), Some("\"\""));
}

#[tokio::test]
async fn test_expiry_does_not_rearm() {
    let engine = engine(session_area(), true);

    engine.set_state("k", json!(1), SetOptions::expire_after(Duration::from_millis(20)));
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(engine.pending_expiries(), 0);
    assert_eq!(engine.stats().expirations, 1);
}

// == Reset ==

#[tokio::test]
async fn test_reset_clears_keys_of_other_writers() {
    let area = session_area();
    area.set_item("foreign", "\"not ours\"").unwrap();

    let engine = engine(area.clone(), true);
    engine.set_state("mine", json!(1), SetOptions::persistent());

    engine.reset_storage();
    engine.reset_storage();

    assert!(area.is_empty());
}

// == Decode failure isolation ==

#[tokio::test]
async fn test_corrupt_record_reads_as_absent() {
    let area = session_area();
    let engine = engine(area.clone(), true);

    engine.set_state("k", json!({"a": 1}), SetOptions::persistent());
    area.set_item("k", "#corrupted{").unwrap();

    assert_eq!(engine.get_state("k"), None);
}

// == Change events ==

#[tokio::test]
async fn test_on_change_sees_writes_from_other_engines() {
    let area = session_area();
    let observer = engine(area.clone(), true);
    let writer = engine(area, true);

    let keys = Arc::new(Mutex::new(Vec::new()));
    let sink = keys.clone();
    let subscription = observer
        .on_change(move |event| sink.lock().unwrap().push(event.key))
        .unwrap();

    writer.set_state("a", json!(1), SetOptions::persistent());
    writer.reset_storage();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(*keys.lock().unwrap(), vec![Some("a".to_string()), None]);
    subscription.unsubscribe();
}

#[tokio::test]
async fn test_on_change_reports_expiry() {
    let engine = engine(session_area(), false);

    let values = Arc::new(Mutex::new(Vec::new()));
    let sink = values.clone();
    engine
        .on_change(move |event| sink.lock().unwrap().push(event.new_value))
        .unwrap();

    engine.set_state("k", json!("v"), SetOptions::expire_after(Duration::from_millis(30)));
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(
        *values.lock().unwrap(),
        vec![Some("\"v\"".to_string()), Some("\"\"".to_string())]
    );
}

#[tokio::test]
async fn test_on_change_delivers_a_burst_of_writes() {
    let engine = engine(session_area(), true);

    let count = Arc::new(Mutex::new(0));
    let sink = count.clone();
    engine
        .on_change(move |_| *sink.lock().unwrap() += 1)
        .unwrap();

    for i in 0..300 {
        engine.set_state(&format!("k{}", i), json!(i), SetOptions::persistent());
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(*count.lock().unwrap(), 300);
}

// == Persistent area ==

#[tokio::test]
async fn test_local_area_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default().with_storage_type(StorageType::Local);
    config.storage_path = dir.path().join("stash.json");

    {
        let engine = CacheEngine::from_config(&config).unwrap();
        engine.set_state("prefs", json!({"theme": "dark"}), SetOptions::persistent());
    }

    let engine = CacheEngine::from_config(&config).unwrap();
    assert_eq!(engine.get_state("prefs"), Some(json!({"theme": "dark"})));

    engine.set_state("prefs", json!({"lang": "en"}), SetOptions::persistent());
    let reopened = FileBackend::open(&config.storage_path, config.quota_bytes).unwrap();
    let raw = reopened.get_item("prefs").unwrap().unwrap();
    assert!(raw.starts_with('#'));
}

#[tokio::test]
async fn test_quota_exceeded_soft_fails() {
    let area: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::with_quota(64));
    let engine = engine(area, true);

    assert!(engine
        .set_state("small", json!("ok"), SetOptions::persistent())
        .is_some());
    assert!(engine
        .set_state("big", json!("x".repeat(128)), SetOptions::persistent())
        .is_none());

    assert_eq!(engine.get_state("small"), Some(json!("ok")));
    assert_eq!(engine.get_state("big"), None);
    assert_eq!(engine.stats().errors, 1);
}
