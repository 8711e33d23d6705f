//! Keyspace Tests
//!
//! Tests verify:
//! - Basic CRUD operations
//! - Overwrite and delete semantics
//! - Binary-safe keys and values
//! - Snapshot / restore round trips
//! - Truncated snapshot handling
//! - Concurrent access patterns

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use flintkv::Keyspace;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_snapshot() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("kvstore.dat");
    (temp_dir, path)
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_keyspace_is_empty() {
    let ks = Keyspace::new();
    assert_eq!(ks.len(), 0);
    assert!(ks.is_empty());
}

#[test]
fn test_set_and_get() {
    let ks = Keyspace::new();

    ks.set(Bytes::from("key1"), Bytes::from("value1"));

    assert_eq!(ks.get(b"key1"), Some(Bytes::from("value1")));
    assert_eq!(ks.len(), 1);
}

#[test]
fn test_get_nonexistent_key() {
    let ks = Keyspace::new();
    assert_eq!(ks.get(b"nonexistent"), None);
}

#[test]
fn test_set_overwrites_existing() {
    let ks = Keyspace::new();

    ks.set(Bytes::from("key1"), Bytes::from("value1"));
    ks.set(Bytes::from("key1"), Bytes::from("value2"));

    assert_eq!(ks.len(), 1);
    assert_eq!(ks.get(b"key1"), Some(Bytes::from("value2")));
}

#[test]
fn test_del_existing_key() {
    let ks = Keyspace::new();

    ks.set(Bytes::from("key1"), Bytes::from("value1"));

    assert!(ks.del(b"key1"));
    assert_eq!(ks.get(b"key1"), None);
    assert_eq!(ks.len(), 0);
}

#[test]
fn test_del_nonexistent_key() {
    let ks = Keyspace::new();
    assert!(!ks.del(b"nonexistent"));
}

#[test]
fn test_set_after_del() {
    let ks = Keyspace::new();

    ks.set(Bytes::from("key1"), Bytes::from("value1"));
    ks.del(b"key1");
    ks.set(Bytes::from("key1"), Bytes::from("value2"));

    assert_eq!(ks.get(b"key1"), Some(Bytes::from("value2")));
}

#[test]
fn test_binary_keys_and_values() {
    let ks = Keyspace::new();

    let key = Bytes::from(&b"k\x00\xffey"[..]);
    let value = Bytes::from(&b"v\x00\x01\x02alue"[..]);

    ks.set(key.clone(), value.clone());
    assert_eq!(ks.get(&key), Some(value));
}

#[test]
fn test_empty_key_and_empty_value() {
    let ks = Keyspace::new();

    ks.set(Bytes::new(), Bytes::from("value"));
    ks.set(Bytes::from("key"), Bytes::new());

    assert_eq!(ks.get(b""), Some(Bytes::from("value")));
    assert_eq!(ks.get(b"key"), Some(Bytes::new()));
}

// =============================================================================
// Snapshot / Restore Tests
// =============================================================================

#[test]
fn test_snapshot_roundtrip() {
    let (_temp, path) = setup_temp_snapshot();

    let ks = Keyspace::new();
    ks.set(Bytes::from("a"), Bytes::from("1"));
    ks.set(Bytes::from("b"), Bytes::from("2"));
    ks.snapshot(&path).unwrap();
    drop(ks);

    let restored = Keyspace::open(&path).unwrap();
    assert_eq!(restored.len(), 2);
    assert_eq!(restored.get(b"a"), Some(Bytes::from("1")));
    assert_eq!(restored.get(b"b"), Some(Bytes::from("2")));
}

#[test]
fn test_snapshot_empty_keyspace() {
    let (_temp, path) = setup_temp_snapshot();

    Keyspace::new().snapshot(&path).unwrap();

    let restored = Keyspace::open(&path).unwrap();
    assert!(restored.is_empty());
}

#[test]
fn test_open_missing_file_yields_empty_keyspace() {
    let (_temp, path) = setup_temp_snapshot();
    let ks = Keyspace::open(&path).unwrap();
    assert!(ks.is_empty());
}

#[test]
fn test_snapshot_overwrites_previous_file() {
    let (_temp, path) = setup_temp_snapshot();

    let ks = Keyspace::new();
    ks.set(Bytes::from("old"), Bytes::from("x"));
    ks.snapshot(&path).unwrap();

    ks.del(b"old");
    ks.set(Bytes::from("new"), Bytes::from("y"));
    ks.snapshot(&path).unwrap();

    let restored = Keyspace::open(&path).unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored.get(b"old"), None);
    assert_eq!(restored.get(b"new"), Some(Bytes::from("y")));
}

#[test]
fn test_snapshot_with_binary_data() {
    let (_temp, path) = setup_temp_snapshot();

    let ks = Keyspace::new();
    ks.set(Bytes::from(&b"\x00\x01"[..]), Bytes::from(&b"\xfe\xff"[..]));
    ks.set(Bytes::new(), Bytes::new());
    ks.snapshot(&path).unwrap();

    let restored = Keyspace::open(&path).unwrap();
    assert_eq!(restored.get(b"\x00\x01"), Some(Bytes::from(&b"\xfe\xff"[..])));
    assert_eq!(restored.get(b""), Some(Bytes::new()));
}

#[test]
fn test_truncated_snapshot_keeps_leading_records() {
    let (_temp, path) = setup_temp_snapshot();

    let ks = Keyspace::new();
    ks.set(Bytes::from("key1"), Bytes::from("value1"));
    ks.snapshot(&path).unwrap();

    // Append half a record: a length field promising bytes that never come
    let intact_len = std::fs::metadata(&path).unwrap().len();
    let mut bytes = std::fs::read(&path).unwrap();
    bytes.extend_from_slice(&8u64.to_le_bytes());
    bytes.extend_from_slice(b"par");
    std::fs::write(&path, &bytes).unwrap();
    assert!(std::fs::metadata(&path).unwrap().len() > intact_len);

    let restored = Keyspace::open(&path).unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored.get(b"key1"), Some(Bytes::from("value1")));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers() {
    let ks = Arc::new(Keyspace::new());
    let mut handles = Vec::new();

    for t in 0..4 {
        let ks = Arc::clone(&ks);
        handles.push(std::thread::spawn(move || {
            for i in 0..100 {
                let key = Bytes::from(format!("key:{}:{}", t, i));
                ks.set(key, Bytes::from("value"));
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(ks.len(), 400);
}

#[test]
fn test_readers_progress_during_snapshot() {
    let (_temp, path) = setup_temp_snapshot();

    let ks = Arc::new(Keyspace::new());
    for i in 0..1000 {
        ks.set(Bytes::from(format!("key:{}", i)), Bytes::from("value"));
    }

    let reader = {
        let ks = Arc::clone(&ks);
        std::thread::spawn(move || {
            for i in 0..1000 {
                assert!(ks.get(format!("key:{}", i % 1000).as_bytes()).is_some());
            }
        })
    };

    ks.snapshot(&path).unwrap();
    reader.join().unwrap();

    let restored = Keyspace::open(&path).unwrap();
    assert_eq!(restored.len(), 1000);
}
