//! Conditional Write Tests
//!
//! `put_if_version` appends only when the caller's expected version is the
//! key's current version number.

use std::sync::Arc;
use std::thread;

use mockdb::{CausalSelector, KvStore, LinearizableSelector, StoreError};

/// Read-modify-write with the version from `get_with_version`.
#[test]
fn test_read_modify_write() {
    let store: KvStore<String, i32> = KvStore::new(LinearizableSelector::new());
    store.put("counter", 0, 1);

    for _ in 0..5 {
        let (value, version) = store.get_with_version("counter", 1).unwrap();
        store.put_if_version("counter", value + 1, version, 1).unwrap();
    }

    assert_eq!(store.get_with_version("counter", 1).unwrap(), (5, 6));
}

/// A stale expected version is rejected with both versions reported.
#[test]
fn test_stale_version_rejected() {
    let store: KvStore<String, i32> = KvStore::new(LinearizableSelector::new());
    store.put("k", 1, 1);
    store.put("k", 2, 2);

    let err = store.put_if_version("k", 3, 1, 1).unwrap_err();
    assert_eq!(
        err,
        StoreError::VersionMismatch {
            key: "k".to_string(),
            expected: 1,
            current: 2
        }
    );
    assert_eq!(err.status_code(), 409);
    assert_eq!(store.metrics().snapshot().conditional_conflicts, 1);
}

/// Expected version 0 means "create only".
#[test]
fn test_create_only() {
    let store: KvStore<String, i32> = KvStore::new(LinearizableSelector::new());

    assert_eq!(store.put_if_version("fresh", 1, 0, 1).unwrap().version_number(), 1);
    assert!(store.put_if_version("fresh", 2, 0, 2).is_err());
}

/// A causal read's version is a valid token only if it is still current.
#[test]
fn test_causal_version_token() {
    for seed in 0..100 {
        let store: KvStore<String, i32> = KvStore::new(CausalSelector::with_seed(seed));
        store.put("k", 1, 1);
        store.put("k", 2, 1);

        let (_, version) = store.get_with_version("k", 9).unwrap();
        let result = store.put_if_version("k", 3, version, 9);
        assert_eq!(result.is_ok(), version == 2, "seed {}", seed);
    }
}

/// Concurrent compare-and-set increments never lose an update.
#[test]
fn test_concurrent_increments() {
    let store: Arc<KvStore<String, i32>> = Arc::new(KvStore::new(LinearizableSelector::new()));
    store.put("counter", 0, 1);

    let handles: Vec<_> = (1..=4)
        .map(|session: i64| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut done = 0;
                while done < 25 {
                    let (value, version) = store.get_with_version("counter", session).unwrap();
                    if store.put_if_version("counter", value + 1, version, session).is_ok() {
                        done += 1;
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.get("counter", 1).unwrap(), 100);
}
