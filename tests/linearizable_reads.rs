//! Linearizable Read Tests
//!
//! Every read observes the most recently committed version of its key,
//! whichever session asks.

use mockdb::{KvStore, LinearizableSelector, StoreError};

fn store() -> KvStore<String, i32> {
    KvStore::new(LinearizableSelector::new())
}

// =============================================================================
// Basic Reads and Writes
// =============================================================================

/// A session reads back what it wrote.
#[test]
fn test_simple_read_write() {
    let store = store();
    let session = 123;

    store.put("a", 50, session);
    assert_eq!(store.get("a", session).unwrap(), 50);

    store.put("b", 100, session);
    store.put("c", 150, session);
    assert_eq!(store.get("b", session).unwrap(), 100);
    assert_eq!(store.get("c", session).unwrap(), 150);
}

/// Reading a key nobody wrote fails and commits nothing.
#[test]
fn test_missing_key() {
    let store = store();

    let err = store.get("ghost", 1).unwrap_err();
    assert_eq!(err.to_string(), "Key Not Found: ghost");
    assert!(store.get_history().is_empty());
}

// =============================================================================
// Causal Chain
// =============================================================================

/// C1 writes a, C2 reads a and writes b; every later read sees b.
#[test]
fn test_linearizability() {
    let store = store();
    let (c1, c2, c3, c4) = (1, 2, 3, 4);
    let (a, b) = (5, 10);

    store.put("x", a, c1);
    let c2_rx1 = store.get("x", c2).unwrap();
    store.put("x", b, c2);
    let c3_rx1 = store.get("x", c3).unwrap();
    let c4_rx1 = store.get("x", c4).unwrap();
    let c3_rx2 = store.get("x", c3).unwrap();
    let c4_rx2 = store.get("x", c4).unwrap();

    assert_eq!(c2_rx1, a);
    assert_eq!([c3_rx1, c3_rx2, c4_rx1, c4_rx2], [b; 4]);
}

/// Version numbers under linearizable reads always name the newest version.
#[test]
fn test_version_is_always_latest() {
    let store = store();

    for value in 1..=10 {
        store.put("k", value, value % 3);
        assert_eq!(store.get_with_version("k", 7).unwrap(), (value, value as u64));
    }
}

/// Reads of a removed key fail even for sessions that never saw the value.
#[test]
fn test_remove_visible_to_all_sessions() {
    let store = store();
    store.put("k", 1, 1);
    store.remove("k", 2).unwrap();

    for session in 1..=3 {
        assert!(matches!(store.get("k", session), Err(StoreError::KeyNotFound { .. })));
    }
}
