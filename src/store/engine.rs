//! Versioned store engine
//!
//! Owns the per-key version chains, the global commit log and the session
//! index. Every operation runs inside one critical section (a single mutex
//! over all three), so the global log is a true total order of admission.
//!
//! Reads enumerate every version of the key as a candidate, oldest first,
//! and let the configured `ReadSelector` choose one. The chosen version's
//! number is its 1-based position in the chain.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{
    History, Operation, ReadResponse, RemoveResponse, SessionId, StoreError, StoreResult,
    Transaction, Version, VersionChain, VersionPayload, WriteResponse,
};
use crate::consistency::ReadSelector;
use crate::observability::{log_event_with_fields, Event, Logger, StoreMetrics};

/// Everything guarded by the critical section.
struct StoreState<K, V> {
    versions: HashMap<K, VersionChain<V>>,
    history: History<K, V>,
    selector: Box<dyn ReadSelector<K, V>>,
}

/// In-memory multi-version key-value store with a pluggable read model.
pub struct KvStore<K, V> {
    state: Mutex<StoreState<K, V>>,
    selector_name: &'static str,
    metrics: StoreMetrics,
}

impl<K, V> KvStore<K, V>
where
    K: Eq + Hash + Clone + Debug + Send,
    V: Clone + Debug + Send,
{
    /// Creates an empty store that answers reads through `selector`.
    pub fn new<S>(selector: S) -> Self
    where
        S: ReadSelector<K, V> + 'static,
    {
        Self::with_boxed_selector(Box::new(selector))
    }

    pub fn with_boxed_selector(selector: Box<dyn ReadSelector<K, V>>) -> Self {
        let selector_name = selector.name();
        log_event_with_fields(Event::StoreCreated, &[("consistency", selector_name)]);

        Self {
            state: Mutex::new(StoreState {
                versions: HashMap::new(),
                history: History::new(),
                selector,
            }),
            selector_name,
            metrics: StoreMetrics::new(),
        }
    }

    /// Enters the critical section.
    ///
    /// A poisoned lock is recovered: state is only mutated after selection
    /// succeeds, so a panic inside a selector leaves it intact.
    fn lock(&self) -> MutexGuard<'_, StoreState<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==================
    // KV interface
    // ==================

    /// Appends a new version of `key`. Never fails.
    pub fn put(
        &self,
        key: impl Into<K>,
        value: impl Into<V>,
        session: impl Into<SessionId>,
    ) -> WriteResponse {
        let key = key.into();
        let value = value.into();
        let mut tx = Transaction::new(Operation::write(key.clone(), value.clone()), session.into());

        let mut state = self.lock();
        tx.start();
        let response = Self::append_value(&mut state, &mut tx, key, value);
        let tx_id = tx.id();
        let session_id = tx.session_id();
        state.history.commit(tx);
        drop(state);

        self.metrics.increment_writes();
        if Logger::enabled(Event::WriteCommit.severity()) {
            log_event_with_fields(
                Event::WriteCommit,
                &[
                    ("session", &session_id.to_string()),
                    ("tx", &tx_id.to_string()),
                    ("version", &response.version_number().to_string()),
                ],
            );
        }
        response
    }

    /// Appends a new version only if `expected_version` is the key's
    /// current version number (0 for a key never written).
    pub fn put_if_version(
        &self,
        key: impl Into<K>,
        value: impl Into<V>,
        expected_version: u64,
        session: impl Into<SessionId>,
    ) -> StoreResult<WriteResponse> {
        let key = key.into();
        let value = value.into();
        let mut tx = Transaction::new(Operation::write(key.clone(), value.clone()), session.into());

        let mut state = self.lock();
        tx.start();

        let current = state
            .versions
            .get(&key)
            .map_or(0, VersionChain::current_version_number);
        if current != expected_version {
            drop(state);
            self.metrics.increment_conditional_conflicts();
            let err = StoreError::version_mismatch(&key, expected_version, current);
            log_event_with_fields(Event::ConditionalWriteRejected, &[("reason", &err.to_string())]);
            return Err(err);
        }

        let response = Self::append_value(&mut state, &mut tx, key, value);
        state.history.commit(tx);
        drop(state);

        self.metrics.increment_writes();
        Ok(response)
    }

    /// Returns the value a consistent read of `key` observes.
    pub fn get<Q>(&self, key: &Q, session: impl Into<SessionId>) -> StoreResult<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ToOwned<Owned = K> + ?Sized,
    {
        self.get_with_version(key, session).map(|(value, _)| value)
    }

    /// Like `get`, also returning the chosen version's number, usable as an
    /// optimistic-concurrency token.
    ///
    /// A read whose chosen version is a tombstone fails with `KeyNotFound`
    /// and, like every failed read, is not committed.
    pub fn get_with_version<Q>(
        &self,
        key: &Q,
        session: impl Into<SessionId>,
    ) -> StoreResult<(V, u64)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ToOwned<Owned = K> + ?Sized,
    {
        self.read(key, session.into())
    }

    /// Appends a tombstone for `key` and returns the value it supersedes.
    ///
    /// Fails with `KeyNotFound` if the key was never written or is already
    /// removed.
    pub fn remove<Q>(&self, key: &Q, session: impl Into<SessionId>) -> StoreResult<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ToOwned<Owned = K> + ?Sized,
    {
        let mut tx = Transaction::new(Operation::remove(key.to_owned()), session.into());

        let mut state = self.lock();
        tx.start();

        let Some(chain) = state.versions.get_mut(key) else {
            drop(state);
            self.metrics.increment_reads_missing();
            return Err(StoreError::key_not_found(key));
        };
        let removed = match chain.latest().map(Version::payload) {
            Some(VersionPayload::Value(value)) => value.clone(),
            _ => {
                drop(state);
                self.metrics.increment_reads_missing();
                return Err(StoreError::key_not_found(key));
            }
        };

        let version_number = chain.push(Version::with_tombstone(tx.id()));
        if let Operation::Remove(op) = tx.operation_mut() {
            op.set_response(RemoveResponse::new(removed.clone(), version_number));
        }
        tx.end();
        let tx_id = tx.id();
        state.history.commit(tx);
        drop(state);

        self.metrics.increment_removes();
        if Logger::enabled(Event::RemoveCommit.severity()) {
            log_event_with_fields(
                Event::RemoveCommit,
                &[("key", &format!("{:?}", key)), ("tx", &tx_id.to_string())],
            );
        }
        Ok(removed)
    }

    // ==================
    // Inspection
    // ==================

    /// Snapshot of the global commit log.
    pub fn get_history(&self) -> Vec<Transaction<K, V>> {
        self.lock().history.global().to_vec()
    }

    /// Snapshot of one session's commit log.
    pub fn get_session_history(&self, session: impl Into<SessionId>) -> Vec<Transaction<K, V>> {
        let session_id = session.into();
        self.lock().history.session(session_id).cloned().collect()
    }

    /// Runs `f` against the live history while holding the lock.
    pub fn with_history<R>(&self, f: impl FnOnce(&History<K, V>) -> R) -> R {
        f(&self.lock().history)
    }

    /// Number of keys ever written.
    pub fn len(&self) -> usize {
        self.lock().versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().versions.is_empty()
    }

    /// Number of versions (tombstones included) recorded for `key`.
    pub fn version_count<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock()
            .versions
            .get(key)
            .map_or(0, VersionChain::current_version_number)
    }

    /// Name of the configured consistency model.
    pub fn consistency(&self) -> &'static str {
        self.selector_name
    }

    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    // ==================
    // Internals
    // ==================

    /// Runs a read through the selector and commits it if it observed a value.
    fn read<Q>(&self, key: &Q, session_id: SessionId) -> StoreResult<(V, u64)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ToOwned<Owned = K> + ?Sized,
    {
        let mut tx = Transaction::new(Operation::read(key.to_owned()), session_id);

        let mut guard = self.lock();
        let state = &mut *guard;
        tx.start();

        let Some(chain) = state.versions.get(key) else {
            drop(guard);
            self.reject_missing(key, session_id);
            return Err(StoreError::key_not_found(key));
        };

        let candidates: Vec<ReadResponse<V>> = chain
            .versions()
            .iter()
            .map(|version| ReadResponse::candidate(version.payload().clone(), version.writer()))
            .collect();

        let selected = state
            .selector
            .select(&mut tx, &candidates, &state.history)
            .and_then(|index| {
                candidates
                    .get(index)
                    .map(|candidate| (index, candidate))
                    .ok_or_else(|| {
                        StoreError::no_consistent_candidate(tx.kind(), key, tx.id())
                    })
            });
        let (index, candidate) = match selected {
            Ok(selected) => selected,
            Err(err) => {
                drop(guard);
                self.metrics.increment_reads_rejected();
                log_event_with_fields(
                    Event::ReadInconsistent,
                    &[("reason", &err.to_string()), ("session", &session_id.to_string())],
                );
                return Err(err);
            }
        };

        let VersionPayload::Value(value) = candidate.payload() else {
            drop(guard);
            self.reject_missing(key, session_id);
            return Err(StoreError::key_not_found(key));
        };
        let value = value.clone();

        // Version number: 1 + candidates preceding the chosen one
        let version_number = index as u64 + 1;
        let mut chosen = candidate.clone();
        chosen.set_version_number(version_number);
        let written_by = chosen.written_by();
        if let Some(read) = tx.operation_mut().as_read_mut() {
            read.set_response(chosen);
        }
        tx.end();
        let tx_id = tx.id();
        state.history.commit(tx);
        drop(guard);

        self.metrics.increment_reads();
        if Logger::enabled(Event::ReadCommit.severity()) {
            log_event_with_fields(
                Event::ReadCommit,
                &[
                    ("key", &format!("{:?}", key)),
                    ("session", &session_id.to_string()),
                    ("tx", &tx_id.to_string()),
                    ("version", &version_number.to_string()),
                    ("written_by", &written_by.to_string()),
                ],
            );
        }
        Ok((value, version_number))
    }

    /// Accounts for a read that found no live value.
    fn reject_missing<Q: Debug + ?Sized>(&self, key: &Q, session_id: SessionId) {
        self.metrics.increment_reads_missing();
        if Logger::enabled(Event::ReadKeyNotFound.severity()) {
            log_event_with_fields(
                Event::ReadKeyNotFound,
                &[("key", &format!("{:?}", key)), ("session", &session_id.to_string())],
            );
        }
    }

    /// Appends a value version inside the critical section and ends `tx`.
    fn append_value(
        state: &mut StoreState<K, V>,
        tx: &mut Transaction<K, V>,
        key: K,
        value: V,
    ) -> WriteResponse {
        let version_number = state
            .versions
            .entry(key)
            .or_default()
            .push(Version::with_value(value, tx.id()));

        let response = WriteResponse::new(true, version_number);
        if let Operation::Write(op) = tx.operation_mut() {
            op.set_response(response);
        }
        tx.end();
        response
    }
}
