//! Consistency checkers
//!
//! A checker decides whether the response tentatively attached to an
//! in-flight read is legal, given only the history committed before it.
//!
//! ## Causal rule
//!
//! For a read by session `S` of key `K` observing the write of `W`:
//! 1. Dependencies are the writers `S` has already produced or observed on
//!    `K`: its own writes and removes of `K`, plus the writer observed by
//!    each of its earlier reads of `K`.
//! 2. With no dependencies the read is trivially consistent.
//! 3. Otherwise walk the global log in commit order. The read is consistent
//!    iff every dependency is passed by the time `W` is reached (`W` itself
//!    counts). If `W` is never reached it is inconsistent.
//!
//! Only the reading session's own history contributes dependencies.
//! Causality carried between sessions out of band is not tracked.

use std::collections::HashSet;

use crate::store::{History, Operation, SessionId, Transaction, TxId};

/// Decides whether an in-flight read may keep its tentative response.
pub trait ConsistencyChecker<K, V>: Send {
    fn is_consistent(&self, tx: &Transaction<K, V>, history: &History<K, V>) -> bool;
}

/// Stateless causal consistency checker.
#[derive(Debug, Clone, Copy, Default)]
pub struct CausalChecker;

impl CausalChecker {
    pub fn new() -> Self {
        Self
    }

    /// Writers on `key` that `session_id` has produced or observed so far.
    pub fn dependencies<K: Eq, V>(
        session_id: SessionId,
        key: &K,
        history: &History<K, V>,
    ) -> HashSet<TxId> {
        let mut dependencies = HashSet::new();

        for tx in history.session(session_id) {
            match tx.operation() {
                Operation::Write(op) if op.key() == key => {
                    dependencies.insert(tx.id());
                }
                Operation::Remove(op) if op.key() == key => {
                    dependencies.insert(tx.id());
                }
                Operation::Read(op) if op.key() == key => {
                    if let Some(response) = op.response() {
                        dependencies.insert(response.written_by());
                    }
                }
                _ => {}
            }
        }

        dependencies
    }

    /// True iff every dependency commits no later than `writer`.
    pub fn writer_follows_dependencies<K, V>(
        writer: TxId,
        dependencies: &HashSet<TxId>,
        history: &History<K, V>,
    ) -> bool {
        if dependencies.is_empty() {
            return true;
        }

        let mut seen = 0;
        for tx in history.global() {
            if dependencies.contains(&tx.id()) {
                seen += 1;
            }
            if tx.id() == writer {
                return seen == dependencies.len();
            }
        }

        false
    }
}

impl<K, V> ConsistencyChecker<K, V> for CausalChecker
where
    K: Eq,
{
    fn is_consistent(&self, tx: &Transaction<K, V>, history: &History<K, V>) -> bool {
        let Some(read) = tx.operation().as_read() else {
            // Writes and removes impose no read obligation
            return true;
        };
        let Some(response) = read.response() else {
            return false;
        };

        let dependencies = Self::dependencies(tx.session_id(), read.key(), history);
        Self::writer_follows_dependencies(response.written_by(), &dependencies, history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ReadResponse, VersionPayload, WriteResponse};

    type Tx = Transaction<&'static str, i32>;

    fn write(id: u64, session: i64, key: &'static str) -> Tx {
        let mut tx = Transaction::with_id(TxId::new(id), Operation::write(key, id as i32), SessionId::new(session));
        tx.start();
        if let Operation::Write(op) = tx.operation_mut() {
            op.set_response(WriteResponse::new(true, 1));
        }
        tx.end();
        tx
    }

    fn read(id: u64, session: i64, key: &'static str, observed: u64) -> Tx {
        let mut tx = Transaction::with_id(TxId::new(id), Operation::read(key), SessionId::new(session));
        tx.start();
        if let Some(op) = tx.operation_mut().as_read_mut() {
            op.set_response(ReadResponse::candidate(
                VersionPayload::Value(observed as i32),
                TxId::new(observed),
            ));
        }
        tx.end();
        tx
    }

    fn pending_read(id: u64, session: i64, key: &'static str, observed: u64) -> Tx {
        let mut tx = Transaction::with_id(TxId::new(id), Operation::read(key), SessionId::new(session));
        tx.start();
        if let Some(op) = tx.operation_mut().as_read_mut() {
            op.set_response(ReadResponse::candidate(
                VersionPayload::Value(observed as i32),
                TxId::new(observed),
            ));
        }
        tx
    }

    fn history(txs: Vec<Tx>) -> History<&'static str, i32> {
        let mut history = History::new();
        for tx in txs {
            history.commit(tx);
        }
        history
    }

    #[test]
    fn test_no_dependencies_is_consistent() {
        let h = history(vec![write(1, 1, "x"), write(2, 1, "x")]);

        // Session 2 has no history at all
        assert!(CausalChecker.is_consistent(&pending_read(3, 2, "x", 1), &h));
        assert!(CausalChecker.is_consistent(&pending_read(3, 2, "x", 2), &h));
    }

    #[test]
    fn test_read_your_writes() {
        let h = history(vec![write(1, 1, "x"), write(2, 2, "x")]);

        // Session 2 wrote tx 2, so it may not go back to tx 1
        assert!(!CausalChecker.is_consistent(&pending_read(3, 2, "x", 1), &h));
        assert!(CausalChecker.is_consistent(&pending_read(3, 2, "x", 2), &h));
    }

    #[test]
    fn test_monotonic_reads() {
        // C1 writes a (1), C2 writes b (2), C3 already read b
        let h = history(vec![write(1, 1, "x"), write(2, 2, "x"), read(3, 3, "x", 2)]);

        assert!(!CausalChecker.is_consistent(&pending_read(4, 3, "x", 1), &h));
        assert!(CausalChecker.is_consistent(&pending_read(4, 3, "x", 2), &h));
    }

    #[test]
    fn test_older_observation_allows_newer_read() {
        let h = history(vec![write(1, 1, "x"), read(2, 3, "x", 1), write(3, 2, "x")]);

        assert!(CausalChecker.is_consistent(&pending_read(4, 3, "x", 1), &h));
        assert!(CausalChecker.is_consistent(&pending_read(4, 3, "x", 3), &h));
    }

    #[test]
    fn test_other_keys_do_not_constrain() {
        let h = history(vec![write(1, 1, "x"), write(2, 1, "y"), write(3, 2, "x")]);

        let deps = CausalChecker::dependencies(SessionId::new(1), &"x", &h);
        assert_eq!(deps, HashSet::from([TxId::new(1)]));
        assert!(CausalChecker.is_consistent(&pending_read(4, 1, "x", 1), &h));
    }

    #[test]
    fn test_unknown_writer_is_inconsistent() {
        let h = history(vec![write(1, 1, "x")]);

        assert!(!CausalChecker.is_consistent(&pending_read(5, 1, "x", 99), &h));
    }

    #[test]
    fn test_read_without_response_is_inconsistent() {
        let h = history(vec![write(1, 1, "x")]);
        let mut tx: Tx = Transaction::with_id(TxId::new(2), Operation::read("x"), SessionId::new(1));
        tx.start();

        assert!(!CausalChecker.is_consistent(&tx, &h));
    }

    #[test]
    fn test_writer_follows_dependencies() {
        let h = history(vec![write(1, 1, "x"), write(2, 2, "x"), write(3, 3, "x")]);
        let deps = HashSet::from([TxId::new(1), TxId::new(2)]);

        assert!(!CausalChecker::writer_follows_dependencies(TxId::new(1), &deps, &h));
        assert!(CausalChecker::writer_follows_dependencies(TxId::new(2), &deps, &h));
        assert!(CausalChecker::writer_follows_dependencies(TxId::new(3), &deps, &h));
    }
}
