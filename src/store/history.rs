//! Commit history
//!
//! - The global log holds every committed transaction in commit order
//! - The session index lists, per session, positions into the global log
//!
//! Both are append-only. Session order is therefore always a subsequence of
//! global order. Only the engine commits; selectors and checkers receive a
//! shared reference and can only read.

use std::collections::HashMap;

use super::{SessionId, Transaction, TxState};

#[derive(Debug, Clone)]
pub struct History<K, V> {
    global: Vec<Transaction<K, V>>,
    sessions: HashMap<SessionId, Vec<usize>>,
}

impl<K, V> History<K, V> {
    pub fn new() -> Self {
        Self {
            global: Vec::new(),
            sessions: HashMap::new(),
        }
    }

    /// Appends an ended transaction to the global log and its session log.
    pub(crate) fn commit(&mut self, tx: Transaction<K, V>) {
        debug_assert_eq!(tx.state(), TxState::Ended);
        let position = self.global.len();
        self.sessions.entry(tx.session_id()).or_default().push(position);
        self.global.push(tx);
    }

    /// All committed transactions, in commit order.
    pub fn global(&self) -> &[Transaction<K, V>] {
        &self.global
    }

    /// The committed transactions of one session, in commit order.
    pub fn session(&self, session_id: SessionId) -> impl Iterator<Item = &Transaction<K, V>> + '_ {
        self.sessions
            .get(&session_id)
            .map(|positions| positions.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&position| &self.global[position])
    }

    pub fn session_len(&self, session_id: SessionId) -> usize {
        self.sessions.get(&session_id).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.global.len()
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty()
    }

    /// Sessions that have committed at least one transaction.
    pub fn sessions(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.sessions.keys().copied()
    }
}

impl<K, V> Default for History<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
