//! Read-response selectors
//!
//! A read enumerates every version of its key as a candidate, oldest first.
//! The selector picks exactly one candidate and returns its index, or fails
//! with `NoConsistentCandidate`.
//!
//! - `LinearizableSelector`: always the newest candidate
//! - `CausalSelector`: random candidates without replacement until the
//!   causal checker accepts one
//! - `KCausalSelector`: causal for exactly `k` pre-drawn read positions,
//!   linearizable otherwise
//!
//! Selection only touches the in-flight transaction's tentative response.
//! Store state and history are read-only here.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::checker::{CausalChecker, ConsistencyChecker};
use crate::observability::{log_event_with_fields, Event};
use crate::store::{History, ReadResponse, StoreError, StoreResult, Transaction};

/// Strategy that chooses which version a read observes.
pub trait ReadSelector<K, V>: Send {
    /// Picks one of `candidates` for the read in `tx`.
    ///
    /// `candidates` is in per-key commit order and never empty when called
    /// by the store. On success the returned index is the chosen candidate
    /// and `tx` holds it as its tentative response.
    fn select(
        &mut self,
        tx: &mut Transaction<K, V>,
        candidates: &[ReadResponse<V>],
        history: &History<K, V>,
    ) -> StoreResult<usize>;

    /// Short model name for logs.
    fn name(&self) -> &'static str;
}

fn attach<K, V: Clone>(tx: &mut Transaction<K, V>, candidate: &ReadResponse<V>) {
    if let Some(read) = tx.operation_mut().as_read_mut() {
        read.set_response(candidate.clone());
    }
}

fn detach<K, V>(tx: &mut Transaction<K, V>) {
    if let Some(read) = tx.operation_mut().as_read_mut() {
        read.clear_response();
    }
}

fn reject<K: std::fmt::Debug, V>(tx: &Transaction<K, V>) -> StoreError {
    StoreError::no_consistent_candidate(tx.kind(), tx.operation().key(), tx.id())
}

// ==================
// Linearizable
// ==================

/// Every read observes the most recently committed write.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearizableSelector;

impl LinearizableSelector {
    pub fn new() -> Self {
        Self
    }
}

impl<K, V> ReadSelector<K, V> for LinearizableSelector
where
    K: std::fmt::Debug + Send,
    V: Clone + Send,
{
    fn select(
        &mut self,
        tx: &mut Transaction<K, V>,
        candidates: &[ReadResponse<V>],
        _history: &History<K, V>,
    ) -> StoreResult<usize> {
        match candidates.last() {
            Some(latest) => {
                attach(tx, latest);
                Ok(candidates.len() - 1)
            }
            None => {
                detach(tx);
                Err(reject(tx))
            }
        }
    }

    fn name(&self) -> &'static str {
        "linearizable"
    }
}

// ==================
// Causal
// ==================

/// Uniform random choice among causally legal candidates.
pub struct CausalSelector {
    checker: CausalChecker,
    rng: StdRng,
}

impl CausalSelector {
    /// Seeds from OS entropy.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Reproducible selector.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            checker: CausalChecker::new(),
            rng,
        }
    }
}

impl Default for CausalSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ReadSelector<K, V> for CausalSelector
where
    K: Eq + std::fmt::Debug + Send,
    V: Clone + Send,
{
    fn select(
        &mut self,
        tx: &mut Transaction<K, V>,
        candidates: &[ReadResponse<V>],
        history: &History<K, V>,
    ) -> StoreResult<usize> {
        // Untried candidates live in order[..remaining]
        let mut order: Vec<usize> = (0..candidates.len()).collect();
        let mut remaining = order.len();

        while remaining > 0 {
            let pick = self.rng.gen_range(0..remaining);
            order.swap(pick, remaining - 1);
            let index = order[remaining - 1];
            remaining -= 1;

            attach(tx, &candidates[index]);
            if self.checker.is_consistent(tx, history) {
                return Ok(index);
            }
        }

        detach(tx);
        Err(reject(tx))
    }

    fn name(&self) -> &'static str {
        "causal"
    }
}

// ==================
// k-causal
// ==================

/// Linearizable except for `k` randomly placed reads, which are causal.
///
/// The weak set is a uniform sample of `k` positions from `1..=total_reads`,
/// drawn once at construction. Read positions are counted per selector, so
/// a selector must not be shared between stores.
pub struct KCausalSelector {
    k: usize,
    total_reads: usize,
    read_count: u64,
    weak_reads: HashSet<u64>,
    causal_reads: u64,
    causal: CausalSelector,
    linearizable: LinearizableSelector,
}

impl KCausalSelector {
    pub fn new(k: usize, total_reads: usize) -> Self {
        Self::build(k, total_reads, StdRng::from_entropy(), CausalSelector::new())
    }

    pub fn with_seed(k: usize, total_reads: usize, seed: u64) -> Self {
        Self::build(
            k,
            total_reads,
            StdRng::seed_from_u64(seed),
            CausalSelector::with_seed(seed.wrapping_add(1)),
        )
    }

    fn build(k: usize, total_reads: usize, mut rng: StdRng, causal: CausalSelector) -> Self {
        let amount = k.min(total_reads);
        let weak_reads: HashSet<u64> = rand::seq::index::sample(&mut rng, total_reads, amount)
            .into_iter()
            .map(|position| position as u64 + 1)
            .collect();

        let k_str = amount.to_string();
        let total_str = total_reads.to_string();
        log_event_with_fields(Event::WeakSetDrawn, &[("k", &k_str), ("total_reads", &total_str)]);

        Self {
            k: amount,
            total_reads,
            read_count: 0,
            weak_reads,
            causal_reads: 0,
            causal,
            linearizable: LinearizableSelector::new(),
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn total_reads(&self) -> usize {
        self.total_reads
    }

    /// Read positions (1-based) that take the causal path.
    pub fn weak_reads(&self) -> &HashSet<u64> {
        &self.weak_reads
    }

    /// Number of reads routed so far.
    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    /// Number of reads routed to the causal selector so far.
    pub fn causal_reads(&self) -> u64 {
        self.causal_reads
    }
}

impl<K, V> ReadSelector<K, V> for KCausalSelector
where
    K: Eq + std::fmt::Debug + Send,
    V: Clone + Send,
{
    fn select(
        &mut self,
        tx: &mut Transaction<K, V>,
        candidates: &[ReadResponse<V>],
        history: &History<K, V>,
    ) -> StoreResult<usize> {
        self.read_count += 1;
        if self.weak_reads.contains(&self.read_count) {
            self.causal_reads += 1;
            return self.causal.select(tx, candidates, history);
        }
        self.linearizable.select(tx, candidates, history)
    }

    fn name(&self) -> &'static str {
        "k-causal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Operation, SessionId, TxId, VersionPayload, WriteResponse};

    type Tx = Transaction<&'static str, i32>;

    fn committed_write(history: &mut History<&'static str, i32>, id: u64, session: i64) {
        let mut tx: Tx = Transaction::with_id(TxId::new(id), Operation::write("x", id as i32), SessionId::new(session));
        tx.start();
        if let Operation::Write(op) = tx.operation_mut() {
            op.set_response(WriteResponse::new(true, 1));
        }
        tx.end();
        history.commit(tx);
    }

    fn candidates(writers: &[u64]) -> Vec<ReadResponse<i32>> {
        writers
            .iter()
            .map(|&w| ReadResponse::candidate(VersionPayload::Value(w as i32), TxId::new(w)))
            .collect()
    }

    fn new_read(session: i64) -> Tx {
        let mut tx = Transaction::new(Operation::read("x"), SessionId::new(session));
        tx.start();
        tx
    }

    fn tentative_writer(tx: &Tx) -> Option<TxId> {
        tx.operation().as_read().and_then(|r| r.response()).map(|r| r.written_by())
    }

    #[test]
    fn test_linearizable_picks_latest() {
        let history = History::new();
        let mut tx = new_read(1);

        let index = LinearizableSelector.select(&mut tx, &candidates(&[1, 2, 3]), &history).unwrap();

        assert_eq!(index, 2);
        assert_eq!(tentative_writer(&tx), Some(TxId::new(3)));
    }

    #[test]
    fn test_linearizable_empty_candidates_fail() {
        let history = History::new();
        let mut tx = new_read(1);

        let result = LinearizableSelector.select(&mut tx, &candidates(&[]), &history);

        assert!(matches!(result, Err(StoreError::NoConsistentCandidate { .. })));
        assert_eq!(tentative_writer(&tx), None);
    }

    #[test]
    fn test_causal_respects_read_your_writes() {
        let mut history = History::new();
        committed_write(&mut history, 1, 1);
        committed_write(&mut history, 2, 2);

        let mut selector = CausalSelector::with_seed(7);
        for _ in 0..50 {
            let mut tx = new_read(2);
            let index = selector.select(&mut tx, &candidates(&[1, 2]), &history).unwrap();
            assert_eq!(index, 1);
            assert_eq!(tentative_writer(&tx), Some(TxId::new(2)));
        }
    }

    #[test]
    fn test_causal_explores_all_legal_candidates() {
        let mut history = History::new();
        committed_write(&mut history, 1, 1);
        committed_write(&mut history, 2, 1);
        committed_write(&mut history, 3, 1);

        // Session 9 has no obligations, so every version is legal
        let mut selector = CausalSelector::with_seed(11);
        let mut chosen = HashSet::new();
        for _ in 0..200 {
            let mut tx = new_read(9);
            chosen.insert(selector.select(&mut tx, &candidates(&[1, 2, 3]), &history).unwrap());
        }
        assert_eq!(chosen, HashSet::from([0, 1, 2]));
    }

    #[test]
    fn test_causal_single_illegal_candidate_fails() {
        let mut history = History::new();
        committed_write(&mut history, 1, 1);
        committed_write(&mut history, 2, 2);

        // Only the old version is offered; session 2 wrote the newer one
        let mut selector = CausalSelector::with_seed(3);
        let mut tx = new_read(2);
        let result = selector.select(&mut tx, &candidates(&[1]), &history);

        assert!(matches!(result, Err(StoreError::NoConsistentCandidate { .. })));
        assert_eq!(tentative_writer(&tx), None);
    }

    #[test]
    fn test_causal_seed_is_reproducible() {
        let mut history = History::new();
        for id in 1..=5 {
            committed_write(&mut history, id, 1);
        }
        let offered = candidates(&[1, 2, 3, 4, 5]);

        let mut a = CausalSelector::with_seed(42);
        let mut b = CausalSelector::with_seed(42);
        for _ in 0..20 {
            let ia = a.select(&mut new_read(8), &offered, &history).unwrap();
            let ib = b.select(&mut new_read(8), &offered, &history).unwrap();
            assert_eq!(ia, ib);
        }
    }

    #[test]
    fn test_k_causal_weak_set_size() {
        let selector = KCausalSelector::with_seed(3, 10, 5);

        assert_eq!(selector.weak_reads().len(), 3);
        assert!(selector.weak_reads().iter().all(|p| (1..=10).contains(p)));
    }

    #[test]
    fn test_k_causal_clamps_k() {
        let selector = KCausalSelector::with_seed(8, 4, 1);
        assert_eq!(selector.k(), 4);
        assert_eq!(selector.weak_reads().len(), 4);
    }

    #[test]
    fn test_k_causal_routes_only_weak_positions() {
        let mut history = History::new();
        for id in 1..=4 {
            committed_write(&mut history, id, 1);
        }
        let offered = candidates(&[1, 2, 3, 4]);
        let mut selector = KCausalSelector::with_seed(2, 20, 99);
        let weak = selector.weak_reads().clone();

        for position in 1..=20u64 {
            let index = selector.select(&mut new_read(5), &offered, &history).unwrap();
            if !weak.contains(&position) {
                assert_eq!(index, 3, "read {} should be linearizable", position);
            }
        }
        assert_eq!(selector.read_count(), 20);
        assert_eq!(selector.causal_reads(), 2);
    }

    #[test]
    fn test_k_zero_is_linearizable() {
        let mut history = History::new();
        committed_write(&mut history, 1, 1);
        committed_write(&mut history, 2, 1);
        let mut selector = KCausalSelector::with_seed(0, 10, 4);

        for _ in 0..10 {
            assert_eq!(selector.select(&mut new_read(3), &candidates(&[1, 2]), &history).unwrap(), 1);
        }
        assert_eq!(selector.causal_reads(), 0);
    }
}
