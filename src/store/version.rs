//! Version - Immutable value version and per-key version chain
//!
//! - A version is the value a single write left behind, tagged with its writer
//! - Once appended, a version never changes and is never reordered
//! - Deletes are explicit tombstone versions, ordered like any other write
//! - A chain is non-empty once its key has been written

use super::TxId;

/// The payload of a version: either a value or an explicit tombstone.
///
/// Tombstone is explicit, NOT represented via Option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionPayload<V> {
    /// A value written by a put.
    Value(V),
    /// A deletion marker written by a remove.
    Tombstone,
}

impl<V> VersionPayload<V> {
    #[inline]
    pub fn is_tombstone(&self) -> bool {
        matches!(self, VersionPayload::Tombstone)
    }

    /// Returns the value, or None for a tombstone.
    #[inline]
    pub fn value(&self) -> Option<&V> {
        match self {
            VersionPayload::Value(v) => Some(v),
            VersionPayload::Tombstone => None,
        }
    }
}

/// A single immutable version of a key.
///
/// All fields are private to enforce immutability.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Version<V> {
    payload: VersionPayload<V>,
    /// The transaction that wrote this version.
    writer: TxId,
}

impl<V> Version<V> {
    pub fn new(payload: VersionPayload<V>, writer: TxId) -> Self {
        Self { payload, writer }
    }

    pub fn with_value(value: V, writer: TxId) -> Self {
        Self::new(VersionPayload::Value(value), writer)
    }

    pub fn with_tombstone(writer: TxId) -> Self {
        Self::new(VersionPayload::Tombstone, writer)
    }

    #[inline]
    pub fn payload(&self) -> &VersionPayload<V> {
        &self.payload
    }

    #[inline]
    pub fn writer(&self) -> TxId {
        self.writer
    }

    #[inline]
    pub fn is_tombstone(&self) -> bool {
        self.payload.is_tombstone()
    }
}

/// The complete write history of one key, in commit order (oldest first).
///
/// The only mutation is `push`. Version numbers are 1-based positions in
/// this chain.
#[derive(Clone, Debug)]
pub struct VersionChain<V> {
    versions: Vec<Version<V>>,
}

impl<V> VersionChain<V> {
    pub fn new() -> Self {
        Self {
            versions: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Returns all versions, oldest first.
    #[inline]
    pub fn versions(&self) -> &[Version<V>] {
        &self.versions
    }

    /// Returns the most recently committed version.
    #[inline]
    pub fn latest(&self) -> Option<&Version<V>> {
        self.versions.last()
    }

    /// Version number of the latest version, 0 for an empty chain.
    #[inline]
    pub fn current_version_number(&self) -> u64 {
        self.versions.len() as u64
    }

    /// Appends a version and returns its version number.
    pub fn push(&mut self, version: Version<V>) -> u64 {
        self.versions.push(version);
        self.current_version_number()
    }
}

impl<V> Default for VersionChain<V> {
    fn default() -> Self {
        Self::new()
    }
}
