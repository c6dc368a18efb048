//! Transaction and session identities
//!
//! - `TxId` totally orders transaction creation across the whole process
//! - `SessionId` names a logical client connection
//!
//! Transaction ids are handed out when the transaction record is created,
//! before it enters the store's critical section. They are therefore unique
//! and increasing, but commit order is defined by the history log, not by id.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Process-wide transaction id counter. The first id handed out is 1.
static TX_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A globally unique, monotonically increasing transaction identity.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct TxId(u64);

impl TxId {
    /// Creates a TxId with an explicit value.
    ///
    /// Store code never calls this; ids for live transactions come from
    /// `TxId::generate`. Exists for tests and for decoding.
    #[inline]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Draws the next id from the process-wide counter.
    pub fn generate() -> Self {
        Self(TX_COUNTER.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Returns the underlying value.
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a logical client session.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct SessionId(i64);

impl SessionId {
    /// Session used when the caller does not name one.
    pub const DEFAULT: SessionId = SessionId(1);

    #[inline]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i64> for SessionId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<i32> for SessionId {
    fn from(value: i32) -> Self {
        Self(i64::from(value))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
