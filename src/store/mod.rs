//! Multi-version key-value store
//!
//! - Per-key version chains that are never overwritten, only appended to
//! - A global commit log plus per-session logs of every committed operation
//! - Reads resolved through a pluggable `ReadSelector`
//!
//! Every committed operation appears exactly once in the global log and
//! exactly once in its session's log, in the same relative order.

mod engine;
mod errors;
mod history;
mod ids;
mod operation;
mod transaction;
mod version;

pub use engine::KvStore;
pub use errors::{StoreError, StoreResult};
pub use history::History;
pub use ids::{SessionId, TxId};
pub use operation::{
    Operation, OperationKind, ReadOp, ReadResponse, RemoveOp, RemoveResponse, WriteOp,
    WriteResponse,
};
pub use transaction::{Transaction, TxState};
pub use version::{Version, VersionChain, VersionPayload};
