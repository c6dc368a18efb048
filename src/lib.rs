//! mockdb - an in-memory multi-version key-value store that simulates
//! linearizable, causal and k-causal reads
//!
//! Writes append versions and never overwrite. A read is offered every
//! version of its key and a pluggable selector decides which one it
//! observes, so applications can be exercised against the anomalies a
//! weakly consistent store would expose.

pub mod cli;
pub mod config;
pub mod consistency;
pub mod http_server;
pub mod observability;
pub mod simulation;
pub mod store;

pub use config::{ConsistencyLevel, SimConfig};
pub use consistency::{CausalSelector, KCausalSelector, LinearizableSelector, ReadSelector};
pub use store::{KvStore, SessionId, StoreError, StoreResult, TxId};
