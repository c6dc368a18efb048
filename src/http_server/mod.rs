//! # HTTP binding
//!
//! Exposes one store over a Dapr-compatible state API.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/metrics` - Store counters
//! - `/v1.0/state/:store[/:key]` - Read, save and delete state

pub mod config;
pub mod observability_routes;
pub mod server;
pub mod state_routes;

pub use config::HttpServerConfig;
pub use server::HttpServer;
pub use state_routes::{StateStore, SESSION_HEADER};
