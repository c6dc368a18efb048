//! # HTTP Server
//!
//! Combines the state and observability routers over one shared store.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::config::HttpServerConfig;
use super::observability_routes::observability_routes;
use super::state_routes::{state_routes, StateStore};
use crate::consistency::LinearizableSelector;
use crate::observability::{log_event, log_event_with_fields, Event, ObservationScope};
use crate::store::KvStore;

/// HTTP binding for a `KvStore`
pub struct HttpServer {
    config: HttpServerConfig,
    state: Arc<StateStore>,
    router: Router,
}

impl HttpServer {
    /// Linearizable store, default configuration
    pub fn new() -> Self {
        Self::with_store(
            HttpServerConfig::default(),
            KvStore::new(LinearizableSelector::new()),
        )
    }

    pub fn with_store(config: HttpServerConfig, store: KvStore<String, Value>) -> Self {
        let state = Arc::new(StateStore::new(store));
        let router = Self::build_router(&config, Arc::clone(&state));
        Self {
            config,
            state,
            router,
        }
    }

    fn build_router(config: &HttpServerConfig, state: Arc<StateStore>) -> Router {
        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(observability_routes(Arc::clone(&state)))
            .merge(state_routes(state))
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// The store behind the routes
    pub fn state(&self) -> Arc<StateStore> {
        Arc::clone(&self.state)
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serves until Ctrl-C.
    pub async fn start(self) -> io::Result<()> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let addr_str = addr.to_string();
        let consistency = self.state.store.consistency();
        let scope = ObservationScope::with_fields(
            "SERVER",
            &[("addr", &addr_str), ("consistency", consistency)],
        );

        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                scope.fail(&e.to_string());
                return Err(e);
            }
        };
        log_event_with_fields(Event::Serving, &[("addr", &addr_str)]);

        let result = axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        match result {
            Ok(()) => {
                let writes = self.state.store.metrics().snapshot().writes.to_string();
                scope.complete_with_fields(&[("writes", &writes)]);
                log_event(Event::ShutdownComplete);
                Ok(())
            }
            Err(e) => {
                scope.fail(&e.to_string());
                Err(e)
            }
        }
    }
}

impl Default for HttpServer {
    fn default() -> Self {
        Self::new()
    }
}

async fn shutdown_signal() {
    // If the handler cannot be installed, serve until killed
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
