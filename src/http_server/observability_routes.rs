//! Observability HTTP Routes
//!
//! Health check and store counters.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use super::state_routes::StateStore;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub consistency: String,
}

/// Create observability routes
pub fn observability_routes(state: Arc<StateStore>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn health_handler(State(state): State<Arc<StateStore>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        consistency: state.store.consistency().to_string(),
    };

    (StatusCode::OK, Json(response))
}

async fn metrics_handler(State(state): State<Arc<StateStore>>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.store.metrics().snapshot()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "ok".to_string(),
            version: "0.1.0".to_string(),
            consistency: "causal".to_string(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["consistency"], "causal");
    }
}
