//! State HTTP Routes
//!
//! Dapr-style state API over a single `KvStore<String, Value>`:
//!
//! - `GET    /v1.0/state/:store/:key` read, version number in `ETag`
//! - `POST   /v1.0/state/:store`      save one item or an array of items
//! - `DELETE /v1.0/state/:store/:key` remove
//!
//! The `:store` segment is accepted for path compatibility; every name maps
//! to the same store. The caller's session comes from the `session-id`
//! header and defaults to session 1.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::store::{KvStore, SessionId, StoreError};

/// Header naming the caller's session
pub const SESSION_HEADER: &str = "session-id";

// ==================
// Shared State
// ==================

/// State shared across handlers
pub struct StateStore {
    pub store: KvStore<String, Value>,
}

impl StateStore {
    pub fn new(store: KvStore<String, Value>) -> Self {
        Self { store }
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateItem {
    pub key: String,
    pub value: Value,
    /// Version the caller last read; the write is conditional when present
    #[serde(default)]
    pub etag: Option<String>,
}

/// A save request carries one item or a batch
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SaveRequest {
    One(StateItem),
    Many(Vec<StateItem>),
}

impl SaveRequest {
    fn into_items(self) -> Vec<StateItem> {
        match self {
            SaveRequest::One(item) => vec![item],
            SaveRequest::Many(items) => items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: status.as_u16(),
        }),
    )
}

fn store_error(err: &StoreError) -> ApiError {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    api_error(status, err.to_string())
}

// ==================
// State Routes
// ==================

/// Create state routes
pub fn state_routes(state: Arc<StateStore>) -> Router {
    Router::new()
        .route("/v1.0/state/:store", post(save_state_handler))
        .route(
            "/v1.0/state/:store/:key",
            get(get_state_handler).delete(delete_state_handler),
        )
        .with_state(state)
}

// ==================
// Helper Functions
// ==================

fn session_id(headers: &HeaderMap) -> Result<SessionId, ApiError> {
    let Some(raw) = headers.get(SESSION_HEADER) else {
        return Ok(SessionId::DEFAULT);
    };

    raw.to_str()
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .map(SessionId::new)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "session-id header must be an integer"))
}

fn parse_etag(etag: &str) -> Result<u64, ApiError> {
    etag.trim()
        .trim_matches('"')
        .parse::<u64>()
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, format!("Invalid etag '{}'", etag)))
}

// ==================
// Handlers
// ==================

async fn get_state_handler(
    State(state): State<Arc<StateStore>>,
    headers: HeaderMap,
    Path((_store, key)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let session = session_id(&headers)?;

    match state.store.get_with_version(key.as_str(), session) {
        Ok((value, version)) => {
            let mut response = Json(value).into_response();
            if let Ok(etag) = HeaderValue::from_str(&version.to_string()) {
                response.headers_mut().insert(header::ETAG, etag);
            }
            Ok(response)
        }
        // The store answered; it had nothing legal to return
        Err(StoreError::NoConsistentCandidate { .. }) => Ok((
            StatusCode::OK,
            Json(json!({ "error": "No consistent response possible" })),
        )
            .into_response()),
        Err(err) => Err(store_error(&err)),
    }
}

/// Applies items in order. A batch is not atomic: items before a failing
/// one stay written.
async fn save_state_handler(
    State(state): State<Arc<StateStore>>,
    headers: HeaderMap,
    Path(_store): Path<String>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, ApiError> {
    let session = session_id(&headers)?;

    for item in request.into_items() {
        match item.etag.as_deref() {
            Some(etag) => {
                let expected = parse_etag(etag)?;
                state
                    .store
                    .put_if_version(item.key, item.value, expected, session)
                    .map_err(|e| store_error(&e))?;
            }
            None => {
                state.store.put(item.key, item.value, session);
            }
        }
    }

    Ok(Json(SaveResponse { success: true }))
}

async fn delete_state_handler(
    State(state): State<Arc<StateStore>>,
    headers: HeaderMap,
    Path((_store, key)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let session = session_id(&headers)?;

    state
        .store
        .remove(key.as_str(), session)
        .map_err(|e| store_error(&e))?;

    Ok(StatusCode::NO_CONTENT)
}
