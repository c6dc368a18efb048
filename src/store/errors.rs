//! # Store Errors
//!
//! Error taxonomy shared by the store, the selectors and the HTTP binding.

use thiserror::Error;

use super::{OperationKind, TxId};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised synchronously by store operations.
///
/// A failing call never leaves a partial mutation behind: failed reads are
/// not appended to any history, and rejected conditional writes append no
/// version.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Read or remove of a key with no live version
    #[error("Key Not Found: {key}")]
    KeyNotFound { key: String },

    /// The configured selector could not find a legal version for this read
    #[error("Inconsistent transaction: {operation} TX_ID: {tx_id}")]
    NoConsistentCandidate { operation: String, tx_id: TxId },

    /// Reserved for a query layer above the store
    #[error("Error while parsing query {query}")]
    QueryParse { query: String },

    /// Conditional write whose expected version is not the current one
    #[error("Version mismatch on {key}: expected {expected}, current {current}")]
    VersionMismatch {
        key: String,
        expected: u64,
        current: u64,
    },
}

impl StoreError {
    pub fn key_not_found(key: impl std::fmt::Debug) -> Self {
        StoreError::KeyNotFound {
            key: display_key(key),
        }
    }

    pub fn no_consistent_candidate(kind: OperationKind, key: impl std::fmt::Debug, tx_id: TxId) -> Self {
        StoreError::NoConsistentCandidate {
            operation: format!("{}({})", kind, display_key(key)),
            tx_id,
        }
    }

    pub fn version_mismatch(key: impl std::fmt::Debug, expected: u64, current: u64) -> Self {
        StoreError::VersionMismatch {
            key: display_key(key),
            expected,
            current,
        }
    }

    /// Returns the stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::KeyNotFound { .. } => "MOCKDB_KEY_NOT_FOUND",
            StoreError::NoConsistentCandidate { .. } => "MOCKDB_NO_CONSISTENT_CANDIDATE",
            StoreError::QueryParse { .. } => "MOCKDB_QUERY_PARSE",
            StoreError::VersionMismatch { .. } => "MOCKDB_VERSION_MISMATCH",
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::KeyNotFound { .. } => 404,
            // The simulated store answers, it just has nothing legal to say
            StoreError::NoConsistentCandidate { .. } => 200,
            StoreError::QueryParse { .. } => 400,
            StoreError::VersionMismatch { .. } => 409,
        }
    }

    /// True for failures a caller may simply retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::NoConsistentCandidate { .. })
    }
}

/// Renders a key for messages. Strings are shown without quotes.
fn display_key(key: impl std::fmt::Debug) -> String {
    let rendered = format!("{:?}", key);
    rendered
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .map(str::to_string)
        .unwrap_or(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_not_found_message() {
        let err = StoreError::key_not_found("cart:42");
        assert_eq!(err.to_string(), "Key Not Found: cart:42");
        assert_eq!(err.code(), "MOCKDB_KEY_NOT_FOUND");
        assert_eq!(err.status_code(), 404);
        assert!(!err.is_transient());
    }

    #[test]
    fn test_non_string_keys_render() {
        let err = StoreError::key_not_found(17_i64);
        assert_eq!(err.to_string(), "Key Not Found: 17");
    }

    #[test]
    fn test_no_consistent_candidate_message() {
        let err = StoreError::no_consistent_candidate(OperationKind::Read, "x", TxId::new(12));
        assert_eq!(err.to_string(), "Inconsistent transaction: GET(x) TX_ID: 12");
        assert!(err.is_transient());
    }

    #[test]
    fn test_version_mismatch_status() {
        let err = StoreError::VersionMismatch {
            key: "k".into(),
            expected: 1,
            current: 2,
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.code(), "MOCKDB_VERSION_MISMATCH");
    }
}
