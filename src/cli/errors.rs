//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero status.

use std::fmt;
use std::io;

use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file or flag error
    ConfigError,
    /// Workload file error
    WorkloadError,
    /// I/O error (stdout, sockets)
    IoError,
    /// HTTP server could not start or failed while serving
    ServeFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "MOCKDB_CLI_CONFIG_ERROR",
            Self::WorkloadError => "MOCKDB_CLI_WORKLOAD_ERROR",
            Self::IoError => "MOCKDB_CLI_IO_ERROR",
            Self::ServeFailed => "MOCKDB_CLI_SERVE_FAILED",
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn workload_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::WorkloadError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn serve_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ServeFailed, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
