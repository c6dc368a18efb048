//! Configuration errors

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCode {
    /// File could not be read
    ReadFailed,
    /// File is not valid JSON for the config schema
    InvalidJson,
    /// Parsed, but a field value or combination is not allowed
    InvalidValue,
}

impl ConfigErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ReadFailed => "MOCKDB_CONFIG_READ_FAILED",
            Self::InvalidJson => "MOCKDB_CONFIG_INVALID_JSON",
            Self::InvalidValue => "MOCKDB_CONFIG_INVALID_VALUE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    code: ConfigErrorCode,
    message: String,
}

impl ConfigError {
    pub fn new(code: ConfigErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::new(ConfigErrorCode::ReadFailed, msg)
    }

    pub fn invalid_json(msg: impl Into<String>) -> Self {
        Self::new(ConfigErrorCode::InvalidJson, msg)
    }

    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Self::new(ConfigErrorCode::InvalidValue, msg)
    }

    pub fn code(&self) -> ConfigErrorCode {
        self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for ConfigError {}

pub type ConfigResult<T> = Result<T, ConfigError>;
