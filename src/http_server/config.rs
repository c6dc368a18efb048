//! HTTP Server Configuration

use serde::{Deserialize, Serialize};

/// HTTP binding configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpServerConfig {
    /// Host to bind to (default: "127.0.0.1")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 3500, the port Dapr sidecars listen on)
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3500
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl HttpServerConfig {
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpServerConfig::default();
        assert_eq!(config.socket_addr(), "127.0.0.1:3500");
        assert!(config.cors_origins.is_empty());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: HttpServerConfig = serde_json::from_str(r#"{"port": 8080}"#).unwrap();
        assert_eq!(config, HttpServerConfig::with_port(8080));
    }
}
