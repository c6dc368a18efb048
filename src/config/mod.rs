//! Simulator configuration
//!
//! A JSON file, every field optional:
//!
//! ```json
//! {
//!   "consistency": "k-causal",
//!   "k": 2,
//!   "total_reads": 12,
//!   "seed": 7,
//!   "log_level": "info",
//!   "http": { "host": "127.0.0.1", "port": 3500 }
//! }
//! ```
//!
//! `load` reads, parses and validates. Command-line flags are applied on top
//! by the CLI before the selector is built.

mod errors;

pub use errors::{ConfigError, ConfigErrorCode, ConfigResult};

use std::fmt;
use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::consistency::{CausalSelector, KCausalSelector, LinearizableSelector, ReadSelector};
use crate::http_server::HttpServerConfig;
use crate::observability::{log_event_with_fields, Event, Severity};
use crate::store::KvStore;

/// Which read model the store runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ConsistencyLevel {
    #[default]
    #[serde(alias = "linear")]
    #[value(alias = "linear")]
    Linearizable,
    Causal,
    KCausal,
}

impl ConsistencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsistencyLevel::Linearizable => "linearizable",
            ConsistencyLevel::Causal => "causal",
            ConsistencyLevel::KCausal => "k-causal",
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Simulator configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    #[serde(default)]
    pub consistency: ConsistencyLevel,

    /// Causal reads allowed under k-causal
    #[serde(default)]
    pub k: usize,

    /// Expected reads per run under k-causal; 0 derives it from the workload
    #[serde(default)]
    pub total_reads: usize,

    /// Seed for every random choice; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub http: HttpServerConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            consistency: ConsistencyLevel::default(),
            k: 0,
            total_reads: 0,
            seed: None,
            log_level: default_log_level(),
            http: HttpServerConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::read_failed(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let config = Self::from_json(&content)?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("consistency", config.consistency.as_str()),
                ("path", &path.display().to_string()),
            ],
        );
        Ok(config)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_json::from_str(content)
            .map_err(|e| ConfigError::invalid_json(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks field combinations serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        self.severity()?;

        if self.consistency == ConsistencyLevel::KCausal
            && self.total_reads > 0
            && self.k > self.total_reads
        {
            return Err(ConfigError::invalid_value(format!(
                "k ({}) must not exceed total_reads ({})",
                self.k, self.total_reads
            )));
        }

        if self.http.port == 0 {
            return Err(ConfigError::invalid_value("http.port must be > 0"));
        }

        Ok(())
    }

    /// The configured log threshold.
    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level.parse::<Severity>().map_err(ConfigError::invalid_value)
    }

    /// Builds a selector for the configured model.
    ///
    /// `derived_total_reads` stands in for `total_reads` when that is 0.
    /// Fails for k-causal when neither is known.
    pub fn build_selector<K, V>(
        &self,
        derived_total_reads: Option<usize>,
    ) -> ConfigResult<Box<dyn ReadSelector<K, V>>>
    where
        K: Eq + fmt::Debug + Send,
        V: Clone + Send,
    {
        let selector: Box<dyn ReadSelector<K, V>> = match self.consistency {
            ConsistencyLevel::Linearizable => Box::new(LinearizableSelector::new()),
            ConsistencyLevel::Causal => Box::new(match self.seed {
                Some(seed) => CausalSelector::with_seed(seed),
                None => CausalSelector::new(),
            }),
            ConsistencyLevel::KCausal => {
                let total_reads = match (self.total_reads, derived_total_reads) {
                    (0, Some(derived)) if derived > 0 => derived,
                    (0, _) => {
                        return Err(ConfigError::invalid_value(
                            "k-causal requires total_reads > 0",
                        ))
                    }
                    (configured, _) => configured,
                };
                Box::new(match self.seed {
                    Some(seed) => KCausalSelector::with_seed(self.k, total_reads, seed),
                    None => KCausalSelector::new(self.k, total_reads),
                })
            }
        };
        Ok(selector)
    }

    /// Builds an empty store under the configured model.
    pub fn build_store<K, V>(&self, derived_total_reads: Option<usize>) -> ConfigResult<KvStore<K, V>>
    where
        K: Eq + std::hash::Hash + Clone + fmt::Debug + Send + 'static,
        V: Clone + fmt::Debug + Send + 'static,
    {
        Ok(KvStore::with_boxed_selector(self.build_selector(derived_total_reads)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = SimConfig::from_json("{}").unwrap();
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.consistency, ConsistencyLevel::Linearizable);
        assert_eq!(config.http.port, 3500);
    }

    #[test]
    fn test_consistency_names() {
        for (name, level) in [
            ("linearizable", ConsistencyLevel::Linearizable),
            ("linear", ConsistencyLevel::Linearizable),
            ("causal", ConsistencyLevel::Causal),
            ("k-causal", ConsistencyLevel::KCausal),
        ] {
            let config = SimConfig::from_json(&format!(r#"{{"consistency":"{}"}}"#, name)).unwrap();
            assert_eq!(config.consistency, level);
        }
        assert!(SimConfig::from_json(r#"{"consistency":"eventual"}"#).is_err());
    }

    #[test]
    fn test_k_above_total_rejected() {
        let err = SimConfig::from_json(r#"{"consistency":"k-causal","k":5,"total_reads":3}"#).unwrap_err();
        assert_eq!(err.code_str(), "MOCKDB_CONFIG_INVALID_VALUE");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = SimConfig::from_json(r#"{"consistancy":"causal"}"#).unwrap_err();
        assert_eq!(err.code_str(), "MOCKDB_CONFIG_INVALID_JSON");
    }

    #[test]
    fn test_bad_log_level_rejected() {
        assert!(SimConfig::from_json(r#"{"log_level":"chatty"}"#).is_err());
        let config = SimConfig::from_json(r#"{"log_level":"trace"}"#).unwrap();
        assert_eq!(config.severity().unwrap(), Severity::Trace);
    }

    #[test]
    fn test_build_selector_names() {
        let mut config = SimConfig::default();
        let selector = config.build_selector::<String, i32>(None).unwrap();
        assert_eq!(selector.name(), "linearizable");

        config.consistency = ConsistencyLevel::Causal;
        config.seed = Some(3);
        assert_eq!(config.build_selector::<String, i32>(None).unwrap().name(), "causal");
    }

    #[test]
    fn test_k_causal_needs_total_reads() {
        let config = SimConfig {
            consistency: ConsistencyLevel::KCausal,
            k: 1,
            ..SimConfig::default()
        };

        assert!(config.build_selector::<String, i32>(None).is_err());
        let selector = config.build_selector::<String, i32>(Some(4)).unwrap();
        assert_eq!(selector.name(), "k-causal");
    }
}
