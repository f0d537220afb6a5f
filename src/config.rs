use crate::domain::payment::PaymentPolicy;
use crate::error::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tourdesk";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Runtime settings, layered from defaults, an optional TOML file and
/// `TOURDESK__*` environment variables (later sources win).
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Verified payments may exceed the total by this many basis points.
    #[serde(default)]
    pub overpayment_tolerance_bps: u32,
    #[serde(default = "default_require_gcash_proof")]
    pub require_gcash_proof: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_require_gcash_proof() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            overpayment_tolerance_bps: 0,
            require_gcash_proof: default_require_gcash_proof(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl EngineConfig {
    /// Loads the configuration. An explicit `path` must exist; otherwise
    /// `tourdesk.toml` is read when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("TOURDESK").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn payment_policy(&self) -> PaymentPolicy {
        PaymentPolicy {
            require_gcash_proof: self.require_gcash_proof,
            overpayment_tolerance_bps: self.overpayment_tolerance_bps,
        }
    }
}
