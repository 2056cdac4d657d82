// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infra::errors::FlowError;
use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub kernel: KernelConfig,

    #[serde(default)]
    pub fuzzy: FuzzyConfig,

    #[serde(default)]
    pub automation: AutomationConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Upper bound on the live sequence window.
    pub max_sequence_length: usize,
    /// Longest n-gram tracked by the pattern store (shortest is always 2).
    pub max_pattern_length: usize,
    /// Predictions below this confidence are not surfaced.
    pub min_confidence: f64,
    pub rebuild_interval_secs: u64,
    pub event_log_capacity: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_sequence_length: 20,
            max_pattern_length: 5,
            min_confidence: 0.3,
            rebuild_interval_secs: 30,
            event_log_capacity: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    /// Events must score strictly above this to count as similar.
    pub similarity_threshold: f64,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    pub repetition_threshold: u32,
    pub suggestion_cooldown_ms: i64,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            repetition_threshold: 3,
            suggestion_cooldown_ms: 3_600_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Pause between replayed steps.
    pub step_delay_ms: u64,
    pub request_timeout_secs: u64,
    /// Base for resolving relative urls in recorded api actions.
    pub base_url: Option<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: 500,
            request_timeout_secs: 30,
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Prefix scoping every persisted row, so several kernels can share a db.
    pub namespace: String,
    pub db_path: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace: "flowcast".into(),
            db_path: None,
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> Result<Self, FlowError> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, FlowError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| FlowError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the kernel cannot run with.
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.kernel.max_pattern_length < 2 {
            return Err(FlowError::Config(format!(
                "kernel.max_pattern_length must be at least 2 (got {})",
                self.kernel.max_pattern_length
            )));
        }
        if self.kernel.max_sequence_length < 2 {
            return Err(FlowError::Config(format!(
                "kernel.max_sequence_length must be at least 2 (got {})",
                self.kernel.max_sequence_length
            )));
        }
        if !(0.0..=1.0).contains(&self.kernel.min_confidence) {
            return Err(FlowError::Config(format!(
                "kernel.min_confidence must be within [0, 1] (got {})",
                self.kernel.min_confidence
            )));
        }
        if self.storage.namespace.trim().is_empty() {
            return Err(FlowError::Config("storage.namespace is empty".into()));
        }
        Ok(())
    }
}
