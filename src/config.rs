//! Dispatch configuration: cache capacities, engine timeouts, detection
//! thresholds and the corruption signature list.
//! Loaded from JSON; every field falls back to its default when absent.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::language::SupportedLanguage;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Memory tier capacity (access-order LRU).
    pub memory_cache_size: usize,
    /// Persistent tier capacity (insertion-order, batch eviction).
    pub disk_cache_size: usize,
    /// Extra entries dropped below capacity when the persistent tier overflows.
    pub disk_cleanup_batch: usize,
    pub translate_timeout_ms: u64,
    pub model_timeout_ms: u64,
    /// Inputs shorter than this (trimmed, in chars) skip classification.
    pub min_detection_len: usize,
    /// Relative length change above which same-script output counts as translated.
    pub difference_threshold: f32,
    /// Share of characters needed for a script family to dominate mixed text.
    pub ratio_threshold: f32,
    pub default_language: SupportedLanguage,
    /// Wi-Fi requirement passed to regular model downloads.
    /// Reinstall downloads always pass `false`.
    pub require_wifi: bool,
    /// Error-text fragments that mark an installed model as corrupted.
    pub corruption_signatures: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            memory_cache_size: 100,
            disk_cache_size: 500,
            disk_cleanup_batch: 50,
            translate_timeout_ms: 10_000,
            model_timeout_ms: 30_000,
            min_detection_len: 2,
            difference_threshold: 0.2,
            ratio_threshold: 0.3,
            default_language: SupportedLanguage::Korean,
            require_wifi: true,
            corruption_signatures: vec![
                "ICU translit".to_string(),
                "transliteration".to_string(),
                "RET_CHECK failure".to_string(),
            ],
        }
    }
}

impl DispatchConfig {
    /// Load and validate a JSON config file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: DispatchConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory_cache_size == 0 {
            return Err(ConfigError::Invalid("memory_cache_size must be > 0".into()));
        }
        if self.disk_cache_size <= self.memory_cache_size {
            return Err(ConfigError::Invalid(format!(
                "disk_cache_size ({}) must exceed memory_cache_size ({})",
                self.disk_cache_size, self.memory_cache_size
            )));
        }
        if self.disk_cleanup_batch > self.disk_cache_size {
            return Err(ConfigError::Invalid(
                "disk_cleanup_batch must not exceed disk_cache_size".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.ratio_threshold) {
            return Err(ConfigError::Invalid("ratio_threshold must be within 0..=1".into()));
        }
        if self.difference_threshold < 0.0 {
            return Err(ConfigError::Invalid("difference_threshold must be >= 0".into()));
        }
        Ok(())
    }

    pub fn translate_timeout(&self) -> Duration {
        Duration::from_millis(self.translate_timeout_ms)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_millis(self.model_timeout_ms)
    }
}
