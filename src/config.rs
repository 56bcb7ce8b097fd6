// File: src/config.rs
use crate::core::types::{BEST_RESULTS_THRESHOLD, DEFAULT_MAX_RANK};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunables shared by the extractor and the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// Profile truncation and the penalty for an n-gram missing from a reference.
    pub max_rank: usize,
    /// Closeness margin used by the CLI's `--best` output.
    pub best_results_threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self { max_rank: DEFAULT_MAX_RANK, best_results_threshold: BEST_RESULTS_THRESHOLD }
    }
}

impl DetectorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rank == 0 {
            return Err(Error::InvalidConfig("max_rank must be positive".into()));
        }
        if !self.best_results_threshold.is_finite() || self.best_results_threshold < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "best_results_threshold must be a non-negative number, got {}",
                self.best_results_threshold
            )));
        }
        Ok(())
    }
}
