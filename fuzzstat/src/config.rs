//! Configuration loading for fuzzstat.
//!
//! Supports loading configuration from TOML files, with sensible defaults
//! for all settings.

use anyhow::{Context, Result};
use fuzzstat_core::Statistic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for fuzzstat.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which fuzzers to compare and how.
    pub analysis: AnalysisConfig,
    /// Settings for the external statistics provider.
    pub provider: ProviderConfig,
    /// Output settings.
    pub report: ReportConfig,
}

/// Configuration of the comparison itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// The fuzzer under evaluation.
    pub tweak: String,
    /// Fixed baseline fuzzer; the best competitor is used when unset.
    pub baseline: Option<String>,
    /// Number of runs every fuzzer is expected to have per target.
    pub expected_runs: usize,
    /// Rank by mean (median as tie-breaker) instead of median.
    pub use_mean: bool,
    /// Compute A12 effect sizes for two-sample comparisons.
    pub effect_size: bool,
    /// Skip fuzzers with missing runs instead of failing.
    pub allow_missing_runs: bool,
    /// Only evaluate these targets (all targets if empty).
    pub eval_targets: Vec<String>,
}

/// Configuration of the R statistics provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// The `Rscript` executable.
    pub rscript: String,
    /// R script defining `dec_twosamplecomparison` and `dec_anova`.
    pub script: PathBuf,
    /// Significance level.
    pub alpha: f64,
    /// Bootstrap iterations for two-sample and k-sample tests.
    pub bootstrap_iterations: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Colorize terminal output.
    pub colors: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tweak: "new_fuzzer".to_string(),
            baseline: None,
            expected_runs: 10,
            use_mean: false,
            effect_size: true,
            allow_missing_runs: false,
            eval_targets: Vec::new(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            rscript: "Rscript".to_string(),
            script: PathBuf::from("statistics.R"),
            alpha: 0.05,
            bootstrap_iterations: 999,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { colors: true }
    }
}

impl AnalysisConfig {
    /// Statistic used to rank fuzzers.
    pub fn primary_statistic(&self) -> Statistic {
        if self.use_mean {
            Statistic::Mean
        } else {
            Statistic::Median
        }
    }

    /// Whether `target` passes the target filter.
    pub fn is_selected(&self, target: &str) -> bool {
        self.eval_targets.is_empty() || self.eval_targets.iter().any(|t| t == target)
    }
}

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = ".fuzzstat.toml";

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from `path` if it exists, or use defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_or_default(path: &Path) -> Result<Config> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }
}
