//! Command-line interface for fuzzstat.

use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::orchestrator::{Mode, MwuSelection};
use clap::{Parser, Subcommand};
use fuzzstat_core::TieMode;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fuzzstat")]
#[command(about = "Effect sizes and significance tests for fuzzer coverage evaluations")]
#[command(version)]
pub struct Cli {
    /// Subcommand/mode to run
    #[command(subcommand)]
    pub command: Command,

    /// JSON file mapping target -> fuzzer -> final coverage of each run
    #[arg(long)]
    pub data: PathBuf,

    /// Baseline fuzzer
    #[arg(long)]
    pub baseline: Option<String>,

    /// New fuzzer ("tweak" of the baseline)
    #[arg(long)]
    pub tweak: Option<String>,

    /// Number of runs we expect
    #[arg(long)]
    pub expected_runs: Option<usize>,

    /// Use mean instead of median
    #[arg(long)]
    pub use_mean: bool,

    /// Do not calculate effect size
    #[arg(long)]
    pub no_effect_size: bool,

    /// Allow missing runs (fuzzers with missing runs are ignored)
    #[arg(long)]
    pub allow_missing_runs: bool,

    /// Only evaluate the specified targets
    #[arg(long, num_args = 1..)]
    pub eval_targets: Vec<String>,

    /// Path to config file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Debug output
    #[arg(long)]
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Generate LaTeX table body for paper
    GenTable,
    /// Two-way test against best competitor
    BestCompetitor,
    /// Calculate average improvement and improvement per target
    Improvement,
    /// Traditional MWU instead of bootstrap-based test
    #[command(alias = "pairwise")]
    Traditional {
        /// Compare only against the best competitor(s)
        #[arg(long, conflicts_with = "against_baseline")]
        only_best_competitor: bool,
        /// Compare every fuzzer against the baseline
        #[arg(long)]
        against_baseline: bool,
        /// Require tie-free data and compute exact p-values
        #[arg(long)]
        exact: bool,
    },
    /// Compare tweak (new fuzzer) to baseline
    Baseline,
    /// Run a full ANOVA+posthoc of all data
    FullComparison,
}

impl Cli {
    /// The comparison mode selected by the subcommand.
    pub fn mode(&self) -> Mode {
        match self.command {
            Command::GenTable => Mode::GenTable,
            Command::BestCompetitor => Mode::BestCompetitor,
            Command::Improvement => Mode::Improvement,
            Command::Traditional {
                only_best_competitor,
                against_baseline,
                exact,
            } => {
                let selection = if only_best_competitor {
                    MwuSelection::BestCompetitors
                } else if against_baseline {
                    MwuSelection::AgainstBaseline
                } else {
                    MwuSelection::AllPairs
                };
                let ties = if exact {
                    TieMode::Exact
                } else {
                    TieMode::Approximate
                };
                Mode::Traditional { selection, ties }
            }
            Command::Baseline => Mode::Baseline,
            Command::FullComparison => Mode::FullComparison,
        }
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI arguments take precedence over config file values.
    /// Flags only ever switch a setting on; unset options leave the config alone.
    pub fn apply_to_config(&self, config: &mut Config) {
        if let Some(baseline) = &self.baseline {
            config.analysis.baseline = Some(baseline.clone());
        }
        if let Some(tweak) = &self.tweak {
            config.analysis.tweak = tweak.clone();
        }
        if let Some(expected_runs) = self.expected_runs {
            config.analysis.expected_runs = expected_runs;
        }
        if self.use_mean {
            config.analysis.use_mean = true;
        }
        if self.no_effect_size {
            config.analysis.effect_size = false;
        }
        if self.allow_missing_runs {
            config.analysis.allow_missing_runs = true;
        }
        if !self.eval_targets.is_empty() {
            config.analysis.eval_targets = self.eval_targets.clone();
        }
        if self.no_color {
            config.report.colors = false;
        }
    }
}
