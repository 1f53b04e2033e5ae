//! fuzzstat: Effect sizes and significance tests for fuzzer coverage evaluations
//!
//! This library loads per-run coverage results of several fuzzers on several
//! targets and compares the fuzzer under evaluation against its competitors
//! through an external R statistics script.

pub mod cli;
pub mod config;
pub mod orchestrator;
pub mod provider;

// Re-export core types for convenience
pub use fuzzstat_core::protocol;
pub use fuzzstat_core::report::{
    ReportError, Reporter, RunReport, TargetOutcome, TerminalReporter,
};
pub use fuzzstat_core::{Sample, Statistic, StatisticsProvider, TargetCollection, TieMode};

// Re-export main types from this crate
pub use cli::{Cli, Command};
pub use config::Config;
pub use orchestrator::{Mode, MwuSelection, Orchestrator, OrchestratorError};
pub use provider::RscriptProvider;
