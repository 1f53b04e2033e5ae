//! Core types and statistics for fuzzstat.
//!
//! This crate holds the coverage data model, the A12 effect size, tie
//! diagnostics, best-competitor selection, the statistics provider seam and
//! the report formatters shared by the fuzzstat CLI.

pub mod protocol;
pub mod provider;
pub mod report;
pub mod sample;
pub mod stats;

// Re-export main types for convenience
pub use protocol::{ProviderRequest, ProviderResponse, RawElement};
pub use provider::{
    mann_whitney_u, CriticalValues, KSampleOutcome, MannWhitneyOutcome, PosthocRow, PosthocTable,
    ProviderError, StatisticsProvider, TieMode, TwoSampleOutcome,
};
pub use report::{
    BestCompetitorComparison, Improvement, ImprovementSummary, KSampleComparison, LatexTable,
    MwuComparison, PosthocComparison, ReportError, Reporter, RunReport, TableRow, TargetOutcome,
    TargetReport, TerminalReporter, TwoSampleComparison,
};
pub use sample::{NamedSampleSet, OrderedMap, Sample, SampleError, TargetCollection};
pub use stats::{
    a12, categorize, find_best, format_field, pick_one_best, BestCompetitor, Category,
    EffectSizeError, Statistic,
};
