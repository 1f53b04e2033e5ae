use statrs::statistics::{Data, Median, Statistics};
use thiserror::Error;

use crate::provider::{CriticalValues, TwoSampleOutcome};
use crate::stats::{EffectSizeError, Statistic};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    EffectSize(#[from] EffectSizeError),
}

/// Mann-Whitney U comparison of one tweak against one baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct MwuComparison {
    pub tweak: String,
    pub baseline: String,
    pub p_value: f64,
    pub effect_size: f64,
}

/// Bootstrap two-sample comparison of the focal fuzzer against another one.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoSampleComparison {
    pub tweak: String,
    pub other: String,
    pub outcome: TwoSampleOutcome,
    /// A12 of the tweak over the other fuzzer, unless disabled.
    pub effect_size: Option<f64>,
}

/// Two-sample comparison against the single best competitor.
#[derive(Debug, Clone, PartialEq)]
pub struct BestCompetitorComparison {
    pub competitor: String,
    /// Statistic the competitor was ranked by.
    pub statistic: Statistic,
    pub competitor_value: f64,
    pub comparison: TwoSampleComparison,
}

/// One posthoc pair with sample indices resolved to fuzzer names.
#[derive(Debug, Clone, PartialEq)]
pub struct PosthocComparison {
    pub first: String,
    pub second: String,
    pub significant: bool,
    pub statistic: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KSampleComparison {
    /// Fuzzers submitted to the test, in submission order.
    pub fuzzers: Vec<String>,
    pub significant: bool,
    pub statistic: f64,
    pub critical_values: CriticalValues,
    pub posthoc_median: Vec<PosthocComparison>,
    pub posthoc_mean: Vec<PosthocComparison>,
}

/// Coverage improvement of the focal fuzzer on one target.
#[derive(Debug, Clone, PartialEq)]
pub struct Improvement {
    pub statistic: Statistic,
    pub tweak: String,
    pub tweak_value: f64,
    pub competitor: String,
    pub competitor_value: f64,
    /// Percentage difference, rounded to two decimals.
    pub percentage: f64,
    /// Ratio of tweak to competitor.
    pub factor: f64,
}

impl Improvement {
    pub fn difference(&self) -> f64 {
        self.tweak_value - self.competitor_value
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TargetOutcome {
    /// Every ordered pair of fuzzers.
    Pairwise(Vec<MwuComparison>),
    /// Every fuzzer against the configured baseline.
    AgainstBaseline(Vec<MwuComparison>),
    /// The focal fuzzer against all equally-best competitors.
    BestCompetitors(Vec<MwuComparison>),
    BestCompetitor(BestCompetitorComparison),
    TwoSample(TwoSampleComparison),
    KSample(KSampleComparison),
    Improvement(Improvement),
    /// The target was skipped; the reason has already been logged.
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetReport {
    pub target: String,
    pub outcome: TargetOutcome,
}

/// A row of the LaTeX results table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub target: String,
    pub competitor: String,
    pub effect_size: f64,
    pub significant: bool,
}

/// Aggregate of per-target improvement values.
#[derive(Debug, Clone, PartialEq)]
pub struct ImprovementSummary {
    pub values: Vec<f64>,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl ImprovementSummary {
    /// Summarize `values`; `None` if there are none.
    pub fn new(values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self {
            mean: Statistics::mean(&values),
            median: Data::new(values.clone()).median(),
            min: Statistics::min(&values),
            max: Statistics::max(&values),
            values,
        })
    }
}

/// Everything one run produced, in target order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub alpha: f64,
    pub targets: Vec<TargetReport>,
    pub factors: Option<ImprovementSummary>,
    pub percentages: Option<ImprovementSummary>,
    /// LaTeX rows, present only when a table was requested.
    pub table: Option<Vec<TableRow>>,
}

impl RunReport {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            ..Self::default()
        }
    }

    pub fn push(&mut self, target: impl Into<String>, outcome: TargetOutcome) {
        self.targets.push(TargetReport {
            target: target.into(),
            outcome,
        });
    }

    /// Outcome recorded for `target`, if any.
    pub fn outcome(&self, target: &str) -> Option<&TargetOutcome> {
        self.targets
            .iter()
            .find(|t| t.target == target)
            .map(|t| &t.outcome)
    }
}

pub trait Reporter {
    fn report(&self, run: &RunReport) -> Result<(), ReportError>;
}

mod latex;
mod terminal;
pub use latex::{escape_latex, LatexTable};
pub use terminal::TerminalReporter;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_improvement_summary() {
        let summary = ImprovementSummary::new(vec![1.5, 0.5, 1.0, 2.0]).unwrap();
        assert_eq!(summary.mean, 1.25);
        assert_eq!(summary.median, 1.25);
        assert_eq!(summary.min, 0.5);
        assert_eq!(summary.max, 2.0);
        assert!(ImprovementSummary::new(Vec::new()).is_none());
    }
}
