//! Comparison orchestrator.
//!
//! The orchestrator walks every target of a [`TargetCollection`], runs the
//! requested comparison against the injected [`StatisticsProvider`], and
//! collects typed outcomes into a [`RunReport`]. Incomplete targets are
//! skipped with a warning; malformed data or provider answers abort the run.

use thiserror::Error;
use tracing::{debug, info, warn};

use fuzzstat_core::provider::{mann_whitney_u, PosthocTable, ProviderError, TieMode};
use fuzzstat_core::report::{
    BestCompetitorComparison, Improvement, ImprovementSummary, KSampleComparison, MwuComparison,
    PosthocComparison, RunReport, TableRow, TargetOutcome, TwoSampleComparison,
};
use fuzzstat_core::stats::validate::validate_for_exact_test;
use fuzzstat_core::stats::{a12, find_best, pick_one_best, EffectSizeError};
use fuzzstat_core::{NamedSampleSet, Sample, StatisticsProvider, TargetCollection};

use crate::config::{AnalysisConfig, Config};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    EffectSize(#[from] EffectSizeError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A fuzzer does not have the expected number of runs.
    #[error("{target}: {fuzzer}: Expected {expected}, found {found}")]
    DataShape {
        target: String,
        fuzzer: String,
        expected: usize,
        found: usize,
    },

    /// A posthoc sample index is not a whole number naming a submitted sample.
    #[error("Posthoc sample index {index} is not valid for {samples} samples")]
    IndexConsistency { index: f64, samples: usize },
}

/// Which pairs a Mann-Whitney U run compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MwuSelection {
    /// Every ordered pair of distinct fuzzers.
    AllPairs,
    /// The focal fuzzer against every equally-best competitor.
    BestCompetitors,
    /// Every fuzzer against the configured baseline.
    AgainstBaseline,
}

/// Comparison mode for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Mann-Whitney U tests with A12 effect sizes.
    Traditional { selection: MwuSelection, ties: TieMode },
    /// Bootstrap test against the single best competitor.
    BestCompetitor,
    /// Bootstrap test of the focal fuzzer against the baseline.
    Baseline,
    /// K-sample test with posthoc comparisons over all fuzzers.
    FullComparison,
    /// Coverage improvement over the baseline or best competitor.
    Improvement,
    /// Best-competitor test per target, rendered as LaTeX rows.
    GenTable,
}

/// Runs comparisons over a target collection.
pub struct Orchestrator<'a, P: StatisticsProvider + ?Sized> {
    provider: &'a P,
    analysis: AnalysisConfig,
    alpha: f64,
    iterations: u32,
}

impl<'a, P: StatisticsProvider + ?Sized> Orchestrator<'a, P> {
    pub fn new(provider: &'a P, config: &Config) -> Self {
        Self {
            provider,
            analysis: config.analysis.clone(),
            alpha: config.provider.alpha,
            iterations: config.provider.bootstrap_iterations,
        }
    }

    fn tweak(&self) -> &str {
        &self.analysis.tweak
    }

    /// Run `mode` over every selected target.
    ///
    /// # Errors
    ///
    /// Returns the first error that is fatal for a comparison; soft skips are
    /// recorded as [`TargetOutcome::Skipped`].
    pub fn run(&self, data: &TargetCollection, mode: Mode) -> Result<RunReport, OrchestratorError> {
        let mut report = RunReport::new(self.alpha);
        let mut factors = Vec::new();
        let mut percentages = Vec::new();
        let mut table = Vec::new();

        for (target, samples) in data.iter() {
            if !self.analysis.is_selected(target) {
                debug!("{}: not in target filter", target);
                continue;
            }
            if samples.len() < 2 {
                let outcome = skip(
                    target,
                    format!(
                        "Skipping this target as we only have data for {} fuzzer(s)",
                        samples.len()
                    ),
                );
                report.push(target, outcome);
                continue;
            }

            info!("Analyzing {}", target);
            self.warn_run_counts(target, samples);

            let outcome = match mode {
                Mode::Traditional { selection, ties } => {
                    self.traditional(target, samples, selection, ties)?
                }
                Mode::BestCompetitor => self.best_competitor(target, samples, false)?,
                Mode::Baseline => self.baseline(target, samples)?,
                Mode::FullComparison => self.full_comparison(target, samples)?,
                Mode::Improvement => {
                    let outcome = self.improvement(target, samples)?;
                    if let TargetOutcome::Improvement(imp) = &outcome {
                        factors.push(imp.factor);
                        percentages.push(imp.percentage);
                    }
                    outcome
                }
                Mode::GenTable => {
                    let outcome = self.best_competitor(target, samples, true)?;
                    if let TargetOutcome::BestCompetitor(best) = &outcome {
                        if let Some(row) = self.table_row(target, samples, best)? {
                            table.push(row);
                        }
                    }
                    outcome
                }
            };
            report.push(target, outcome);
        }

        report.factors = ImprovementSummary::new(factors);
        report.percentages = ImprovementSummary::new(percentages);
        if mode == Mode::GenTable {
            report.table = Some(table);
        }
        Ok(report)
    }

    fn warn_run_counts(&self, target: &str, samples: &NamedSampleSet) {
        for (fuzzer, sample) in samples.iter() {
            if sample.len() != self.analysis.expected_runs {
                warn!(
                    "{}: {} only has {} runs (expected {})",
                    target,
                    fuzzer,
                    sample.len(),
                    self.analysis.expected_runs
                );
            }
        }
    }

    /// Look up the focal fuzzer, or explain why the target must be skipped.
    fn focal<'s>(&self, target: &str, samples: &'s NamedSampleSet) -> Result<&'s Sample, TargetOutcome> {
        samples.get(self.tweak()).ok_or_else(|| {
            skip(
                target,
                format!("Primary fuzzer {} not found in data", self.tweak()),
            )
        })
    }

    fn mwu_comparison(
        &self,
        tweak: &str,
        tweak_sample: &Sample,
        baseline: &str,
        baseline_sample: &Sample,
        ties: TieMode,
    ) -> Result<MwuComparison, OrchestratorError> {
        let effect_size = a12(baseline_sample, tweak_sample)?;
        let outcome = mann_whitney_u(self.provider, baseline_sample, tweak_sample, ties)?;
        Ok(MwuComparison {
            tweak: tweak.to_string(),
            baseline: baseline.to_string(),
            p_value: outcome.p_value,
            effect_size,
        })
    }

    fn traditional(
        &self,
        target: &str,
        samples: &NamedSampleSet,
        selection: MwuSelection,
        ties: TieMode,
    ) -> Result<TargetOutcome, OrchestratorError> {
        match selection {
            MwuSelection::AllPairs => {
                let mut comparisons = Vec::new();
                for (tweak, tweak_sample) in samples.iter() {
                    for (baseline, baseline_sample) in samples.iter() {
                        if tweak == baseline {
                            continue;
                        }
                        comparisons.push(self.mwu_comparison(
                            tweak,
                            tweak_sample,
                            baseline,
                            baseline_sample,
                            ties,
                        )?);
                    }
                }
                Ok(TargetOutcome::Pairwise(comparisons))
            }
            MwuSelection::BestCompetitors => {
                let tweak_sample = match self.focal(target, samples) {
                    Ok(sample) => sample,
                    Err(skipped) => return Ok(skipped),
                };
                let best = find_best(self.tweak(), samples, self.analysis.primary_statistic());
                if best.len() != 1 {
                    info!("Found {} best competitors: {:?}", best.len(), best);
                }
                let mut comparisons = Vec::new();
                for competitor in &best {
                    if let Some(competitor_sample) = samples.get(competitor) {
                        comparisons.push(self.mwu_comparison(
                            self.tweak(),
                            tweak_sample,
                            competitor,
                            competitor_sample,
                            ties,
                        )?);
                    }
                }
                Ok(TargetOutcome::BestCompetitors(comparisons))
            }
            MwuSelection::AgainstBaseline => {
                let Some((baseline, baseline_sample)) = self
                    .analysis
                    .baseline
                    .as_deref()
                    .and_then(|b| samples.get(b).map(|s| (b, s)))
                else {
                    return Ok(skip(target, "Baseline has no data for this target".to_string()));
                };
                let mut comparisons = Vec::new();
                for (fuzzer, sample) in samples.iter() {
                    if fuzzer == baseline {
                        continue;
                    }
                    comparisons.push(self.mwu_comparison(
                        fuzzer,
                        sample,
                        baseline,
                        baseline_sample,
                        ties,
                    )?);
                }
                Ok(TargetOutcome::AgainstBaseline(comparisons))
            }
        }
    }

    /// Bootstrap two-sample comparison of `tweak` against `other`.
    fn two_sample(
        &self,
        tweak: &str,
        tweak_sample: &Sample,
        other: &str,
        other_sample: &Sample,
    ) -> Result<TwoSampleComparison, OrchestratorError> {
        info!("Two sample comparison: {} vs {}", tweak, other);
        debug!("{:16} -> {:?}", tweak, tweak_sample.sorted());
        debug!("{:16} -> {:?}", other, other_sample.sorted());

        let outcome =
            self.provider
                .two_sample_test(tweak_sample, other_sample, self.alpha, self.iterations)?;
        let effect_size = if self.analysis.effect_size {
            Some(a12(other_sample, tweak_sample)?)
        } else {
            None
        };

        Ok(TwoSampleComparison {
            tweak: tweak.to_string(),
            other: other.to_string(),
            outcome,
            effect_size,
        })
    }

    fn baseline(&self, target: &str, samples: &NamedSampleSet) -> Result<TargetOutcome, OrchestratorError> {
        let tweak_sample = match self.focal(target, samples) {
            Ok(sample) => sample,
            Err(skipped) => return Ok(skipped),
        };

        let (other, other_sample) = match &self.analysis.baseline {
            Some(baseline) => match samples.get(baseline) {
                Some(sample) => (baseline.as_str(), sample),
                None => {
                    return Ok(skip(
                        target,
                        format!("Baseline {} has no data for target {}", baseline, target),
                    ))
                }
            },
            None => {
                let others: Vec<(&str, &Sample)> = samples
                    .iter()
                    .filter(|(name, _)| *name != self.tweak())
                    .collect();
                match others.as_slice() {
                    [other] => *other,
                    _ => {
                        return Ok(skip(
                            target,
                            format!(
                                "No baseline specified and {} other fuzzers to choose from",
                                others.len()
                            ),
                        ))
                    }
                }
            }
        };

        let comparison = self.two_sample(self.tweak(), tweak_sample, other, other_sample)?;
        Ok(TargetOutcome::TwoSample(comparison))
    }

    /// With `equal_runs`, a competitor with a different number of runs than
    /// the focal fuzzer skips the target.
    fn best_competitor(
        &self,
        target: &str,
        samples: &NamedSampleSet,
        equal_runs: bool,
    ) -> Result<TargetOutcome, OrchestratorError> {
        let tweak_sample = match self.focal(target, samples) {
            Ok(sample) => sample,
            Err(skipped) => return Ok(skipped),
        };

        let primary = self.analysis.primary_statistic();
        let best = pick_one_best(
            self.tweak(),
            samples,
            primary,
            primary.other(),
            self.analysis.expected_runs,
        );
        if best.is_placeholder() {
            return Ok(skip(target, "No competitor with positive coverage".to_string()));
        }
        if equal_runs && best.sample.len() != tweak_sample.len() {
            return Ok(skip(
                target,
                format!(
                    "num_runs[best_comp]={} <-> num_runs[tweak]={}",
                    best.sample.len(),
                    tweak_sample.len()
                ),
            ));
        }
        let competitor_value = primary.compute(&best.sample);
        info!("Best competitor: {} with {} {}", best.name, primary, competitor_value);

        let comparison = self.two_sample(self.tweak(), tweak_sample, &best.name, &best.sample)?;
        Ok(TargetOutcome::BestCompetitor(BestCompetitorComparison {
            competitor: best.name,
            statistic: primary,
            competitor_value,
            comparison,
        }))
    }

    fn table_row(
        &self,
        target: &str,
        samples: &NamedSampleSet,
        best: &BestCompetitorComparison,
    ) -> Result<Option<TableRow>, OrchestratorError> {
        let effect_size = match best.comparison.effect_size {
            Some(effect_size) => effect_size,
            None => {
                let (Some(tweak_sample), Some(competitor_sample)) =
                    (samples.get(self.tweak()), samples.get(&best.competitor))
                else {
                    return Ok(None);
                };
                a12(competitor_sample, tweak_sample)?
            }
        };
        Ok(Some(TableRow {
            target: target.to_string(),
            competitor: best.competitor.clone(),
            effect_size,
            significant: best.comparison.outcome.significant,
        }))
    }

    /// Two-sample fallback for exactly two groups.
    fn pair(&self, target: &str, pair: &[(&str, &Sample)]) -> Result<TargetOutcome, OrchestratorError> {
        let Some(&(_, tweak_sample)) = pair.iter().find(|(name, _)| *name == self.tweak()) else {
            return Ok(skip(
                target,
                format!("Primary fuzzer {} not found in data", self.tweak()),
            ));
        };
        let Some(&(other, other_sample)) = pair.iter().find(|(name, _)| *name != self.tweak()) else {
            return Ok(skip(target, "No second fuzzer to compare against".to_string()));
        };
        let comparison = self.two_sample(self.tweak(), tweak_sample, other, other_sample)?;
        Ok(TargetOutcome::TwoSample(comparison))
    }

    fn full_comparison(
        &self,
        target: &str,
        samples: &NamedSampleSet,
    ) -> Result<TargetOutcome, OrchestratorError> {
        info!("Found {} fuzzers", samples.len());
        let all: Vec<(&str, &Sample)> = samples.iter().collect();
        if all.len() == 2 {
            return self.pair(target, &all);
        }

        let expected = self.analysis.expected_runs;
        let mut groups: Vec<(&str, &Sample)> = Vec::new();
        for (fuzzer, sample) in all {
            debug!("{:16} -> {}", fuzzer, sample);
            validate_for_exact_test(sample.values(), fuzzer);
            if self.analysis.allow_missing_runs {
                if sample.len() < expected {
                    warn!("{}: Expected {}, found {}", fuzzer, expected, sample.len());
                    continue;
                }
            } else if sample.len() != expected {
                return Err(OrchestratorError::DataShape {
                    target: target.to_string(),
                    fuzzer: fuzzer.to_string(),
                    expected,
                    found: sample.len(),
                });
            }
            if sample.distinct_count() < 3 {
                warn!("{}: data is essentially constant. Skipping this fuzzer", fuzzer);
                continue;
            }
            groups.push((fuzzer, sample));
        }

        match groups.len() {
            0 | 1 => Ok(skip(
                target,
                "Not enough groups to run a test. Skipping this target".to_string(),
            )),
            2 => self.pair(target, &groups),
            _ => {
                info!("Running k-sample test over {} fuzzers", groups.len());
                let outcome = self
                    .provider
                    .k_sample_test(&groups, self.alpha, self.iterations)?;
                let fuzzers: Vec<String> = groups.iter().map(|(name, _)| name.to_string()).collect();
                Ok(TargetOutcome::KSample(KSampleComparison {
                    posthoc_median: resolve_posthoc(&outcome.posthoc_median, &fuzzers)?,
                    posthoc_mean: resolve_posthoc(&outcome.posthoc_mean, &fuzzers)?,
                    fuzzers,
                    significant: outcome.significant,
                    statistic: outcome.statistic,
                    critical_values: outcome.critical_values,
                }))
            }
        }
    }

    fn improvement(&self, target: &str, samples: &NamedSampleSet) -> Result<TargetOutcome, OrchestratorError> {
        let tweak_sample = match self.focal(target, samples) {
            Ok(sample) => sample,
            Err(skipped) => return Ok(skipped),
        };
        let primary = self.analysis.primary_statistic();

        let (competitor, competitor_sample) = match &self.analysis.baseline {
            Some(baseline) => match samples.get(baseline) {
                Some(sample) => (baseline.clone(), sample.clone()),
                None => {
                    return Ok(skip(
                        target,
                        format!("Baseline fuzzer {} not found in data", baseline),
                    ))
                }
            },
            None => {
                info!("No baseline specified, using best competitor");
                let best = pick_one_best(
                    self.tweak(),
                    samples,
                    primary,
                    primary.other(),
                    self.analysis.expected_runs,
                );
                if best.is_placeholder() {
                    return Ok(skip(target, "No competitor with positive coverage".to_string()));
                }
                (best.name, best.sample)
            }
        };

        let competitor_value = primary.compute(&competitor_sample);
        debug!("Best competitor: {} with {} {}", competitor, primary, competitor_value);
        if competitor_value == 0.0 {
            return Ok(skip(
                target,
                format!("{} of {} is zero, cannot compute improvement", primary, competitor),
            ));
        }

        let tweak_value = primary.compute(tweak_sample);
        Ok(TargetOutcome::Improvement(Improvement {
            statistic: primary,
            tweak: self.tweak().to_string(),
            tweak_value,
            competitor,
            competitor_value,
            percentage: round2(100.0 * (tweak_value - competitor_value) / competitor_value),
            factor: tweak_value / competitor_value,
        }))
    }
}

/// Log a soft skip and record it.
fn skip(target: &str, reason: String) -> TargetOutcome {
    warn!("{}: {}", target, reason);
    TargetOutcome::Skipped(reason)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Convert a 1-based posthoc sample index into a fuzzer name.
fn sample_name(index: f64, fuzzers: &[String]) -> Result<String, OrchestratorError> {
    let invalid = || OrchestratorError::IndexConsistency {
        index,
        samples: fuzzers.len(),
    };
    if index.fract() != 0.0 || index < 1.0 {
        return Err(invalid());
    }
    fuzzers
        .get(index as usize - 1)
        .cloned()
        .ok_or_else(invalid)
}

fn resolve_posthoc(
    table: &PosthocTable,
    fuzzers: &[String],
) -> Result<Vec<PosthocComparison>, OrchestratorError> {
    table
        .rows
        .iter()
        .map(|row| {
            Ok(PosthocComparison {
                first: sample_name(row.first_index, fuzzers)?,
                second: sample_name(row.second_index, fuzzers)?,
                significant: row.significant,
                statistic: row.statistic,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    }

    #[test]
    fn test_sample_name_is_one_based() {
        assert_eq!(sample_name(1.0, &names()).unwrap(), "a");
        assert_eq!(sample_name(3.0, &names()).unwrap(), "c");
    }

    #[test]
    fn test_sample_name_rejects_fractional_and_out_of_range() {
        for index in [1.5, 0.0, 4.0, -1.0, f64::NAN] {
            assert!(matches!(
                sample_name(index, &names()),
                Err(OrchestratorError::IndexConsistency { .. })
            ));
        }
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(11.1111), 11.11);
        assert_eq!(round2(-3.456), -3.46);
    }
}
