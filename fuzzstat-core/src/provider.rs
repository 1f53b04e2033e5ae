//! The statistics provider seam.
//!
//! Significance tests are delegated to an external engine behind the
//! [`StatisticsProvider`] trait. Providers hand back raw numeric vectors; the
//! `from_raw` constructors here check that those vectors have the documented
//! shape before anything downstream trusts them.

use thiserror::Error;
use tracing::debug;

use crate::protocol::RawElement;
use crate::sample::Sample;
use crate::stats::validate::{contains_ties, validate_datasets};

/// Errors reported by a statistics provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with a result of unexpected shape.
    #[error("Unexpected provider response: {0}")]
    Response(String),

    /// An exact test was requested on data containing ties.
    #[error("'exact' Mann-Whitney-U test may not contain ties in data ({ties} ties)")]
    TiesInExactTest { ties: usize },

    /// The provider process could not be started.
    #[error("Failed to spawn provider: {0}")]
    Spawn(String),

    /// The provider reported an error while computing.
    #[error("Provider failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn decision(value: f64, what: &str) -> Result<bool, ProviderError> {
    if value == 1.0 {
        Ok(true)
    } else if value == 0.0 {
        Ok(false)
    } else {
        Err(ProviderError::Response(format!(
            "Unexpected {} decision: {}",
            what, value
        )))
    }
}

fn single(vector: &[f64], what: &str) -> Result<f64, ProviderError> {
    match vector {
        [value] => Ok(*value),
        _ => Err(ProviderError::Response(format!(
            "{}: expected len=1 found {}",
            what,
            vector.len()
        ))),
    }
}

/// Result of a bootstrap two-sample comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoSampleOutcome {
    pub statistic: f64,
    pub critical_value: f64,
    pub significant: bool,
}

impl TwoSampleOutcome {
    /// Parse `[test_statistic, critical_value, decision]`.
    pub fn from_raw(raw: &[f64]) -> Result<Self, ProviderError> {
        match raw {
            [statistic, critical_value, dec] => Ok(Self {
                statistic: *statistic,
                critical_value: *critical_value,
                significant: decision(*dec, "two-sample")?,
            }),
            _ => Err(ProviderError::Response(format!(
                "two-sample response vector must have 3 elements: {:?}",
                raw
            ))),
        }
    }
}

/// Result of a Mann-Whitney U test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MannWhitneyOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

impl MannWhitneyOutcome {
    /// Parse `[statistic, p_value]`.
    pub fn from_raw(raw: &[f64]) -> Result<Self, ProviderError> {
        match raw {
            [statistic, p_value] => Ok(Self {
                statistic: *statistic,
                p_value: *p_value,
            }),
            _ => Err(ProviderError::Response(format!(
                "Mann-Whitney-U response vector must have 2 elements: {:?}",
                raw
            ))),
        }
    }
}

/// Critical values of the k-sample test and both posthoc tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalValues {
    pub overall: f64,
    pub posthoc_median: f64,
    pub posthoc_mean: f64,
}

/// One pairwise posthoc result. Sample indices are 1-based and still raw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PosthocRow {
    pub significant: bool,
    pub statistic: f64,
    pub first_index: f64,
    pub second_index: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PosthocTable {
    pub rows: Vec<PosthocRow>,
}

impl PosthocTable {
    /// Parse four parallel columns: decision, statistic, index 1, index 2.
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self, ProviderError> {
        let [decisions, statistics, first, second] = columns else {
            return Err(ProviderError::Response(format!(
                "posthoc table must have 4 columns, found {}",
                columns.len()
            )));
        };
        let n = decisions.len();
        if statistics.len() != n || first.len() != n || second.len() != n {
            return Err(ProviderError::Response(
                "posthoc columns differ in length".to_string(),
            ));
        }

        let rows = (0..n)
            .map(|i| {
                Ok(PosthocRow {
                    significant: decision(decisions[i], "posthoc")?,
                    statistic: statistics[i],
                    first_index: first[i],
                    second_index: second[i],
                })
            })
            .collect::<Result<Vec<_>, ProviderError>>()?;
        Ok(Self { rows })
    }
}

/// Result of a k-sample (ANOVA-style) test with posthoc comparisons.
#[derive(Debug, Clone, PartialEq)]
pub struct KSampleOutcome {
    pub significant: bool,
    pub statistic: f64,
    pub critical_values: CriticalValues,
    pub posthoc_median: PosthocTable,
    pub posthoc_mean: PosthocTable,
}

impl KSampleOutcome {
    /// Parse `[decision[1], statistic[1], critvals[3], posthoc, posthoc_mean]`.
    pub fn from_raw(raw: &[RawElement]) -> Result<Self, ProviderError> {
        let [decision_vec, statistic_vec, critvals, posthoc, posthoc_mean] = raw else {
            return Err(ProviderError::Response(format!(
                "k-sample response must have 5 elements, found {}",
                raw.len()
            )));
        };

        let significant = decision(single(decision_vec.as_vector()?, "decision vector")?, "k-sample")?;
        let statistic = single(statistic_vec.as_vector()?, "test statistic vector")?;
        let critical_values = match critvals.as_vector()? {
            [overall, posthoc_median, posthoc_mean] => CriticalValues {
                overall: *overall,
                posthoc_median: *posthoc_median,
                posthoc_mean: *posthoc_mean,
            },
            other => {
                return Err(ProviderError::Response(format!(
                    "expected 3 critical values, found {}",
                    other.len()
                )))
            }
        };

        Ok(Self {
            significant,
            statistic,
            critical_values,
            posthoc_median: PosthocTable::from_columns(posthoc.as_columns()?)?,
            posthoc_mean: PosthocTable::from_columns(posthoc_mean.as_columns()?)?,
        })
    }
}

/// An external engine for significance tests.
///
/// Implementations block until the result is available and never retry.
pub trait StatisticsProvider {
    /// Bootstrap two-sample comparison of `focal` against `other`.
    fn two_sample_test(
        &self,
        focal: &Sample,
        other: &Sample,
        alpha: f64,
        iterations: u32,
    ) -> Result<TwoSampleOutcome, ProviderError>;

    /// K-sample test over named samples, with posthoc tables whose indices
    /// refer to the submission order of `samples` (1-based).
    fn k_sample_test(
        &self,
        samples: &[(&str, &Sample)],
        alpha: f64,
        iterations: u32,
    ) -> Result<KSampleOutcome, ProviderError>;

    /// Two-sided Mann-Whitney U test; `exact` requests exact p-values.
    fn mann_whitney_u(
        &self,
        baseline: &Sample,
        tweak: &Sample,
        exact: bool,
    ) -> Result<MannWhitneyOutcome, ProviderError>;
}

/// How a Mann-Whitney U test treats ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieMode {
    /// Require tie-free data and request exact p-values.
    Exact,
    /// Warn about ties and request the approximate test.
    #[default]
    Approximate,
}

/// Run a Mann-Whitney U test after checking the data against `mode`.
///
/// # Errors
///
/// Returns [`ProviderError::TiesInExactTest`] if `mode` is exact and the
/// combined data contains ties, and any error of the provider.
pub fn mann_whitney_u<P: StatisticsProvider + ?Sized>(
    provider: &P,
    baseline: &Sample,
    tweak: &Sample,
    mode: TieMode,
) -> Result<MannWhitneyOutcome, ProviderError> {
    let combined: Vec<f64> = baseline
        .values()
        .iter()
        .chain(tweak.values())
        .copied()
        .collect();
    match mode {
        TieMode::Exact => {
            if contains_ties(&combined) {
                return Err(ProviderError::TiesInExactTest {
                    ties: crate::stats::validate::num_ties(&combined),
                });
            }
            provider.mann_whitney_u(baseline, tweak, true)
        }
        TieMode::Approximate => {
            if !validate_datasets(baseline.values(), tweak.values(), "baseline", "tweak") {
                debug!("Ties present, using approximate Mann-Whitney-U test");
            }
            provider.mann_whitney_u(baseline, tweak, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(rows: &[[f64; 4]]) -> RawElement {
        RawElement::Columns((0..4).map(|c| rows.iter().map(|r| r[c]).collect()).collect())
    }

    #[test]
    fn test_two_sample_from_raw() {
        let outcome = TwoSampleOutcome::from_raw(&[2.5, 1.9, 1.0]).unwrap();
        assert_eq!(outcome.statistic, 2.5);
        assert_eq!(outcome.critical_value, 1.9);
        assert!(outcome.significant);
    }

    #[test]
    fn test_two_sample_wrong_arity() {
        assert!(matches!(
            TwoSampleOutcome::from_raw(&[2.5, 1.9]),
            Err(ProviderError::Response(_))
        ));
        assert!(matches!(
            TwoSampleOutcome::from_raw(&[2.5, 1.9, 0.5]),
            Err(ProviderError::Response(_))
        ));
    }

    #[test]
    fn test_k_sample_from_raw() {
        let raw = vec![
            RawElement::Vector(vec![1.0]),
            RawElement::Vector(vec![12.3]),
            RawElement::Vector(vec![3.1, 2.2, 2.4]),
            columns(&[[1.0, 4.5, 1.0, 2.0], [0.0, 0.3, 1.0, 3.0]]),
            columns(&[[0.0, 0.7, 2.0, 3.0]]),
        ];

        let outcome = KSampleOutcome::from_raw(&raw).unwrap();

        assert!(outcome.significant);
        assert_eq!(outcome.statistic, 12.3);
        assert_eq!(outcome.critical_values.posthoc_mean, 2.4);
        assert_eq!(outcome.posthoc_median.rows.len(), 2);
        assert!(outcome.posthoc_median.rows[0].significant);
        assert_eq!(outcome.posthoc_median.rows[1].second_index, 3.0);
        assert!(!outcome.posthoc_mean.rows[0].significant);
    }

    #[test]
    fn test_k_sample_wrong_shapes() {
        let good = || {
            vec![
                RawElement::Vector(vec![0.0]),
                RawElement::Vector(vec![1.0]),
                RawElement::Vector(vec![3.1, 2.2, 2.4]),
                columns(&[]),
                columns(&[]),
            ]
        };
        assert!(KSampleOutcome::from_raw(&good()).is_ok());

        let mut short = good();
        short.pop();
        assert!(KSampleOutcome::from_raw(&short).is_err());

        let mut two_decisions = good();
        two_decisions[0] = RawElement::Vector(vec![0.0, 1.0]);
        assert!(KSampleOutcome::from_raw(&two_decisions).is_err());

        let mut two_critvals = good();
        two_critvals[2] = RawElement::Vector(vec![3.1, 2.2]);
        assert!(KSampleOutcome::from_raw(&two_critvals).is_err());

        let mut bare_posthoc = good();
        bare_posthoc[4] = RawElement::Vector(Vec::new());
        assert!(matches!(
            KSampleOutcome::from_raw(&bare_posthoc),
            Err(ProviderError::Response(_))
        ));

        let mut no_columns = good();
        no_columns[3] = RawElement::Columns(Vec::new());
        assert!(matches!(
            KSampleOutcome::from_raw(&no_columns),
            Err(ProviderError::Response(_))
        ));

        let mut ragged = good();
        ragged[3] = RawElement::Columns(vec![vec![1.0], vec![], vec![1.0], vec![2.0]]);
        assert!(KSampleOutcome::from_raw(&ragged).is_err());
    }
}
