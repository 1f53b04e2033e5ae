//! Best-competitor selection.
//!
//! Two searches with different tie semantics exist on purpose. [`find_best`]
//! reports every fuzzer sharing the top score, while [`pick_one_best`] always
//! settles on a single winner using a secondary statistic.

use crate::sample::{NamedSampleSet, Sample};

use super::Statistic;

/// Name of the all-zero placeholder that seeds [`pick_one_best`].
pub const PLACEHOLDER_NAME: &str = "NONE";

/// The strongest fuzzer other than the focal one.
#[derive(Debug, Clone, PartialEq)]
pub struct BestCompetitor {
    pub name: String,
    pub sample: Sample,
}

impl BestCompetitor {
    /// True if no real candidate beat the all-zero placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.name == PLACEHOLDER_NAME
    }
}

/// Names of all non-focal fuzzers that reach the maximum of `statistic`.
///
/// Ties are preserved in insertion order. Returns an empty list if the set
/// holds no fuzzer besides `focal`.
pub fn find_best(focal: &str, samples: &NamedSampleSet, statistic: Statistic) -> Vec<String> {
    let ratings: Vec<(&str, f64)> = samples
        .iter()
        .filter(|(name, _)| *name != focal)
        .map(|(name, sample)| (name, statistic.compute(sample)))
        .collect();

    let max = ratings
        .iter()
        .map(|&(_, v)| v)
        .fold(f64::NEG_INFINITY, f64::max);

    ratings
        .into_iter()
        .filter(|&(_, v)| v == max)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Pick a single best competitor to `focal`.
///
/// Candidates are visited in insertion order. A candidate replaces the running
/// best if its `primary` statistic is higher, or equal with a higher
/// `secondary` statistic. Full ties keep the earlier candidate. The running
/// best starts as a [`PLACEHOLDER_NAME`] sample of `expected_runs` zeros.
pub fn pick_one_best(
    focal: &str,
    samples: &NamedSampleSet,
    primary: Statistic,
    secondary: Statistic,
    expected_runs: usize,
) -> BestCompetitor {
    let mut best = BestCompetitor {
        name: PLACEHOLDER_NAME.to_string(),
        sample: Sample::zeros(expected_runs),
    };

    for (name, sample) in samples.iter() {
        if name == focal {
            continue;
        }
        let candidate = primary.compute(sample);
        let current = primary.compute(&best.sample);
        let replace = candidate > current
            || (candidate == current && secondary.compute(sample) > secondary.compute(&best.sample));
        if replace {
            best = BestCompetitor {
                name: name.to_string(),
                sample: sample.clone(),
            };
        }
    }

    best
}
