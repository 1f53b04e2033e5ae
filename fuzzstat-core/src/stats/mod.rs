use std::fmt;

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};

use crate::sample::Sample;

/// Central-tendency statistic used to rank fuzzers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    Median,
    Mean,
}

impl Statistic {
    /// Evaluate this statistic over a sample.
    pub fn compute(self, sample: &Sample) -> f64 {
        match self {
            Statistic::Median => Data::new(sample.values().to_vec()).median(),
            Statistic::Mean => sample.values().mean(),
        }
    }

    /// The complementary statistic, used as a tie-breaker.
    pub fn other(self) -> Self {
        match self {
            Statistic::Median => Statistic::Mean,
            Statistic::Mean => Statistic::Median,
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statistic::Median => f.write_str("median"),
            Statistic::Mean => f.write_str("mean"),
        }
    }
}

pub mod effect_size;
pub mod select;
pub mod validate;

pub use effect_size::{a12, categorize, format_field, Category, EffectSizeError};
pub use select::{find_best, pick_one_best, BestCompetitor, PLACEHOLDER_NAME};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_even_length_averages_middle() {
        let sample = Sample::new([4, 1, 3, 2]).unwrap();
        assert_eq!(Statistic::Median.compute(&sample), 2.5);
    }

    #[test]
    fn test_mean() {
        let sample = Sample::new([1, 2, 6]).unwrap();
        assert_eq!(Statistic::Mean.compute(&sample), 3.0);
    }

    #[test]
    fn test_other() {
        assert_eq!(Statistic::Median.other(), Statistic::Mean);
        assert_eq!(Statistic::Mean.other(), Statistic::Median);
        assert_eq!(Statistic::Mean.to_string(), "mean");
    }
}
