//! Vargha and Delaney's A12 effect size.
//!
//! A12 is the probability that a run of the tweak reaches more coverage than a
//! run of the baseline, counting ties as half. 0.5 means no difference, values
//! above 0.5 favour the tweak.
//!
//! Reference: A. Vargha and H. D. Delaney. "A Critique and Improvement of the
//! CL Common Language Effect Size Statistics of McGraw and Wong". Journal of
//! Educational and Behavioral Statistics 25(2), 2000.

use std::fmt;

use thiserror::Error;

use crate::sample::Sample;

#[derive(Debug, Error, PartialEq)]
pub enum EffectSizeError {
    /// Baseline and tweak must have the same number of runs.
    #[error("len(baseline)={baseline} != len(tweak)={tweak}")]
    DimensionMismatch { baseline: usize, tweak: usize },

    /// Effect sizes live in [0, 1].
    #[error("effect size must be 0 <= effect_size <= 1; but is {0}")]
    OutOfRange(f64),
}

/// Magnitude and direction of an A12 effect size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    LargeNegative,
    MediumNegative,
    SmallNegative,
    Neutral,
    SmallPositive,
    MediumPositive,
    LargePositive,
}

impl Category {
    /// Two-character table symbol (`+L`, `-S`, two spaces for neutral).
    pub fn symbol(self) -> &'static str {
        match self {
            Category::LargeNegative => "-L",
            Category::MediumNegative => "-M",
            Category::SmallNegative => "-S",
            Category::Neutral => "  ",
            Category::SmallPositive => "+S",
            Category::MediumPositive => "+M",
            Category::LargePositive => "+L",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::LargeNegative => "large negative",
            Category::MediumNegative => "medium negative",
            Category::SmallNegative => "small negative",
            Category::Neutral => "neutral",
            Category::SmallPositive => "small positive",
            Category::MediumPositive => "medium positive",
            Category::LargePositive => "large positive",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    Above(f64),
    Exactly(f64),
    Below(f64),
}

impl Bound {
    fn matches(self, value: f64) -> bool {
        match self {
            Bound::Above(t) => value > t,
            Bound::Exactly(t) => value == t,
            Bound::Below(t) => value < t,
        }
    }
}

/// Category thresholds, checked in order; the first match wins.
const LADDER: [(Bound, Category); 9] = [
    (Bound::Above(0.71), Category::LargePositive),
    (Bound::Above(0.64), Category::MediumPositive),
    (Bound::Above(0.56), Category::SmallPositive),
    (Bound::Above(0.50), Category::Neutral),
    (Bound::Exactly(0.50), Category::Neutral),
    (Bound::Below(0.29), Category::LargeNegative),
    (Bound::Below(0.36), Category::MediumNegative),
    (Bound::Below(0.44), Category::SmallNegative),
    (Bound::Below(0.50), Category::Neutral),
];

/// Compute A12 of `tweak` over `baseline` by comparing every pair of runs.
///
/// # Errors
///
/// Returns [`EffectSizeError::DimensionMismatch`] if the samples differ in
/// length.
pub fn a12(baseline: &Sample, tweak: &Sample) -> Result<f64, EffectSizeError> {
    if baseline.len() != tweak.len() {
        return Err(EffectSizeError::DimensionMismatch {
            baseline: baseline.len(),
            tweak: tweak.len(),
        });
    }

    let mut more = 0usize;
    let mut same = 0usize;
    for x in tweak.values() {
        for y in baseline.values() {
            if x == y {
                same += 1;
            } else if x > y {
                more += 1;
            }
        }
    }

    let pairs = (baseline.len() * tweak.len()) as f64;
    Ok((more as f64 + 0.5 * same as f64) / pairs)
}

/// Categorize an effect size using the Vargha-Delaney thresholds.
///
/// # Errors
///
/// Returns [`EffectSizeError::OutOfRange`] for values outside [0, 1] (or NaN).
pub fn categorize(effect_size: f64) -> Result<Category, EffectSizeError> {
    if !(0.0..=1.0).contains(&effect_size) {
        return Err(EffectSizeError::OutOfRange(effect_size));
    }
    LADDER
        .iter()
        .find(|(bound, _)| bound.matches(effect_size))
        .map(|&(_, category)| category)
        .ok_or(EffectSizeError::OutOfRange(effect_size))
}

/// Render an effect size as a fixed-width table field, e.g. `+L(0.72)`.
pub fn format_field(effect_size: f64) -> Result<String, EffectSizeError> {
    let category = categorize(effect_size)?;
    Ok(format!("{}({:.2})", category.symbol(), effect_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(values: &[i32]) -> Sample {
        Sample::new(values.iter().copied()).unwrap()
    }

    #[test]
    fn test_a12_known_scenario() {
        let baseline = sample(&[11377, 11707, 11731, 11899, 12178]);
        let tweak = sample(&[11703, 11791, 12030, 12039, 12135]);

        let effect_size = a12(&baseline, &tweak).unwrap();

        // 1 + 3 + 4 + 4 + 4 of 25 pairs favour the tweak.
        assert_eq!(effect_size, 16.0 / 25.0);
        // 0.64 is not above the medium threshold.
        assert_eq!(categorize(effect_size).unwrap(), Category::SmallPositive);
    }

    #[test]
    fn test_a12_identical_is_half() {
        let s = sample(&[5, 5, 7, 9]);
        assert_eq!(a12(&s, &s).unwrap(), 0.5);
    }

    #[test]
    fn test_a12_counts_ties_as_half() {
        let baseline = sample(&[1, 2]);
        let tweak = sample(&[2, 3]);
        // 3 > 1, 3 > 2, 2 > 1 and one tie: (3 + 0.5) / 4
        assert_eq!(a12(&baseline, &tweak).unwrap(), 0.875);
    }

    #[test]
    fn test_a12_dimension_mismatch() {
        let result = a12(&sample(&[1, 2, 3]), &sample(&[1, 2]));
        assert_eq!(
            result,
            Err(EffectSizeError::DimensionMismatch {
                baseline: 3,
                tweak: 2
            })
        );
    }

    #[test]
    fn test_categorize_endpoints() {
        assert_eq!(categorize(0.5).unwrap(), Category::Neutral);
        assert_eq!(categorize(1.0).unwrap(), Category::LargePositive);
        assert_eq!(categorize(0.0).unwrap(), Category::LargeNegative);
    }

    #[test]
    fn test_categorize_boundaries() {
        assert_eq!(categorize(0.71).unwrap(), Category::MediumPositive);
        assert_eq!(categorize(0.64).unwrap(), Category::SmallPositive);
        assert_eq!(categorize(0.56).unwrap(), Category::Neutral);
        assert_eq!(categorize(0.44).unwrap(), Category::Neutral);
        assert_eq!(categorize(0.36).unwrap(), Category::SmallNegative);
        assert_eq!(categorize(0.29).unwrap(), Category::MediumNegative);
        assert_eq!(categorize(0.2899).unwrap(), Category::LargeNegative);
    }

    #[test]
    fn test_categorize_out_of_range() {
        assert_eq!(categorize(1.01), Err(EffectSizeError::OutOfRange(1.01)));
        assert_eq!(categorize(-0.1), Err(EffectSizeError::OutOfRange(-0.1)));
        assert!(categorize(f64::NAN).is_err());
    }

    #[test]
    fn test_format_field() {
        assert_eq!(format_field(0.72).unwrap(), "+L(0.72)");
        assert_eq!(format_field(0.5).unwrap(), "  (0.50)");
        assert_eq!(format_field(0.3).unwrap(), "-M(0.30)");
        assert_eq!(Category::SmallNegative.to_string(), "small negative");
    }
}
