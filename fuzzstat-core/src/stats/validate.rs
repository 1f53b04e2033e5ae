//! Checks for zeros and ties in coverage data.
//!
//! An exact Mann-Whitney U test needs tie-free data. These helpers decide
//! whether that holds and log which values are duplicated when it does not.

use tracing::warn;

use crate::sample::write_values;

pub fn contains_zero(data: &[f64]) -> bool {
    data.contains(&0.0)
}

/// True if any value occurs more than once.
pub fn contains_ties(data: &[f64]) -> bool {
    num_ties(data) > 0
}

/// Number of elements that duplicate an earlier element.
pub fn num_ties(data: &[f64]) -> usize {
    data.len() - value_counts(data).len()
}

/// True if the two samples share at least one value.
pub fn contains_overlap(a: &[f64], b: &[f64]) -> bool {
    a.iter().any(|x| b.contains(x))
}

/// Values occurring more than once, with their counts, in ascending order.
pub fn duplicates(data: &[f64]) -> Vec<(f64, usize)> {
    value_counts(data)
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .collect()
}

fn value_counts(data: &[f64]) -> Vec<(f64, usize)> {
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut counts: Vec<(f64, usize)> = Vec::new();
    for value in sorted {
        match counts.last_mut() {
            Some((last, count)) if *last == value => *count += 1,
            _ => counts.push((value, 1)),
        }
    }
    counts
}

/// Warn about zeros and each duplicated value in `data`.
///
/// Returns true if the data is safe for an exact test. Never fails.
pub fn validate_for_exact_test(data: &[f64], label: &str) -> bool {
    let mut is_valid = true;
    if contains_zero(data) {
        let zeros = data.iter().filter(|&&v| v == 0.0).count();
        warn!("Data of {} contains 0 ({} times)", label, zeros);
        is_valid = false;
    }
    for (value, count) in duplicates(data) {
        warn!("Data of {} contains {} {} times", label, value, count);
        is_valid = false;
    }
    is_valid
}

/// Warn about ties within each sample and across both.
///
/// Returns true if neither sample nor their union contains ties. Ties across
/// the samples are only reported when the samples share a value.
pub fn validate_datasets(a: &[f64], b: &[f64], label_a: &str, label_b: &str) -> bool {
    let mut is_valid = true;
    for (data, label) in [(a, label_a), (b, label_b)] {
        if contains_ties(data) {
            warn!("{} contains {} ties: {}", label, num_ties(data), sorted_text(data));
            is_valid = false;
        }
    }
    if contains_overlap(a, b) {
        let combined: Vec<f64> = a.iter().chain(b).copied().collect();
        warn!(
            "{}+{} contains {} ties: {}",
            label_a,
            label_b,
            num_ties(&combined),
            sorted_text(&combined)
        );
        is_valid = false;
    }
    is_valid
}

fn sorted_text(data: &[f64]) -> String {
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut text = String::new();
    // Writing into a String cannot fail.
    let _ = write_values(&mut text, &sorted);
    text
}
