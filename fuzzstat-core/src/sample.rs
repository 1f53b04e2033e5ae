//! Coverage samples and the insertion-ordered collections that hold them.
//!
//! A [`Sample`] is the list of final coverage values of repeated runs of one
//! fuzzer on one target. Samples are grouped per target in a
//! [`NamedSampleSet`], and all targets of an evaluation form a
//! [`TargetCollection`]. Both collections keep document order, because
//! competitor selection breaks ties by iteration order.

use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors that can occur while building or loading samples.
#[derive(Debug, Error)]
pub enum SampleError {
    /// A sample must contain at least one measurement.
    #[error("sample must contain at least one measurement")]
    Empty,

    /// The data file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The data file is not a `{target: {fuzzer: [values]}}` JSON object.
    #[error("failed to parse sample data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Repeated-run measurements of one fuzzer on one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Sample(Vec<f64>);

impl Sample {
    /// Create a sample from any sequence of numeric measurements.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::Empty`] if `values` yields nothing.
    pub fn new<I, T>(values: I) -> Result<Self, SampleError>
    where
        I: IntoIterator<Item = T>,
        T: Into<f64>,
    {
        let values: Vec<f64> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(SampleError::Empty);
        }
        Ok(Self(values))
    }

    /// A sample of `runs` zeros (at least one).
    pub fn zeros(runs: usize) -> Self {
        Self(vec![0.0; runs.max(1)])
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Number of runs in this sample.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The measurements in ascending order.
    pub fn sorted(&self) -> Vec<f64> {
        let mut values = self.0.clone();
        values.sort_by(f64::total_cmp);
        values
    }

    /// Number of distinct measurements.
    pub fn distinct_count(&self) -> usize {
        let mut values = self.sorted();
        values.dedup();
        values.len()
    }
}

impl TryFrom<Vec<f64>> for Sample {
    type Error = SampleError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<Sample> for Vec<f64> {
    fn from(sample: Sample) -> Self {
        sample.0
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_values(f, &self.0)
    }
}

/// Write `[a, b, c]`, printing integral values without a fractional part.
pub(crate) fn write_values(f: &mut impl fmt::Write, values: &[f64]) -> fmt::Result {
    f.write_char('[')?;
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", v)?;
    }
    f.write_char(']')
}

/// A map from name to value that iterates in insertion order.
///
/// Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

/// All fuzzers' samples for one target, keyed by fuzzer name.
pub type NamedSampleSet = OrderedMap<Sample>;

/// All targets of an evaluation, keyed by target name.
pub type TargetCollection = OrderedMap<NamedSampleSet>;

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `name`, returning the replaced value if any.
    pub fn insert(&mut self, name: impl Into<String>, value: V) -> Option<V> {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map keyed by name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = OrderedMap::new();
                while let Some((name, value)) = access.next_entry::<String, V>()? {
                    map.insert(name, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

impl TargetCollection {
    /// Parse a `{target: {fuzzer: [values]}}` JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, SampleError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a target collection from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SampleError> {
        let content = std::fs::read_to_string(path).map_err(|source| SampleError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sample_rejected() {
        assert!(matches!(Sample::new(Vec::<f64>::new()), Err(SampleError::Empty)));
    }

    #[test]
    fn test_sample_helpers() {
        let sample = Sample::new([3, 1, 2, 3]).unwrap();
        assert_eq!(sample.len(), 4);
        assert_eq!(sample.sorted(), vec![1.0, 2.0, 3.0, 3.0]);
        assert_eq!(sample.distinct_count(), 3);
        assert_eq!(sample.to_string(), "[3, 1, 2, 3]");
        assert_eq!(Sample::zeros(0).len(), 1);
    }

    #[test]
    fn test_ordered_map_insert_replaces_in_place() {
        let mut set = NamedSampleSet::new();
        set.insert("b", Sample::new([1]).unwrap());
        set.insert("a", Sample::new([2]).unwrap());
        let old = set.insert("b", Sample::new([3]).unwrap());

        assert_eq!(old, Some(Sample::new([1]).unwrap()));
        assert_eq!(set.names(), vec!["b", "a"]);
        assert_eq!(set.get("b").unwrap().values(), &[3.0]);
        assert!(!set.contains("c"));
    }

    #[test]
    fn test_load_preserves_document_order() {
        let json = r#"{
            "zlib": {"new_fuzzer": [3, 2, 1], "aflpp": [1.5, 2, 3]},
            "libpng": {"aflpp": [7]}
        }"#;

        let data = TargetCollection::from_json_str(json).unwrap();

        assert_eq!(data.names(), vec!["zlib", "libpng"]);
        let zlib = data.get("zlib").unwrap();
        assert_eq!(zlib.names(), vec!["new_fuzzer", "aflpp"]);
        assert_eq!(zlib.get("aflpp").unwrap().values(), &[1.5, 2.0, 3.0]);
    }

    #[test]
    fn test_load_rejects_empty_sample() {
        let result = TargetCollection::from_json_str(r#"{"zlib": {"aflpp": []}}"#);
        assert!(matches!(result, Err(SampleError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = TargetCollection::load(Path::new("/nonexistent/data.json"));
        assert!(matches!(result, Err(SampleError::Io { .. })));
    }
}
