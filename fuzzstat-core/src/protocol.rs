//! JSON messages exchanged with an out-of-process statistics provider.
//!
//! One [`ProviderRequest`] is written to the provider's stdin and one
//! [`ProviderResponse`] is read back from its stdout.

use serde::{Deserialize, Serialize};

use crate::provider::ProviderError;

/// A single request to the statistics provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ProviderRequest {
    /// Bootstrap comparison of two samples (`f1` is the focal fuzzer).
    TwoSample {
        script: String,
        f1: Vec<f64>,
        f2: Vec<f64>,
        alpha: f64,
        iterations: u32,
    },
    /// K-sample test with posthoc comparisons.
    KSample {
        script: String,
        names: Vec<String>,
        samples: Vec<Vec<f64>>,
        alpha: f64,
        iterations: u32,
    },
    /// Two-sided Mann-Whitney U test.
    MannWhitneyU { x: Vec<f64>, y: Vec<f64>, exact: bool },
}

/// The provider's answer: a raw result or an error message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderResponse {
    /// Create a successful response.
    pub fn success(result: serde_json::Value) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    /// Create a failed response.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Deserialize the result payload, turning provider-side failures into
    /// [`ProviderError::Failed`].
    pub fn into_result<T: serde::de::DeserializeOwned>(self) -> Result<T, ProviderError> {
        if !self.ok {
            return Err(ProviderError::Failed(
                self.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }
        let value = self
            .result
            .ok_or_else(|| ProviderError::Response("missing result".to_string()))?;
        Ok(serde_json::from_value(value)?)
    }
}

/// One element of a k-sample result: a numeric vector or a set of columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawElement {
    Vector(Vec<f64>),
    Columns(Vec<Vec<f64>>),
}

impl RawElement {
    pub fn as_vector(&self) -> Result<&[f64], ProviderError> {
        match self {
            RawElement::Vector(v) => Ok(v),
            RawElement::Columns(_) => Err(ProviderError::Response(
                "expected a vector, found a table".to_string(),
            )),
        }
    }

    pub fn as_columns(&self) -> Result<&[Vec<f64>], ProviderError> {
        match self {
            RawElement::Columns(c) => Ok(c),
            RawElement::Vector(_) => Err(ProviderError::Response(
                "expected a table, found a vector".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_tagged_by_op() {
        let request = ProviderRequest::MannWhitneyU {
            x: vec![1.0],
            y: vec![2.0],
            exact: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["op"], "mann_whitney_u");
        assert_eq!(json["exact"], true);
    }

    #[test]
    fn test_failure_response_becomes_error() {
        let response: ProviderResponse =
            serde_json::from_str(r#"{"ok": false, "error": "could not find function"}"#).unwrap();
        let result: Result<Vec<f64>, _> = response.into_result();
        assert!(matches!(result, Err(ProviderError::Failed(msg)) if msg == "could not find function"));
    }

    #[test]
    fn test_k_sample_payload_shapes() {
        let json = r#"{"ok": true, "result": [[1], [4.2], [1, 2, 3], [[1], [0.5], [1], [2]], [[], [], [], []], []]}"#;
        let response: ProviderResponse = serde_json::from_str(json).unwrap();
        let raw: Vec<RawElement> = response.into_result().unwrap();

        assert_eq!(raw[0], RawElement::Vector(vec![1.0]));
        assert!(matches!(raw[3], RawElement::Columns(_)));
        assert!(raw[3].as_vector().is_err());

        // An empty table still has four columns.
        let empty = raw[4].as_columns().unwrap();
        assert_eq!(empty.len(), 4);
        assert!(empty.iter().all(|column| column.is_empty()));

        // A bare empty array is a vector, not a table.
        assert_eq!(raw[5], RawElement::Vector(Vec::new()));
        assert!(raw[5].as_columns().is_err());
    }

    #[test]
    fn test_error_field_omitted_when_none() {
        let response = ProviderResponse::success(serde_json::json!([1.0, 2.0, 0.0]));
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("error"));
    }
}
