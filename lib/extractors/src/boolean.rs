//! Boolean passthrough extractor

use crate::fitted::Extractor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single `= True` feature, hot wherever the value is `true`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BooleanExtractor {
    feature_names: Vec<String>,
}

impl BooleanExtractor {
    /// Fit on boolean samples; `None` unless both `true` and `false` occur
    pub fn fit(samples: &[&Value]) -> Option<Self> {
        let seen_true = samples.iter().any(|v| is_true(v));
        let seen_false = samples.iter().any(|v| !is_true(v));
        if seen_true && seen_false {
            Some(Self {
                feature_names: vec!["= True".to_string()],
            })
        } else {
            None
        }
    }
}

impl Extractor for BooleanExtractor {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn transform(&self, values: &[&Value]) -> Vec<Vec<usize>> {
        values
            .iter()
            .map(|v| if is_true(v) { vec![0] } else { Vec::new() })
            .collect()
    }
}

#[inline]
fn is_true(value: &Value) -> bool {
    value.as_bool().unwrap_or(false)
}
