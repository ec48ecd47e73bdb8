//! Fitted extractor contract

use crate::boolean::BooleanExtractor;
use crate::number::NumberExtractor;
use crate::string::StringExtractor;
use crate::timestamp::TimestampExtractor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Capability shared by every fitted extractor
pub trait Extractor {
    /// Local feature names, in column order
    fn feature_names(&self) -> &[String];

    /// Hot local columns for each value, ascending
    fn transform(&self, values: &[&Value]) -> Vec<Vec<usize>>;

    fn n_features(&self) -> usize {
        self.feature_names().len()
    }
}

/// A fitted extractor of any kind, persisted as a tagged blob
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FittedExtractor {
    Boolean(BooleanExtractor),
    Number(NumberExtractor),
    String(StringExtractor),
    Timestamp(TimestampExtractor),
}

impl FittedExtractor {
    fn inner(&self) -> &dyn Extractor {
        match self {
            FittedExtractor::Boolean(e) => e,
            FittedExtractor::Number(e) => e,
            FittedExtractor::String(e) => e,
            FittedExtractor::Timestamp(e) => e,
        }
    }
}

impl Extractor for FittedExtractor {
    fn feature_names(&self) -> &[String] {
        self.inner().feature_names()
    }

    fn transform(&self, values: &[&Value]) -> Vec<Vec<usize>> {
        self.inner().transform(values)
    }
}
