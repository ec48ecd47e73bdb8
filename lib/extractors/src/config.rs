//! Extractor configuration
//!
//! Declares which extractor to fit for a field and with which parameters.
//! Configurations are plain data so they can live in a rule table loaded
//! from a config file; [`ExtractorConfig::fit`] turns one into a
//! [`FittedExtractor`].

use crate::boolean::BooleanExtractor;
use crate::fitted::FittedExtractor;
use crate::number::NumberExtractor;
use crate::string::StringExtractor;
use crate::timestamp::TimestampExtractor;
use jsonvec_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Absolute count or proportion of the total document count
///
/// Integers in a config file are counts, floats are proportions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Threshold {
    Count(u64),
    Proportion(f64),
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Count(1)
    }
}

impl Threshold {
    /// Resolve to an absolute count, never below one
    pub fn resolve_count(&self, n_total: usize) -> u64 {
        match *self {
            Threshold::Count(c) => c,
            Threshold::Proportion(p) => ((p * n_total as f64).floor() as u64).max(1),
        }
    }

    /// Resolve to an unfloored absolute value
    pub fn resolve_value(&self, n_total: usize) -> f64 {
        match *self {
            Threshold::Count(c) => c as f64,
            Threshold::Proportion(p) => p * n_total as f64,
        }
    }

    pub(crate) fn check_positive(&self, alias: &str) -> Result<()> {
        let positive = match *self {
            Threshold::Count(c) => c > 0,
            Threshold::Proportion(p) => p > 0.0 && p.is_finite(),
        };
        if positive {
            Ok(())
        } else {
            Err(Error::InvalidConfig(format!("{} must be a positive number", alias)))
        }
    }
}

/// Context handed to an extractor when fitting a node
#[derive(Debug, Clone, Copy)]
pub struct ExtractorContext<'a> {
    /// Grand total number of documents seen by the schema root
    pub n_total: usize,
    /// Dotted path of the node being fitted
    pub path: &'a str,
}

/// Parameters of the numeric binning extractor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NumberConfig {
    /// Number of equiprobable bins to start from
    pub n_bins: usize,
    /// Minimum number of samples per bin after merging
    #[serde(default)]
    pub min_f: Threshold,
}

/// Parameters of the string extractor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StringConfig {
    /// Maximum number of categories for one-hot encoding
    #[serde(default = "default_max_categories")]
    pub max_categories: usize,
    /// Average number of samples each category must hold
    #[serde(default)]
    pub n_average: Threshold,
    /// Minimum document frequency of a token
    #[serde(default)]
    pub min_df: Threshold,
    #[serde(default = "default_lowercase")]
    pub lowercase: bool,
    /// Token regex, defaults to words of two or more characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_pattern: Option<String>,
}

fn default_max_categories() -> usize {
    1
}

fn default_lowercase() -> bool {
    true
}

impl Default for StringConfig {
    fn default() -> Self {
        Self {
            max_categories: default_max_categories(),
            n_average: Threshold::default(),
            min_df: Threshold::default(),
            lowercase: default_lowercase(),
            token_pattern: None,
        }
    }
}

/// Parameters of the timestamp extractor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimestampConfig {
    pub n_bins: usize,
    #[serde(default)]
    pub min_f: Threshold,
}

/// Extractor factory selected by a rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExtractorConfig {
    Boolean,
    Number(NumberConfig),
    String(StringConfig),
    Timestamp(TimestampConfig),
}

impl ExtractorConfig {
    /// Numeric binning with `n_bins` bins and one sample minimum per bin
    pub fn number(n_bins: usize) -> Self {
        ExtractorConfig::Number(NumberConfig { n_bins, min_f: Threshold::default() })
    }

    /// String extractor with default parameters
    pub fn string() -> Self {
        ExtractorConfig::String(StringConfig::default())
    }

    /// Timestamp binning with `n_bins` bins
    pub fn timestamp(n_bins: usize) -> Self {
        ExtractorConfig::Timestamp(TimestampConfig { n_bins, min_f: Threshold::default() })
    }

    /// Reject invalid parameters before any data is seen
    pub fn validate(&self) -> Result<()> {
        match self {
            ExtractorConfig::Boolean => Ok(()),
            ExtractorConfig::Number(cfg) => {
                check_positive_int(cfg.n_bins, "n_bins")?;
                cfg.min_f.check_positive("min_f")
            }
            ExtractorConfig::String(cfg) => {
                check_positive_int(cfg.max_categories, "max_categories")?;
                cfg.n_average.check_positive("n_average")?;
                cfg.min_df.check_positive("min_df")?;
                if let Some(pattern) = &cfg.token_pattern {
                    regex::Regex::new(pattern)
                        .map_err(|e| Error::InvalidPattern(format!("{}: {}", pattern, e)))?;
                }
                Ok(())
            }
            ExtractorConfig::Timestamp(cfg) => {
                check_positive_int(cfg.n_bins, "n_bins")?;
                cfg.min_f.check_positive("min_f")
            }
        }
    }

    /// Fit an extractor on the sample values of one node
    ///
    /// Returns `Ok(None)` when the samples carry no usable signal (a single
    /// distinct value, no surviving bins, an empty vocabulary).
    pub fn fit(&self, samples: &[&Value], ctx: &ExtractorContext<'_>) -> Result<Option<FittedExtractor>> {
        self.validate()?;
        let fitted = match self {
            ExtractorConfig::Boolean => BooleanExtractor::fit(samples).map(FittedExtractor::Boolean),
            ExtractorConfig::Number(cfg) => {
                NumberExtractor::fit(samples, cfg, ctx).map(FittedExtractor::Number)
            }
            ExtractorConfig::String(cfg) => {
                StringExtractor::fit(samples, cfg, ctx)?.map(FittedExtractor::String)
            }
            ExtractorConfig::Timestamp(cfg) => {
                TimestampExtractor::fit(samples, cfg, ctx).map(FittedExtractor::Timestamp)
            }
        };
        Ok(fitted)
    }
}

fn check_positive_int(value: usize, alias: &str) -> Result<()> {
    if value == 0 {
        Err(Error::InvalidConfig(format!("{} must be a positive integer", alias)))
    } else {
        Ok(())
    }
}
