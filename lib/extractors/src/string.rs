//! String extractor
//!
//! Uses one-hot categories when the number of distinct values is small
//! (at most `max_categories` and `n / n_average`), token presence features
//! otherwise. Exactly two categories collapse into a single feature.

use crate::config::{ExtractorContext, StringConfig};
use crate::fitted::Extractor;
use ahash::AHashMap;
use jsonvec_core::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeSet;

/// Default token regex: words of two or more characters
pub const DEFAULT_TOKEN_PATTERN: &str = r"\b\w\w+\b";

/// Compiled token regex, persisted as its source string
#[derive(Debug, Clone)]
pub struct TokenPattern(Regex);

impl TokenPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(TokenPattern)
            .map_err(|e| Error::InvalidPattern(format!("{}: {}", pattern, e)))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Distinct tokens of `text`, sorted
    pub fn tokenize(&self, text: &str) -> BTreeSet<String> {
        self.0.find_iter(text).map(|m| m.as_str().to_string()).collect()
    }
}

impl PartialEq for TokenPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for TokenPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TokenPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        TokenPattern::new(&pattern).map_err(serde::de::Error::custom)
    }
}

/// Encoding chosen at fit time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum StringMode {
    /// Two categories: hot when equal to `positive`
    Binary { positive: String },
    /// One feature per sorted category
    Categorical { classes: Vec<String> },
    /// One feature per sorted vocabulary token
    Tokens {
        vocabulary: Vec<String>,
        token_pattern: TokenPattern,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StringExtractor {
    mode: StringMode,
    lowercase: bool,
    feature_names: Vec<String>,
}

impl StringExtractor {
    pub fn fit(samples: &[&Value], config: &StringConfig, ctx: &ExtractorContext<'_>) -> Result<Option<Self>> {
        let values: Vec<String> = samples
            .iter()
            .map(|v| normalize(&text_of(v), config.lowercase))
            .collect();
        let n_total = if ctx.n_total == 0 { values.len() } else { ctx.n_total };
        let n_average = config.n_average.resolve_value(n_total);
        let min_df = config.min_df.resolve_count(n_total);

        let unique: BTreeSet<&str> = values.iter().map(String::as_str).collect();
        let max_categories = (config.max_categories as f64).min(values.len() as f64 / n_average);

        if unique.len() <= 1 {
            return Ok(None);
        }

        if unique.len() as f64 <= max_categories {
            let classes: Vec<String> = unique.into_iter().map(str::to_string).collect();
            let (mode, feature_names) = if classes.len() == 2 {
                let name = format!("= {} (!= {})", classes[1], classes[0]);
                (StringMode::Binary { positive: classes[1].clone() }, vec![name])
            } else {
                let names = classes.iter().map(|c| format!("= {}", c)).collect();
                (StringMode::Categorical { classes }, names)
            };
            return Ok(Some(Self { mode, lowercase: config.lowercase, feature_names }));
        }

        let token_pattern = TokenPattern::new(
            config.token_pattern.as_deref().unwrap_or(DEFAULT_TOKEN_PATTERN),
        )?;
        let mut document_frequency: AHashMap<String, u64> = AHashMap::new();
        for value in &values {
            for token in token_pattern.tokenize(value) {
                *document_frequency.entry(token).or_insert(0) += 1;
            }
        }
        let vocabulary: Vec<String> = document_frequency
            .into_iter()
            .filter(|(_, df)| *df >= min_df)
            .map(|(token, _)| token)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if vocabulary.is_empty() {
            tracing::trace!(path = ctx.path, "empty token vocabulary");
            return Ok(None);
        }

        let feature_names = vocabulary
            .iter()
            .map(|token| format!("has token \"{}\"", token))
            .collect();
        Ok(Some(Self {
            mode: StringMode::Tokens { vocabulary, token_pattern },
            lowercase: config.lowercase,
            feature_names,
        }))
    }

    pub fn mode(&self) -> &StringMode {
        &self.mode
    }
}

impl Extractor for StringExtractor {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn transform(&self, values: &[&Value]) -> Vec<Vec<usize>> {
        values
            .iter()
            .map(|v| {
                let value = normalize(&text_of(v), self.lowercase);
                match &self.mode {
                    StringMode::Binary { positive } => {
                        if &value == positive {
                            vec![0]
                        } else {
                            Vec::new()
                        }
                    }
                    StringMode::Categorical { classes } => classes
                        .binary_search(&value)
                        .map(|idx| vec![idx])
                        .unwrap_or_default(),
                    StringMode::Tokens { vocabulary, token_pattern } => token_pattern
                        .tokenize(&value)
                        .iter()
                        .filter_map(|token| vocabulary.binary_search(token).ok())
                        .collect(),
                }
            })
            .collect()
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[inline]
fn normalize(text: &str, lowercase: bool) -> String {
    if lowercase {
        text.to_lowercase()
    } else {
        text.to_string()
    }
}
