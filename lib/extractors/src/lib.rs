//! # jsonvec Extractors
//!
//! Per-type feature extractors fitted on the sample values buffered at each
//! schema node.
//!
//! | Type        | Extractor              | Features                           |
//! |-------------|------------------------|------------------------------------|
//! | boolean     | [`BooleanExtractor`]   | `= True`                           |
//! | number      | [`NumberExtractor`]    | one per equiprobable bin           |
//! | string      | [`StringExtractor`]    | categories or token presence       |
//! | timestamp   | [`TimestampExtractor`] | invalid marker plus time bins      |
//!
//! Which extractor a node gets is decided by an ordered rule table
//! ([`ExtractorRule`]); the first rule accepting the node's type and path
//! wins.
//!
//! ## Example
//!
//! ```rust
//! use jsonvec_extractors::{Extractor, ExtractorConfig, ExtractorContext};
//! use serde_json::{json, Value};
//!
//! let samples: Vec<Value> = (1..=8).map(|v| json!(v)).collect();
//! let refs: Vec<&Value> = samples.iter().collect();
//! let ctx = ExtractorContext { n_total: 8, path: "root.size" };
//!
//! let fitted = ExtractorConfig::number(4).fit(&refs, &ctx).unwrap().unwrap();
//! assert_eq!(fitted.n_features(), 4);
//! ```

pub mod boolean;
pub mod config;
pub mod fitted;
pub mod number;
pub mod rule;
pub mod string;
pub mod timestamp;

pub use boolean::BooleanExtractor;
pub use config::{
    ExtractorConfig, ExtractorContext, NumberConfig, StringConfig, Threshold, TimestampConfig,
};
pub use fitted::{Extractor, FittedExtractor};
pub use number::NumberExtractor;
pub use rule::{
    compile_pattern, compile_patterns, default_rules, select_rule, ExtractorRule, RuleSpec,
    TypeFilter,
};
pub use string::{StringExtractor, StringMode, TokenPattern, DEFAULT_TOKEN_PATTERN};
pub use timestamp::{parse_timestamp, TimestampExtractor};
