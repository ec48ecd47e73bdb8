//! JSON value types and runtime classification
//!
//! Every tree algorithm dispatches on [`JsonType`], produced for a single
//! value by [`classify`]. The declared vocabulary includes `integer`, but
//! live classification never emits it: integral and fractional numbers are
//! both reported as [`JsonType::Number`].

use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Strict timestamp layout recognized by [`classify`]
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Length of a string matching [`TIMESTAMP_FORMAT`]
const TIMESTAMP_LEN: usize = 20;

/// Kind of a document value
///
/// The declaration order is the ascending enumeration order used by every
/// per-type walk (fitting, pruning and transforming).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JsonType {
    Object,
    Array,
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Timestamp,
}

impl JsonType {
    /// All types in ascending enumeration order
    pub const ALL: [JsonType; 8] = [
        JsonType::Object,
        JsonType::Array,
        JsonType::Null,
        JsonType::Boolean,
        JsonType::Integer,
        JsonType::Number,
        JsonType::String,
        JsonType::Timestamp,
    ];

    /// Lowercase name used in representations and feature names
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            JsonType::Object => "object",
            JsonType::Array => "array",
            JsonType::Null => "null",
            JsonType::Boolean => "boolean",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Timestamp => "timestamp",
        }
    }

    /// Containers hold child schemas instead of sample values
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, JsonType::Object | JsonType::Array)
    }

    /// Leaf types buffer sample values during learning
    #[inline]
    pub fn is_leaf(&self) -> bool {
        !self.is_container() && *self != JsonType::Null
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for JsonType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        JsonType::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::InvalidTypeName(s.to_string()))
    }
}

impl Serialize for JsonType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for JsonType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Classify a single document value
///
/// Strings matching `YYYY-MM-DDTHH:MM:SSZ` exactly are timestamps; every
/// other string is a plain string.
pub fn classify(value: &Value) -> Result<JsonType> {
    match value {
        Value::Object(_) => Ok(JsonType::Object),
        Value::Array(_) => Ok(JsonType::Array),
        Value::Null => Ok(JsonType::Null),
        Value::Bool(_) => Ok(JsonType::Boolean),
        Value::Number(n) => {
            if n.as_f64().is_some() {
                Ok(JsonType::Number)
            } else {
                Err(Error::Classification(format!("number {} has no f64 representation", n)))
            }
        }
        Value::String(s) => {
            if is_timestamp(s) {
                Ok(JsonType::Timestamp)
            } else {
                Ok(JsonType::String)
            }
        }
    }
}

/// Check a string against the strict timestamp layout
pub fn is_timestamp(s: &str) -> bool {
    s.len() == TIMESTAMP_LEN && NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).is_ok()
}
