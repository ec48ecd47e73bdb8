//! Extractor rule table
//!
//! Rules are scanned in order and the first one accepting a `(type, path)`
//! pair wins. A rule without a type filter accepts every type, a rule
//! without a pattern accepts every path.

use crate::config::ExtractorConfig;
use jsonvec_core::{Error, JsonType, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One type name or a list of them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TypeFilter {
    One(String),
    Many(Vec<String>),
}

/// Rule as written in a config file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleSpec {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub types: Option<TypeFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub extractor: ExtractorConfig,
}

impl RuleSpec {
    /// Parse type names, compile the pattern and validate the extractor
    pub fn compile(&self) -> Result<ExtractorRule> {
        let types: Option<Vec<JsonType>> = match &self.types {
            None => None,
            Some(TypeFilter::One(name)) => Some(vec![name.parse()?]),
            Some(TypeFilter::Many(names)) => Some(
                names
                    .iter()
                    .map(|name| name.parse())
                    .collect::<Result<Vec<JsonType>>>()?,
            ),
        };
        let pattern = self.pattern.as_deref().map(compile_pattern).transpose()?;
        self.extractor.validate()?;
        Ok(ExtractorRule {
            types,
            pattern,
            extractor: self.extractor.clone(),
        })
    }
}

/// Compiled rule
#[derive(Debug, Clone)]
pub struct ExtractorRule {
    pub types: Option<Vec<JsonType>>,
    pub pattern: Option<Regex>,
    pub extractor: ExtractorConfig,
}

impl ExtractorRule {
    pub fn new(types: Option<Vec<JsonType>>, pattern: Option<Regex>, extractor: ExtractorConfig) -> Self {
        Self { types, pattern, extractor }
    }

    /// Rule applying to a single type on every path
    pub fn for_type(ty: JsonType, extractor: ExtractorConfig) -> Self {
        Self::new(Some(vec![ty]), None, extractor)
    }

    pub fn accepts(&self, ty: JsonType, path: &str) -> bool {
        let type_ok = self.types.as_ref().map_or(true, |types| types.contains(&ty));
        let path_ok = self.pattern.as_ref().map_or(true, |re| re.is_match(path));
        type_ok && path_ok
    }
}

impl From<&ExtractorRule> for RuleSpec {
    fn from(rule: &ExtractorRule) -> Self {
        Self {
            types: rule
                .types
                .as_ref()
                .map(|types| TypeFilter::Many(types.iter().map(|ty| ty.name().to_string()).collect())),
            pattern: rule.pattern.as_ref().map(|re| re.as_str().to_string()),
            extractor: rule.extractor.clone(),
        }
    }
}

/// First rule accepting `(ty, path)`
pub fn select_rule<'a>(rules: &'a [ExtractorRule], ty: JsonType, path: &str) -> Option<&'a ExtractorRule> {
    rules.iter().find(|rule| rule.accepts(ty, path))
}

/// Standard rule table used when a config does not declare one
pub fn default_rules() -> Vec<ExtractorRule> {
    vec![
        ExtractorRule::for_type(JsonType::Boolean, ExtractorConfig::Boolean),
        ExtractorRule::new(
            Some(vec![JsonType::Integer, JsonType::Number]),
            None,
            ExtractorConfig::number(10),
        ),
        ExtractorRule::for_type(JsonType::String, ExtractorConfig::string()),
        ExtractorRule::for_type(JsonType::Timestamp, ExtractorConfig::timestamp(10)),
    ]
}

/// Compile a path regex, failing fast on bad syntax
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::InvalidPattern(format!("{}: {}", pattern, e)))
}

pub fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>> {
    patterns.iter().map(|p| compile_pattern(p.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_match_wins() {
        let rules = vec![
            ExtractorRule::new(
                Some(vec![JsonType::Number]),
                Some(compile_pattern(r"\.price$").unwrap()),
                ExtractorConfig::number(4),
            ),
            ExtractorRule::new(None, None, ExtractorConfig::number(2)),
        ];
        let rule = select_rule(&rules, JsonType::Number, "root.price").unwrap();
        assert_eq!(rule.extractor, ExtractorConfig::number(4));
        let rule = select_rule(&rules, JsonType::Number, "root.qty").unwrap();
        assert_eq!(rule.extractor, ExtractorConfig::number(2));
        let rule = select_rule(&rules, JsonType::String, "root.price").unwrap();
        assert_eq!(rule.extractor, ExtractorConfig::number(2));
    }

    #[test]
    fn test_default_rules_never_match_null() {
        let rules = default_rules();
        assert!(select_rule(&rules, JsonType::Null, "root").is_none());
        assert!(select_rule(&rules, JsonType::Integer, "root").is_some());
        assert!(select_rule(&rules, JsonType::Timestamp, "root").is_some());
    }

    #[test]
    fn test_rule_spec_compile() {
        let spec: RuleSpec = serde_json::from_value(json!({
            "type": ["number", "integer"],
            "pattern": "^root\\.age$",
            "extractor": {"kind": "number", "n_bins": 5}
        }))
        .unwrap();
        let rule = spec.compile().unwrap();
        assert!(rule.accepts(JsonType::Integer, "root.age"));
        assert!(!rule.accepts(JsonType::String, "root.age"));
        assert!(!rule.accepts(JsonType::Number, "root.ages"));

        let single: RuleSpec = serde_json::from_value(json!({
            "type": "boolean",
            "extractor": {"kind": "boolean"}
        }))
        .unwrap();
        assert!(single.compile().unwrap().accepts(JsonType::Boolean, "anything"));
    }

    #[test]
    fn test_compiled_rule_back_to_spec() {
        for rule in default_rules() {
            let spec = RuleSpec::from(&rule);
            let again = spec.compile().unwrap();
            assert_eq!(again.types, rule.types);
            assert_eq!(again.extractor, rule.extractor);
        }
        let rule = ExtractorRule::new(None, Some(compile_pattern("^root$").unwrap()), ExtractorConfig::Boolean);
        assert_eq!(RuleSpec::from(&rule).pattern.as_deref(), Some("^root$"));
    }

    #[test]
    fn test_rule_spec_fails_fast() {
        let bad_type = RuleSpec {
            types: Some(TypeFilter::One("float".to_string())),
            pattern: None,
            extractor: ExtractorConfig::Boolean,
        };
        assert!(matches!(bad_type.compile(), Err(Error::InvalidTypeName(_))));

        let bad_pattern = RuleSpec {
            types: None,
            pattern: Some("[unclosed".to_string()),
            extractor: ExtractorConfig::Boolean,
        };
        assert!(matches!(bad_pattern.compile(), Err(Error::InvalidPattern(_))));
    }
}
