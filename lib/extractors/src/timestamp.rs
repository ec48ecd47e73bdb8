//! Timestamp extractor
//!
//! Parses strings to unix timestamps and bins them the same way numbers are
//! binned. When at least `min_f` samples fail to parse, an extra leading
//! feature marks invalid timestamps.

use crate::config::{ExtractorContext, TimestampConfig};
use crate::fitted::Extractor;
use crate::number::{bin_feature_names, digitize, fit_bin_edges};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Naive layouts accepted besides RFC 3339, interpreted as UTC
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimestampExtractor {
    has_invalid_feature: bool,
    bin_edges: Option<Vec<f64>>,
    feature_names: Vec<String>,
}

impl TimestampExtractor {
    pub fn fit(samples: &[&Value], config: &TimestampConfig, ctx: &ExtractorContext<'_>) -> Option<Self> {
        let n_total = if ctx.n_total == 0 { samples.len() } else { ctx.n_total };
        let min_f = config.min_f.resolve_count(n_total);

        let mut timestamps = Vec::with_capacity(samples.len());
        let mut n_invalid = 0u64;
        for value in samples {
            match parse_timestamp(value) {
                Some(ts) => timestamps.push(ts),
                None => n_invalid += 1,
            }
        }

        let has_invalid_feature = n_invalid >= min_f;
        let bin_edges = fit_bin_edges(timestamps, config.n_bins, min_f);
        if !has_invalid_feature && bin_edges.is_none() {
            return None;
        }

        let mut feature_names = Vec::new();
        if has_invalid_feature {
            feature_names.push("is not a valid timestamp".to_string());
        }
        if let Some(edges) = &bin_edges {
            feature_names.extend(bin_feature_names(edges, format_timestamp, ", "));
        }

        Some(Self {
            has_invalid_feature,
            bin_edges,
            feature_names,
        })
    }
}

impl Extractor for TimestampExtractor {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn transform(&self, values: &[&Value]) -> Vec<Vec<usize>> {
        let offset = usize::from(self.has_invalid_feature);
        values
            .iter()
            .map(|v| match (parse_timestamp(v), &self.bin_edges) {
                (Some(ts), Some(edges)) => vec![offset + digitize(edges, ts)],
                (Some(_), None) => Vec::new(),
                (None, _) if self.has_invalid_feature => vec![0],
                (None, _) => Vec::new(),
            })
            .collect()
    }
}

/// Seconds since the unix epoch, `None` for unparseable values
pub fn parse_timestamp(value: &Value) -> Option<f64> {
    let text = value.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(seconds(dt.timestamp(), dt.timestamp_subsec_nanos()));
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            let utc = dt.and_utc();
            return Some(seconds(utc.timestamp(), utc.timestamp_subsec_nanos()));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp() as f64)
}

#[inline]
fn seconds(secs: i64, nanos: u32) -> f64 {
    secs as f64 + f64::from(nanos) / 1e9
}

fn format_timestamp(ts: f64) -> String {
    let secs = ts.floor();
    let nanos = ((ts - secs) * 1e9) as u32;
    DateTime::from_timestamp(secs as i64, nanos)
        .map(|dt| format!("{}Z", dt.format("%Y-%m-%dT%H:%M:%S")))
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Threshold;
    use serde_json::json;

    fn fit(values: &[Value], n_bins: usize, min_f: u64) -> Option<TimestampExtractor> {
        let refs: Vec<&Value> = values.iter().collect();
        let config = TimestampConfig { n_bins, min_f: Threshold::Count(min_f) };
        let ctx = ExtractorContext { n_total: values.len(), path: "root.at" };
        TimestampExtractor::fit(&refs, &config, &ctx)
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp(&json!("1970-01-01T00:01:00Z")), Some(60.0));
        assert_eq!(parse_timestamp(&json!("1970-01-01T01:00:00+01:00")), Some(0.0));
        assert_eq!(parse_timestamp(&json!("1970-01-01 00:00:10")), Some(10.0));
        assert_eq!(parse_timestamp(&json!("1970-01-02")), Some(86400.0));
        assert_eq!(parse_timestamp(&json!("yesterday")), None);
        assert_eq!(parse_timestamp(&json!(12)), None);
    }

    #[test]
    fn test_bins_with_iso_names() {
        let values = vec![
            json!("2020-01-01T00:00:00Z"),
            json!("2020-01-02T00:00:00Z"),
            json!("2020-01-03T00:00:00Z"),
            json!("2020-01-04T00:00:00Z"),
        ];
        let extractor = fit(&values, 2, 1).unwrap();
        assert_eq!(
            extractor.feature_names(),
            &[
                "in (-inf, 2020-01-03T00:00:00Z)".to_string(),
                "in [2020-01-03T00:00:00Z, inf)".to_string(),
            ]
        );
        let refs: Vec<&Value> = values.iter().collect();
        assert_eq!(extractor.transform(&refs), vec![vec![0], vec![0], vec![1], vec![1]]);
    }

    #[test]
    fn test_invalid_feature() {
        let values = vec![
            json!("not a date"),
            json!("garbage"),
            json!("2020-01-01T00:00:00Z"),
            json!("2020-06-01T00:00:00Z"),
        ];
        let extractor = fit(&values, 2, 1).unwrap();
        assert_eq!(extractor.feature_names()[0], "is not a valid timestamp");
        assert_eq!(extractor.feature_names().len(), 3);

        let refs: Vec<&Value> = values.iter().collect();
        assert_eq!(
            extractor.transform(&refs),
            vec![vec![0], vec![0], vec![1], vec![2]]
        );
    }

    #[test]
    fn test_nothing_to_learn() {
        let values = vec![json!("2020-01-01T00:00:00Z"), json!("2020-01-01T00:00:00Z")];
        assert!(fit(&values, 4, 1).is_none());
    }
}
