//! Numeric binning extractor
//!
//! Samples are split into equiprobable bins (percentile edges with "higher"
//! interpolation), then bins holding fewer than `min_f` samples are merged
//! left to right into their right neighbour. If the right-most bin is still
//! too small it is merged into its left neighbour. Each surviving bin becomes
//! one one-hot feature.

use crate::config::{ExtractorContext, NumberConfig};
use crate::fitted::Extractor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One-hot encoding of the bin a number falls in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NumberExtractor {
    bin_edges: Vec<f64>,
    feature_names: Vec<String>,
}

impl NumberExtractor {
    pub fn fit(samples: &[&Value], config: &NumberConfig, ctx: &ExtractorContext<'_>) -> Option<Self> {
        let values: Vec<f64> = samples.iter().filter_map(|v| v.as_f64()).collect();
        let n_total = if ctx.n_total == 0 { values.len() } else { ctx.n_total };
        let min_f = config.min_f.resolve_count(n_total);

        let bin_edges = fit_bin_edges(values, config.n_bins, min_f)?;
        let feature_names = bin_feature_names(&bin_edges, format_edge, ",");
        Some(Self { bin_edges, feature_names })
    }

    pub fn bin_edges(&self) -> &[f64] {
        &self.bin_edges
    }
}

impl Extractor for NumberExtractor {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn transform(&self, values: &[&Value]) -> Vec<Vec<usize>> {
        values
            .iter()
            .map(|v| match v.as_f64() {
                Some(x) => vec![digitize(&self.bin_edges, x)],
                None => Vec::new(),
            })
            .collect()
    }
}

/// Compute merged bin edges; `None` when fewer than two bins survive
pub(crate) fn fit_bin_edges(mut values: Vec<f64>, n_bins: usize, min_f: u64) -> Option<Vec<f64>> {
    if values.is_empty() || n_bins < 2 {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let n = values.len();

    let mut edges: Vec<f64> = (1..n_bins)
        .map(|k| {
            // ceil((n - 1) * k / n_bins), the "higher" percentile index
            let idx = ((n - 1) * k + n_bins - 1) / n_bins;
            values[idx]
        })
        .collect();

    let count_below = |edge: f64| values.partition_point(|&v| v < edge) as u64;
    let mut hist = Vec::with_capacity(edges.len() + 1);
    let mut previous = 0u64;
    for &edge in &edges {
        let below = count_below(edge);
        hist.push(below - previous);
        previous = below;
    }
    hist.push(n as u64 - previous);

    let mut i = 0;
    while i != edges.len() {
        if hist[i] < min_f {
            hist[i + 1] += hist[i];
            edges.remove(i);
            hist.remove(i);
        } else {
            i += 1;
        }
    }
    while !edges.is_empty() && hist[hist.len() - 1] < min_f {
        let last = hist.pop().unwrap_or(0);
        let len = hist.len();
        hist[len - 1] += last;
        edges.pop();
    }

    if edges.is_empty() {
        None
    } else {
        Some(edges)
    }
}

/// Index of the bin holding `x`: the number of edges `<= x`
#[inline]
pub(crate) fn digitize(edges: &[f64], x: f64) -> usize {
    edges.partition_point(|&e| e <= x)
}

/// Names for the bins delimited by `edges`
pub(crate) fn bin_feature_names(edges: &[f64], format: impl Fn(f64) -> String, sep: &str) -> Vec<String> {
    let labels: Vec<String> = edges.iter().map(|&e| format(e)).collect();
    let mut names = Vec::with_capacity(labels.len() + 1);
    names.push(format!("in (-inf{}{})", sep, labels[0]));
    for pair in labels.windows(2) {
        names.push(format!("in [{}{}{})", pair[0], sep, pair[1]));
    }
    names.push(format!("in [{}{}inf)", labels[labels.len() - 1], sep));
    names
}

/// Scientific notation with three decimals and a signed two digit exponent
pub(crate) fn format_edge(x: f64) -> String {
    let formatted = format!("{:.3e}", x);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => formatted,
    }
}
