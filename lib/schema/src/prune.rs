//! Schema pruning
//!
//! Removes rarely observed types and unwanted subtrees before fitting. A
//! type edge is dropped when its count falls under the resolved threshold;
//! a child is dropped whole when its path matches one of the patterns, or
//! when it is left without any type.

use crate::node::SchemaNode;
use jsonvec_core::JsonType;
use regex::Regex;
use std::fmt;
use tracing::trace;

/// What a proportional threshold is a proportion of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyBasis {
    /// The count of values observed at the node being pruned
    Local,
    /// A grand total, usually the number of documents learned
    Global(u64),
}

/// Minimum number of observations a type needs to survive pruning
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PruneThreshold {
    Count(u64),
    Proportion { fraction: f64, basis: FrequencyBasis },
}

impl PruneThreshold {
    /// Absolute minimum count at a node whose own total is `node_total`
    pub fn min_count(&self, node_total: u64) -> f64 {
        match *self {
            PruneThreshold::Count(n) => n as f64,
            PruneThreshold::Proportion { fraction, basis: FrequencyBasis::Local } => {
                fraction * node_total as f64
            }
            PruneThreshold::Proportion { fraction, basis: FrequencyBasis::Global(total) } => {
                fraction * total as f64
            }
        }
    }
}

/// One removal performed by [`SchemaNode::prune`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dropped {
    /// A type edge removed from a node that kept other types
    Type { path: String, ty: JsonType },
    /// A whole node
    Node { path: String },
}

impl Dropped {
    pub fn path(&self) -> &str {
        match self {
            Dropped::Type { path, .. } | Dropped::Node { path } => path,
        }
    }
}

impl fmt::Display for Dropped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dropped::Type { path, ty } => write!(f, "{} -> {}", path, ty),
            Dropped::Node { path } => f.write_str(path),
        }
    }
}

impl SchemaNode {
    /// Prune the subtree in place, returning the removals in walk order
    ///
    /// `prune(&[], &PruneThreshold::Count(0))` changes nothing. A fitted
    /// subtree that loses anything returns to the learning phase, keeping
    /// the extractors of surviving types for the next fit.
    pub fn prune(&mut self, patterns: &[Regex], threshold: &PruneThreshold) -> Vec<Dropped> {
        let mut dropped = Vec::new();
        self.prune_into(patterns, threshold, &mut dropped);
        if !dropped.is_empty() {
            self.reset_fit();
        }
        dropped
    }

    fn prune_into(&mut self, patterns: &[Regex], threshold: &PruneThreshold, dropped: &mut Vec<Dropped>) {
        let min = threshold.min_count(self.total_count());
        let sparse: Vec<JsonType> = self
            .types
            .iter()
            .copied()
            .filter(|&ty| (self.count(ty) as f64) < min)
            .collect();

        if !sparse.is_empty() {
            for &ty in &sparse {
                self.drop_type(ty);
            }
            let path = self.path_string();
            if self.types.is_empty() {
                trace!(path = %path, "dropping node");
                dropped.push(Dropped::Node { path });
                return;
            }
            for ty in sparse {
                trace!(path = %path, ty = %ty, "dropping type");
                dropped.push(Dropped::Type { path: path.clone(), ty });
            }
        }

        let names: Vec<String> = self.properties.keys().cloned().collect();
        for name in names {
            let remove = match self.properties.get_mut(&name) {
                Some(child) => prune_child(child, patterns, threshold, dropped),
                None => false,
            };
            if remove {
                self.properties.remove(&name);
                if let Some(required) = &mut self.required {
                    required.remove(&name);
                }
            }
        }

        if self.tuple_arrays {
            for index in 0..self.items.len() {
                if prune_child(&mut self.items[index], patterns, threshold, dropped) {
                    let placeholder = self.child(index.to_string());
                    self.items[index] = placeholder;
                }
            }
            while self.items.last().map_or(false, SchemaNode::is_empty) {
                self.items.pop();
            }
        } else if let Some(item) = self.items.first_mut() {
            if prune_child(item, patterns, threshold, dropped) {
                self.items.clear();
            }
        }
    }
}

/// Prune one child, returning whether the parent should remove it
fn prune_child(
    child: &mut SchemaNode,
    patterns: &[Regex],
    threshold: &PruneThreshold,
    dropped: &mut Vec<Dropped>,
) -> bool {
    // Tuple placeholders are left alone
    if child.is_empty() {
        return false;
    }
    let path = child.path_string();
    if patterns.iter().any(|re| re.is_match(&path)) {
        trace!(path = %path, "dropping node matching pattern");
        dropped.push(Dropped::Node { path });
        return true;
    }
    child.prune_into(patterns, threshold, dropped);
    child.types.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::FitContext;
    use jsonvec_extractors::default_rules;
    use serde_json::{json, Value};

    fn learn(tuple_arrays: bool, docs: &[Value]) -> SchemaNode {
        let mut root = SchemaNode::new(tuple_arrays);
        root.extend_all(docs).unwrap();
        root
    }

    fn re(pattern: &str) -> Regex {
        Regex::new(pattern).unwrap()
    }

    #[test]
    fn test_noop_prune() {
        let mut root = learn(true, &[json!({"a": [1, "x"], "b": null}), json!({"a": [true]})]);
        let before = root.clone();
        assert!(root.prune(&[], &PruneThreshold::Count(0)).is_empty());
        assert_eq!(root, before);
    }

    #[test]
    fn test_sparse_type_dropped() {
        let mut docs: Vec<Value> = (0..9).map(|i| json!(format!("s{}", i))).collect();
        docs.push(json!(3.5));
        let mut root = learn(false, &docs);

        let dropped = root.prune(&[], &PruneThreshold::Count(2));
        assert_eq!(
            dropped,
            vec![Dropped::Type { path: "root".to_string(), ty: JsonType::Number }]
        );
        assert_eq!(root.types().iter().copied().collect::<Vec<_>>(), vec![JsonType::String]);
        assert_eq!(root.count(JsonType::Number), 0);
        assert!(root.samples(JsonType::Number).is_empty());
        assert_eq!(root.samples(JsonType::String).len(), 9);
    }

    #[test]
    fn test_pattern_drops_subtree() {
        let mut root = learn(false, &[json!({"id": 1, "meta": {"x": 1}, "name": "a"})]);
        let dropped = root.prune(&[re(r"^root\.(id|meta)$")], &PruneThreshold::Count(0));
        assert_eq!(dropped.iter().map(Dropped::path).collect::<Vec<_>>(), vec!["root.id", "root.meta"]);
        assert_eq!(root.properties().keys().collect::<Vec<_>>(), vec!["name"]);
        assert_eq!(root.required().unwrap().iter().collect::<Vec<_>>(), vec!["name"]);
    }

    #[test]
    fn test_emptied_child_removed() {
        let mut root = learn(false, &[json!({"a": 1, "rare": "x"}), json!({"a": 2}), json!({"a": 3})]);
        let dropped = root.prune(&[], &PruneThreshold::Count(2));
        assert_eq!(dropped, vec![Dropped::Node { path: "root.rare".to_string() }]);
        assert!(root.property("rare").is_none());
        assert!(root.property("a").is_some());
    }

    #[test]
    fn test_dropping_object_clears_properties() {
        let docs = vec![json!({"a": 1}), json!("x"), json!("y"), json!("z")];
        let mut root = learn(false, &docs);
        let dropped = root.prune(&[], &PruneThreshold::Count(2));
        assert_eq!(dropped, vec![Dropped::Type { path: "root".to_string(), ty: JsonType::Object }]);
        assert!(root.properties().is_empty());
        assert!(root.required().is_none());
    }

    #[test]
    fn test_local_and_global_proportions() {
        let mut docs: Vec<Value> = (0..8).map(|i| json!({"a": i})).collect();
        docs.push(json!({"a": 1, "b": "x"}));
        docs.push(json!({"a": 2, "b": 7}));

        // Locally "b" holds one string out of two values
        let mut local = learn(false, &docs);
        let threshold = PruneThreshold::Proportion { fraction: 0.5, basis: FrequencyBasis::Local };
        assert!(local.prune(&[], &threshold).is_empty());

        // Against the ten documents learned both types are rare
        let mut global = learn(false, &docs);
        let threshold = PruneThreshold::Proportion { fraction: 0.2, basis: FrequencyBasis::Global(10) };
        let dropped = global.prune(&[], &threshold);
        assert_eq!(dropped, vec![Dropped::Node { path: "root.b".to_string() }]);
    }

    #[test]
    fn test_tuple_positions_preserved() {
        let mut root = learn(true, &[json!([1, "x", true]), json!([2, "y", false])]);
        let dropped = root.prune(&[re(r"^root\.1$")], &PruneThreshold::Count(0));
        assert_eq!(dropped, vec![Dropped::Node { path: "root.1".to_string() }]);
        assert_eq!(root.items().len(), 3);
        assert!(root.items()[1].is_empty());
        assert_eq!(root.items()[2].path_string(), "root.2");

        // Placeholders are skipped, trailing empties are popped
        assert!(root.prune(&[re(r"^root\.1$")], &PruneThreshold::Count(0)).is_empty());
        root.prune(&[re(r"^root\.2$")], &PruneThreshold::Count(0));
        assert_eq!(root.items().len(), 1);
    }

    #[test]
    fn test_prune_idempotent() {
        let docs = vec![
            json!({"a": 1, "b": [1, 2], "c": "x"}),
            json!({"a": "y", "b": [3]}),
            json!({"a": 2, "b": "z"}),
        ];
        let mut root = learn(false, &docs);
        let patterns = [re(r"\.c$")];
        let threshold = PruneThreshold::Count(2);
        root.prune(&patterns, &threshold);
        let once = root.clone();
        assert!(root.prune(&patterns, &threshold).is_empty());
        assert_eq!(root, once);
    }

    #[test]
    fn test_display() {
        let d = Dropped::Type { path: "root.a".to_string(), ty: JsonType::String };
        assert_eq!(d.to_string(), "root.a -> string");
        assert_eq!(Dropped::Node { path: "root.b".to_string() }.to_string(), "root.b");
    }

    #[test]
    fn test_pruning_fitted_tree_resets_fit() {
        let docs = vec![json!({"a": true}), json!({"a": false, "c": "x"}), json!({"a": true})];
        let mut root = learn(false, &docs);
        let rules = default_rules();
        let ctx = FitContext { n_total: docs.len(), rules: &rules, ignore: &[] };
        root.fit(&ctx).unwrap();
        assert!(root.feature_names().contains(&"root has property c".to_string()));

        let dropped = root.prune(&[re(r"^root\.c$")], &PruneThreshold::Count(0));
        assert_eq!(dropped, vec![Dropped::Node { path: "root.c".to_string() }]);
        assert!(!root.is_fitted());
        assert!(!root.property("a").unwrap().is_fitted());
        assert_eq!(root.total_feature_count(), 0);
        assert!(root.feature_names().is_empty());

        // Surviving extractors are reused without new samples
        assert_eq!(root.fit(&ctx).unwrap(), 1);
        assert_eq!(root.feature_names(), vec!["root.a = True".to_string()]);
    }

    #[test]
    fn test_noop_prune_keeps_fit() {
        let docs = vec![json!({"a": true}), json!({"a": false})];
        let mut root = learn(false, &docs);
        let rules = default_rules();
        root.fit(&FitContext { n_total: docs.len(), rules: &rules, ignore: &[] }).unwrap();
        assert!(root.prune(&[], &PruneThreshold::Count(1)).is_empty());
        assert!(root.is_fitted());
        assert_eq!(root.feature_names(), vec!["root.a = True".to_string()]);
    }
}
