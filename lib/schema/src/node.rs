//! Schema tree node
//!
//! A [`SchemaNode`] describes one position of the inferred document
//! structure: which JSON types were observed there, how often, which
//! properties an object carries and which of them are always present, and
//! the schemas of array items. Leaf values are buffered per type while the
//! node is collecting, and replaced by fitted extractors once `fit` runs.
//! Extractors survive later learning: a refit only fits types that have
//! none yet.

use jsonvec_core::{classify, JsonType, Result};
use jsonvec_extractors::FittedExtractor;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Name of the root path segment
pub const ROOT_SEGMENT: &str = "root";

/// Separator used when joining path segments
pub const PATH_SEPARATOR: &str = ".";

/// State produced by fitting a node
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FittedState {
    pub extractors: BTreeMap<JsonType, FittedExtractor>,
    pub local_feature_names: Vec<String>,
    /// Global column of the node's first local feature
    pub column_offset: usize,
    /// Local features plus those of every descendant
    pub total_feature_count: usize,
}

/// Lifecycle of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodePhase {
    /// Learning: raw leaf values buffered per type
    Collecting {
        samples: BTreeMap<JsonType, Vec<Value>>,
        /// Extractors of an earlier fit, reused by the next one
        retained: BTreeMap<JsonType, FittedExtractor>,
    },
    /// Fitted: samples consumed, column block assigned
    Fitted(FittedState),
}

impl Default for NodePhase {
    fn default() -> Self {
        NodePhase::Collecting {
            samples: BTreeMap::new(),
            retained: BTreeMap::new(),
        }
    }
}

/// One node of the inferred schema tree
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub(crate) path: Vec<String>,
    pub(crate) tuple_arrays: bool,
    pub(crate) types: BTreeSet<JsonType>,
    pub(crate) required: Option<BTreeSet<String>>,
    pub(crate) properties: BTreeMap<String, SchemaNode>,
    pub(crate) items: Vec<SchemaNode>,
    pub(crate) counts: BTreeMap<JsonType, u64>,
    pub(crate) phase: NodePhase,
}

impl SchemaNode {
    /// Empty root node
    pub fn new(tuple_arrays: bool) -> Self {
        Self::with_path(vec![ROOT_SEGMENT.to_string()], tuple_arrays)
    }

    pub(crate) fn with_path(path: Vec<String>, tuple_arrays: bool) -> Self {
        Self {
            path,
            tuple_arrays,
            types: BTreeSet::new(),
            required: None,
            properties: BTreeMap::new(),
            items: Vec::new(),
            counts: BTreeMap::new(),
            phase: NodePhase::default(),
        }
    }

    /// Empty node one segment below this one
    pub(crate) fn child(&self, segment: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push(segment.into());
        Self::with_path(path, self.tuple_arrays)
    }

    /// Path segments from the root, root segment included
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Dotted path, as used in feature names and pattern matching
    pub fn path_string(&self) -> String {
        self.path.join(PATH_SEPARATOR)
    }

    pub fn tuple_arrays(&self) -> bool {
        self.tuple_arrays
    }

    pub fn types(&self) -> &BTreeSet<JsonType> {
        &self.types
    }

    /// Properties present in every object observed here, `None` before the
    /// first object
    pub fn required(&self) -> Option<&BTreeSet<String>> {
        self.required.as_ref()
    }

    pub fn properties(&self) -> &BTreeMap<String, SchemaNode> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties.get(name)
    }

    pub fn items(&self) -> &[SchemaNode] {
        &self.items
    }

    pub fn counts(&self) -> &BTreeMap<JsonType, u64> {
        &self.counts
    }

    /// Number of values of type `ty` observed here
    pub fn count(&self, ty: JsonType) -> u64 {
        self.counts.get(&ty).copied().unwrap_or(0)
    }

    /// Number of values observed here, all types together
    pub fn total_count(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn phase(&self) -> &NodePhase {
        &self.phase
    }

    /// Buffered samples of type `ty`; empty once fitted
    pub fn samples(&self, ty: JsonType) -> &[Value] {
        match &self.phase {
            NodePhase::Collecting { samples, .. } => samples.get(&ty).map(Vec::as_slice).unwrap_or(&[]),
            NodePhase::Fitted(_) => &[],
        }
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self.phase, NodePhase::Fitted(_))
    }

    pub fn fitted_state(&self) -> Option<&FittedState> {
        match &self.phase {
            NodePhase::Fitted(state) => Some(state),
            NodePhase::Collecting { .. } => None,
        }
    }

    /// Node that has never seen a value (or was pruned down to nothing)
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.properties.is_empty() && self.items.is_empty()
    }

    /// Properties not present in every observed object, lexicographic
    pub fn optional_properties(&self) -> impl Iterator<Item = &String> + '_ {
        self.properties
            .keys()
            .filter(move |name| !self.required.as_ref().map_or(false, |req| req.contains(*name)))
    }

    /// Number of nodes in this subtree
    pub fn node_count(&self) -> usize {
        1 + self.properties.values().map(SchemaNode::node_count).sum::<usize>()
            + self.items.iter().map(SchemaNode::node_count).sum::<usize>()
    }

    /// Update the subtree with one more document
    ///
    /// Fails only when a value cannot be classified; nodes already updated
    /// before the failure keep their changes.
    pub fn extend(&mut self, document: &Value) -> Result<()> {
        let ty = classify(document)?;

        self.unfit();
        self.types.insert(ty);
        *self.counts.entry(ty).or_insert(0) += 1;

        match document {
            Value::Object(map) => {
                for key in map.keys() {
                    if !self.properties.contains_key(key) {
                        let child = self.child(key.as_str());
                        self.properties.insert(key.clone(), child);
                    }
                }
                self.required = Some(match self.required.take() {
                    Some(required) => required.into_iter().filter(|name| map.contains_key(name)).collect(),
                    None => map.keys().cloned().collect(),
                });
                for (key, value) in map {
                    if let Some(child) = self.properties.get_mut(key) {
                        child.extend(value)?;
                    }
                }
            }
            Value::Array(elements) => {
                if self.tuple_arrays {
                    while self.items.len() < elements.len() {
                        let child = self.child(self.items.len().to_string());
                        self.items.push(child);
                    }
                    for (item, value) in self.items.iter_mut().zip(elements) {
                        item.extend(value)?;
                    }
                } else {
                    if self.items.is_empty() {
                        let child = self.child("0");
                        self.items.push(child);
                    }
                    for value in elements {
                        self.items[0].extend(value)?;
                    }
                }
            }
            _ if ty.is_leaf() => {
                if let NodePhase::Collecting { samples, .. } = &mut self.phase {
                    samples.entry(ty).or_default().push(document.clone());
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Extend with each document in order
    pub fn extend_all<'a, I>(&mut self, documents: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        for document in documents {
            self.extend(document)?;
        }
        Ok(())
    }

    /// Return the whole subtree to the learning phase
    ///
    /// Column blocks and names are discarded; extractors are retained for
    /// the next fit.
    pub fn reset_fit(&mut self) {
        self.unfit();
        for child in self.properties.values_mut() {
            child.reset_fit();
        }
        for item in &mut self.items {
            item.reset_fit();
        }
    }

    fn unfit(&mut self) {
        if let NodePhase::Fitted(state) = &mut self.phase {
            let retained = std::mem::take(&mut state.extractors);
            self.phase = NodePhase::Collecting {
                samples: BTreeMap::new(),
                retained,
            };
        }
    }

    /// Remove type `ty` together with everything hanging off it
    pub(crate) fn drop_type(&mut self, ty: JsonType) {
        self.types.remove(&ty);
        self.counts.remove(&ty);
        match &mut self.phase {
            NodePhase::Collecting { samples, retained } => {
                samples.remove(&ty);
                retained.remove(&ty);
            }
            NodePhase::Fitted(state) => {
                state.extractors.remove(&ty);
            }
        }
        match ty {
            JsonType::Object => {
                self.properties.clear();
                self.required = None;
            }
            JsonType::Array => self.items.clear(),
            _ => {}
        }
    }
}
