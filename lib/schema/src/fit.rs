//! Fitting and column assignment
//!
//! Walks the tree in pre-order (node, then properties in lexicographic
//! order, then items in index order), fits one extractor per type where a
//! rule applies, and assigns every node a contiguous block of columns.
//! Buffered samples are consumed as each node transitions to
//! [`NodePhase::Fitted`]. A type that already has an extractor from an
//! earlier fit keeps it; only types without one are fitted on samples.

use crate::node::{FittedState, NodePhase, SchemaNode};
use jsonvec_core::{JsonType, Result};
use jsonvec_extractors::{select_rule, Extractor, ExtractorContext, ExtractorRule};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Inputs shared by every node of one `fit` call
#[derive(Debug, Clone, Copy)]
pub struct FitContext<'a> {
    /// Grand total number of learned documents
    pub n_total: usize,
    /// Ordered rule table, first match wins
    pub rules: &'a [ExtractorRule],
    /// Paths matching any of these get no extractor
    pub ignore: &'a [Regex],
}

/// Next free column, threaded through one pre-order walk
#[derive(Debug, Default)]
pub struct ColumnCursor {
    next: usize,
}

impl ColumnCursor {
    pub fn new(start: usize) -> Self {
        Self { next: start }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.next
    }

    /// Reserve `n` columns, returning the first
    pub fn advance(&mut self, n: usize) -> usize {
        let start = self.next;
        self.next += n;
        start
    }
}

pub(crate) fn type_indicator_name(path: &str, ty: JsonType) -> String {
    format!("{} is {}", path, ty)
}

pub(crate) fn property_indicator_name(path: &str, property: &str) -> String {
    format!("{} has property {}", path, property)
}

impl SchemaNode {
    /// Fit the subtree and return the total number of features
    pub fn fit(&mut self, ctx: &FitContext<'_>) -> Result<usize> {
        let mut cursor = ColumnCursor::new(0);
        self.fit_at(ctx, &mut cursor)?;
        Ok(cursor.position())
    }

    fn fit_at(&mut self, ctx: &FitContext<'_>, cursor: &mut ColumnCursor) -> Result<()> {
        let path = self.path_string();
        let (mut samples, mut retained) = match std::mem::take(&mut self.phase) {
            NodePhase::Collecting { samples, retained } => (samples, retained),
            NodePhase::Fitted(state) => (BTreeMap::new(), state.extractors),
        };
        let ignored = ctx.ignore.iter().any(|re| re.is_match(&path));
        let polymorphic = self.types.len() > 1;

        let mut names = Vec::new();
        let mut extractors = BTreeMap::new();
        for &ty in &self.types {
            if polymorphic {
                names.push(type_indicator_name(&path, ty));
            }
            if ty == JsonType::Object {
                names.extend(self.optional_properties().map(|p| property_indicator_name(&path, p)));
            }

            let values: Vec<Value> = samples.remove(&ty).unwrap_or_default();
            let previous = retained.remove(&ty);
            if ignored {
                continue;
            }
            let Some(rule) = select_rule(ctx.rules, ty, &path) else {
                continue;
            };
            let fitted = match previous {
                Some(extractor) => Some(extractor),
                None if values.is_empty() => {
                    warn!(path = %path, ty = %ty, "no samples to fit extractor on");
                    None
                }
                None => {
                    let refs: Vec<&Value> = values.iter().collect();
                    let ectx = ExtractorContext { n_total: ctx.n_total, path: &path };
                    rule.extractor.fit(&refs, &ectx)?
                }
            };
            if let Some(extractor) = fitted {
                names.extend(extractor.feature_names().iter().map(|name| format!("{} {}", path, name)));
                extractors.insert(ty, extractor);
            }
        }

        let local = names.len();
        let column_offset = cursor.advance(local);
        self.phase = NodePhase::Fitted(FittedState {
            extractors,
            local_feature_names: names,
            column_offset,
            total_feature_count: local,
        });

        let mut total = local;
        for child in self.properties.values_mut() {
            child.fit_at(ctx, cursor)?;
            total += child.total_feature_count();
        }
        for item in &mut self.items {
            item.fit_at(ctx, cursor)?;
            total += item.total_feature_count();
        }
        if let NodePhase::Fitted(state) = &mut self.phase {
            state.total_feature_count = total;
        }
        Ok(())
    }

    /// Features of this subtree; zero before fitting
    pub fn total_feature_count(&self) -> usize {
        self.fitted_state().map_or(0, |state| state.total_feature_count)
    }

    /// First column of this node's block
    pub fn column_offset(&self) -> Option<usize> {
        self.fitted_state().map(|state| state.column_offset)
    }

    /// Feature names of the subtree, ordered by column
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.total_feature_count());
        self.collect_feature_names(&mut names);
        names
    }

    fn collect_feature_names(&self, names: &mut Vec<String>) {
        if let Some(state) = self.fitted_state() {
            names.extend(state.local_feature_names.iter().cloned());
        }
        for child in self.properties.values() {
            child.collect_feature_names(names);
        }
        for item in &self.items {
            item.collect_feature_names(names);
        }
    }
}
