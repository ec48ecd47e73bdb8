//! JSON vectorizer
//!
//! Ties a schema tree to the rule table and ignore list used when fitting
//! it, and keeps the feature names of the last fit. This is the entry point
//! most callers need: extend with learning documents, optionally prune,
//! fit, then transform batches into sparse matrices.

use crate::fit::FitContext;
use crate::node::SchemaNode;
use crate::prune::{Dropped, FrequencyBasis, PruneThreshold};
use crate::repr::NodeRepr;
use jsonvec_core::{Error, Result, SparseBoolMatrix};
use jsonvec_extractors::{compile_patterns, default_rules, ExtractorRule, RuleSpec, Threshold};
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Default number of documents per parallel transform chunk
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Version written into snapshots
pub const SNAPSHOT_VERSION: u32 = 1;

/// Which total a proportional `min_frequency` refers to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasisKind {
    /// Values observed at each node
    #[default]
    Local,
    /// Documents learned by the vectorizer
    Global,
}

/// Pruning parameters as written in a config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PruneSpec {
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default = "zero_threshold")]
    pub min_frequency: Threshold,
    #[serde(default)]
    pub basis: BasisKind,
}

fn zero_threshold() -> Threshold {
    Threshold::Count(0)
}

impl Default for PruneSpec {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            min_frequency: zero_threshold(),
            basis: BasisKind::Local,
        }
    }
}

impl PruneSpec {
    /// Resolve against the number of learned documents
    pub fn threshold(&self, n_documents: u64) -> PruneThreshold {
        match self.min_frequency {
            Threshold::Count(n) => PruneThreshold::Count(n),
            Threshold::Proportion(fraction) => PruneThreshold::Proportion {
                fraction,
                basis: match self.basis {
                    BasisKind::Local => FrequencyBasis::Local,
                    BasisKind::Global => FrequencyBasis::Global(n_documents),
                },
            },
        }
    }
}

/// Vectorizer configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    #[serde(default)]
    pub tuple_arrays: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prune: Option<PruneSpec>,
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Falls back to [`default_rules`] when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RuleSpec>>,
}

impl VectorizerConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Compile patterns and rules into an empty vectorizer
    pub fn build(&self) -> Result<JsonVectorizer> {
        let mut builder = VectorizerBuilder::new()
            .tuple_arrays(self.tuple_arrays)
            .ignore(self.ignore.iter().cloned());
        if let Some(specs) = &self.rules {
            let rules = specs.iter().map(RuleSpec::compile).collect::<Result<Vec<_>>>()?;
            builder = builder.rules(rules);
        }
        builder.build()
    }
}

/// Persisted form of a vectorizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerSnapshot {
    pub version: u32,
    pub tuple_arrays: bool,
    pub n_documents: u64,
    pub rules: Vec<RuleSpec>,
    pub ignore: Vec<String>,
    pub schema: NodeRepr,
}

/// Schema tree plus the parameters used to fit it
#[derive(Debug, Clone)]
pub struct JsonVectorizer {
    schema: SchemaNode,
    rules: Vec<ExtractorRule>,
    ignore: Vec<Regex>,
    feature_names: Vec<String>,
}

impl Default for JsonVectorizer {
    fn default() -> Self {
        Self::new(false)
    }
}

impl JsonVectorizer {
    /// Empty vectorizer with the default rule table
    pub fn new(tuple_arrays: bool) -> Self {
        Self {
            schema: SchemaNode::new(tuple_arrays),
            rules: default_rules(),
            ignore: Vec::new(),
            feature_names: Vec::new(),
        }
    }

    pub fn builder() -> VectorizerBuilder {
        VectorizerBuilder::new()
    }

    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    pub fn rules(&self) -> &[ExtractorRule] {
        &self.rules
    }

    pub fn ignore(&self) -> &[Regex] {
        &self.ignore
    }

    /// Number of learned documents
    pub fn n_documents(&self) -> u64 {
        self.schema.total_count()
    }

    pub fn is_fitted(&self) -> bool {
        self.schema.is_fitted()
    }

    /// Feature names of the last fit, ordered by column
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Learn the structure of more documents
    pub fn extend(&mut self, documents: &[Value]) -> Result<()> {
        self.schema.extend_all(documents)?;
        if !self.schema.is_fitted() {
            self.feature_names.clear();
        }
        debug!(
            documents = documents.len(),
            total = self.n_documents(),
            nodes = self.schema.node_count(),
            "extended schema"
        );
        Ok(())
    }

    /// Prune the schema; a fitted vectorizer that loses anything must be
    /// fitted again
    pub fn prune(&mut self, patterns: &[Regex], threshold: &PruneThreshold) -> Vec<Dropped> {
        let dropped = self.schema.prune(patterns, threshold);
        if !dropped.is_empty() {
            self.feature_names.clear();
        }
        debug!(dropped = dropped.len(), nodes = self.schema.node_count(), "pruned schema");
        dropped
    }

    /// Prune with parameters from a config file
    pub fn prune_with(&mut self, spec: &PruneSpec) -> Result<Vec<Dropped>> {
        let patterns = compile_patterns(&spec.patterns)?;
        let threshold = spec.threshold(self.n_documents());
        Ok(self.prune(&patterns, &threshold))
    }

    /// Fit extractors, optionally learning `documents` first, and return
    /// the number of features
    pub fn fit(&mut self, documents: Option<&[Value]>) -> Result<usize> {
        if let Some(documents) = documents {
            self.extend(documents)?;
        }
        let n_total = usize::try_from(self.n_documents()).unwrap_or(usize::MAX);
        let ctx = FitContext {
            n_total,
            rules: &self.rules,
            ignore: &self.ignore,
        };
        let n_features = self.schema.fit(&ctx)?;
        self.feature_names = self.schema.feature_names();
        debug!(
            features = n_features,
            documents = n_total,
            nodes = self.schema.node_count(),
            "fitted vectorizer"
        );
        Ok(n_features)
    }

    /// Transform a batch into a `(documents, features)` matrix
    pub fn transform(&self, documents: &[Value]) -> Result<SparseBoolMatrix> {
        if !self.schema.is_fitted() {
            return Err(Error::NotFitted(self.schema.path_string()));
        }
        let refs: Vec<&Value> = documents.iter().collect();
        let rows: Vec<usize> = (0..documents.len()).collect();
        let mut matrix = SparseBoolMatrix::new(documents.len(), self.schema.total_feature_count());
        self.schema.transform(&refs, &rows, &mut matrix)?;
        Ok(matrix)
    }

    /// Hot columns of a single document
    pub fn transform_one(&self, document: &Value) -> Result<Vec<usize>> {
        let matrix = self.transform(std::slice::from_ref(document))?;
        Ok(matrix.row(0).map(<[usize]>::to_vec).unwrap_or_default())
    }

    /// Same result as [`JsonVectorizer::transform`], chunks of
    /// `chunk_size` documents transformed in parallel
    pub fn par_transform(&self, documents: &[Value], chunk_size: usize) -> Result<SparseBoolMatrix> {
        if !self.schema.is_fitted() {
            return Err(Error::NotFitted(self.schema.path_string()));
        }
        let blocks = documents
            .par_chunks(chunk_size.max(1))
            .map(|chunk| self.transform(chunk))
            .collect::<Result<Vec<_>>>()?;
        if blocks.is_empty() {
            return Ok(SparseBoolMatrix::new(0, self.schema.total_feature_count()));
        }
        SparseBoolMatrix::vstack(blocks)
    }

    pub fn snapshot(&self) -> VectorizerSnapshot {
        VectorizerSnapshot {
            version: SNAPSHOT_VERSION,
            tuple_arrays: self.schema.tuple_arrays(),
            n_documents: self.n_documents(),
            rules: self.rules.iter().map(RuleSpec::from).collect(),
            ignore: self.ignore.iter().map(|re| re.as_str().to_string()).collect(),
            schema: self.schema.to_representation(),
        }
    }

    pub fn from_snapshot(snapshot: &VectorizerSnapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::InvalidConfig(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        let schema = SchemaNode::from_representation(&snapshot.schema)?;
        let rules = snapshot.rules.iter().map(RuleSpec::compile).collect::<Result<Vec<_>>>()?;
        let ignore = compile_patterns(&snapshot.ignore)?;
        let feature_names = schema.feature_names();
        Ok(Self {
            schema,
            rules,
            ignore,
            feature_names,
        })
    }
}

/// Builder for [`JsonVectorizer`]
#[derive(Debug, Clone)]
pub struct VectorizerBuilder {
    tuple_arrays: bool,
    rules: Vec<ExtractorRule>,
    ignore: Vec<String>,
}

impl Default for VectorizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorizerBuilder {
    pub fn new() -> Self {
        Self {
            tuple_arrays: false,
            rules: default_rules(),
            ignore: Vec::new(),
        }
    }

    /// One schema per array position instead of a shared item schema
    pub fn tuple_arrays(mut self, tuple_arrays: bool) -> Self {
        self.tuple_arrays = tuple_arrays;
        self
    }

    /// Replace the rule table
    pub fn rules(mut self, rules: Vec<ExtractorRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Prepend a rule, giving it priority over the current table
    pub fn rule(mut self, rule: ExtractorRule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    /// Add path patterns that get no extractor
    pub fn ignore<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<JsonVectorizer> {
        let ignore = compile_patterns(&self.ignore)?;
        Ok(JsonVectorizer {
            schema: SchemaNode::new(self.tuple_arrays),
            rules: self.rules,
            ignore,
            feature_names: Vec::new(),
        })
    }
}
