//! Thread-safe vectorizer handle
//!
//! A [`JsonVectorizer`] behind `Arc<RwLock<..>>`. Learning, pruning and
//! fitting take the write lock; transforms share the read lock so batches
//! from several threads can be vectorized concurrently once fitted.

use crate::prune::{Dropped, PruneThreshold};
use crate::vectorizer::{JsonVectorizer, PruneSpec, VectorizerSnapshot};
use jsonvec_core::{Result, SparseBoolMatrix};
use parking_lot::RwLock;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct SharedVectorizer {
    inner: Arc<RwLock<JsonVectorizer>>,
}

impl SharedVectorizer {
    pub fn new(vectorizer: JsonVectorizer) -> Self {
        Self {
            inner: Arc::new(RwLock::new(vectorizer)),
        }
    }

    pub fn extend(&self, documents: &[Value]) -> Result<()> {
        self.inner.write().extend(documents)
    }

    pub fn prune(&self, patterns: &[Regex], threshold: &PruneThreshold) -> Vec<Dropped> {
        self.inner.write().prune(patterns, threshold)
    }

    pub fn prune_with(&self, spec: &PruneSpec) -> Result<Vec<Dropped>> {
        self.inner.write().prune_with(spec)
    }

    pub fn fit(&self, documents: Option<&[Value]>) -> Result<usize> {
        self.inner.write().fit(documents)
    }

    pub fn transform(&self, documents: &[Value]) -> Result<SparseBoolMatrix> {
        self.inner.read().transform(documents)
    }

    pub fn par_transform(&self, documents: &[Value], chunk_size: usize) -> Result<SparseBoolMatrix> {
        self.inner.read().par_transform(documents, chunk_size)
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.inner.read().feature_names().to_vec()
    }

    pub fn n_documents(&self) -> u64 {
        self.inner.read().n_documents()
    }

    pub fn is_fitted(&self) -> bool {
        self.inner.read().is_fitted()
    }

    pub fn snapshot(&self) -> VectorizerSnapshot {
        self.inner.read().snapshot()
    }

    /// Run `f` with read access to the wrapped vectorizer
    pub fn with_vectorizer<R>(&self, f: impl FnOnce(&JsonVectorizer) -> R) -> R {
        f(&self.inner.read())
    }
}

impl From<JsonVectorizer> for SharedVectorizer {
    fn from(vectorizer: JsonVectorizer) -> Self {
        Self::new(vectorizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread;

    #[test]
    fn test_concurrent_transforms() {
        let docs: Vec<Value> = (0..20).map(|i| json!({"flag": i % 2 == 0, "n": i})).collect();
        let shared = SharedVectorizer::new(JsonVectorizer::new(false));
        shared.fit(Some(&docs)).unwrap();
        let expected = shared.transform(&docs).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                let docs = docs.clone();
                thread::spawn(move || shared.transform(&docs).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    fn test_writes_visible_to_clones() {
        let shared = SharedVectorizer::default();
        let other = shared.clone();
        shared.extend(&[json!({"a": 1})]).unwrap();
        assert_eq!(other.n_documents(), 1);
        assert!(!other.is_fitted());
        other.fit(None).unwrap();
        assert!(shared.with_vectorizer(|v| v.is_fitted()));
    }

    #[test]
    fn test_refit_keeps_model() {
        let docs: Vec<Value> = (0..20).map(|i| json!({"flag": i % 2 == 0, "n": i})).collect();
        let shared = SharedVectorizer::new(JsonVectorizer::new(false));
        let n = shared.fit(Some(&docs)).unwrap();
        let expected = shared.transform(&docs).unwrap();
        assert_eq!(shared.fit(None).unwrap(), n);
        assert_eq!(shared.transform(&docs).unwrap(), expected);
    }
}
