//! Batch transformation into a sparse matrix
//!
//! A batch travels down the fitted tree together with the matrix row of
//! every document. Each node writes its own hits, then splits the batch by
//! property or array position and hands the pieces to its children.

use crate::fit::ColumnCursor;
use crate::node::SchemaNode;
use jsonvec_core::{classify, Error, JsonType, Result, SparseBoolMatrix};
use jsonvec_extractors::Extractor;
use serde_json::Value;
use std::collections::BTreeMap;

/// Documents of one type together with their matrix rows
#[derive(Debug, Default, Clone)]
struct Batch<'a> {
    documents: Vec<&'a Value>,
    rows: Vec<usize>,
}

impl<'a> Batch<'a> {
    fn push(&mut self, document: &'a Value, row: usize) {
        self.documents.push(document);
        self.rows.push(row);
    }

    fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl SchemaNode {
    /// Write the features of `documents` into `matrix`, document `i` going
    /// to row `rows[i]`
    ///
    /// Documents whose type was never observed at this node are skipped
    /// together with their subtree.
    pub fn transform(&self, documents: &[&Value], rows: &[usize], matrix: &mut SparseBoolMatrix) -> Result<()> {
        if documents.len() != rows.len() {
            return Err(Error::StructuralMismatch(format!(
                "{} documents but {} rows at {}",
                documents.len(),
                rows.len(),
                self.path_string()
            )));
        }
        let state = self
            .fitted_state()
            .ok_or_else(|| Error::NotFitted(self.path_string()))?;
        if documents.is_empty() {
            return Ok(());
        }

        let mut by_type: BTreeMap<JsonType, Batch<'_>> = BTreeMap::new();
        for (&document, &row) in documents.iter().zip(rows) {
            let ty = classify(document)?;
            if self.types.contains(&ty) {
                by_type.entry(ty).or_default().push(document, row);
            }
        }

        let mut cursor = ColumnCursor::new(state.column_offset);
        let polymorphic = self.types.len() > 1;
        for &ty in &self.types {
            let batch = by_type.get(&ty);
            if polymorphic {
                let col = cursor.advance(1);
                if let Some(batch) = batch {
                    matrix.insert_column_for_rows(&batch.rows, col)?;
                }
            }
            if ty == JsonType::Object {
                for name in self.optional_properties() {
                    let col = cursor.advance(1);
                    if let Some(batch) = batch {
                        let hits: Vec<usize> = batch
                            .documents
                            .iter()
                            .zip(&batch.rows)
                            .filter(|(document, _)| document.get(name).is_some())
                            .map(|(_, &row)| row)
                            .collect();
                        matrix.insert_column_for_rows(&hits, col)?;
                    }
                }
            }
            if let Some(extractor) = state.extractors.get(&ty) {
                let block = cursor.advance(extractor.n_features());
                if let Some(batch) = batch {
                    let local = extractor.transform(&batch.documents);
                    let (mut hit_rows, mut hit_cols) = (Vec::new(), Vec::new());
                    for (cols, &row) in local.iter().zip(&batch.rows) {
                        for &col in cols {
                            hit_rows.push(row);
                            hit_cols.push(block + col);
                        }
                    }
                    matrix.insert_pairs(&hit_rows, &hit_cols)?;
                }
            }
        }

        if let Some(objects) = by_type.get(&JsonType::Object) {
            for (name, child) in &self.properties {
                let mut sub = Batch::default();
                for (&document, &row) in objects.documents.iter().zip(&objects.rows) {
                    if let Some(value) = document.get(name) {
                        sub.push(value, row);
                    }
                }
                if !sub.is_empty() {
                    child.transform(&sub.documents, &sub.rows, matrix)?;
                }
            }
        }

        if let Some(arrays) = by_type.get(&JsonType::Array) {
            if !self.items.is_empty() {
                let n_slots = if self.tuple_arrays { self.items.len() } else { 1 };
                let mut slots = vec![Batch::default(); n_slots];
                for (&document, &row) in arrays.documents.iter().zip(&arrays.rows) {
                    let Value::Array(elements) = document else {
                        continue;
                    };
                    for (index, element) in elements.iter().enumerate() {
                        if self.tuple_arrays {
                            if index >= n_slots {
                                break;
                            }
                            slots[index].push(element, row);
                        } else {
                            slots[0].push(element, row);
                        }
                    }
                }
                for (item, slot) in self.items.iter().zip(&slots) {
                    if !slot.is_empty() {
                        item.transform(&slot.documents, &slot.rows, matrix)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::FitContext;
    use jsonvec_extractors::default_rules;
    use serde_json::json;

    fn fitted(tuple_arrays: bool, docs: &[Value]) -> SchemaNode {
        let mut root = SchemaNode::new(tuple_arrays);
        root.extend_all(docs).unwrap();
        let rules = default_rules();
        root.fit(&FitContext { n_total: docs.len(), rules: &rules, ignore: &[] }).unwrap();
        root
    }

    fn run(root: &SchemaNode, docs: &[Value]) -> SparseBoolMatrix {
        let refs: Vec<&Value> = docs.iter().collect();
        let rows: Vec<usize> = (0..docs.len()).collect();
        let mut matrix = SparseBoolMatrix::new(docs.len(), root.total_feature_count());
        root.transform(&refs, &rows, &mut matrix).unwrap();
        matrix
    }

    fn column(root: &SchemaNode, name: &str) -> usize {
        root.feature_names().iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn test_type_indicators() {
        let docs = vec![json!("a"), json!(1), json!(null), json!("b")];
        let root = fitted(false, &docs);
        let matrix = run(&root, &docs);
        assert_eq!(matrix.shape(), (4, root.total_feature_count()));

        let is_string = column(&root, "root is string");
        let is_null = column(&root, "root is null");
        for (row, doc) in docs.iter().enumerate() {
            assert_eq!(matrix.get(row, is_string), doc.is_string());
            assert_eq!(matrix.get(row, is_null), doc.is_null());
        }
    }

    #[test]
    fn test_optional_property_indicator() {
        let docs = vec![json!({"a": 1}), json!({"a": 2, "b": true}), json!({"a": 3, "b": false})];
        let root = fitted(false, &docs);
        let col = column(&root, "root has property b");
        let matrix = run(&root, &docs);
        assert!(!matrix.get(0, col));
        assert!(matrix.get(1, col));
        assert!(matrix.get(2, col));

        let flag = column(&root, "root.b = True");
        assert!(matrix.get(1, flag));
        assert!(!matrix.get(2, flag));
    }

    #[test]
    fn test_unknown_types_skipped() {
        let docs = vec![json!({"a": true}), json!({"a": false})];
        let root = fitted(false, &docs);
        let matrix = run(&root, &[json!({"a": "text"}), json!([1, 2]), json!({"z": 1})]);
        assert_eq!(matrix.nnz(), 0);
    }

    #[test]
    fn test_tuple_arrays_are_positional() {
        let docs = vec![json!([true, false]), json!([false, true])];
        let root = fitted(true, &docs);
        assert_eq!(
            root.feature_names(),
            vec!["root.0 = True".to_string(), "root.1 = True".to_string()]
        );
        let matrix = run(&root, &[json!([true, false, true]), json!([false])]);
        assert_eq!(matrix.row(0), Some(&[0][..]));
        assert!(matrix.row(1).unwrap().is_empty());
    }

    #[test]
    fn test_shared_arrays_merge_positions() {
        let docs = vec![json!([true, false]), json!([false])];
        let root = fitted(false, &docs);
        assert_eq!(root.feature_names(), vec!["root.0 = True".to_string()]);
        let matrix = run(&root, &[json!([false, false, true]), json!([false])]);
        assert_eq!(matrix.row(0), Some(&[0][..]));
        assert!(matrix.row(1).unwrap().is_empty());
    }

    #[test]
    fn test_row_mapping() {
        let docs = vec![json!(true), json!(false)];
        let root = fitted(false, &docs);
        let batch = [json!(true)];
        let refs: Vec<&Value> = batch.iter().collect();
        let mut matrix = SparseBoolMatrix::new(3, root.total_feature_count());
        root.transform(&refs, &[2], &mut matrix).unwrap();
        assert!(matrix.get(2, 0));
        assert_eq!(matrix.nnz(), 1);
    }

    #[test]
    fn test_errors() {
        let docs = vec![json!(true), json!(false)];
        let root = fitted(false, &docs);
        let refs: Vec<&Value> = docs.iter().collect();
        let mut matrix = SparseBoolMatrix::new(2, root.total_feature_count());

        let err = root.transform(&refs, &[0], &mut matrix).unwrap_err();
        assert!(matches!(err, Error::StructuralMismatch(_)));

        let err = root.transform(&refs, &[5, 0], &mut matrix).unwrap_err();
        assert!(matches!(err, Error::StructuralMismatch(_)));

        let mut unfitted = SchemaNode::new(false);
        unfitted.extend(&json!(true)).unwrap();
        let err = unfitted.transform(&refs, &[0, 1], &mut matrix).unwrap_err();
        assert_eq!(err, Error::NotFitted("root".to_string()));
    }
}
