//! Serializable schema representation
//!
//! One JSON object per node, camelCase keys, optional fields omitted when
//! empty. Fitted nodes additionally carry their column block and extractor
//! blobs so a fitted tree can be restored without its learning data.

use crate::node::{FittedState, NodePhase, SchemaNode, ROOT_SEGMENT};
use jsonvec_core::{Error, JsonType, Result};
use jsonvec_extractors::FittedExtractor;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRepr {
    #[serde(default)]
    pub tuple_arrays: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, NodeRepr>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<NodeRepr>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<BTreeMap<String, u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fitted_extractors: Option<BTreeMap<String, FittedExtractor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_feature_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_feature_count: Option<usize>,
}

impl NodeRepr {
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

impl SchemaNode {
    /// Representation of the subtree; sample buffers are not included
    pub fn to_representation(&self) -> NodeRepr {
        let mut type_names: Vec<String> = self.types.iter().map(|ty| ty.name().to_string()).collect();
        type_names.sort();
        let mut repr = NodeRepr {
            tuple_arrays: self.tuple_arrays,
            types: non_empty(type_names),
            required: self.required.as_ref().map(|req| req.iter().cloned().collect()),
            properties: None,
            items: non_empty(self.items.iter().map(SchemaNode::to_representation).collect()),
            counts: None,
            ..NodeRepr::default()
        };
        if !self.properties.is_empty() {
            repr.properties = Some(
                self.properties
                    .iter()
                    .map(|(name, child)| (name.clone(), child.to_representation()))
                    .collect(),
            );
        }
        if !self.counts.is_empty() {
            repr.counts = Some(
                self.counts
                    .iter()
                    .map(|(ty, count)| (ty.name().to_string(), *count))
                    .collect(),
            );
        }
        if let Some(state) = self.fitted_state() {
            repr.column_offset = Some(state.column_offset);
            repr.total_feature_count = Some(state.total_feature_count);
            repr.local_feature_names = Some(state.local_feature_names.clone());
            if !state.extractors.is_empty() {
                repr.fitted_extractors = Some(
                    state
                        .extractors
                        .iter()
                        .map(|(ty, extractor)| (ty.name().to_string(), extractor.clone()))
                        .collect(),
                );
            }
        }
        repr
    }

    /// Rebuild a root node from its representation
    pub fn from_representation(repr: &NodeRepr) -> Result<Self> {
        Self::from_repr_at(repr, vec![ROOT_SEGMENT.to_string()])
    }

    fn from_repr_at(repr: &NodeRepr, path: Vec<String>) -> Result<Self> {
        let mut node = SchemaNode::with_path(path, repr.tuple_arrays);

        if let Some(names) = &repr.types {
            node.types = names.iter().map(|name| name.parse()).collect::<Result<BTreeSet<JsonType>>>()?;
        }
        if let Some(counts) = &repr.counts {
            for (name, count) in counts {
                node.counts.insert(name.parse()?, *count);
            }
        }
        if let Some(properties) = &repr.properties {
            for (name, child) in properties {
                let mut child_path = node.path.clone();
                child_path.push(name.clone());
                node.properties.insert(name.clone(), Self::from_repr_at(child, child_path)?);
            }
        }
        if let Some(required) = &repr.required {
            if let Some(missing) = required.iter().find(|name| !node.properties.contains_key(*name)) {
                return Err(Error::StructuralMismatch(format!(
                    "required property {} has no schema at {}",
                    missing,
                    node.path_string()
                )));
            }
            node.required = Some(required.iter().cloned().collect());
        }
        if let Some(items) = &repr.items {
            if !repr.tuple_arrays && items.len() > 1 {
                return Err(Error::StructuralMismatch(format!(
                    "{} shared item schemas at {}",
                    items.len(),
                    node.path_string()
                )));
            }
            for (index, item) in items.iter().enumerate() {
                let mut item_path = node.path.clone();
                item_path.push(index.to_string());
                node.items.push(Self::from_repr_at(item, item_path)?);
            }
        }

        if let (Some(column_offset), Some(total_feature_count)) = (repr.column_offset, repr.total_feature_count) {
            let mut extractors = BTreeMap::new();
            if let Some(blobs) = &repr.fitted_extractors {
                for (name, extractor) in blobs {
                    extractors.insert(name.parse::<JsonType>()?, extractor.clone());
                }
            }
            node.phase = NodePhase::Fitted(FittedState {
                extractors,
                local_feature_names: repr.local_feature_names.clone().unwrap_or_default(),
                column_offset,
                total_feature_count,
            });
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::FitContext;
    use jsonvec_core::SparseBoolMatrix;
    use jsonvec_extractors::default_rules;
    use serde_json::{json, Value};

    fn to_json_value(node: &SchemaNode) -> Value {
        node.to_representation().to_json().unwrap()
    }

    fn docs() -> Vec<Value> {
        vec![
            json!({"name": "alpha beta", "n": 1, "tags": ["x", true], "at": "2020-01-01T00:00:00Z"}),
            json!({"name": "beta gamma", "n": 2.5, "tags": [false]}),
            json!({"name": "gamma delta", "n": null, "at": "2021-01-01T00:00:00Z"}),
        ]
    }

    #[test]
    fn test_layout() {
        let mut root = SchemaNode::new(false);
        root.extend(&json!({"a": [1]})).unwrap();
        let repr = to_json_value(&root);
        assert_eq!(
            repr,
            json!({
                "tupleArrays": false,
                "type": ["object"],
                "required": ["a"],
                "properties": {
                    "a": {
                        "tupleArrays": false,
                        "type": ["array"],
                        "items": [{"tupleArrays": false, "type": ["number"], "counts": {"number": 1}}],
                        "counts": {"array": 1}
                    }
                },
                "counts": {"object": 1}
            })
        );
    }

    #[test]
    fn test_unfitted_roundtrip() {
        for tuple_arrays in [false, true] {
            let mut root = SchemaNode::new(tuple_arrays);
            root.extend_all(&docs()).unwrap();
            let repr = root.to_representation();
            let restored = SchemaNode::from_representation(&repr).unwrap();
            assert_eq!(restored.to_representation(), repr);
            assert!(!restored.is_fitted());
            assert_eq!(restored.property("tags").unwrap().path_string(), "root.tags");
        }
    }

    #[test]
    fn test_fitted_roundtrip_transforms_identically() {
        let docs = docs();
        let mut root = SchemaNode::new(false);
        root.extend_all(&docs).unwrap();
        let rules = default_rules();
        let n = root.fit(&FitContext { n_total: docs.len(), rules: &rules, ignore: &[] }).unwrap();

        let json = to_json_value(&root);
        let restored = SchemaNode::from_representation(&NodeRepr::from_json(json).unwrap()).unwrap();
        assert_eq!(restored, root);
        assert_eq!(restored.feature_names(), root.feature_names());

        let refs: Vec<&Value> = docs.iter().collect();
        let rows: Vec<usize> = (0..docs.len()).collect();
        let mut expected = SparseBoolMatrix::new(docs.len(), n);
        let mut actual = SparseBoolMatrix::new(docs.len(), n);
        root.transform(&refs, &rows, &mut expected).unwrap();
        restored.transform(&refs, &rows, &mut actual).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_declared_integer_accepted() {
        let repr = NodeRepr::from_json(json!({"type": ["integer", "null"], "counts": {"integer": 4}})).unwrap();
        let node = SchemaNode::from_representation(&repr).unwrap();
        assert!(node.types().contains(&JsonType::Integer));
        assert_eq!(node.count(JsonType::Integer), 4);
    }

    #[test]
    fn test_invalid_representations() {
        let repr = NodeRepr::from_json(json!({"type": ["float"]})).unwrap();
        assert_eq!(
            SchemaNode::from_representation(&repr).unwrap_err(),
            Error::InvalidTypeName("float".to_string())
        );

        let repr = NodeRepr::from_json(json!({"type": ["object"], "required": ["a"]})).unwrap();
        assert!(matches!(
            SchemaNode::from_representation(&repr),
            Err(Error::StructuralMismatch(_))
        ));

        let repr = NodeRepr::from_json(json!({
            "tupleArrays": false,
            "type": ["array"],
            "items": [{"type": ["null"]}, {"type": ["null"]}]
        }))
        .unwrap();
        assert!(matches!(
            SchemaNode::from_representation(&repr),
            Err(Error::StructuralMismatch(_))
        ));

        assert!(matches!(
            NodeRepr::from_json(json!({"type": "object"})),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_type_names_sorted() {
        let mut root = SchemaNode::new(false);
        root.extend_all(&[json!({"a": 1}), json!(null), json!("2021-01-01T00:00:00Z"), json!([true])])
            .unwrap();
        let json = to_json_value(&root);
        assert_eq!(json["type"], json!(["array", "null", "object", "timestamp"]));

        let restored = SchemaNode::from_representation(&root.to_representation()).unwrap();
        assert_eq!(restored.types(), root.types());
    }
}
