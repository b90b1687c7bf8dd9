//! Validated name-to-value mapping bound to one namespace.

use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::error::{PatchError, Result};
use crate::namespace::Namespace;
use crate::value::FeatureValue;

/// A mapping from feature name to value that enforces the owning
/// namespace's array-rank rule on every write.
///
/// Backed by a `BTreeMap` so enumeration is deterministic (lexical) at
/// serialization boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMap {
    namespace: Namespace,
    entries: BTreeMap<String, FeatureValue>,
}

impl FeatureMap {
    /// Create an empty map bound to the given namespace.
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            entries: BTreeMap::new(),
        }
    }

    /// Wrap existing entries, re-applying the rank check to every one.
    pub fn from_entries(
        namespace: Namespace,
        entries: BTreeMap<String, FeatureValue>,
    ) -> Result<Self> {
        let mut map = Self::new(namespace);
        for (name, value) in entries {
            map.insert(name, value)?;
        }
        Ok(map)
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Store a value, overwriting any existing entry for the name.
    ///
    /// For array namespaces the value must be an array of exactly the
    /// namespace's expected rank. Lazy values are accepted; their rank is
    /// only known once materialized.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) -> Result<()> {
        let value = value.into();

        if let Some(expected) = self.namespace.expected_rank() {
            match &value {
                FeatureValue::Array(array) => {
                    if array.ndim() != expected {
                        return Err(PatchError::Shape {
                            namespace: self.namespace,
                            expected,
                            actual: array.ndim(),
                        });
                    }
                }
                FeatureValue::Lazy(_) => {}
                _ => {
                    return Err(PatchError::NotArray {
                        namespace: self.namespace,
                        expected,
                    });
                }
            }
        }

        self.entries.insert(name.into(), value);
        Ok(())
    }

    /// Look up a feature by name.
    pub fn get(&self, name: &str) -> Result<&FeatureValue> {
        self.entries.get(name).ok_or_else(|| PatchError::MissingFeature {
            namespace: self.namespace,
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Delete a feature if present; absent names are not an error.
    pub fn remove(&mut self, name: &str) -> Option<FeatureValue> {
        self.entries.remove(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FeatureValue> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &BTreeMap<String, FeatureValue> {
        &self.entries
    }

    /// Clone with no shared array storage.
    pub(crate) fn deep_clone(&self) -> FeatureMap {
        Self {
            namespace: self.namespace,
            entries: self
                .entries
                .iter()
                .map(|(name, value)| (name.clone(), value.deep_clone()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FeatureMap {
    type Item = (&'a String, &'a FeatureValue);
    type IntoIter = btree_map::Iter<'a, String, FeatureValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::NdArray;
    use serde_json::json;

    fn rank4(frames: usize) -> NdArray {
        NdArray::zeros::<f32>([frames, 2, 2, 1])
    }

    #[test]
    fn test_insert_and_get_back() {
        let mut map = FeatureMap::new(Namespace::Data);
        map.insert("bands", rank4(3)).unwrap();

        let stored = map.get("bands").unwrap().as_array().unwrap();
        assert_eq!(stored.shape(), &[3, 2, 2, 1]);
    }

    #[test]
    fn test_wrong_rank_is_rejected() {
        let mut map = FeatureMap::new(Namespace::Data);
        let err = map
            .insert("bands", NdArray::zeros::<f32>([2, 2, 1]))
            .unwrap_err();
        assert!(matches!(
            err,
            PatchError::Shape {
                namespace: Namespace::Data,
                expected: 4,
                actual: 3,
            }
        ));
    }

    #[test]
    fn test_non_array_rejected_in_array_namespace() {
        let mut map = FeatureMap::new(Namespace::Mask);
        let err = map
            .insert("clouds", FeatureValue::Object(json!([1, 2, 3])))
            .unwrap_err();
        assert!(matches!(err, PatchError::NotArray { .. }));
    }

    #[test]
    fn test_non_array_namespace_accepts_anything() {
        let mut map = FeatureMap::new(Namespace::MetaInfo);
        map.insert("maxcc", FeatureValue::Object(json!(0.8))).unwrap();
        map.insert("notes", FeatureValue::Series(vec![json!("a"), json!("b")]))
            .unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_missing_feature() {
        let map = FeatureMap::new(Namespace::Data);
        assert!(matches!(
            map.get("nope"),
            Err(PatchError::MissingFeature { .. })
        ));
    }

    #[test]
    fn test_remove_is_noop_when_absent() {
        let mut map = FeatureMap::new(Namespace::Data);
        assert!(map.remove("nope").is_none());
    }

    #[test]
    fn test_from_entries_validates_retroactively() {
        let mut raw = BTreeMap::new();
        raw.insert("ok".to_string(), FeatureValue::array(rank4(1)));
        raw.insert(
            "bad".to_string(),
            FeatureValue::array(NdArray::zeros::<f32>([2, 2])),
        );

        assert!(matches!(
            FeatureMap::from_entries(Namespace::Data, raw),
            Err(PatchError::Shape { .. })
        ));
    }
}
