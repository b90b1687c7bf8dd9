//! Values stored under feature names.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::array::NdArray;
use crate::error::Result;
use crate::io;

/// A deferred columnar entry: a thunk over a gzip-compressed array file
/// that decompresses and decodes on demand.
///
/// Distinct from a materialized [`NdArray`] so callers can test for
/// laziness without triggering the load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyArray {
    path: PathBuf,
}

impl LazyArray {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The compressed file this thunk reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decompress and decode the array.
    pub fn load(&self) -> Result<NdArray> {
        io::read_array_gz(&self.path)
    }
}

/// A single value held under a feature name.
///
/// Array buffers are behind `Arc`: shallow patch copies clone the handle
/// and share storage, deep copies clone the array itself.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    /// A materialized numeric array.
    Array(Arc<NdArray>),
    /// A deferred compressed columnar entry.
    Lazy(LazyArray),
    /// A per-time sequence of arbitrary objects (vector geometries).
    Series(Vec<JsonValue>),
    /// An arbitrary serializable object (metadata, timeless geometries).
    Object(JsonValue),
}

impl FeatureValue {
    /// Wrap an array value.
    pub fn array(array: NdArray) -> Self {
        FeatureValue::Array(Arc::new(array))
    }

    /// The shared array handle, when this value is a materialized array.
    pub fn as_array(&self) -> Option<&Arc<NdArray>> {
        match self {
            FeatureValue::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, FeatureValue::Lazy(_))
    }

    /// Resolve a lazy value into a materialized array; other variants are
    /// returned unchanged.
    pub fn materialize(&self) -> Result<FeatureValue> {
        match self {
            FeatureValue::Lazy(lazy) => Ok(FeatureValue::array(lazy.load()?)),
            other => Ok(other.clone()),
        }
    }

    /// Array rank, when this value is a materialized array.
    pub fn ndim(&self) -> Option<usize> {
        self.as_array().map(|array| array.ndim())
    }

    /// Clone with no shared storage: array buffers are duplicated.
    pub(crate) fn deep_clone(&self) -> FeatureValue {
        match self {
            FeatureValue::Array(array) => FeatureValue::array(NdArray::clone(array)),
            other => other.clone(),
        }
    }
}

impl From<NdArray> for FeatureValue {
    fn from(array: NdArray) -> Self {
        FeatureValue::array(array)
    }
}

impl From<JsonValue> for FeatureValue {
    fn from(value: JsonValue) -> Self {
        FeatureValue::Object(value)
    }
}

impl Serialize for FeatureValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FeatureValue::Array(array) => {
                serializer.serialize_newtype_variant("FeatureValue", 0, "array", array.as_ref())
            }
            FeatureValue::Lazy(_) => Err(serde::ser::Error::custom(
                "lazy feature values must be materialized before serialization",
            )),
            FeatureValue::Series(items) => {
                serializer.serialize_newtype_variant("FeatureValue", 1, "series", items)
            }
            FeatureValue::Object(value) => {
                serializer.serialize_newtype_variant("FeatureValue", 2, "object", value)
            }
        }
    }
}

impl<'de> Deserialize<'de> for FeatureValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "snake_case")]
        enum Repr {
            Array(NdArray),
            Series(Vec<JsonValue>),
            Object(JsonValue),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Array(array) => Ok(FeatureValue::array(array)),
            Repr::Series(items) => Ok(FeatureValue::Series(items)),
            Repr::Object(value) => Ok(FeatureValue::Object(value)),
        }
        // Lazy values never appear on the wire; loads reconstruct them
        // from the directory layout instead.
    }
}
