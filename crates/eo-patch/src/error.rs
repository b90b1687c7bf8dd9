//! Error types for the patch container.

use thiserror::Error;

use crate::array::Dtype;
use crate::namespace::Namespace;

/// Result type alias using PatchError.
pub type Result<T> = std::result::Result<T, PatchError>;

/// Primary error type for patch operations.
#[derive(Debug, Error)]
pub enum PatchError {
    // === Validation Errors ===
    #[error("{namespace} features must be arrays of rank {expected}, got rank {actual}")]
    Shape {
        namespace: Namespace,
        expected: usize,
        actual: usize,
    },

    #[error("{namespace} features must be arrays of rank {expected}")]
    NotArray {
        namespace: Namespace,
        expected: usize,
    },

    #[error("array shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("expected {expected} array data, got {actual}")]
    Dtype { expected: Dtype, actual: Dtype },

    // === Lookup Errors ===
    #[error("feature '{name}' not found in {namespace}")]
    MissingFeature { namespace: Namespace, name: String },

    #[error("unknown namespace: {0}")]
    UnknownNamespace(String),

    #[error("{0} does not hold a mapping of named features")]
    NotMapping(Namespace),

    // === Merge Errors ===
    #[error("could not merge ({namespace}, {name}) because values differ")]
    MergeConflict { namespace: Namespace, name: String },

    #[error("could not merge {0} because values differ")]
    MergeIncompatible(Namespace),

    // === Persistence Errors ===
    #[error("features '{first}' and '{second}' differ only in casing")]
    NamingCollision { first: String, second: String },

    #[error("persistence layout error: {0}")]
    PersistenceLayout(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
