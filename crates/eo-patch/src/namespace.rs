//! The fixed registry of patch data namespaces.
//!
//! Every behavior that varies by namespace (time dependence, expected array
//! rank, container kind) is looked up from one static table here instead of
//! being scattered across call sites.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PatchError;

/// How a namespace stores its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// A validated mapping from feature name to value.
    Mapping,
    /// The single bounding-box value.
    Bounds,
    /// The ordered sequence of acquisition times.
    Sequence,
}

/// Semantic categories of data a patch may hold.
///
/// Declaration order is the canonical registry order used for equality,
/// flattening and the on-disk layout.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Per-time multi-band raster data: time x height x width x bands.
    Data,
    /// Per-time masks: time x height x width x bands.
    Mask,
    /// Per-time scalar vectors: time x d.
    Scalar,
    /// Per-time label vectors: time x d.
    Label,
    /// Per-time vector/geometry collections.
    Vector,
    /// Time-independent raster data: height x width x bands.
    DataTimeless,
    /// Time-independent masks: height x width x bands.
    MaskTimeless,
    /// Time-independent scalar vectors: d.
    ScalarTimeless,
    /// Time-independent label vectors: d.
    LabelTimeless,
    /// Time-independent vector/geometry collections.
    VectorTimeless,
    /// Arbitrary metadata entries.
    MetaInfo,
    /// The patch bounding box and its CRS.
    Bbox,
    /// Acquisition times, one per temporal slice.
    #[serde(rename = "timestamp")]
    Timestamps,
}

struct NamespaceMeta {
    name: &'static str,
    time_dependent: bool,
    rank: Option<usize>,
    kind: ContainerKind,
}

/// Metadata records, indexed by discriminant. Order must match the enum.
const META: [NamespaceMeta; 13] = [
    NamespaceMeta { name: "data", time_dependent: true, rank: Some(4), kind: ContainerKind::Mapping },
    NamespaceMeta { name: "mask", time_dependent: true, rank: Some(4), kind: ContainerKind::Mapping },
    NamespaceMeta { name: "scalar", time_dependent: true, rank: Some(2), kind: ContainerKind::Mapping },
    NamespaceMeta { name: "label", time_dependent: true, rank: Some(2), kind: ContainerKind::Mapping },
    NamespaceMeta { name: "vector", time_dependent: true, rank: None, kind: ContainerKind::Mapping },
    NamespaceMeta { name: "data_timeless", time_dependent: false, rank: Some(3), kind: ContainerKind::Mapping },
    NamespaceMeta { name: "mask_timeless", time_dependent: false, rank: Some(3), kind: ContainerKind::Mapping },
    NamespaceMeta { name: "scalar_timeless", time_dependent: false, rank: Some(1), kind: ContainerKind::Mapping },
    NamespaceMeta { name: "label_timeless", time_dependent: false, rank: Some(1), kind: ContainerKind::Mapping },
    NamespaceMeta { name: "vector_timeless", time_dependent: false, rank: None, kind: ContainerKind::Mapping },
    NamespaceMeta { name: "meta_info", time_dependent: false, rank: None, kind: ContainerKind::Mapping },
    NamespaceMeta { name: "bbox", time_dependent: false, rank: None, kind: ContainerKind::Bounds },
    NamespaceMeta { name: "timestamp", time_dependent: true, rank: None, kind: ContainerKind::Sequence },
];

impl Namespace {
    /// All namespaces in canonical registry order.
    pub const ALL: [Namespace; 13] = [
        Namespace::Data,
        Namespace::Mask,
        Namespace::Scalar,
        Namespace::Label,
        Namespace::Vector,
        Namespace::DataTimeless,
        Namespace::MaskTimeless,
        Namespace::ScalarTimeless,
        Namespace::LabelTimeless,
        Namespace::VectorTimeless,
        Namespace::MetaInfo,
        Namespace::Bbox,
        Namespace::Timestamps,
    ];

    fn meta(self) -> &'static NamespaceMeta {
        &META[self as usize]
    }

    /// Canonical name, also used as the on-disk subpath.
    pub fn canonical_name(self) -> &'static str {
        self.meta().name
    }

    /// Whether the leading array axis (or sequence length) is indexed by
    /// acquisition time.
    pub fn is_time_dependent(self) -> bool {
        self.meta().time_dependent
    }

    /// Required array rank for array-bearing namespaces.
    pub fn expected_rank(self) -> Option<usize> {
        self.meta().rank
    }

    /// Whether values in this namespace are numeric arrays of fixed rank.
    pub fn holds_arrays(self) -> bool {
        self.meta().rank.is_some()
    }

    /// The container kind backing this namespace.
    pub fn kind(self) -> ContainerKind {
        self.meta().kind
    }

    /// Whether this namespace holds a mapping of named features.
    pub fn is_mapping(self) -> bool {
        self.kind() == ContainerKind::Mapping
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

impl FromStr for Namespace {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Namespace::ALL
            .iter()
            .find(|ns| ns.canonical_name() == s)
            .copied()
            .ok_or_else(|| PatchError::UnknownNamespace(s.to_string()))
    }
}
