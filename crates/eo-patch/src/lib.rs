//! Multi-temporal, multi-namespace containers for earth-observation data.
//!
//! The central type is [`Patch`]: one spatial region's rasters, masks,
//! scalars, labels, vector collections and metadata, organized into fixed
//! [`Namespace`]s with per-namespace shape rules, plus the bounding box and
//! acquisition-timestamp singletons. Patches persist to directories in an
//! object (JSON) or columnar (binary, mappable) layout.

pub mod array;
pub mod error;
pub mod feature_map;
pub mod io;
pub mod namespace;
pub mod patch;
pub mod value;

pub use array::{Dtype, Element, NdArray};
pub use error::{PatchError, Result};
pub use feature_map::FeatureMap;
pub use io::{FileFormat, LoadOptions, SaveOptions};
pub use namespace::{ContainerKind, Namespace};
pub use patch::{FeatureSelector, Patch, Populated};
pub use value::{FeatureValue, LazyArray};
