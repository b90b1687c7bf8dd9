//! Common types shared across the eo-patch workspace.

pub mod bbox;
pub mod crs;
pub mod time;

pub use bbox::{BboxParseError, BoundingBox, PatchBounds};
pub use crs::{CrsCode, CrsParseError};
pub use time::{TimeInterval, TimeParseError};
