//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::crs::CrsCode;

/// A geographic or projected bounding box.
///
/// For geographic CRS (EPSG:4326), coordinates are in degrees.
/// For projected CRS (UTM zones, EPSG:3857), coordinates are in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Parse a bbox string: "minx,miny,maxx,maxy"
    pub fn from_coords(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let mut values = [0.0f64; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .trim()
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber((*part).to_string()))?;
        }

        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Pixel dimensions (width, height) of this bbox at a given ground
    /// resolution in coordinate units per pixel.
    pub fn dimensions_at_resolution(&self, res_x: f64, res_y: f64) -> (u32, u32) {
        let width = (self.width().abs() / res_x).round().max(1.0) as u32;
        let height = (self.height().abs() / res_y).round().max(1.0) as u32;
        (width, height)
    }

    /// Corner coordinates in `[min_x, min_y, max_x, max_y]` order.
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

/// The spatial footprint of a patch: four numeric bounds plus the CRS they
/// are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatchBounds {
    pub bbox: BoundingBox,
    pub crs: CrsCode,
}

impl PatchBounds {
    pub fn new(bbox: BoundingBox, crs: CrsCode) -> Self {
        Self { bbox, crs }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid bbox format: {0}. Expected 'minx,miny,maxx,maxy'")]
    InvalidFormat(String),

    #[error("Invalid number in bbox: {0}")]
    InvalidNumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox = BoundingBox::from_coords("-125.0,24.0,-66.0,50.0").unwrap();
        assert_eq!(bbox.min_x, -125.0);
        assert_eq!(bbox.min_y, 24.0);
        assert_eq!(bbox.max_x, -66.0);
        assert_eq!(bbox.max_y, 50.0);

        assert!(BoundingBox::from_coords("1,2,3").is_err());
        assert!(BoundingBox::from_coords("a,b,c,d").is_err());
    }

    #[test]
    fn test_dimensions_at_resolution() {
        let bbox = BoundingBox::new(500000.0, 5000000.0, 501000.0, 5000500.0);
        assert_eq!(bbox.dimensions_at_resolution(10.0, 10.0), (100, 50));
    }

    #[test]
    fn test_intersects() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
