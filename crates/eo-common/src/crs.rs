//! Coordinate Reference System identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known CRS codes for Earth observation data.
///
/// UTM zones are carried by number since satellite tiles are commonly
/// delivered in the UTM zone of their footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
    /// WGS84 / UTM zone north (EPSG:326xx)
    UtmNorth(u8),
    /// WGS84 / UTM zone south (EPSG:327xx)
    UtmSouth(u8),
}

impl CrsCode {
    /// The numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3857 => 3857,
            CrsCode::UtmNorth(zone) => 32600 + u32::from(*zone),
            CrsCode::UtmSouth(zone) => 32700 + u32::from(*zone),
        }
    }

    /// Resolve a numeric EPSG code.
    pub fn from_epsg(code: u32) -> Result<Self, CrsParseError> {
        match code {
            4326 => Ok(CrsCode::Epsg4326),
            3857 | 900913 => Ok(CrsCode::Epsg3857),
            32601..=32660 => Ok(CrsCode::UtmNorth((code - 32600) as u8)),
            32701..=32760 => Ok(CrsCode::UtmSouth((code - 32700) as u8)),
            _ => Err(CrsParseError::UnsupportedCrs(code.to_string())),
        }
    }

    /// Parse strings like "EPSG:4326" or "epsg:32633".
    pub fn from_epsg_string(s: &str) -> Result<Self, CrsParseError> {
        let code = s
            .trim()
            .strip_prefix("EPSG:")
            .or_else(|| s.trim().strip_prefix("epsg:"))
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))?;

        let code: u32 = code
            .parse()
            .map_err(|_| CrsParseError::UnsupportedCrs(s.to_string()))?;

        Self::from_epsg(code)
    }

    /// The OpenGIS URN form used in processing-API request bounds.
    pub fn opengis_string(&self) -> String {
        format!("http://www.opengis.net/def/crs/EPSG/0/{}", self.epsg())
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
