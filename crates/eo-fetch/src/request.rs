//! Request-side vocabulary: band classification and payload construction.

use chrono::{DateTime, Utc};
use serde_json::{json, Value as JsonValue};

use eo_common::PatchBounds;
use eo_patch::{Dtype, Namespace};

use crate::client::MimeType;
use crate::error::FetchError;

/// How a provider band is requested and where its pixels land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandClass {
    /// Input unit requested from the provider.
    pub unit: &'static str,
    /// Output sample type requested from the provider.
    pub sample_type: &'static str,
    /// Element type of the decoded pixels.
    pub dtype: Dtype,
    /// Default namespace the band belongs in.
    pub namespace: Namespace,
}

/// Boolean validity masks.
pub const BOOL_MASK: BandClass = BandClass {
    unit: "DN",
    sample_type: "UINT8",
    dtype: Dtype::U8,
    namespace: Namespace::Mask,
};

/// Categorical masks (cloud mask, scene classification).
pub const MASK: BandClass = BandClass {
    unit: "DN",
    sample_type: "UINT8",
    dtype: Dtype::U8,
    namespace: Namespace::Mask,
};

/// Byte-valued probability layers.
pub const UINT8_DATA: BandClass = BandClass {
    unit: "DN",
    sample_type: "UINT8",
    dtype: Dtype::U8,
    namespace: Namespace::Data,
};

/// Reflectance bands, delivered as digital numbers with a normalization
/// factor in the user-data side channel.
pub const BANDS: BandClass = BandClass {
    unit: "DN",
    sample_type: "UINT16",
    dtype: Dtype::U16,
    namespace: Namespace::Data,
};

/// Angle grids and other continuous auxiliary layers.
pub const OTHER: BandClass = BandClass {
    unit: "DEGREES",
    sample_type: "FLOAT32",
    dtype: Dtype::F32,
    namespace: Namespace::Data,
};

/// Bands not in the predefined tables.
pub const CUSTOM: BandClass = BandClass {
    unit: "DN",
    sample_type: "FLOAT32",
    dtype: Dtype::F32,
    namespace: Namespace::Data,
};

const BOOL_MASK_BANDS: &[&str] = &["dataMask"];
const MASK_BANDS: &[&str] = &["CLM", "SCL"];
const UINT8_DATA_BANDS: &[&str] = &["SNW", "CLD", "CLP"];
const REFLECTANCE_BANDS: &[&str] = &[
    "B01", "B02", "B03", "B04", "B05", "B06", "B07", "B08", "B8A", "B09", "B10", "B11",
    "B12", "B13",
];
const OTHER_BANDS: &[&str] = &[
    "sunAzimuthAngles",
    "sunZenithAngles",
    "viewAzimuthMean",
    "viewZenithMean",
];

/// Classify a provider band name into its request class.
pub fn classify_band(name: &str) -> BandClass {
    if BOOL_MASK_BANDS.contains(&name) {
        BOOL_MASK
    } else if MASK_BANDS.contains(&name) {
        MASK
    } else if UINT8_DATA_BANDS.contains(&name) {
        UINT8_DATA
    } else if REFLECTANCE_BANDS.contains(&name) {
        BANDS
    } else if OTHER_BANDS.contains(&name) {
        OTHER
    } else {
        CUSTOM
    }
}

/// Scene stacking order for mosaicked outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MosaickingOrder {
    #[default]
    MostRecent,
    LeastRecent,
    LeastCc,
}

impl MosaickingOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            MosaickingOrder::MostRecent => "mostRecent",
            MosaickingOrder::LeastRecent => "leastRecent",
            MosaickingOrder::LeastCc => "leastCC",
        }
    }
}

impl std::str::FromStr for MosaickingOrder {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mostRecent" => Ok(MosaickingOrder::MostRecent),
            "leastRecent" => Ok(MosaickingOrder::LeastRecent),
            "leastCC" => Ok(MosaickingOrder::LeastCc),
            other => Err(FetchError::Config(format!(
                "unknown mosaicking order {other:?}"
            ))),
        }
    }
}

/// One requested output of a processing payload.
#[derive(Debug, Clone)]
pub struct ResponseSpec {
    pub identifier: String,
    pub mime_type: MimeType,
}

/// Build one processing-API request body.
#[allow(clippy::too_many_arguments)]
pub fn request_body(
    bounds: &PatchBounds,
    time_from: DateTime<Utc>,
    time_to: DateTime<Utc>,
    data_type: &str,
    maxcc: f64,
    mosaicking_order: MosaickingOrder,
    width: u32,
    height: u32,
    responses: &[ResponseSpec],
    evalscript: &str,
) -> JsonValue {
    let responses: Vec<JsonValue> = responses
        .iter()
        .map(|spec| {
            json!({
                "identifier": spec.identifier,
                "format": { "type": spec.mime_type.as_str() },
            })
        })
        .collect();

    json!({
        "input": {
            "bounds": {
                "bbox": bounds.bbox.to_array(),
                "properties": { "crs": bounds.crs.opengis_string() },
            },
            "data": [{
                "type": data_type,
                "dataFilter": {
                    "timeRange": {
                        "from": time_from.to_rfc3339(),
                        "to": time_to.to_rfc3339(),
                    },
                    // Provider expects whole percent.
                    "maxCloudCoverage": (maxcc * 100.0).round() as i64,
                    "mosaickingOrder": mosaicking_order.as_str(),
                },
            }],
        },
        "output": {
            "width": width,
            "height": height,
            "responses": responses,
        },
        "evalscript": evalscript,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use eo_common::{BoundingBox, CrsCode};

    #[test]
    fn test_band_classification() {
        assert_eq!(classify_band("dataMask"), BOOL_MASK);
        assert_eq!(classify_band("SCL"), MASK);
        assert_eq!(classify_band("CLP"), UINT8_DATA);
        assert_eq!(classify_band("B8A"), BANDS);
        assert_eq!(classify_band("sunZenithAngles"), OTHER);
        assert_eq!(classify_band("MY_INDEX"), CUSTOM);
    }

    #[test]
    fn test_mosaicking_order_roundtrip() {
        for order in [
            MosaickingOrder::MostRecent,
            MosaickingOrder::LeastRecent,
            MosaickingOrder::LeastCc,
        ] {
            assert_eq!(order.as_str().parse::<MosaickingOrder>().unwrap(), order);
        }
        assert!("median".parse::<MosaickingOrder>().is_err());
    }

    #[test]
    fn test_request_body_contents() {
        let bounds = PatchBounds::new(
            BoundingBox::new(500000.0, 5000000.0, 501000.0, 5001000.0),
            CrsCode::UtmNorth(33),
        );
        let from = Utc.with_ymd_and_hms(2020, 5, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2020, 5, 2, 0, 0, 0).unwrap();
        let responses = [ResponseSpec {
            identifier: "B02".to_string(),
            mime_type: MimeType::Tiff,
        }];

        let body = request_body(
            &bounds,
            from,
            to,
            "sentinel-2-l1c",
            0.8,
            MosaickingOrder::LeastCc,
            100,
            100,
            &responses,
            "//VERSION=3",
        );

        assert_eq!(body["input"]["data"][0]["dataFilter"]["maxCloudCoverage"], 80);
        assert_eq!(
            body["input"]["data"][0]["dataFilter"]["mosaickingOrder"],
            "leastCC"
        );
        assert_eq!(
            body["input"]["bounds"]["properties"]["crs"],
            "http://www.opengis.net/def/crs/EPSG/0/32633"
        );
        assert_eq!(body["output"]["responses"][0]["identifier"], "B02");
        assert_eq!(body["output"]["width"], 100);
    }
}
