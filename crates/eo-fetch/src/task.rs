//! The fetch task: resolve acquisition times, download imagery, populate
//! a patch.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{debug, info};

use eo_common::{PatchBounds, TimeInterval};
use eo_patch::{Dtype, FeatureValue, Namespace, NdArray, Patch};

use crate::client::{
    DownloadClient, DownloadRequest, MimeType, ResponseBundle, ResponsePart, SceneCatalog,
};
use crate::error::{FetchError, Result};
use crate::evalscript;
use crate::request::{classify_band, request_body, BandClass, MosaickingOrder, ResponseSpec};

const USERDATA_ID: &str = "userdata";
const NORM_FACTORS_FEATURE: &str = "NORM_FACTORS";

/// A provider band fetched into a namespace of its own, next to the main
/// band stack (validity masks, cloud probabilities, angle grids).
#[derive(Debug, Clone)]
pub struct AdditionalData {
    pub band: String,
    pub namespace: Namespace,
    pub feature: String,
}

impl AdditionalData {
    /// Target feature name defaults to the provider band name.
    pub fn new(band: impl Into<String>, namespace: Namespace) -> Self {
        let band = band.into();
        Self {
            feature: band.clone(),
            band,
            namespace,
        }
    }

    pub fn named(mut self, feature: impl Into<String>) -> Self {
        self.feature = feature.into();
        self
    }
}

/// Configuration of one fetch task.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Processing endpoint URL.
    pub url: String,
    /// Provider data collection identifier.
    pub data_type: String,
    /// Destination of the stacked reflectance bands.
    pub bands_feature: Option<(Namespace, String)>,
    /// Reflectance band names, stacked along the last axis in this order.
    pub bands: Vec<String>,
    pub additional: Vec<AdditionalData>,
    /// Explicit output size in pixels (width, height).
    pub size: Option<(u32, u32)>,
    /// Ground resolution in CRS units per pixel (x, y).
    pub resolution: Option<(f64, f64)>,
    /// Maximum cloud coverage, fractional.
    pub maxcc: f64,
    /// Scenes closer together than this are collapsed into one.
    pub time_difference: Duration,
    /// Element type of the stacked bands feature.
    pub bands_dtype: Dtype,
    /// Fetch one mosaicked scene covering the whole interval.
    pub single_scene: bool,
    pub mosaicking_order: MosaickingOrder,
    pub max_concurrency: usize,
}

impl FetchConfig {
    pub fn new(url: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            data_type: data_type.into(),
            bands_feature: None,
            bands: Vec::new(),
            additional: Vec::new(),
            size: None,
            resolution: None,
            maxcc: 1.0,
            time_difference: Duration::seconds(1),
            bands_dtype: Dtype::F32,
            single_scene: false,
            mosaicking_order: MosaickingOrder::MostRecent,
            max_concurrency: 4,
        }
    }
}

/// Downloads imagery for one area and interval and writes it into a patch.
pub struct FetchTask<C, S> {
    config: FetchConfig,
    client: C,
    catalog: S,
}

impl<C: DownloadClient, S: SceneCatalog> FetchTask<C, S> {
    pub fn new(config: FetchConfig, client: C, catalog: S) -> Result<Self> {
        match (config.size, config.resolution) {
            (Some(_), Some(_)) => {
                return Err(FetchError::Config(
                    "size and resolution are mutually exclusive".to_string(),
                ))
            }
            (None, None) => {
                return Err(FetchError::Config(
                    "either size or resolution is required".to_string(),
                ))
            }
            _ => {}
        }

        if !(0.0..=1.0).contains(&config.maxcc) {
            return Err(FetchError::Config(format!(
                "maxcc must be within [0, 1], got {}",
                config.maxcc
            )));
        }

        if config.bands.is_empty() && config.additional.is_empty() {
            return Err(FetchError::Config(
                "at least one band or additional output is required".to_string(),
            ));
        }

        if !config.bands.is_empty() && config.bands_feature.is_none() {
            return Err(FetchError::Config(
                "bands were requested without a destination feature".to_string(),
            ));
        }

        if let Some((namespace, _)) = &config.bands_feature {
            if *namespace != Namespace::Data {
                return Err(FetchError::Config(format!(
                    "band stacks belong in the data namespace, not {namespace}"
                )));
            }
        }

        for additional in &config.additional {
            if !additional.namespace.holds_arrays() {
                return Err(FetchError::Config(format!(
                    "additional data target {} is not an array namespace",
                    additional.namespace
                )));
            }
        }

        Ok(Self {
            config,
            client,
            catalog,
        })
    }

    /// Fetch imagery and return the populated patch.
    ///
    /// Starts from `seed` when given, otherwise from an empty patch with
    /// the explicit `bounds`. A seed patch with timestamps must agree with
    /// the newly resolved acquisition times.
    pub async fn execute(
        &self,
        seed: Option<Patch>,
        bounds: Option<PatchBounds>,
        interval: &TimeInterval,
    ) -> Result<Patch> {
        let mut patch = seed.unwrap_or_default();

        let bounds = match (patch.bounds().copied(), bounds) {
            (Some(existing), Some(given)) if existing != given => {
                return Err(FetchError::Config(
                    "explicit bounds disagree with the seed patch".to_string(),
                ))
            }
            (Some(existing), _) => existing,
            (None, Some(given)) => given,
            (None, None) => {
                return Err(FetchError::Config(
                    "either a seed patch with bounds or explicit bounds is required".to_string(),
                ))
            }
        };

        let (width, height) = self.output_size(&bounds);
        let timestamps = self.resolve_timestamps(&bounds, interval).await?;

        if !patch.timestamps().is_empty() && patch.timestamps() != timestamps {
            return Err(FetchError::TimestampMismatch);
        }

        let bands: Vec<(String, BandClass)> = self
            .config
            .bands
            .iter()
            .chain(self.config.additional.iter().map(|extra| &extra.band))
            .map(|name| (name.clone(), classify_band(name)))
            .collect();
        let script = evalscript::generate(&bands, !self.config.bands.is_empty());

        let requests: Vec<DownloadRequest> = timestamps
            .iter()
            .map(|&timestamp| self.build_request(&bounds, timestamp, interval, width, height, &bands, &script))
            .collect();

        info!(
            scenes = requests.len(),
            width, height, "downloading processing-API scenes"
        );
        let bundles = self
            .client
            .download_all(&requests, self.config.max_concurrency)
            .await?;

        self.extract(&mut patch, &bundles, width, height)?;

        patch.set_bounds(Some(bounds));
        patch.set_timestamps(timestamps);
        self.record_meta(&mut patch, width, height, interval)?;

        Ok(patch)
    }

    fn output_size(&self, bounds: &PatchBounds) -> (u32, u32) {
        match (self.config.size, self.config.resolution) {
            (Some(size), _) => size,
            (None, Some((res_x, res_y))) => bounds.bbox.dimensions_at_resolution(res_x, res_y),
            // new() guarantees one of the two is set.
            (None, None) => unreachable!("validated at construction"),
        }
    }

    async fn resolve_timestamps(
        &self,
        bounds: &PatchBounds,
        interval: &TimeInterval,
    ) -> Result<Vec<DateTime<Utc>>> {
        if self.config.single_scene {
            return Ok(vec![interval.from]);
        }

        let mut stamps = self
            .catalog
            .scene_timestamps(bounds, interval, self.config.maxcc)
            .await?;
        stamps.sort_unstable();

        let thinned = thin_timestamps(&stamps, self.config.time_difference);
        if thinned.is_empty() {
            return Err(FetchError::NoScenes(interval.to_string()));
        }

        debug!(
            found = stamps.len(),
            kept = thinned.len(),
            "resolved acquisition times"
        );
        Ok(thinned)
    }

    #[allow(clippy::too_many_arguments)]
    fn build_request(
        &self,
        bounds: &PatchBounds,
        timestamp: DateTime<Utc>,
        interval: &TimeInterval,
        width: u32,
        height: u32,
        bands: &[(String, BandClass)],
        script: &str,
    ) -> DownloadRequest {
        let (from, to) = if self.config.single_scene {
            (interval.from, interval.to)
        } else {
            (
                timestamp - self.config.time_difference,
                timestamp + self.config.time_difference,
            )
        };

        let mut responses: Vec<ResponseSpec> = bands
            .iter()
            .map(|(name, _)| ResponseSpec {
                identifier: name.clone(),
                mime_type: MimeType::Tiff,
            })
            .collect();
        responses.push(ResponseSpec {
            identifier: USERDATA_ID.to_string(),
            mime_type: MimeType::Json,
        });

        DownloadRequest {
            url: self.config.url.clone(),
            payload: request_body(
                bounds,
                from,
                to,
                &self.config.data_type,
                self.config.maxcc,
                self.config.mosaicking_order,
                width,
                height,
                &responses,
                script,
            ),
            mime_type: MimeType::Tar,
            cache_key: Some(format!("{}_{}", self.config.data_type, timestamp.timestamp())),
        }
    }

    /// Turn downloaded bundles into patch features. Synchronous and
    /// all-or-nothing: runs only after every download succeeded.
    fn extract(
        &self,
        patch: &mut Patch,
        bundles: &[ResponseBundle],
        width: u32,
        height: u32,
    ) -> Result<()> {
        let (width, height) = (width as usize, height as usize);
        let frames = bundles.len();

        for additional in &self.config.additional {
            let class = classify_band(&additional.band);
            let array = if additional.namespace.is_time_dependent() {
                let mut values = Vec::with_capacity(frames * height * width);
                for bundle in bundles {
                    values.extend(channel_values(bundle, &additional.band, width * height)?);
                }
                build_array(class.dtype, vec![frames, height, width, 1], &values)?
            } else {
                // Timeless layers (elevation models and the like) are the
                // same in every scene; the first response provides the
                // pixels and the time axis is dropped.
                let values = channel_values(&bundles[0], &additional.band, width * height)?;
                build_array(class.dtype, vec![height, width, 1], &values)?
            };
            patch.add_feature(additional.namespace, additional.feature.clone(), array)?;
        }

        if let Some((namespace, feature)) = &self.config.bands_feature {
            let band_count = self.config.bands.len();
            let mut values = vec![0.0f64; frames * height * width * band_count];
            let mut norms = Vec::with_capacity(frames);

            for (frame, bundle) in bundles.iter().enumerate() {
                let norm = norm_factor(bundle);
                norms.push(norm as f32);

                for (channel, band) in self.config.bands.iter().enumerate() {
                    let pixels = channel_values(bundle, band, width * height)?;
                    for (pixel, value) in pixels.into_iter().enumerate() {
                        let index = (frame * height * width + pixel) * band_count + channel;
                        values[index] = if self.config.bands_dtype.is_float() {
                            round4(value * norm)
                        } else {
                            value
                        };
                    }
                }
            }

            let shape = vec![frames, height, width, band_count];
            let array = build_array(self.config.bands_dtype, shape, &values)?;
            patch.add_feature(*namespace, feature.clone(), array)?;

            // Integral band stacks keep raw digital numbers; the applied
            // factors ride along as a per-scene scalar feature.
            if !self.config.bands_dtype.is_float() {
                let factors = NdArray::from_vec([frames, 1], norms)?;
                patch.add_feature(Namespace::Scalar, NORM_FACTORS_FEATURE, factors)?;
            }
        }

        Ok(())
    }

    fn record_meta(
        &self,
        patch: &mut Patch,
        width: u32,
        height: u32,
        interval: &TimeInterval,
    ) -> Result<()> {
        let entries = [
            ("size_x", json!(width)),
            ("size_y", json!(height)),
            ("time_interval", json!(interval.to_string())),
            ("maxcc", json!(self.config.maxcc)),
            (
                "time_difference",
                json!(self.config.time_difference.num_seconds()),
            ),
            ("service_type", json!("processing")),
        ];
        for (name, value) in entries {
            patch.add_feature(Namespace::MetaInfo, name, FeatureValue::Object(value))?;
        }
        Ok(())
    }
}

/// Collapse acquisition times closer together than `time_difference`.
fn thin_timestamps(sorted: &[DateTime<Utc>], time_difference: Duration) -> Vec<DateTime<Utc>> {
    let mut kept: Vec<DateTime<Utc>> = Vec::with_capacity(sorted.len());
    for &stamp in sorted {
        match kept.last() {
            Some(&last) if stamp - last <= time_difference => {}
            _ => kept.push(stamp),
        }
    }
    kept
}

/// The per-scene normalization factor from the user-data side channel.
/// Scenes without one are treated as already normalized.
fn norm_factor(bundle: &ResponseBundle) -> f64 {
    match bundle.get(USERDATA_ID) {
        Some(ResponsePart::UserData(value)) => {
            value.get("norm_factor").and_then(|v| v.as_f64()).unwrap_or(1.0)
        }
        _ => 1.0,
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Pixels of one single-band image part, row-major, as f64.
fn channel_values(bundle: &ResponseBundle, band: &str, expected: usize) -> Result<Vec<f64>> {
    let array = match bundle.get(band) {
        Some(ResponsePart::Image(array)) => array,
        _ => {
            return Err(FetchError::Download(format!(
                "response is missing image part {band:?}"
            )))
        }
    };

    if array.num_elements() != expected {
        return Err(FetchError::Download(format!(
            "image part {band:?} has {} pixels, expected {expected}",
            array.num_elements()
        )));
    }

    let values = match array.dtype() {
        Dtype::U8 => array.to_vec::<u8>()?.into_iter().map(f64::from).collect(),
        Dtype::U16 => array.to_vec::<u16>()?.into_iter().map(f64::from).collect(),
        Dtype::I16 => array.to_vec::<i16>()?.into_iter().map(f64::from).collect(),
        Dtype::I32 => array.to_vec::<i32>()?.into_iter().map(f64::from).collect(),
        Dtype::I64 => array
            .to_vec::<i64>()?
            .into_iter()
            .map(|v| v as f64)
            .collect(),
        Dtype::F32 => array.to_vec::<f32>()?.into_iter().map(f64::from).collect(),
        Dtype::F64 => array.to_vec::<f64>()?,
    };
    Ok(values)
}

/// Build an array of the requested dtype from f64 working values.
fn build_array(dtype: Dtype, shape: Vec<usize>, values: &[f64]) -> Result<NdArray> {
    let array = match dtype {
        Dtype::U8 => NdArray::from_vec(shape, values.iter().map(|&v| v as u8).collect::<Vec<_>>()),
        Dtype::U16 => {
            NdArray::from_vec(shape, values.iter().map(|&v| v as u16).collect::<Vec<_>>())
        }
        Dtype::I16 => {
            NdArray::from_vec(shape, values.iter().map(|&v| v as i16).collect::<Vec<_>>())
        }
        Dtype::I32 => {
            NdArray::from_vec(shape, values.iter().map(|&v| v as i32).collect::<Vec<_>>())
        }
        Dtype::I64 => {
            NdArray::from_vec(shape, values.iter().map(|&v| v as i64).collect::<Vec<_>>())
        }
        Dtype::F32 => {
            NdArray::from_vec(shape, values.iter().map(|&v| v as f32).collect::<Vec<_>>())
        }
        Dtype::F64 => NdArray::from_vec(shape, values.to_vec()),
    }?;
    Ok(array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use eo_common::{BoundingBox, CrsCode};

    struct MockClient {
        norm: f64,
    }

    #[async_trait]
    impl DownloadClient for MockClient {
        async fn download(&self, request: &DownloadRequest) -> Result<ResponseBundle> {
            let mut bundle = ResponseBundle::new();
            let responses = request.payload["output"]["responses"]
                .as_array()
                .expect("responses list");

            for (index, spec) in responses.iter().enumerate() {
                let id = spec["identifier"].as_str().expect("identifier").to_string();
                if id == USERDATA_ID {
                    bundle.insert(
                        id,
                        ResponsePart::UserData(json!({ "norm_factor": self.norm })),
                    );
                } else if id == "dataMask" {
                    bundle.insert(
                        id,
                        ResponsePart::Image(NdArray::from_vec([2, 2], vec![1u8; 4]).unwrap()),
                    );
                } else {
                    let base = (index as u16 + 1) * 1000;
                    bundle.insert(
                        id,
                        ResponsePart::Image(
                            NdArray::from_vec([2, 2], vec![base, base + 1, base + 2, base + 3])
                                .unwrap(),
                        ),
                    );
                }
            }
            Ok(bundle)
        }
    }

    struct MockCatalog {
        stamps: Vec<DateTime<Utc>>,
    }

    #[async_trait]
    impl SceneCatalog for MockCatalog {
        async fn scene_timestamps(
            &self,
            _bounds: &PatchBounds,
            interval: &TimeInterval,
            _maxcc: f64,
        ) -> Result<Vec<DateTime<Utc>>> {
            Ok(self
                .stamps
                .iter()
                .filter(|stamp| interval.contains(stamp))
                .copied()
                .collect())
        }
    }

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 5, day, hour, 0, 0).unwrap()
    }

    fn bounds() -> PatchBounds {
        PatchBounds::new(
            BoundingBox::new(500000.0, 5000000.0, 500020.0, 5000020.0),
            CrsCode::UtmNorth(33),
        )
    }

    fn interval() -> TimeInterval {
        TimeInterval::parse("2020-05-01/2020-05-10").unwrap()
    }

    fn config() -> FetchConfig {
        let mut config = FetchConfig::new("https://example.com/process", "sentinel-2-l1c");
        config.bands = vec!["B02".to_string(), "B03".to_string()];
        config.bands_feature = Some((Namespace::Data, "BANDS".to_string()));
        config.additional = vec![AdditionalData::new("dataMask", Namespace::Mask)];
        config.size = Some((2, 2));
        config
    }

    fn task(config: FetchConfig, stamps: Vec<DateTime<Utc>>) -> FetchTask<MockClient, MockCatalog> {
        FetchTask::new(config, MockClient { norm: 0.0001 }, MockCatalog { stamps }).unwrap()
    }

    #[test]
    fn test_config_validation() {
        let mut both = config();
        both.resolution = Some((10.0, 10.0));
        assert!(matches!(
            FetchTask::new(both, MockClient { norm: 1.0 }, MockCatalog { stamps: vec![] }),
            Err(FetchError::Config(_))
        ));

        let mut neither = config();
        neither.size = None;
        assert!(FetchTask::new(
            neither,
            MockClient { norm: 1.0 },
            MockCatalog { stamps: vec![] }
        )
        .is_err());

        let mut bad_maxcc = config();
        bad_maxcc.maxcc = 1.5;
        assert!(FetchTask::new(
            bad_maxcc,
            MockClient { norm: 1.0 },
            MockCatalog { stamps: vec![] }
        )
        .is_err());

        let mut bad_target = config();
        bad_target
            .additional
            .push(AdditionalData::new("DEM", Namespace::MetaInfo));
        assert!(FetchTask::new(
            bad_target,
            MockClient { norm: 1.0 },
            MockCatalog { stamps: vec![] }
        )
        .is_err());

        let mut no_outputs = config();
        no_outputs.bands.clear();
        no_outputs.bands_feature = None;
        no_outputs.additional.clear();
        assert!(FetchTask::new(
            no_outputs,
            MockClient { norm: 1.0 },
            MockCatalog { stamps: vec![] }
        )
        .is_err());
    }

    #[tokio::test]
    async fn test_execute_populates_float_bands() {
        let stamps = vec![ts(2, 10), ts(5, 10)];
        let task = task(config(), stamps.clone());

        let patch = task.execute(None, Some(bounds()), &interval()).await.unwrap();

        assert_eq!(patch.timestamps(), &stamps[..]);
        assert_eq!(patch.bounds(), Some(&bounds()));

        let bands = patch.get_feature(Namespace::Data, "BANDS").unwrap();
        let array = bands.as_array().unwrap();
        assert_eq!(array.shape(), &[2, 2, 2, 2]);
        assert_eq!(array.dtype(), Dtype::F32);

        // First pixel of frame 0: B02 is 1000 DN, B03 is 2000 DN at
        // norm 0.0001.
        let values = array.to_vec::<f32>().unwrap();
        assert!((values[0] - 0.1).abs() < 1e-6);
        assert!((values[1] - 0.2).abs() < 1e-6);

        let mask = patch.get_feature(Namespace::Mask, "dataMask").unwrap();
        let mask = mask.as_array().unwrap();
        assert_eq!(mask.shape(), &[2, 2, 2, 1]);
        assert_eq!(mask.dtype(), Dtype::U8);

        // Float outputs need no separate norm-factor record.
        assert!(patch.get_feature(Namespace::Scalar, NORM_FACTORS_FEATURE).is_err());

        let meta = patch.features(Namespace::MetaInfo).unwrap();
        assert_eq!(meta.get("size_x").unwrap(), &FeatureValue::Object(json!(2)));
        assert_eq!(
            meta.get("service_type").unwrap(),
            &FeatureValue::Object(json!("processing"))
        );
    }

    #[tokio::test]
    async fn test_integral_bands_record_norm_factors() {
        let mut config = config();
        config.bands_dtype = Dtype::U16;
        let task = task(config, vec![ts(2, 10)]);

        let patch = task.execute(None, Some(bounds()), &interval()).await.unwrap();

        let bands = patch.get_feature(Namespace::Data, "BANDS").unwrap();
        let array = bands.as_array().unwrap();
        assert_eq!(array.dtype(), Dtype::U16);
        // Raw digital numbers survive.
        assert_eq!(array.to_vec::<u16>().unwrap()[0], 1000);

        let factors = patch
            .get_feature(Namespace::Scalar, NORM_FACTORS_FEATURE)
            .unwrap();
        let factors = factors.as_array().unwrap();
        assert_eq!(factors.shape(), &[1, 1]);
        assert!((factors.to_vec::<f32>().unwrap()[0] - 0.0001).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_timeless_additional_target_drops_time_axis() {
        let mut config = config();
        config
            .additional
            .push(AdditionalData::new("DEM", Namespace::DataTimeless));
        let task = task(config, vec![ts(2, 10), ts(5, 10)]);

        let patch = task.execute(None, Some(bounds()), &interval()).await.unwrap();

        let dem = patch.get_feature(Namespace::DataTimeless, "DEM").unwrap();
        let dem = dem.as_array().unwrap();
        assert_eq!(dem.shape(), &[2, 2, 1]);
        assert_eq!(dem.dtype(), Dtype::F32);

        // Time-dependent targets still grow the leading axis.
        let mask = patch.get_feature(Namespace::Mask, "dataMask").unwrap();
        assert_eq!(mask.as_array().unwrap().shape(), &[2, 2, 2, 1]);
    }

    #[tokio::test]
    async fn test_seed_timestamp_mismatch() {
        let task = task(config(), vec![ts(2, 10)]);

        let mut seed = Patch::new();
        seed.set_bounds(Some(bounds()));
        seed.set_timestamps(vec![ts(3, 10)]);

        assert!(matches!(
            task.execute(Some(seed), None, &interval()).await,
            Err(FetchError::TimestampMismatch)
        ));
    }

    #[tokio::test]
    async fn test_no_scenes() {
        let task = task(config(), vec![]);
        assert!(matches!(
            task.execute(None, Some(bounds()), &interval()).await,
            Err(FetchError::NoScenes(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_bounds() {
        let task = task(config(), vec![ts(2, 10)]);
        assert!(matches!(
            task.execute(None, None, &interval()).await,
            Err(FetchError::Config(_))
        ));
    }

    #[test]
    fn test_timestamp_thinning() {
        let base = ts(2, 10);
        let stamps = vec![
            base,
            base + Duration::seconds(30),
            base + Duration::hours(2),
        ];

        let thinned = thin_timestamps(&stamps, Duration::seconds(60));
        assert_eq!(thinned, vec![base, base + Duration::hours(2)]);

        // Default one-second threshold keeps near-duplicates apart only
        // when they differ by more than a second.
        let thinned = thin_timestamps(&stamps, Duration::seconds(1));
        assert_eq!(thinned.len(), 3);
    }

    #[tokio::test]
    async fn test_single_scene_uses_interval_start() {
        let mut config = config();
        config.single_scene = true;
        let task = task(config, vec![]);

        let patch = task.execute(None, Some(bounds()), &interval()).await.unwrap();
        assert_eq!(patch.timestamps(), &[interval().from]);

        let bands = patch.get_feature(Namespace::Data, "BANDS").unwrap();
        assert_eq!(bands.as_array().unwrap().shape()[0], 1);
    }
}
