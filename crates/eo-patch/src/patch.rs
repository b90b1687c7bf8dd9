//! The multi-namespace patch container.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::debug;

use eo_common::PatchBounds;

use crate::array::NdArray;
use crate::error::{PatchError, Result};
use crate::feature_map::FeatureMap;
use crate::namespace::{ContainerKind, Namespace};
use crate::value::FeatureValue;

/// Selects whole namespaces or single named features for copy operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureSelector {
    /// An entire namespace.
    Whole(Namespace),
    /// One named feature of a mapping namespace.
    Named(Namespace, String),
}

/// Per-namespace population summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Populated {
    /// Feature names present in a mapping namespace.
    Names(BTreeSet<String>),
    /// A non-empty non-mapping namespace.
    Present,
}

/// Container for one spatial region's multi-temporal, multi-namespace data.
///
/// Holds one validated mapping per mapping-kind namespace plus the bounding
/// box and timestamp singletons. Mapping namespaces are always present;
/// absence of data is an empty map, never a missing one.
///
/// The length of the timestamp sequence is deliberately not tied to the
/// time-axis length of array features.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    maps: BTreeMap<Namespace, FeatureMap>,
    bounds: Option<PatchBounds>,
    timestamps: Vec<DateTime<Utc>>,
}

impl Patch {
    /// Create an empty patch with every namespace initialized.
    pub fn new() -> Self {
        let maps = Namespace::ALL
            .iter()
            .filter(|ns| ns.is_mapping())
            .map(|&ns| (ns, FeatureMap::new(ns)))
            .collect();

        Self {
            maps,
            bounds: None,
            timestamps: Vec::new(),
        }
    }

    /// The validated mapping of a mapping-kind namespace.
    pub fn features(&self, namespace: Namespace) -> Result<&FeatureMap> {
        self.maps
            .get(&namespace)
            .ok_or(PatchError::NotMapping(namespace))
    }

    /// Mutable access to the validated mapping of a mapping-kind namespace.
    pub fn features_mut(&mut self, namespace: Namespace) -> Result<&mut FeatureMap> {
        self.maps
            .get_mut(&namespace)
            .ok_or(PatchError::NotMapping(namespace))
    }

    /// Replace a namespace's mapping with raw entries, re-validating the
    /// rank of every entry (the construction-time wrapping rule).
    pub fn set_features(
        &mut self,
        namespace: Namespace,
        entries: BTreeMap<String, FeatureValue>,
    ) -> Result<()> {
        if !namespace.is_mapping() {
            return Err(PatchError::NotMapping(namespace));
        }
        let map = FeatureMap::from_entries(namespace, entries)?;
        self.maps.insert(namespace, map);
        Ok(())
    }

    pub fn bounds(&self) -> Option<&PatchBounds> {
        self.bounds.as_ref()
    }

    pub fn set_bounds(&mut self, bounds: Option<PatchBounds>) {
        self.bounds = bounds;
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn set_timestamps(&mut self, timestamps: Vec<DateTime<Utc>>) {
        self.timestamps = timestamps;
    }

    /// Store a feature under `namespace[name]`.
    pub fn add_feature(
        &mut self,
        namespace: Namespace,
        name: impl Into<String>,
        value: impl Into<FeatureValue>,
    ) -> Result<()> {
        self.features_mut(namespace)?.insert(name, value)
    }

    /// Remove a feature if present.
    pub fn remove_feature(&mut self, namespace: Namespace, name: &str) -> Result<()> {
        debug!(namespace = %namespace, feature = %name, "removing feature");
        self.features_mut(namespace)?.remove(name);
        Ok(())
    }

    /// Look up a feature by namespace and name.
    pub fn get_feature(&self, namespace: Namespace, name: &str) -> Result<&FeatureValue> {
        self.features(namespace)?.get(name)
    }

    /// Copy sharing array storage with the source (`Arc` handles cloned).
    ///
    /// `selection` limits the copy to whole namespaces or named features;
    /// `None` copies everything. Naming features of the bbox or timestamp
    /// namespaces is invalid.
    pub fn shallow_copy(&self, selection: Option<&[FeatureSelector]>) -> Result<Patch> {
        self.copy_with(selection, false)
    }

    /// Copy sharing no storage with the source.
    pub fn deep_copy(&self, selection: Option<&[FeatureSelector]>) -> Result<Patch> {
        self.copy_with(selection, true)
    }

    fn copy_with(&self, selection: Option<&[FeatureSelector]>, deep: bool) -> Result<Patch> {
        enum Picked {
            Whole,
            Names(BTreeSet<String>),
        }

        let mut plan: BTreeMap<Namespace, Picked> = BTreeMap::new();
        match selection {
            None => {
                for &ns in Namespace::ALL.iter() {
                    plan.insert(ns, Picked::Whole);
                }
            }
            Some(selectors) => {
                for selector in selectors {
                    match selector {
                        FeatureSelector::Whole(ns) => {
                            plan.insert(*ns, Picked::Whole);
                        }
                        FeatureSelector::Named(ns, name) => {
                            if !ns.is_mapping() {
                                return Err(PatchError::NotMapping(*ns));
                            }
                            match plan.entry(*ns).or_insert_with(|| Picked::Names(BTreeSet::new()))
                            {
                                Picked::Whole => {}
                                Picked::Names(names) => {
                                    names.insert(name.clone());
                                }
                            }
                        }
                    }
                }
            }
        }

        let mut copied = Patch::new();
        for (ns, picked) in plan {
            match ns.kind() {
                ContainerKind::Mapping => {
                    let source = self.features(ns)?;
                    match picked {
                        Picked::Whole => {
                            copied.maps.insert(ns, source.clone());
                        }
                        Picked::Names(names) => {
                            let target = copied.features_mut(ns)?;
                            for name in names {
                                let value = source.get(&name)?.clone();
                                target.insert(name, value)?;
                            }
                        }
                    }
                }
                ContainerKind::Bounds => copied.bounds = self.bounds,
                ContainerKind::Sequence => copied.timestamps = self.timestamps.clone(),
            }
        }

        if deep {
            for map in copied.maps.values_mut() {
                *map = map.deep_clone();
            }
        }

        Ok(copied)
    }

    /// Join all data from two patches into a new one.
    ///
    /// Time-dependent features concatenate along the time axis when the two
    /// timestamp sequences differ; everything else must agree or the merge
    /// fails. Timestamps concatenate in input order; chronological ordering
    /// and overlap are intentionally not validated.
    pub fn merge(first: &Patch, second: &Patch) -> Result<Patch> {
        let timestamps_exist =
            !first.timestamps.is_empty() && !second.timestamps.is_empty();
        let timestamps_match = timestamps_exist && first.timestamps == second.timestamps;

        let mut merged = Patch::new();
        for &ns in Namespace::ALL.iter() {
            match ns.kind() {
                ContainerKind::Mapping => {
                    let left = first.features(ns)?;
                    let right = second.features(ns)?;
                    let target = merged.features_mut(ns)?;

                    for (name, value) in left {
                        match right.entries().get(name) {
                            Some(other) if ns.is_time_dependent() && !timestamps_match => {
                                target.insert(
                                    name.clone(),
                                    concat_values(ns, name, value, other)?,
                                )?;
                            }
                            Some(other) => {
                                if value != other {
                                    return Err(PatchError::MergeConflict {
                                        namespace: ns,
                                        name: name.clone(),
                                    });
                                }
                                target.insert(name.clone(), value.clone())?;
                            }
                            None => target.insert(name.clone(), value.clone())?,
                        }
                    }

                    for (name, value) in right {
                        if !left.contains(name) {
                            target.insert(name.clone(), value.clone())?;
                        }
                    }
                }
                ContainerKind::Bounds => {
                    merged.bounds = match (&first.bounds, &second.bounds) {
                        (None, other) => *other,
                        (other, None) => *other,
                        (Some(a), Some(b)) if a == b => Some(*a),
                        _ => return Err(PatchError::MergeIncompatible(ns)),
                    };
                }
                ContainerKind::Sequence => {
                    merged.timestamps = if timestamps_exist && !timestamps_match {
                        first
                            .timestamps
                            .iter()
                            .chain(second.timestamps.iter())
                            .copied()
                            .collect()
                    } else if first.timestamps.is_empty() {
                        second.timestamps.clone()
                    } else {
                        first.timestamps.clone()
                    };
                }
            }
        }

        Ok(merged)
    }

    /// Population summary: feature names for mapping namespaces, a
    /// presence flag for non-empty singletons.
    pub fn populated(&self) -> BTreeMap<Namespace, Populated> {
        let mut summary = BTreeMap::new();
        for &ns in Namespace::ALL.iter() {
            match ns.kind() {
                ContainerKind::Mapping => {
                    let map = &self.maps[&ns];
                    if !map.is_empty() {
                        summary.insert(
                            ns,
                            Populated::Names(map.keys().map(String::from).collect()),
                        );
                    }
                }
                ContainerKind::Bounds => {
                    if self.bounds.is_some() {
                        summary.insert(ns, Populated::Present);
                    }
                }
                ContainerKind::Sequence => {
                    if !self.timestamps.is_empty() {
                        summary.insert(ns, Populated::Present);
                    }
                }
            }
        }
        summary
    }

    /// Flat list of everything populated, in registry order: (namespace,
    /// name) pairs for mapping namespaces, bare namespaces otherwise.
    pub fn flatten(&self) -> Vec<FeatureSelector> {
        let mut flat = Vec::new();
        for &ns in Namespace::ALL.iter() {
            match ns.kind() {
                ContainerKind::Mapping => {
                    for name in self.maps[&ns].keys() {
                        flat.push(FeatureSelector::Named(ns, name.to_string()));
                    }
                }
                ContainerKind::Bounds => {
                    if self.bounds.is_some() {
                        flat.push(FeatureSelector::Whole(ns));
                    }
                }
                ContainerKind::Sequence => {
                    if !self.timestamps.is_empty() {
                        flat.push(FeatureSelector::Whole(ns));
                    }
                }
            }
        }
        flat
    }

    /// Rounded counts of `scale_seconds`-sized units between each timestamp
    /// and the reference date (defaulting to the first timestamp).
    ///
    /// Exact half counts round away from zero (`f64::round`), so 30 s at
    /// scale 60 yields 1.
    ///
    /// Returns `None` when the patch has no timestamps.
    pub fn time_series(
        &self,
        reference: Option<DateTime<Utc>>,
        scale_seconds: i64,
    ) -> Option<Vec<i64>> {
        if self.timestamps.is_empty() {
            return None;
        }

        let reference = reference.unwrap_or(self.timestamps[0]);
        Some(
            self.timestamps
                .iter()
                .map(|timestamp| {
                    let seconds = (*timestamp - reference).num_milliseconds() as f64 / 1000.0;
                    (seconds / scale_seconds as f64).round() as i64
                })
                .collect(),
        )
    }

    /// Drop every temporal slice whose timestamp is not in `keep`.
    ///
    /// Array entries of time-dependent namespaces are re-indexed along axis
    /// 0 and series entries filtered by index; remaining slices keep their
    /// original relative order. Returns the set of removed timestamps.
    pub fn consolidate_timestamps(
        &mut self,
        keep: &[DateTime<Utc>],
    ) -> Result<BTreeSet<DateTime<Utc>>> {
        let keep: BTreeSet<DateTime<Utc>> = keep.iter().copied().collect();
        let removed: BTreeSet<DateTime<Utc>> = self
            .timestamps
            .iter()
            .filter(|timestamp| !keep.contains(timestamp))
            .copied()
            .collect();

        let kept_indices: Vec<usize> = self
            .timestamps
            .iter()
            .enumerate()
            .filter(|(_, timestamp)| !removed.contains(timestamp))
            .map(|(index, _)| index)
            .collect();

        let time_namespaces: Vec<Namespace> = Namespace::ALL
            .iter()
            .filter(|ns| ns.is_mapping() && ns.is_time_dependent())
            .copied()
            .collect();

        for ns in time_namespaces {
            let map = self.features_mut(ns)?;
            let names: Vec<String> = map.keys().map(String::from).collect();

            for name in names {
                let replacement = match map.get(&name)? {
                    FeatureValue::Array(array) => Some(FeatureValue::array(
                        array.select_time(&kept_indices)?,
                    )),
                    FeatureValue::Series(items) => Some(FeatureValue::Series(
                        kept_indices
                            .iter()
                            .filter_map(|&index| items.get(index).cloned())
                            .collect(),
                    )),
                    // Lazy and object entries are left untouched.
                    _ => None,
                };

                if let Some(value) = replacement {
                    map.insert(name, value)?;
                }
            }
        }

        self.timestamps = kept_indices
            .iter()
            .map(|&index| self.timestamps[index])
            .collect();

        Ok(removed)
    }
}

impl Default for Patch {
    fn default() -> Self {
        Self::new()
    }
}

/// Concatenate two time-dependent feature values along the time axis.
fn concat_values(
    namespace: Namespace,
    name: &str,
    left: &FeatureValue,
    right: &FeatureValue,
) -> Result<FeatureValue> {
    let left = left.materialize()?;
    let right = right.materialize()?;

    match (left, right) {
        (FeatureValue::Array(a), FeatureValue::Array(b)) => {
            Ok(FeatureValue::array(NdArray::concat_time(&a, &b)?))
        }
        (FeatureValue::Series(mut a), FeatureValue::Series(b)) => {
            a.extend(b);
            Ok(FeatureValue::Series(a))
        }
        _ => Err(PatchError::MergeConflict {
            namespace,
            name: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::NdArray;
    use chrono::TimeZone;
    use eo_common::{BoundingBox, CrsCode};
    use serde_json::json;
    use std::sync::Arc;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 5, 1, hour, 0, 0).unwrap()
    }

    fn bands(frames: usize, fill: f32) -> NdArray {
        let len = frames * 4;
        NdArray::from_vec([frames, 2, 2, 1], vec![fill; len]).unwrap()
    }

    fn bounds() -> PatchBounds {
        PatchBounds::new(
            BoundingBox::new(500000.0, 5000000.0, 501000.0, 5001000.0),
            CrsCode::UtmNorth(33),
        )
    }

    #[test]
    fn test_set_then_get_identity() {
        let mut patch = Patch::new();
        let array = bands(2, 1.5);
        patch.add_feature(Namespace::Data, "BANDS", array.clone()).unwrap();

        let stored = patch.get_feature(Namespace::Data, "BANDS").unwrap();
        assert_eq!(stored.as_array().unwrap().as_ref(), &array);
    }

    #[test]
    fn test_equality_ignores_construction_order() {
        let mut a = Patch::new();
        a.add_feature(Namespace::Data, "BANDS", bands(1, 0.0)).unwrap();
        a.add_feature(Namespace::MaskTimeless, "LULC", NdArray::zeros::<u8>([2, 2, 1]))
            .unwrap();

        let mut b = Patch::new();
        b.add_feature(Namespace::MaskTimeless, "LULC", NdArray::zeros::<u8>([2, 2, 1]))
            .unwrap();
        b.add_feature(Namespace::Data, "BANDS", bands(1, 0.0)).unwrap();

        assert_eq!(a, b);
        assert_eq!(b, a);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_equality_sees_every_namespace() {
        let mut a = Patch::new();
        let b = Patch::new();
        a.set_timestamps(vec![ts(10)]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_shallow_copy_shares_buffers_deep_copy_does_not() {
        let mut patch = Patch::new();
        patch.add_feature(Namespace::Data, "BANDS", bands(1, 2.0)).unwrap();

        let shallow = patch.shallow_copy(None).unwrap();
        let deep = patch.deep_copy(None).unwrap();

        let source = patch.get_feature(Namespace::Data, "BANDS").unwrap().as_array().unwrap();
        let shared = shallow.get_feature(Namespace::Data, "BANDS").unwrap().as_array().unwrap();
        let owned = deep.get_feature(Namespace::Data, "BANDS").unwrap().as_array().unwrap();

        assert!(Arc::ptr_eq(source, shared));
        assert!(!Arc::ptr_eq(source, owned));
        assert_eq!(patch, shallow);
        assert_eq!(patch, deep);
    }

    #[test]
    fn test_copy_with_selection() {
        let mut patch = Patch::new();
        patch.add_feature(Namespace::Data, "BANDS", bands(1, 1.0)).unwrap();
        patch.add_feature(Namespace::Data, "NDVI", bands(1, 0.5)).unwrap();
        patch
            .add_feature(Namespace::MetaInfo, "maxcc", FeatureValue::Object(json!(0.8)))
            .unwrap();
        patch.set_timestamps(vec![ts(10)]);

        let selection = [
            FeatureSelector::Named(Namespace::Data, "NDVI".to_string()),
            FeatureSelector::Whole(Namespace::Timestamps),
        ];
        let copied = patch.shallow_copy(Some(&selection)).unwrap();

        assert!(copied.get_feature(Namespace::Data, "NDVI").is_ok());
        assert!(copied.get_feature(Namespace::Data, "BANDS").is_err());
        assert!(copied.features(Namespace::MetaInfo).unwrap().is_empty());
        assert_eq!(copied.timestamps(), patch.timestamps());
    }

    #[test]
    fn test_selecting_named_singleton_is_invalid() {
        let patch = Patch::new();
        let selection = [FeatureSelector::Named(Namespace::Bbox, "area".to_string())];
        assert!(matches!(
            patch.shallow_copy(Some(&selection)),
            Err(PatchError::NotMapping(Namespace::Bbox))
        ));
    }

    #[test]
    fn test_merge_disjoint_is_commutative() {
        let stamps = vec![ts(10), ts(12)];

        let mut a = Patch::new();
        a.set_timestamps(stamps.clone());
        a.add_feature(Namespace::Data, "BANDS", bands(2, 1.0)).unwrap();

        let mut b = Patch::new();
        b.set_timestamps(stamps);
        b.add_feature(Namespace::Mask, "CLOUDS", NdArray::zeros::<u8>([2, 2, 2, 1]))
            .unwrap();

        let ab = Patch::merge(&a, &b).unwrap();
        let ba = Patch::merge(&b, &a).unwrap();
        assert_eq!(ab, ba);
        assert!(ab.get_feature(Namespace::Data, "BANDS").is_ok());
        assert!(ab.get_feature(Namespace::Mask, "CLOUDS").is_ok());
    }

    #[test]
    fn test_merge_conflict_with_matching_timestamps() {
        let stamps = vec![ts(10)];

        let mut a = Patch::new();
        a.set_timestamps(stamps.clone());
        a.add_feature(Namespace::Data, "BANDS", bands(1, 1.0)).unwrap();

        let mut b = Patch::new();
        b.set_timestamps(stamps);
        b.add_feature(Namespace::Data, "BANDS", bands(1, 2.0)).unwrap();

        assert!(matches!(
            Patch::merge(&a, &b),
            Err(PatchError::MergeConflict {
                namespace: Namespace::Data,
                ..
            })
        ));
    }

    #[test]
    fn test_merge_concatenates_along_time() {
        let mut a = Patch::new();
        a.set_timestamps(vec![ts(10)]);
        a.add_feature(Namespace::Data, "BANDS", bands(1, 1.0)).unwrap();

        let mut b = Patch::new();
        b.set_timestamps(vec![ts(12), ts(14)]);
        b.add_feature(Namespace::Data, "BANDS", bands(2, 2.0)).unwrap();

        let merged = Patch::merge(&a, &b).unwrap();
        assert_eq!(merged.timestamps(), &[ts(10), ts(12), ts(14)]);

        let joined = merged.get_feature(Namespace::Data, "BANDS").unwrap();
        assert_eq!(joined.as_array().unwrap().shape(), &[3, 2, 2, 1]);
    }

    #[test]
    fn test_merge_timestamps_keep_input_order() {
        // Interleaved and overlapping ranges are allowed; ordering is the
        // caller's responsibility.
        let mut a = Patch::new();
        a.set_timestamps(vec![ts(14)]);
        let mut b = Patch::new();
        b.set_timestamps(vec![ts(10)]);

        let merged = Patch::merge(&a, &b).unwrap();
        assert_eq!(merged.timestamps(), &[ts(14), ts(10)]);
    }

    #[test]
    fn test_merge_concat_rejects_spatial_mismatch() {
        let mut a = Patch::new();
        a.set_timestamps(vec![ts(10)]);
        a.add_feature(Namespace::Data, "BANDS", bands(1, 1.0)).unwrap();

        let mut b = Patch::new();
        b.set_timestamps(vec![ts(12)]);
        b.add_feature(
            Namespace::Data,
            "BANDS",
            NdArray::zeros::<f32>([1, 3, 3, 1]),
        )
        .unwrap();

        assert!(matches!(
            Patch::merge(&a, &b),
            Err(PatchError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_merge_bounds_policy() {
        let mut a = Patch::new();
        let b = Patch::new();
        a.set_bounds(Some(bounds()));

        let merged = Patch::merge(&a, &b).unwrap();
        assert_eq!(merged.bounds(), Some(&bounds()));

        let mut c = Patch::new();
        c.set_bounds(Some(PatchBounds::new(
            BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            CrsCode::Epsg4326,
        )));
        assert!(matches!(
            Patch::merge(&a, &c),
            Err(PatchError::MergeIncompatible(Namespace::Bbox))
        ));
    }

    #[test]
    fn test_merge_timeless_conflict() {
        let mut a = Patch::new();
        a.add_feature(Namespace::DataTimeless, "DEM", NdArray::zeros::<f32>([2, 2, 1]))
            .unwrap();

        let mut b = Patch::new();
        b.add_feature(
            Namespace::DataTimeless,
            "DEM",
            NdArray::from_vec([2, 2, 1], vec![9.0f32; 4]).unwrap(),
        )
        .unwrap();

        assert!(matches!(
            Patch::merge(&a, &b),
            Err(PatchError::MergeConflict {
                namespace: Namespace::DataTimeless,
                ..
            })
        ));
    }

    #[test]
    fn test_populated_and_flatten() {
        let mut patch = Patch::new();
        patch.add_feature(Namespace::Data, "BANDS", bands(1, 0.0)).unwrap();
        patch.set_bounds(Some(bounds()));

        let populated = patch.populated();
        assert_eq!(populated.len(), 2);
        assert!(matches!(populated[&Namespace::Bbox], Populated::Present));

        let flat = patch.flatten();
        assert_eq!(
            flat,
            vec![
                FeatureSelector::Named(Namespace::Data, "BANDS".to_string()),
                FeatureSelector::Whole(Namespace::Bbox),
            ]
        );
    }

    #[test]
    fn test_time_series() {
        let mut patch = Patch::new();
        assert!(patch.time_series(None, 1).is_none());

        let t0 = ts(10);
        patch.set_timestamps(vec![t0, t0 + chrono::Duration::seconds(90)]);

        assert_eq!(patch.time_series(None, 1), Some(vec![0, 90]));
        assert_eq!(patch.time_series(None, 60), Some(vec![0, 2]));
        assert_eq!(
            patch.time_series(Some(t0 - chrono::Duration::seconds(30)), 1),
            Some(vec![30, 120])
        );
    }

    #[test]
    fn test_time_series_rounds_ties_away_from_zero() {
        let mut patch = Patch::new();
        let t0 = ts(10);
        patch.set_timestamps(vec![t0, t0 + chrono::Duration::seconds(30)]);

        // 0.5 units of 60 s round up, not to even.
        assert_eq!(patch.time_series(None, 60), Some(vec![0, 1]));
        // Negative halves also move away from zero: -0.5 becomes -1.
        assert_eq!(
            patch.time_series(Some(t0 + chrono::Duration::seconds(60)), 60),
            Some(vec![-1, -1])
        );
    }

    #[test]
    fn test_consolidate_timestamps() {
        let stamps = vec![ts(8), ts(10), ts(12)];

        let mut patch = Patch::new();
        patch.set_timestamps(stamps.clone());
        patch
            .add_feature(
                Namespace::Scalar,
                "VALUES",
                NdArray::from_vec([3, 1], vec![0.0f32, 1.0, 2.0]).unwrap(),
            )
            .unwrap();
        patch
            .add_feature(
                Namespace::Vector,
                "GEOMS",
                FeatureValue::Series(vec![json!("g0"), json!("g1"), json!("g2")]),
            )
            .unwrap();
        patch
            .add_feature(Namespace::DataTimeless, "DEM", NdArray::zeros::<f32>([2, 2, 1]))
            .unwrap();

        let removed = patch
            .consolidate_timestamps(&[stamps[0], stamps[2]])
            .unwrap();

        assert_eq!(removed, BTreeSet::from([stamps[1]]));
        assert_eq!(patch.timestamps(), &[stamps[0], stamps[2]]);

        let values = patch.get_feature(Namespace::Scalar, "VALUES").unwrap();
        assert_eq!(
            values.as_array().unwrap().to_vec::<f32>().unwrap(),
            vec![0.0, 2.0]
        );

        let geoms = patch.get_feature(Namespace::Vector, "GEOMS").unwrap();
        assert_eq!(
            geoms,
            &FeatureValue::Series(vec![json!("g0"), json!("g2")])
        );

        // Timeless namespaces are untouched.
        assert!(patch.get_feature(Namespace::DataTimeless, "DEM").is_ok());
    }
}
