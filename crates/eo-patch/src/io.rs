//! Filesystem persistence for patches.
//!
//! A patch is stored as one directory. Each non-empty namespace becomes
//! either a single JSON file at `<root>/<namespace>` (object format) or a
//! `<root>/<namespace>/` directory of columnar array files (columnar
//! format, array namespaces only). Columnar files carry an `EOAR` header
//! with dtype and shape followed by the raw little-endian payload, so
//! uncompressed files can be memory-mapped directly.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read as _, Write as _};
use std::path::Path;
use std::sync::Arc;

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use memmap2::Mmap;
use tracing::{debug, warn};

use eo_common::PatchBounds;

use crate::array::{Dtype, NdArray};
use crate::error::{PatchError, Result};
use crate::feature_map::FeatureMap;
use crate::namespace::{ContainerKind, Namespace};
use crate::patch::Patch;
use crate::value::{FeatureValue, LazyArray};

const MAGIC: [u8; 4] = *b"EOAR";
const FORMAT_VERSION: u8 = 1;

const ARRAY_SUFFIX: &str = ".arr";
const COMPRESSED_SUFFIX: &str = ".arr.gz";

/// On-disk representation of array namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// One JSON file per namespace, arrays inlined as number lists.
    Object,
    /// One binary file per array feature, mappable and lazily loadable.
    Columnar,
}

/// Options controlling [`Patch::save`].
#[derive(Debug, Clone)]
pub struct SaveOptions {
    pub format: FileFormat,
    /// Replace an existing non-empty target directory.
    pub overwrite: bool,
    /// Gzip columnar array files.
    pub compress: bool,
    /// Gzip level, 0-9.
    pub compression_level: u32,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            format: FileFormat::Columnar,
            overwrite: false,
            compress: false,
            compression_level: 9,
        }
    }
}

/// Options controlling [`Patch::load`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Memory-map uncompressed columnar files instead of reading them.
    pub mmap: bool,
    /// Defer compressed columnar files behind [`LazyArray`] thunks.
    pub lazy: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            mmap: true,
            lazy: true,
        }
    }
}

impl Patch {
    /// Write the patch under `path`, creating the directory if needed.
    ///
    /// `namespaces` limits the write to a subset; `None` writes everything
    /// populated. With `overwrite` the existing directory content is
    /// deleted first, otherwise a non-empty target is refused.
    pub fn save(
        &self,
        path: impl AsRef<Path>,
        namespaces: Option<&[Namespace]>,
        options: &SaveOptions,
    ) -> Result<()> {
        let root = path.as_ref();
        prepare_target(root, options.overwrite)?;

        let selected = namespaces.unwrap_or(&Namespace::ALL);
        for &ns in selected {
            match ns.kind() {
                ContainerKind::Mapping => {
                    let map = self.features(ns)?;
                    if map.is_empty() {
                        continue;
                    }
                    if ns.holds_arrays() && options.format == FileFormat::Columnar {
                        save_columnar(root, map, options)?;
                    } else {
                        save_object(root, map)?;
                    }
                }
                ContainerKind::Bounds => {
                    if let Some(bounds) = self.bounds() {
                        write_json(&root.join(ns.canonical_name()), bounds)?;
                    }
                }
                ContainerKind::Sequence => {
                    if !self.timestamps().is_empty() {
                        write_json(&root.join(ns.canonical_name()), &self.timestamps())?;
                    }
                }
            }
        }

        debug!(path = %root.display(), "saved patch");
        Ok(())
    }

    /// Read a patch from the directory written by [`Patch::save`].
    ///
    /// The on-disk format is detected per tree; a directory mixing object
    /// and columnar array namespaces is refused. Namespaces absent on disk
    /// load as empty.
    pub fn load(
        path: impl AsRef<Path>,
        namespaces: Option<&[Namespace]>,
        options: &LoadOptions,
    ) -> Result<Patch> {
        let root = path.as_ref();
        if !root.is_dir() {
            return Err(PatchError::PersistenceLayout(format!(
                "{} is not a patch directory",
                root.display()
            )));
        }

        let selected = namespaces.unwrap_or(&Namespace::ALL);
        detect_format(root, selected)?;

        let mut patch = Patch::new();
        for &ns in selected {
            let entry = root.join(ns.canonical_name());
            if !entry.exists() {
                continue;
            }

            match ns.kind() {
                ContainerKind::Mapping => {
                    if entry.is_dir() {
                        load_columnar(&entry, patch.features_mut(ns)?, options)?;
                    } else if let Some(entries) = read_json::<BTreeMap<String, FeatureValue>>(&entry)? {
                        patch.set_features(ns, entries)?;
                    }
                }
                ContainerKind::Bounds => {
                    patch.set_bounds(read_json::<PatchBounds>(&entry)?);
                }
                ContainerKind::Sequence => {
                    if let Some(timestamps) = read_json::<Vec<DateTime<Utc>>>(&entry)? {
                        patch.set_timestamps(timestamps);
                    }
                }
            }
        }

        Ok(patch)
    }
}

fn prepare_target(root: &Path, overwrite: bool) -> Result<()> {
    if root.is_file() {
        return Err(PatchError::PersistenceLayout(format!(
            "{} is a file, not a patch directory",
            root.display()
        )));
    }

    if root.is_dir() && fs::read_dir(root)?.next().is_some() {
        if !overwrite {
            return Err(PatchError::PersistenceLayout(format!(
                "{} is not empty; pass overwrite to replace it",
                root.display()
            )));
        }
        warn!(path = %root.display(), "overwriting existing patch directory");
        fs::remove_dir_all(root)?;
    }

    fs::create_dir_all(root)?;
    Ok(())
}

/// Refuse trees where some array namespaces are object files and others
/// are columnar directories.
fn detect_format(root: &Path, selected: &[Namespace]) -> Result<()> {
    let mut saw_object = false;
    let mut saw_columnar = false;

    for ns in selected {
        if !ns.holds_arrays() {
            continue;
        }
        let entry = root.join(ns.canonical_name());
        if entry.is_file() {
            saw_object = true;
        } else if entry.is_dir() {
            saw_columnar = true;
        }
    }

    if saw_object && saw_columnar {
        return Err(PatchError::PersistenceLayout(format!(
            "{} mixes object and columnar namespaces",
            root.display()
        )));
    }
    Ok(())
}

fn save_object(root: &Path, map: &FeatureMap) -> Result<()> {
    let mut entries = BTreeMap::new();
    for (name, value) in map {
        entries.insert(name.clone(), value.materialize()?);
    }
    write_json(&root.join(map.namespace().canonical_name()), &entries)
}

fn save_columnar(root: &Path, map: &FeatureMap, options: &SaveOptions) -> Result<()> {
    check_collisions(map)?;

    let dir = root.join(map.namespace().canonical_name());
    fs::create_dir_all(&dir)?;

    for (name, value) in map {
        let value = value.materialize()?;
        let array = value.as_array().ok_or_else(|| {
            PatchError::NotArray {
                namespace: map.namespace(),
                expected: map.namespace().expected_rank().unwrap_or(0),
            }
        })?;

        let encoded = encode_array(array.as_ref());
        if options.compress {
            let file = File::create(dir.join(format!("{name}{COMPRESSED_SUFFIX}")))?;
            let mut encoder =
                GzEncoder::new(file, Compression::new(options.compression_level));
            encoder.write_all(&encoded)?;
            encoder.finish()?;
        } else {
            fs::write(dir.join(format!("{name}{ARRAY_SUFFIX}")), &encoded)?;
        }
    }
    Ok(())
}

/// Case-insensitive filesystems cannot hold two features whose names
/// differ only in case.
fn check_collisions(map: &FeatureMap) -> Result<()> {
    let mut folded: BTreeMap<String, &str> = BTreeMap::new();
    for name in map.keys() {
        if let Some(first) = folded.insert(name.to_lowercase(), name) {
            return Err(PatchError::NamingCollision {
                first: first.to_string(),
                second: name.to_string(),
            });
        }
    }
    Ok(())
}

fn load_columnar(dir: &Path, map: &mut FeatureMap, options: &LoadOptions) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let file_name = match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        if let Some(name) = file_name.strip_suffix(COMPRESSED_SUFFIX) {
            let value = if options.lazy {
                FeatureValue::Lazy(LazyArray::new(path))
            } else {
                FeatureValue::array(read_array_gz(&path)?)
            };
            map.insert(name, value)?;
        } else if let Some(name) = file_name.strip_suffix(ARRAY_SUFFIX) {
            let array = if options.mmap {
                map_array(&path)?
            } else {
                read_array(&path)?
            };
            map.insert(name, FeatureValue::array(array))?;
        } else {
            debug!(path = %path.display(), "skipping unrecognized file in patch directory");
        }
    }
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer(file, value)?;
    Ok(())
}

/// Read a JSON file, treating zero-length files as absent.
fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if fs::metadata(path)?.len() == 0 {
        return Ok(None);
    }
    let file = File::open(path)?;
    Ok(Some(serde_json::from_reader(file)?))
}

/// Encode an array into the columnar wire form: `EOAR` magic, format
/// version, dtype code, rank, rank x u64-LE dims, raw payload.
pub(crate) fn encode_array(array: &NdArray) -> Vec<u8> {
    let header_len = MAGIC.len() + 3 + array.ndim() * 8;
    let mut buf = BytesMut::with_capacity(header_len + array.as_bytes().len());

    buf.put_slice(&MAGIC);
    buf.put_u8(FORMAT_VERSION);
    buf.put_u8(array.dtype().code());
    buf.put_u8(array.ndim() as u8);
    for &dim in array.shape() {
        buf.put_u64_le(dim as u64);
    }
    buf.put_slice(array.as_bytes());

    buf.to_vec()
}

/// Parse a columnar header, returning dtype, shape and the payload offset.
fn decode_header(bytes: &[u8]) -> Result<(Dtype, Vec<usize>, usize)> {
    if bytes.len() < MAGIC.len() + 3 || bytes[..MAGIC.len()] != MAGIC {
        return Err(PatchError::PersistenceLayout(
            "not a columnar array file".to_string(),
        ));
    }

    let version = bytes[4];
    if version != FORMAT_VERSION {
        return Err(PatchError::PersistenceLayout(format!(
            "unsupported columnar format version {version}"
        )));
    }

    let dtype = Dtype::from_code(bytes[5])?;
    let ndim = bytes[6] as usize;
    let offset = MAGIC.len() + 3 + ndim * 8;
    if bytes.len() < offset {
        return Err(PatchError::PersistenceLayout(
            "columnar header is truncated".to_string(),
        ));
    }

    let shape = (0..ndim)
        .map(|axis| {
            let start = MAGIC.len() + 3 + axis * 8;
            let dim: [u8; 8] = bytes[start..start + 8].try_into().expect("8-byte slice");
            u64::from_le_bytes(dim) as usize
        })
        .collect();

    Ok((dtype, shape, offset))
}

fn decode_array(bytes: &[u8]) -> Result<NdArray> {
    let (dtype, shape, offset) = decode_header(bytes)?;
    NdArray::from_raw(dtype, shape, bytes[offset..].to_vec())
}

fn read_array(path: &Path) -> Result<NdArray> {
    decode_array(&fs::read(path)?)
}

/// Map an uncompressed columnar file and wrap its payload without copying.
fn map_array(path: &Path) -> Result<NdArray> {
    let file = File::open(path)?;
    // Safety: the mapping is read-only and the Arc keeps it alive for as
    // long as any array references it. Concurrent truncation of the
    // underlying file is undefined behavior we accept, as mapping readers
    // of regular files generally do.
    let map = unsafe { Mmap::map(&file)? };
    let (dtype, shape, offset) = decode_header(&map)?;
    NdArray::from_mapped(dtype, shape, Arc::new(map), offset)
}

/// Decompress and decode a gzip columnar file.
pub(crate) fn read_array_gz(path: &Path) -> Result<NdArray> {
    let file = File::open(path)?;
    let mut decoder = GzDecoder::new(file);
    let mut bytes = Vec::new();
    decoder.read_to_end(&mut bytes)?;
    decode_array(&bytes)
}
