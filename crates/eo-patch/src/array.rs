//! Dense n-dimensional arrays backing the array-bearing namespaces.
//!
//! Arrays carry their dtype and shape explicitly and store elements in one
//! contiguous little-endian buffer, either owned or memory-mapped from an
//! uncompressed columnar file.

use std::fmt;
use std::sync::Arc;

use memmap2::Mmap;
use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{PatchError, Result};

/// Element type of an array, using numpy-style names on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dtype {
    #[serde(rename = "uint8")]
    U8,
    #[serde(rename = "uint16")]
    U16,
    #[serde(rename = "int16")]
    I16,
    #[serde(rename = "int32")]
    I32,
    #[serde(rename = "int64")]
    I64,
    #[serde(rename = "float32")]
    F32,
    #[serde(rename = "float64")]
    F64,
}

impl Dtype {
    /// Size of one element in bytes.
    pub fn size_of(self) -> usize {
        match self {
            Dtype::U8 => 1,
            Dtype::U16 | Dtype::I16 => 2,
            Dtype::I32 | Dtype::F32 => 4,
            Dtype::I64 | Dtype::F64 => 8,
        }
    }

    /// Whether this is a floating-point type.
    pub fn is_float(self) -> bool {
        matches!(self, Dtype::F32 | Dtype::F64)
    }

    /// Wire code used in the columnar file header.
    pub(crate) fn code(self) -> u8 {
        match self {
            Dtype::U8 => 1,
            Dtype::U16 => 2,
            Dtype::I16 => 3,
            Dtype::I32 => 4,
            Dtype::I64 => 5,
            Dtype::F32 => 6,
            Dtype::F64 => 7,
        }
    }

    pub(crate) fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(Dtype::U8),
            2 => Ok(Dtype::U16),
            3 => Ok(Dtype::I16),
            4 => Ok(Dtype::I32),
            5 => Ok(Dtype::I64),
            6 => Ok(Dtype::F32),
            7 => Ok(Dtype::F64),
            other => Err(PatchError::PersistenceLayout(format!(
                "unknown dtype code {other} in columnar header"
            ))),
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dtype::U8 => "uint8",
            Dtype::U16 => "uint16",
            Dtype::I16 => "int16",
            Dtype::I32 => "int32",
            Dtype::I64 => "int64",
            Dtype::F32 => "float32",
            Dtype::F64 => "float64",
        };
        f.write_str(name)
    }
}

/// Primitive element types storable in an [`NdArray`].
pub trait Element: bytemuck::Pod {
    const DTYPE: Dtype;
}

impl Element for u8 {
    const DTYPE: Dtype = Dtype::U8;
}
impl Element for u16 {
    const DTYPE: Dtype = Dtype::U16;
}
impl Element for i16 {
    const DTYPE: Dtype = Dtype::I16;
}
impl Element for i32 {
    const DTYPE: Dtype = Dtype::I32;
}
impl Element for i64 {
    const DTYPE: Dtype = Dtype::I64;
}
impl Element for f32 {
    const DTYPE: Dtype = Dtype::F32;
}
impl Element for f64 {
    const DTYPE: Dtype = Dtype::F64;
}

/// Backing storage for an array.
enum ArrayBuf {
    Owned(Vec<u8>),
    Mapped {
        map: Arc<Mmap>,
        offset: usize,
        len: usize,
    },
}

impl ArrayBuf {
    fn as_bytes(&self) -> &[u8] {
        match self {
            ArrayBuf::Owned(bytes) => bytes,
            ArrayBuf::Mapped { map, offset, len } => &map[*offset..*offset + *len],
        }
    }
}

/// A dense n-dimensional array with explicit dtype and shape.
pub struct NdArray {
    dtype: Dtype,
    shape: Vec<usize>,
    buf: ArrayBuf,
}

impl NdArray {
    /// Create an array from typed values in row-major order.
    pub fn from_vec<T: Element>(shape: impl Into<Vec<usize>>, values: Vec<T>) -> Result<Self> {
        let shape = shape.into();
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(PatchError::ShapeMismatch(format!(
                "shape {shape:?} needs {expected} elements, got {}",
                values.len()
            )));
        }

        Ok(Self {
            dtype: T::DTYPE,
            shape,
            buf: ArrayBuf::Owned(bytemuck::cast_slice(&values).to_vec()),
        })
    }

    /// Create a zero-filled array.
    pub fn zeros<T: Element>(shape: impl Into<Vec<usize>>) -> Self {
        let shape = shape.into();
        let len: usize = shape.iter().product::<usize>() * T::DTYPE.size_of();
        Self {
            dtype: T::DTYPE,
            shape,
            buf: ArrayBuf::Owned(vec![0u8; len]),
        }
    }

    /// Create an array over a raw element buffer.
    pub(crate) fn from_raw(dtype: Dtype, shape: Vec<usize>, bytes: Vec<u8>) -> Result<Self> {
        let expected = shape.iter().product::<usize>() * dtype.size_of();
        if bytes.len() != expected {
            return Err(PatchError::PersistenceLayout(format!(
                "columnar payload is {} bytes, shape {shape:?} of {dtype} needs {expected}",
                bytes.len()
            )));
        }
        Ok(Self {
            dtype,
            shape,
            buf: ArrayBuf::Owned(bytes),
        })
    }

    /// Create an array over a memory-mapped columnar file.
    pub(crate) fn from_mapped(
        dtype: Dtype,
        shape: Vec<usize>,
        map: Arc<Mmap>,
        offset: usize,
    ) -> Result<Self> {
        let len = shape.iter().product::<usize>() * dtype.size_of();
        if map.len() < offset + len {
            return Err(PatchError::PersistenceLayout(format!(
                "mapped columnar file is {} bytes, header plus shape {shape:?} of {dtype} needs {}",
                map.len(),
                offset + len
            )));
        }
        Ok(Self {
            dtype,
            shape,
            buf: ArrayBuf::Mapped { map, offset, len },
        })
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn num_elements(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether this array reads from a memory-mapped file.
    pub fn is_mapped(&self) -> bool {
        matches!(self.buf, ArrayBuf::Mapped { .. })
    }

    /// The raw little-endian element buffer.
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }

    /// Copy elements out as a typed vector.
    ///
    /// Copies rather than borrowing so that memory-mapped buffers with
    /// arbitrary alignment can be read safely.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::DTYPE != self.dtype {
            return Err(PatchError::Dtype {
                expected: self.dtype,
                actual: T::DTYPE,
            });
        }
        Ok(bytemuck::pod_collect_to_vec(self.as_bytes()))
    }

    /// Copy elements out without a dtype check. Caller must have matched
    /// on `dtype()` already.
    fn collect_unchecked<T: Element>(&self) -> Vec<T> {
        bytemuck::pod_collect_to_vec(self.as_bytes())
    }

    /// Concatenate two arrays along the leading (time) axis.
    ///
    /// All non-temporal dimensions and the dtype must match exactly.
    pub fn concat_time(a: &NdArray, b: &NdArray) -> Result<NdArray> {
        if a.dtype != b.dtype {
            return Err(PatchError::ShapeMismatch(format!(
                "cannot concatenate {} data with {} data",
                a.dtype, b.dtype
            )));
        }
        if a.ndim() == 0 || a.shape[1..] != b.shape[1..] {
            return Err(PatchError::ShapeMismatch(
                "could not concatenate because non-temporal dimensions do not match".to_string(),
            ));
        }

        let mut shape = a.shape.clone();
        shape[0] += b.shape[0];

        let mut bytes = Vec::with_capacity(a.as_bytes().len() + b.as_bytes().len());
        bytes.extend_from_slice(a.as_bytes());
        bytes.extend_from_slice(b.as_bytes());

        Ok(NdArray {
            dtype: a.dtype,
            shape,
            buf: ArrayBuf::Owned(bytes),
        })
    }

    /// Gather slices along the leading (time) axis in the given index order.
    pub fn select_time(&self, indices: &[usize]) -> Result<NdArray> {
        if self.ndim() == 0 {
            return Err(PatchError::ShapeMismatch(
                "cannot index a scalar array along time".to_string(),
            ));
        }

        let frames = self.shape[0];
        let frame_bytes = self.shape[1..].iter().product::<usize>() * self.dtype.size_of();
        let src = self.as_bytes();

        let mut bytes = Vec::with_capacity(frame_bytes * indices.len());
        for &index in indices {
            if index >= frames {
                return Err(PatchError::ShapeMismatch(format!(
                    "time index {index} out of range for {frames} frames"
                )));
            }
            bytes.extend_from_slice(&src[index * frame_bytes..(index + 1) * frame_bytes]);
        }

        let mut shape = self.shape.clone();
        shape[0] = indices.len();

        Ok(NdArray {
            dtype: self.dtype,
            shape,
            buf: ArrayBuf::Owned(bytes),
        })
    }
}

impl PartialEq for NdArray {
    fn eq(&self, other: &Self) -> bool {
        self.dtype == other.dtype
            && self.shape == other.shape
            && self.as_bytes() == other.as_bytes()
    }
}

impl Clone for NdArray {
    /// Cloning always materializes an owned buffer, so clones of
    /// memory-mapped arrays share no storage with the source file.
    fn clone(&self) -> Self {
        Self {
            dtype: self.dtype,
            shape: self.shape.clone(),
            buf: ArrayBuf::Owned(self.as_bytes().to_vec()),
        }
    }
}

impl fmt::Debug for NdArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NdArray")
            .field("dtype", &self.dtype)
            .field("shape", &self.shape)
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

impl Serialize for NdArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("NdArray", 3)?;
        state.serialize_field("dtype", &self.dtype)?;
        state.serialize_field("shape", &self.shape)?;
        match self.dtype {
            Dtype::U8 => state.serialize_field("data", &self.collect_unchecked::<u8>())?,
            Dtype::U16 => state.serialize_field("data", &self.collect_unchecked::<u16>())?,
            Dtype::I16 => state.serialize_field("data", &self.collect_unchecked::<i16>())?,
            Dtype::I32 => state.serialize_field("data", &self.collect_unchecked::<i32>())?,
            Dtype::I64 => state.serialize_field("data", &self.collect_unchecked::<i64>())?,
            Dtype::F32 => state.serialize_field("data", &self.collect_unchecked::<f32>())?,
            Dtype::F64 => state.serialize_field("data", &self.collect_unchecked::<f64>())?,
        }
        state.end()
    }
}

/// Serialized number payload; integers and floats arrive as separate token
/// streams depending on how the values were written.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberList {
    Ints(Vec<i64>),
    Floats(Vec<f64>),
}

impl NumberList {
    fn into_ints(self) -> Vec<i64> {
        match self {
            NumberList::Ints(values) => values,
            NumberList::Floats(values) => values.into_iter().map(|v| v as i64).collect(),
        }
    }

    fn into_floats(self) -> Vec<f64> {
        match self {
            NumberList::Ints(values) => values.into_iter().map(|v| v as f64).collect(),
            NumberList::Floats(values) => values,
        }
    }
}

impl<'de> Deserialize<'de> for NdArray {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Repr {
            dtype: Dtype,
            shape: Vec<usize>,
            data: NumberList,
        }

        let repr = Repr::deserialize(deserializer)?;
        let array = match repr.dtype {
            Dtype::U8 => NdArray::from_vec(
                repr.shape,
                repr.data.into_ints().into_iter().map(|v| v as u8).collect::<Vec<_>>(),
            ),
            Dtype::U16 => NdArray::from_vec(
                repr.shape,
                repr.data.into_ints().into_iter().map(|v| v as u16).collect::<Vec<_>>(),
            ),
            Dtype::I16 => NdArray::from_vec(
                repr.shape,
                repr.data.into_ints().into_iter().map(|v| v as i16).collect::<Vec<_>>(),
            ),
            Dtype::I32 => NdArray::from_vec(
                repr.shape,
                repr.data.into_ints().into_iter().map(|v| v as i32).collect::<Vec<_>>(),
            ),
            Dtype::I64 => NdArray::from_vec(repr.shape, repr.data.into_ints()),
            Dtype::F32 => NdArray::from_vec(
                repr.shape,
                repr.data.into_floats().into_iter().map(|v| v as f32).collect::<Vec<_>>(),
            ),
            Dtype::F64 => NdArray::from_vec(repr.shape, repr.data.into_floats()),
        };

        array.map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_checks_element_count() {
        assert!(NdArray::from_vec([2, 3], vec![0.0f32; 6]).is_ok());
        assert!(NdArray::from_vec([2, 3], vec![0.0f32; 5]).is_err());
    }

    #[test]
    fn test_roundtrip_values() {
        let array = NdArray::from_vec([2, 2], vec![1u16, 2, 3, 4]).unwrap();
        assert_eq!(array.dtype(), Dtype::U16);
        assert_eq!(array.ndim(), 2);
        assert_eq!(array.to_vec::<u16>().unwrap(), vec![1, 2, 3, 4]);
        assert!(matches!(
            array.to_vec::<f32>(),
            Err(PatchError::Dtype { .. })
        ));
    }

    #[test]
    fn test_concat_time() {
        let a = NdArray::from_vec([1, 2, 2, 1], vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();
        let b = NdArray::from_vec([2, 2, 2, 1], vec![5.0f32; 8]).unwrap();

        let joined = NdArray::concat_time(&a, &b).unwrap();
        assert_eq!(joined.shape(), &[3, 2, 2, 1]);
        assert_eq!(
            joined.to_vec::<f32>().unwrap()[..4],
            [1.0, 2.0, 3.0, 4.0]
        );
    }

    #[test]
    fn test_concat_time_rejects_mismatched_dims() {
        let a = NdArray::from_vec([1, 2, 2, 1], vec![0.0f32; 4]).unwrap();
        let b = NdArray::from_vec([1, 3, 2, 1], vec![0.0f32; 6]).unwrap();
        assert!(matches!(
            NdArray::concat_time(&a, &b),
            Err(PatchError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_concat_time_rejects_mismatched_dtype() {
        let a = NdArray::from_vec([1, 1], vec![0.0f32]).unwrap();
        let b = NdArray::from_vec([1, 1], vec![0u8]).unwrap();
        assert!(NdArray::concat_time(&a, &b).is_err());
    }

    #[test]
    fn test_select_time() {
        let array =
            NdArray::from_vec([3, 2], vec![0.0f64, 0.1, 1.0, 1.1, 2.0, 2.1]).unwrap();
        let picked = array.select_time(&[0, 2]).unwrap();
        assert_eq!(picked.shape(), &[2, 2]);
        assert_eq!(picked.to_vec::<f64>().unwrap(), vec![0.0, 0.1, 2.0, 2.1]);

        assert!(array.select_time(&[3]).is_err());
    }

    #[test]
    fn test_equality_is_structural() {
        let a = NdArray::from_vec([2, 1], vec![1i32, 2]).unwrap();
        let b = NdArray::from_vec([2, 1], vec![1i32, 2]).unwrap();
        let c = NdArray::from_vec([1, 2], vec![1i32, 2]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_json_roundtrip() {
        let array = NdArray::from_vec([2, 2], vec![1.5f32, -2.0, 0.0, 4.25]).unwrap();
        let json = serde_json::to_string(&array).unwrap();
        let back: NdArray = serde_json::from_str(&json).unwrap();
        assert_eq!(array, back);

        let ints = NdArray::from_vec([3], vec![1i64, -5, 1 << 40]).unwrap();
        let json = serde_json::to_string(&ints).unwrap();
        let back: NdArray = serde_json::from_str(&json).unwrap();
        assert_eq!(ints, back);
    }
}
