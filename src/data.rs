//! Typed N-dimensional payload buffers and index-order handling.
//!
//! NRRD headers list axes fastest-varying first. [`NrrdArray`] holds the
//! decoded payload as an [`ndarray::ArrayD`] of the declared scalar type and
//! translates between the on-disk element order and the caller's preferred
//! [`IndexOrder`].

use byteorder::{BigEndian, ByteOrder, LittleEndian, NativeEndian};
use ndarray::{ArrayD, IxDyn, ShapeBuilder};

use crate::error::{Error, Result};
use crate::header::{Endianness, ScalarType};

/// Axis ordering of the in-memory buffer relative to the header's `sizes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexOrder {
    /// Fastest-varying axis first; shapes match `sizes` directly.
    #[default]
    Fortran,
    /// Slowest-varying axis first; shapes are `sizes` reversed.
    C,
}

/// Decoded payload: one `ArrayD` variant per concrete scalar type.
#[derive(Debug, Clone, PartialEq)]
pub enum NrrdArray {
    Int8(ArrayD<i8>),
    UInt8(ArrayD<u8>),
    Int16(ArrayD<i16>),
    UInt16(ArrayD<u16>),
    Int32(ArrayD<i32>),
    UInt32(ArrayD<u32>),
    Int64(ArrayD<i64>),
    UInt64(ArrayD<u64>),
    Float(ArrayD<f32>),
    Double(ArrayD<f64>),
}

macro_rules! each_variant {
    ($value:expr, $array:ident => $body:expr) => {
        match $value {
            NrrdArray::Int8($array) => $body,
            NrrdArray::UInt8($array) => $body,
            NrrdArray::Int16($array) => $body,
            NrrdArray::UInt16($array) => $body,
            NrrdArray::Int32($array) => $body,
            NrrdArray::UInt32($array) => $body,
            NrrdArray::Int64($array) => $body,
            NrrdArray::UInt64($array) => $body,
            NrrdArray::Float($array) => $body,
            NrrdArray::Double($array) => $body,
        }
    };
}

// Decode multi-byte elements with the declared byte order.
macro_rules! decode_elements {
    ($bytes:expr, $count:expr, $endian:expr, $t:ty, $read:ident) => {{
        let mut values = vec![<$t>::default(); $count];
        match $endian {
            Endianness::Little => LittleEndian::$read($bytes, &mut values),
            Endianness::Big => BigEndian::$read($bytes, &mut values),
        }
        values
    }};
}

// Encode multi-byte elements in host order; the writer declares the host
// endianness in the header.
macro_rules! encode_elements {
    ($values:expr, $size:expr, $write:ident) => {{
        let mut bytes = vec![0u8; $values.len() * $size];
        NativeEndian::$write(&$values, &mut bytes);
        bytes
    }};
}

macro_rules! parse_tokens {
    ($tokens:expr, $t:ty, $name:expr) => {
        $tokens
            .iter()
            .map(|token| {
                token.parse::<$t>().map_err(|_| {
                    Error::Encoding(format!(
                        "Invalid ascii value for type {}: {token}",
                        $name
                    ))
                })
            })
            .collect::<Result<Vec<$t>>>()
    };
}

impl NrrdArray {
    /// Scalar type of the elements.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Self::Int8(_) => ScalarType::Int8,
            Self::UInt8(_) => ScalarType::UInt8,
            Self::Int16(_) => ScalarType::Int16,
            Self::UInt16(_) => ScalarType::UInt16,
            Self::Int32(_) => ScalarType::Int32,
            Self::UInt32(_) => ScalarType::UInt32,
            Self::Int64(_) => ScalarType::Int64,
            Self::UInt64(_) => ScalarType::UInt64,
            Self::Float(_) => ScalarType::Float,
            Self::Double(_) => ScalarType::Double,
        }
    }

    /// Shape in the caller's index order.
    pub fn shape(&self) -> &[usize] {
        each_variant!(self, a => a.shape())
    }

    pub fn ndim(&self) -> usize {
        each_variant!(self, a => a.ndim())
    }

    /// Total element count.
    pub fn len(&self) -> usize {
        each_variant!(self, a => a.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Axis lengths in fastest-first order, as written to `sizes`.
    pub(crate) fn disk_sizes(&self, order: IndexOrder) -> Vec<usize> {
        let mut sizes = self.shape().to_vec();
        if order == IndexOrder::C {
            sizes.reverse();
        }
        sizes
    }

    /// Build an array from on-disk bytes (fastest-first element order).
    pub(crate) fn from_bytes(
        scalar_type: ScalarType,
        sizes: &[usize],
        bytes: &[u8],
        endian: Endianness,
        order: IndexOrder,
    ) -> Result<Self> {
        let count: usize = sizes.iter().product();
        let size = scalar_type.size();
        if size == 0 {
            return Err(Error::UnsupportedType(
                "Decoding data of type 'block' is not supported".to_string(),
            ));
        }
        if bytes.len() % size != 0 {
            return Err(Error::Encoding(format!(
                "Data length {} is not a multiple of the element size {size}",
                bytes.len()
            )));
        }
        let actual = bytes.len() / size;
        if actual != count {
            return Err(size_mismatch(count, actual));
        }

        match scalar_type {
            ScalarType::Int8 => {
                let values: Vec<i8> = bytes.iter().map(|&b| b as i8).collect();
                Ok(Self::Int8(build_array(values, sizes, order)?))
            }
            ScalarType::UInt8 => Ok(Self::UInt8(build_array(bytes.to_vec(), sizes, order)?)),
            ScalarType::Int16 => Ok(Self::Int16(build_array(
                decode_elements!(bytes, count, endian, i16, read_i16_into),
                sizes,
                order,
            )?)),
            ScalarType::UInt16 => Ok(Self::UInt16(build_array(
                decode_elements!(bytes, count, endian, u16, read_u16_into),
                sizes,
                order,
            )?)),
            ScalarType::Int32 => Ok(Self::Int32(build_array(
                decode_elements!(bytes, count, endian, i32, read_i32_into),
                sizes,
                order,
            )?)),
            ScalarType::UInt32 => Ok(Self::UInt32(build_array(
                decode_elements!(bytes, count, endian, u32, read_u32_into),
                sizes,
                order,
            )?)),
            ScalarType::Int64 => Ok(Self::Int64(build_array(
                decode_elements!(bytes, count, endian, i64, read_i64_into),
                sizes,
                order,
            )?)),
            ScalarType::UInt64 => Ok(Self::UInt64(build_array(
                decode_elements!(bytes, count, endian, u64, read_u64_into),
                sizes,
                order,
            )?)),
            ScalarType::Float => Ok(Self::Float(build_array(
                decode_elements!(bytes, count, endian, f32, read_f32_into),
                sizes,
                order,
            )?)),
            ScalarType::Double => Ok(Self::Double(build_array(
                decode_elements!(bytes, count, endian, f64, read_f64_into),
                sizes,
                order,
            )?)),
            ScalarType::Block => Err(Error::UnsupportedType(
                "Decoding data of type 'block' is not supported".to_string(),
            )),
        }
    }

    /// Serialize elements to bytes in fastest-first order, host endianness.
    pub(crate) fn to_bytes(&self, order: IndexOrder) -> Vec<u8> {
        match self {
            Self::Int8(a) => disk_elements(a, order)
                .into_iter()
                .map(|x| x as u8)
                .collect(),
            Self::UInt8(a) => disk_elements(a, order),
            Self::Int16(a) => encode_elements!(disk_elements(a, order), 2, write_i16_into),
            Self::UInt16(a) => encode_elements!(disk_elements(a, order), 2, write_u16_into),
            Self::Int32(a) => encode_elements!(disk_elements(a, order), 4, write_i32_into),
            Self::UInt32(a) => encode_elements!(disk_elements(a, order), 4, write_u32_into),
            Self::Int64(a) => encode_elements!(disk_elements(a, order), 8, write_i64_into),
            Self::UInt64(a) => encode_elements!(disk_elements(a, order), 8, write_u64_into),
            Self::Float(a) => encode_elements!(disk_elements(a, order), 4, write_f32_into),
            Self::Double(a) => encode_elements!(disk_elements(a, order), 8, write_f64_into),
        }
    }

    /// Build an array from whitespace-separated ASCII tokens.
    pub(crate) fn from_ascii(
        scalar_type: ScalarType,
        sizes: &[usize],
        text: &str,
        order: IndexOrder,
    ) -> Result<Self> {
        let count: usize = sizes.iter().product();
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() != count {
            return Err(size_mismatch(count, tokens.len()));
        }

        match scalar_type {
            ScalarType::Int8 => Ok(Self::Int8(build_array(
                parse_tokens!(tokens, i8, "int8")?,
                sizes,
                order,
            )?)),
            ScalarType::UInt8 => Ok(Self::UInt8(build_array(
                parse_tokens!(tokens, u8, "uint8")?,
                sizes,
                order,
            )?)),
            ScalarType::Int16 => Ok(Self::Int16(build_array(
                parse_tokens!(tokens, i16, "int16")?,
                sizes,
                order,
            )?)),
            ScalarType::UInt16 => Ok(Self::UInt16(build_array(
                parse_tokens!(tokens, u16, "uint16")?,
                sizes,
                order,
            )?)),
            ScalarType::Int32 => Ok(Self::Int32(build_array(
                parse_tokens!(tokens, i32, "int32")?,
                sizes,
                order,
            )?)),
            ScalarType::UInt32 => Ok(Self::UInt32(build_array(
                parse_tokens!(tokens, u32, "uint32")?,
                sizes,
                order,
            )?)),
            ScalarType::Int64 => Ok(Self::Int64(build_array(
                parse_tokens!(tokens, i64, "int64")?,
                sizes,
                order,
            )?)),
            ScalarType::UInt64 => Ok(Self::UInt64(build_array(
                parse_tokens!(tokens, u64, "uint64")?,
                sizes,
                order,
            )?)),
            ScalarType::Float => Ok(Self::Float(build_array(
                parse_tokens!(tokens, f32, "float")?,
                sizes,
                order,
            )?)),
            ScalarType::Double => Ok(Self::Double(build_array(
                parse_tokens!(tokens, f64, "double")?,
                sizes,
                order,
            )?)),
            ScalarType::Block => Err(Error::UnsupportedType(
                "Decoding data of type 'block' is not supported".to_string(),
            )),
        }
    }

    /// Format elements as ASCII in fastest-first order.
    ///
    /// 2-D data gets one row along the fastest axis per line; any other
    /// dimensionality is one token per line. The layout carries no meaning
    /// but stays consistent across writes.
    pub(crate) fn to_ascii(&self, order: IndexOrder) -> String {
        let tokens: Vec<String> = match self {
            Self::Int8(a) => format_elements(a, order),
            Self::UInt8(a) => format_elements(a, order),
            Self::Int16(a) => format_elements(a, order),
            Self::UInt16(a) => format_elements(a, order),
            Self::Int32(a) => format_elements(a, order),
            Self::UInt32(a) => format_elements(a, order),
            Self::Int64(a) => format_elements(a, order),
            Self::UInt64(a) => format_elements(a, order),
            Self::Float(a) => format_elements(a, order),
            Self::Double(a) => format_elements(a, order),
        };

        let sizes = self.disk_sizes(order);
        let per_line = if sizes.len() == 2 { sizes[0].max(1) } else { 1 };
        let mut out = String::new();
        for chunk in tokens.chunks(per_line) {
            out.push_str(&chunk.join(" "));
            out.push('\n');
        }
        out
    }
}

macro_rules! impl_from_array {
    ($t:ty, $variant:ident) => {
        impl From<ArrayD<$t>> for NrrdArray {
            fn from(array: ArrayD<$t>) -> Self {
                Self::$variant(array)
            }
        }
    };
}

impl_from_array!(i8, Int8);
impl_from_array!(u8, UInt8);
impl_from_array!(i16, Int16);
impl_from_array!(u16, UInt16);
impl_from_array!(i32, Int32);
impl_from_array!(u32, UInt32);
impl_from_array!(i64, Int64);
impl_from_array!(u64, UInt64);
impl_from_array!(f32, Float);
impl_from_array!(f64, Double);

pub(crate) fn size_mismatch(expected: usize, actual: usize) -> Error {
    Error::Encoding(format!(
        "Size of the data does not equal the product of all the dimensions: \
         {expected}-{actual}={}",
        expected as i64 - actual as i64
    ))
}

/// Shape a fastest-first element vector per the requested index order.
fn build_array<T>(values: Vec<T>, sizes: &[usize], order: IndexOrder) -> Result<ArrayD<T>> {
    let result = match order {
        IndexOrder::Fortran => ArrayD::from_shape_vec(IxDyn(sizes).f(), values),
        IndexOrder::C => {
            let reversed: Vec<usize> = sizes.iter().rev().copied().collect();
            ArrayD::from_shape_vec(IxDyn(&reversed), values)
        }
    };
    result.map_err(|e| Error::Encoding(format!("Cannot shape data into {sizes:?}: {e}")))
}

/// Elements in fastest-first (on-disk) order regardless of memory layout.
fn disk_elements<T: Copy>(array: &ArrayD<T>, order: IndexOrder) -> Vec<T> {
    match order {
        // Iterating the transposed view in logical row-major order visits
        // the original array in column-major order.
        IndexOrder::Fortran => array.t().iter().copied().collect(),
        IndexOrder::C => array.iter().copied().collect(),
    }
}

fn format_elements<T: Copy + ToString>(array: &ArrayD<T>, order: IndexOrder) -> Vec<String> {
    disk_elements(array, order)
        .into_iter()
        .map(|v| v.to_string())
        .collect()
}
