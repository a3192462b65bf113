use thiserror::Error;

use crate::metadata::FillValueMetadata;

use super::FillValue;

/// The element type of an array.
///
/// The V2 dtype string of a data type is its [`identifier`](DataType::identifier)
/// prefixed with an endianness marker (`<` little, `>` big, `|` not applicable).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DataType {
    /// `u1`: an unsigned 8-bit integer.
    UInt8,
    /// `i1`: a signed 8-bit integer.
    Int8,
    /// `u2`: an unsigned 16-bit integer.
    UInt16,
    /// `i2`: a signed 16-bit integer.
    Int16,
    /// `u4`: an unsigned 32-bit integer.
    UInt32,
    /// `i4`: a signed 32-bit integer.
    Int32,
    /// `f4`: an IEEE 754 32-bit float.
    Float32,
    /// `f8`: an IEEE 754 64-bit float.
    Float64,
}

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.identifier())
    }
}

impl DataType {
    /// Return the size in bytes of an element.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::UInt8 | Self::Int8 => 1,
            Self::UInt16 | Self::Int16 => 2,
            Self::UInt32 | Self::Int32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    /// Return the kind and width identifier of the data type, e.g. `i4`.
    #[must_use]
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::UInt8 => "u1",
            Self::Int8 => "i1",
            Self::UInt16 => "u2",
            Self::Int16 => "i2",
            Self::UInt32 => "u4",
            Self::Int32 => "i4",
            Self::Float32 => "f4",
            Self::Float64 => "f8",
        }
    }

    /// Parse a V2 dtype string, e.g. `<i4`.
    ///
    /// `b`/`B` are accepted as aliases of `i1`/`u1`. The endianness is [`None`] for
    /// single byte data types.
    ///
    /// # Errors
    /// Returns [`UnsupportedDataTypeError`] if the dtype is not recognised.
    pub fn from_dtype(dtype: &str) -> Result<(Self, Option<Endianness>), UnsupportedDataTypeError> {
        let err = || UnsupportedDataTypeError(dtype.to_string());
        let mut chars = dtype.chars();
        let endianness = match chars.next().ok_or_else(err)? {
            '<' => Some(Endianness::Little),
            '>' => Some(Endianness::Big),
            '|' => None,
            _ => return Err(err()),
        };
        let data_type = match chars.as_str() {
            "u1" | "B" | "B1" => Self::UInt8,
            "i1" | "b" | "b1" => Self::Int8,
            "u2" => Self::UInt16,
            "i2" => Self::Int16,
            "u4" => Self::UInt32,
            "i4" => Self::Int32,
            "f4" => Self::Float32,
            "f8" => Self::Float64,
            _ => return Err(err()),
        };
        let endianness = if data_type.size() == 1 {
            None
        } else {
            Some(endianness.ok_or_else(err)?)
        };
        Ok((data_type, endianness))
    }

    /// Return the V2 dtype string of the data type with `endianness`.
    #[must_use]
    pub fn dtype(&self, endianness: Option<Endianness>) -> String {
        let prefix = endianness.map_or('|', Endianness::prefix);
        format!("{prefix}{}", self.identifier())
    }

    /// Resolve metadata into the little-endian byte form of the fill value.
    ///
    /// Returns [`None`] for a null fill value.
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueMetadataError`] if the fill value is out of range
    /// of the data type or a non-finite float string is used with an integer data type.
    pub fn fill_value_from_metadata(
        &self,
        fill_value: &FillValueMetadata,
    ) -> Result<Option<FillValue>, IncompatibleFillValueMetadataError> {
        let err = || IncompatibleFillValueMetadataError(*self, fill_value.clone());
        match fill_value {
            FillValueMetadata::Null => Ok(None),
            FillValueMetadata::NaN | FillValueMetadata::Infinity | FillValueMetadata::NegInfinity => {
                let value = match fill_value {
                    FillValueMetadata::NaN => f64::NAN,
                    FillValueMetadata::Infinity => f64::INFINITY,
                    _ => f64::NEG_INFINITY,
                };
                match self {
                    Self::Float32 => Ok(Some(FillValue::from(value as f32))),
                    Self::Float64 => Ok(Some(FillValue::from(value))),
                    _ => Err(err()),
                }
            }
            FillValueMetadata::Number(number) => {
                let fill_value = match self {
                    Self::UInt8 => number
                        .as_u64()
                        .and_then(|value| u8::try_from(value).ok())
                        .map(FillValue::from),
                    Self::Int8 => number
                        .as_i64()
                        .and_then(|value| i8::try_from(value).ok())
                        .map(FillValue::from),
                    Self::UInt16 => number
                        .as_u64()
                        .and_then(|value| u16::try_from(value).ok())
                        .map(FillValue::from),
                    Self::Int16 => number
                        .as_i64()
                        .and_then(|value| i16::try_from(value).ok())
                        .map(FillValue::from),
                    Self::UInt32 => number
                        .as_u64()
                        .and_then(|value| u32::try_from(value).ok())
                        .map(FillValue::from),
                    Self::Int32 => number
                        .as_i64()
                        .and_then(|value| i32::try_from(value).ok())
                        .map(FillValue::from),
                    Self::Float32 => number.as_f64().map(|value| FillValue::from(value as f32)),
                    Self::Float64 => number.as_f64().map(FillValue::from),
                };
                fill_value.map(Some).ok_or_else(err)
            }
        }
    }
}

/// The byte order of multi-byte elements.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Endianness {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

impl Endianness {
    /// Return the dtype string prefix of the endianness.
    #[must_use]
    pub const fn prefix(self) -> char {
        match self {
            Self::Little => '<',
            Self::Big => '>',
        }
    }
}

/// Reverse the byte order of each `element_size` sized element of `bytes`.
pub(crate) fn reverse_endianness(bytes: &mut [u8], element_size: usize) {
    debug_assert_eq!(bytes.len() % element_size, 0);
    if element_size > 1 {
        for element in bytes.chunks_exact_mut(element_size) {
            element.reverse();
        }
    }
}

/// An unsupported data type error.
#[derive(Clone, Debug, Error)]
#[error("data type {_0} is not supported")]
pub struct UnsupportedDataTypeError(String);

/// An incompatible fill value error.
#[derive(Clone, Debug, Error)]
#[error("fill value {_1} is incompatible with data type {_0}")]
pub struct IncompatibleFillValueMetadataError(DataType, FillValueMetadata);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_from_dtype() {
        assert_eq!(
            DataType::from_dtype("<i4").unwrap(),
            (DataType::Int32, Some(Endianness::Little))
        );
        assert_eq!(
            DataType::from_dtype(">f8").unwrap(),
            (DataType::Float64, Some(Endianness::Big))
        );
        assert_eq!(DataType::from_dtype("|u1").unwrap(), (DataType::UInt8, None));
        assert_eq!(DataType::from_dtype("|b1").unwrap(), (DataType::Int8, None));
        assert_eq!(DataType::from_dtype("<i1").unwrap(), (DataType::Int8, None));
        assert!(DataType::from_dtype("<c8").is_err());
        assert!(DataType::from_dtype("|i2").is_err());
        assert!(DataType::from_dtype("i4").is_err());
        assert!(DataType::from_dtype("").is_err());
    }

    #[test]
    fn data_type_dtype_round_trip() {
        for dtype in ["<i4", ">u2", "|u1", "<f8"] {
            let (data_type, endianness) = DataType::from_dtype(dtype).unwrap();
            assert_eq!(data_type.dtype(endianness), dtype);
        }
    }

    #[test]
    fn fill_value_from_metadata() {
        let fill_value = DataType::Int32
            .fill_value_from_metadata(&FillValueMetadata::Number(7.into()))
            .unwrap()
            .unwrap();
        assert_eq!(fill_value.as_le_bytes(), 7i32.to_le_bytes());
        let fill_value = DataType::Int16
            .fill_value_from_metadata(&FillValueMetadata::Number((-1).into()))
            .unwrap()
            .unwrap();
        assert_eq!(fill_value.as_le_bytes(), (-1i16).to_le_bytes());
        assert!(DataType::Int32
            .fill_value_from_metadata(&FillValueMetadata::Null)
            .unwrap()
            .is_none());
        assert!(DataType::UInt8
            .fill_value_from_metadata(&FillValueMetadata::Number(256.into()))
            .is_err());
        assert!(DataType::Int32
            .fill_value_from_metadata(&FillValueMetadata::NaN)
            .is_err());
        let fill_value = DataType::Float32
            .fill_value_from_metadata(&FillValueMetadata::NaN)
            .unwrap()
            .unwrap();
        assert_eq!(fill_value.as_le_bytes(), f32::NAN.to_le_bytes());
    }

    #[test]
    fn endianness_reversal() {
        let mut bytes = vec![1, 2, 3, 4];
        reverse_endianness(&mut bytes, 2);
        assert_eq!(bytes, [2, 1, 4, 3]);
        reverse_endianness(&mut bytes, 1);
        assert_eq!(bytes, [2, 1, 4, 3]);
    }
}
