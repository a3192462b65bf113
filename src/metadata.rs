//! Zarr V2 array metadata.
//!
//! The on-disk representation of an array: a JSON document stored under the `.zarray` key.
//! See <https://zarr-specs.readthedocs.io/en/latest/v2/v2.0.html#metadata>.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::array::{ArrayShape, ChunkShape};

/// Zarr V2 array metadata.
///
/// An example `JSON` document:
/// ```json
/// {
///     "zarr_format": 2,
///     "shape": [10000, 10000],
///     "chunks": [1000, 1000],
///     "dtype": "<f8",
///     "compressor": {"id": "zlib", "level": 1},
///     "fill_value": "NaN",
///     "order": "C",
///     "filters": null,
///     "dimension_separator": "."
/// }
/// ```
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ArrayMetadata {
    /// An integer defining the version of the storage specification to which the array
    /// adheres. Must be `2`.
    pub zarr_format: monostate::MustBe!(2u64),
    /// An array of integers providing the length of each dimension of the array.
    pub shape: ArrayShape,
    /// A list of integers defining the length of each dimension of a chunk of the array.
    pub chunks: ChunkShape,
    /// A string defining the data type of the array, e.g. `<i4`.
    pub dtype: String,
    /// A JSON object identifying the primary compression codec, or null if no compressor
    /// is to be used.
    pub compressor: Option<CodecMetadata>,
    /// A scalar value providing the default value to use for uninitialized portions of
    /// the array, or null if no fill value is to be used.
    pub fill_value: FillValueMetadata,
    /// Either `C` or `F`, defining the layout of bytes within each chunk of the array.
    pub order: Order,
    /// A list of JSON objects providing codec configurations, or null if no filters are
    /// to be applied.
    #[serde(default)]
    pub filters: Option<Vec<CodecMetadata>>,
    /// Either `.` or `/`, the separator placed between the dimensions of a chunk key.
    #[serde(default = "chunk_key_separator_default")]
    pub dimension_separator: ChunkKeySeparator,
}

const fn chunk_key_separator_default() -> ChunkKeySeparator {
    ChunkKeySeparator::Dot
}

impl ArrayMetadata {
    /// Create array metadata with no compressor, `C` order, no filters, and a `.`
    /// dimension separator.
    #[must_use]
    pub fn new(
        shape: ArrayShape,
        chunks: ChunkShape,
        dtype: impl Into<String>,
        fill_value: FillValueMetadata,
    ) -> Self {
        Self {
            zarr_format: monostate::MustBe!(2u64),
            shape,
            chunks,
            dtype: dtype.into(),
            compressor: None,
            fill_value,
            order: Order::C,
            filters: None,
            dimension_separator: ChunkKeySeparator::Dot,
        }
    }

    /// Return this metadata with `compressor`.
    #[must_use]
    pub fn with_compressor(mut self, compressor: CodecMetadata) -> Self {
        self.compressor = Some(compressor);
        self
    }

    /// Return this metadata with `dimension_separator`.
    #[must_use]
    pub fn with_dimension_separator(mut self, dimension_separator: ChunkKeySeparator) -> Self {
        self.dimension_separator = dimension_separator;
        self
    }
}

/// Codec metadata with an id and a flattened configuration.
///
/// For example:
/// ```json
/// {
///     "id": "blosc",
///     "cname": "lz4",
///     "clevel": 5,
///     "shuffle": 1
/// }
/// ```
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
pub struct CodecMetadata {
    id: String,
    #[serde(flatten)]
    configuration: serde_json::Map<String, serde_json::Value>,
}

impl CodecMetadata {
    /// Create codec metadata from an id and a serializable configuration.
    ///
    /// # Errors
    /// Returns [`serde_json::Error`] if the configuration does not serialize to a JSON
    /// object.
    pub fn new_with_serializable_configuration<T: Serialize>(
        id: impl Into<String>,
        configuration: &T,
    ) -> Result<Self, serde_json::Error> {
        let configuration = match serde_json::to_value(configuration)? {
            serde_json::Value::Object(configuration) => configuration,
            _ => return Err(serde::ser::Error::custom("configuration must be an object")),
        };
        Ok(Self {
            id: id.into(),
            configuration,
        })
    }

    /// Return the "id" key.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Return the configuration, which includes all fields excluding the "id".
    #[must_use]
    pub fn configuration(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.configuration
    }

    /// Deserialize the configuration.
    ///
    /// # Errors
    /// Returns [`serde_json::Error`] if the configuration cannot be deserialized into `T`.
    pub fn to_configuration<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(self.configuration.clone()))
    }
}

/// A scalar value providing the default value to use for uninitialized portions of the
/// array, or null if no fill value is to be used.
#[derive(Clone, PartialEq, Debug)]
pub enum FillValueMetadata {
    /// No fill value.
    Null,
    /// NaN (not-a-number).
    NaN,
    /// Positive infinity.
    Infinity,
    /// Negative infinity.
    NegInfinity,
    /// A number.
    Number(serde_json::Number),
}

impl core::fmt::Display for FillValueMetadata {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::NaN => f.write_str("NaN"),
            Self::Infinity => f.write_str("Infinity"),
            Self::NegInfinity => f.write_str("-Infinity"),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

impl<'de> serde::Deserialize<'de> for FillValueMetadata {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum FillValueMetadataType {
            String(String),
            Number(serde_json::Number),
            Null,
        }
        let fill_value = FillValueMetadataType::deserialize(d)?;
        match fill_value {
            FillValueMetadataType::String(string) => match string.as_str() {
                "NaN" => Ok(Self::NaN),
                "Infinity" => Ok(Self::Infinity),
                "-Infinity" => Ok(Self::NegInfinity),
                _ => Err(serde::de::Error::custom("unsupported fill value")),
            },
            FillValueMetadataType::Number(number) => Ok(Self::Number(number)),
            FillValueMetadataType::Null => Ok(Self::Null),
        }
    }
}

impl Serialize for FillValueMetadata {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::NaN => serializer.serialize_str("NaN"),
            Self::Infinity => serializer.serialize_str("Infinity"),
            Self::NegInfinity => serializer.serialize_str("-Infinity"),
            Self::Number(number) => number.serialize(serializer),
        }
    }
}

/// The layout of bytes within each chunk of the array.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Order {
    /// Row-major order. The last dimension varies fastest.
    C,
    /// Column-major order. The first dimension varies fastest.
    F,
}

/// The separator placed between the dimensions of a chunk key.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum ChunkKeySeparator {
    /// A `.` separator.
    #[serde(rename = ".")]
    #[display(".")]
    Dot,
    /// A `/` separator.
    #[serde(rename = "/")]
    #[display("/")]
    Slash,
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON_EXAMPLE: &str = r#"{
        "chunks": [1000, 1000],
        "compressor": {"id": "zlib", "level": 1},
        "dtype": "<f8",
        "fill_value": "NaN",
        "filters": null,
        "order": "C",
        "shape": [10000, 10000],
        "zarr_format": 2
    }"#;

    #[test]
    fn metadata_deserialize() {
        let metadata: ArrayMetadata = serde_json::from_str(JSON_EXAMPLE).unwrap();
        assert_eq!(metadata.shape, vec![10000, 10000]);
        assert_eq!(metadata.chunks.to_array_shape(), vec![1000, 1000]);
        assert_eq!(metadata.dtype, "<f8");
        assert_eq!(metadata.fill_value, FillValueMetadata::NaN);
        assert_eq!(metadata.order, Order::C);
        assert_eq!(metadata.dimension_separator, ChunkKeySeparator::Dot);
        let compressor = metadata.compressor.unwrap();
        assert_eq!(compressor.id(), "zlib");
        assert_eq!(
            compressor.configuration().get("level"),
            Some(&serde_json::Value::from(1))
        );
    }

    #[test]
    fn metadata_round_trip() {
        let metadata: ArrayMetadata = serde_json::from_str(JSON_EXAMPLE).unwrap();
        let json = serde_json::to_string(&metadata).unwrap();
        let reparsed: ArrayMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(metadata, reparsed);
    }

    #[test]
    fn metadata_rejects_other_formats() {
        assert!(serde_json::from_str::<ArrayMetadata>(
            &JSON_EXAMPLE.replace("\"zarr_format\": 2", "\"zarr_format\": 3")
        )
        .is_err());
    }

    #[test]
    fn metadata_fill_values() {
        for (json, expected) in [
            ("null", FillValueMetadata::Null),
            ("\"NaN\"", FillValueMetadata::NaN),
            ("\"Infinity\"", FillValueMetadata::Infinity),
            ("\"-Infinity\"", FillValueMetadata::NegInfinity),
            ("42", FillValueMetadata::Number(42.into())),
        ] {
            assert_eq!(
                serde_json::from_str::<FillValueMetadata>(json).unwrap(),
                expected
            );
        }
        assert!(serde_json::from_str::<FillValueMetadata>("\"nan\"").is_err());
    }

    #[test]
    fn metadata_separator() {
        let metadata: ArrayMetadata = serde_json::from_str(
            &JSON_EXAMPLE.replace("\"order\": \"C\"", "\"order\": \"C\", \"dimension_separator\": \"/\""),
        )
        .unwrap();
        assert_eq!(metadata.dimension_separator, ChunkKeySeparator::Slash);
        assert_eq!(metadata.dimension_separator.to_string(), "/");
    }
}
