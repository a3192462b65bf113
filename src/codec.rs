//! Chunk compression codecs.
//!
//! A codec is a bidirectional byte transform applied to chunks on their way to and from
//! the store. Codec descriptors in array metadata (see
//! [`CodecMetadata`](crate::metadata::CodecMetadata)) are resolved with
//! [`Codec::from_metadata`].

#[cfg(feature = "gzip")]
mod gzip;
#[cfg(feature = "zlib")]
mod zlib;

#[cfg(feature = "gzip")]
pub use gzip::{GzipCodec, GzipCodecConfiguration};
#[cfg(feature = "zlib")]
pub use zlib::{ZlibCodec, ZlibCodecConfiguration};

use derive_more::{Deref, From};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metadata::CodecMetadata;

/// Traits for a codec.
pub trait CodecTraits: core::fmt::Debug + Send + Sync {
    /// The codec identifier, e.g. `zlib`.
    fn identifier(&self) -> &'static str;

    /// Encode `decoded` into its stored byte form.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the bytes cannot be encoded.
    fn encode(&self, decoded: Vec<u8>) -> Result<Vec<u8>, CodecError>;

    /// Decode `encoded` into its in-memory byte form.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the bytes cannot be decoded.
    fn decode(&self, encoded: Vec<u8>) -> Result<Vec<u8>, CodecError>;
}

/// A codec.
#[derive(Debug, From, Deref)]
pub struct Codec(Box<dyn CodecTraits>);

impl Codec {
    /// Create a codec.
    pub fn new<T: CodecTraits + 'static>(codec: T) -> Self {
        Self(Box::new(codec))
    }

    /// Create a codec from metadata.
    ///
    /// # Errors
    /// Returns [`CodecCreateError`] if the codec is not supported or its configuration is
    /// invalid.
    pub fn from_metadata(metadata: &CodecMetadata) -> Result<Self, CodecCreateError> {
        let invalid_configuration =
            |err| CodecCreateError::InvalidConfiguration(metadata.id().to_string(), err);
        match metadata.id() {
            #[cfg(feature = "zlib")]
            "zlib" => {
                let configuration: ZlibCodecConfiguration =
                    metadata.to_configuration().map_err(invalid_configuration)?;
                Ok(Self::new(ZlibCodec::new_with_configuration(&configuration)))
            }
            #[cfg(feature = "gzip")]
            "gzip" => {
                let configuration: GzipCodecConfiguration =
                    metadata.to_configuration().map_err(invalid_configuration)?;
                Ok(Self::new(GzipCodec::new_with_configuration(&configuration)))
            }
            id => Err(CodecCreateError::Unsupported(id.to_string())),
        }
    }
}

/// A codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// Any other error.
    #[error("{_0}")]
    Other(String),
}

impl From<&str> for CodecError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for CodecError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// A codec creation error.
#[derive(Debug, Error)]
pub enum CodecCreateError {
    /// The codec is not supported.
    #[error("codec {_0} is not supported")]
    Unsupported(String),
    /// The codec configuration is invalid.
    #[error("invalid configuration for codec {_0}: {_1}")]
    InvalidConfiguration(String, serde_json::Error),
}

/// A compression level for the bundled codecs. An integer from 0 to 9.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
#[serde(try_from = "u32", into = "u32")]
pub struct CompressionLevel(u32);

/// An invalid compression level error.
#[derive(Clone, Copy, Debug, Error)]
#[error("invalid compression level {_0}, must be 0-9")]
pub struct InvalidCompressionLevelError(u32);

impl TryFrom<u32> for CompressionLevel {
    type Error = InvalidCompressionLevelError;

    fn try_from(level: u32) -> Result<Self, Self::Error> {
        if level <= 9 {
            Ok(Self(level))
        } else {
            Err(InvalidCompressionLevelError(level))
        }
    }
}

impl From<CompressionLevel> for u32 {
    fn from(level: CompressionLevel) -> Self {
        level.0
    }
}

impl CompressionLevel {
    /// The level as an integer.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}
