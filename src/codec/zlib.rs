use std::io::{Cursor, Read};

use flate2::bufread::{ZlibDecoder, ZlibEncoder};
use serde::{Deserialize, Serialize};

use super::{CodecError, CodecTraits, CompressionLevel, InvalidCompressionLevelError};

const IDENTIFIER: &str = "zlib";

/// Configuration parameters for the `zlib` codec.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
pub struct ZlibCodecConfiguration {
    /// The compression level.
    pub level: CompressionLevel,
}

/// A `zlib` codec implementation.
#[derive(Clone, Debug)]
pub struct ZlibCodec {
    compression_level: CompressionLevel,
}

impl ZlibCodec {
    /// Create a new `zlib` codec.
    ///
    /// # Errors
    /// Returns [`InvalidCompressionLevelError`] if `compression_level` is not valid.
    pub fn new(compression_level: u32) -> Result<Self, InvalidCompressionLevelError> {
        let compression_level: CompressionLevel = compression_level.try_into()?;
        Ok(Self { compression_level })
    }

    /// Create a new `zlib` codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &ZlibCodecConfiguration) -> Self {
        Self {
            compression_level: configuration.level,
        }
    }
}

impl CodecTraits for ZlibCodec {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn encode(&self, decoded: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut encoder = ZlibEncoder::new(
            Cursor::new(decoded),
            flate2::Compression::new(self.compression_level.as_u32()),
        );
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(out)
    }

    fn decode(&self, encoded: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut decoder = ZlibDecoder::new(Cursor::new(encoded));
        let mut out: Vec<u8> = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zlib_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let codec = ZlibCodec::new(5)?;
        let decoded: Vec<u8> = (0..255).collect();
        let encoded = codec.encode(decoded.clone())?;
        assert_eq!(codec.decode(encoded)?, decoded);
        Ok(())
    }

    #[test]
    fn zlib_decode_garbage() {
        let codec = ZlibCodec::new(5).unwrap();
        assert!(codec.decode(vec![0xde, 0xad, 0xbe, 0xef]).is_err());
    }
}
