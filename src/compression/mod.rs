// src/compression/mod.rs
//! Payload compression codecs
//!
//! One codec is selected per package and applied to every sub-archive the
//! package contains: both `control.tar.*` and `data.tar.*` for DEB, the cpio
//! payload for RPM. Encoders are configured so that identical input always
//! yields identical output (gzip headers carry no timestamp, zstd and xz run
//! single-threaded).

use std::io::{self, Read, Write};
use std::str::FromStr;
use thiserror::Error;

/// Compression level used for zstd payloads
const ZSTD_LEVEL: i32 = 19;
/// Compression preset used for xz payloads
const XZ_PRESET: u32 = 6;

/// Compression-related errors
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Failed to create {format} decoder: {source}")]
    DecoderCreation {
        format: &'static str,
        source: io::Error,
    },

    #[error("Failed to decompress {format} data: {source}")]
    Decompression {
        format: &'static str,
        source: io::Error,
    },

    #[error("Failed to compress {format} data: {source}")]
    Compression {
        format: &'static str,
        source: io::Error,
    },

    #[error("Unsupported compression format: {0}")]
    UnsupportedFormat(String),
}

/// Supported compression formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionFormat {
    /// No compression (raw data)
    None,
    /// Gzip compression (.gz)
    #[default]
    Gzip,
    /// XZ/LZMA compression (.xz)
    Xz,
    /// Zstandard compression (.zst)
    Zstd,
}

impl CompressionFormat {
    /// Detect compression format from magic bytes
    ///
    /// Magic bytes:
    /// - Gzip: `1f 8b`
    /// - XZ: `fd 37 7a 58 5a 00` (FD + "7zXZ" + NUL)
    /// - Zstd: `28 b5 2f fd`
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.starts_with(&[0x1f, 0x8b]) {
            Self::Gzip
        } else if data.starts_with(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00]) {
            Self::Xz
        } else if data.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
            Self::Zstd
        } else {
            Self::None
        }
    }

    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Gzip => ".gz",
            Self::Xz => ".xz",
            Self::Zstd => ".zst",
        }
    }

    /// Suffix for a tar archive compressed with this format
    ///
    /// ```
    /// use packwright::compression::CompressionFormat;
    ///
    /// assert_eq!(CompressionFormat::Gzip.tar_suffix(), ".tar.gz");
    /// assert_eq!(CompressionFormat::Zstd.tar_suffix(), ".tar.zst");
    /// ```
    pub fn tar_suffix(&self) -> &'static str {
        match self {
            Self::None => ".tar",
            Self::Gzip => ".tar.gz",
            Self::Xz => ".tar.xz",
            Self::Zstd => ".tar.zst",
        }
    }

    /// Get a human-readable name for this format
    ///
    /// This is also the value of RPM's `PAYLOADCOMPRESSOR` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Xz => "xz",
            Self::Zstd => "zstd",
        }
    }

    /// Compression level, as recorded in RPM's `PAYLOADFLAGS` tag
    pub fn level(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Gzip => flate2::Compression::default().level(),
            Self::Xz => XZ_PRESET,
            Self::Zstd => ZSTD_LEVEL as u32,
        }
    }
}

impl std::fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CompressionFormat {
    type Err = CompressionError;

    /// Parse a package codec selector. Only real codecs are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gzip" | "gz" => Ok(Self::Gzip),
            "xz" => Ok(Self::Xz),
            "zstd" | "zst" => Ok(Self::Zstd),
            _ => Err(CompressionError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Compress a byte slice with the given format
pub fn compress(data: &[u8], format: CompressionFormat) -> Result<Vec<u8>, CompressionError> {
    let wrap = |source| CompressionError::Compression {
        format: format.name(),
        source,
    };

    match format {
        CompressionFormat::None => Ok(data.to_vec()),
        CompressionFormat::Gzip => {
            let mut encoder =
                flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(data).map_err(wrap)?;
            encoder.finish().map_err(wrap)
        }
        CompressionFormat::Xz => {
            let mut encoder = xz2::write::XzEncoder::new(Vec::new(), XZ_PRESET);
            encoder.write_all(data).map_err(wrap)?;
            encoder.finish().map_err(wrap)
        }
        CompressionFormat::Zstd => zstd::encode_all(data, ZSTD_LEVEL).map_err(wrap),
    }
}

/// Create a decompressing reader for the given format
///
/// Returns a boxed `Read` implementation that decompresses data on the fly.
/// For `CompressionFormat::None`, returns the reader unchanged.
pub fn create_decoder<'a, R: Read + 'a>(
    reader: R,
    format: CompressionFormat,
) -> Result<Box<dyn Read + 'a>, CompressionError> {
    match format {
        CompressionFormat::None => Ok(Box::new(reader)),
        CompressionFormat::Gzip => Ok(Box::new(flate2::read::GzDecoder::new(reader))),
        CompressionFormat::Xz => Ok(Box::new(xz2::read::XzDecoder::new(reader))),
        CompressionFormat::Zstd => {
            let decoder = zstd::Decoder::new(reader).map_err(|e| CompressionError::DecoderCreation {
                format: "zstd",
                source: e,
            })?;
            Ok(Box::new(decoder))
        }
    }
}

/// Decompress a byte slice using the specified format
pub fn decompress(data: &[u8], format: CompressionFormat) -> Result<Vec<u8>, CompressionError> {
    let mut decoder = create_decoder(data, format)?;
    let mut output = Vec::new();
    decoder
        .read_to_end(&mut output)
        .map_err(|e| CompressionError::Decompression {
            format: format.name(),
            source: e,
        })?;
    Ok(output)
}

/// Decompress a byte slice, detecting the format from magic bytes
pub fn decompress_auto(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let format = CompressionFormat::from_magic_bytes(data);
    decompress(data, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODECS: [CompressionFormat; 3] = [
        CompressionFormat::Gzip,
        CompressionFormat::Xz,
        CompressionFormat::Zstd,
    ];

    #[test]
    fn test_parse_codec_selector() {
        assert_eq!("gzip".parse::<CompressionFormat>().unwrap(), CompressionFormat::Gzip);
        assert_eq!("XZ".parse::<CompressionFormat>().unwrap(), CompressionFormat::Xz);
        assert_eq!("zstd".parse::<CompressionFormat>().unwrap(), CompressionFormat::Zstd);
        assert!("bzip2".parse::<CompressionFormat>().is_err());
        assert!("none".parse::<CompressionFormat>().is_err());
    }

    #[test]
    fn test_tar_suffixes() {
        assert_eq!(CompressionFormat::Gzip.tar_suffix(), ".tar.gz");
        assert_eq!(CompressionFormat::Xz.tar_suffix(), ".tar.xz");
        assert_eq!(CompressionFormat::Zstd.tar_suffix(), ".tar.zst");
    }

    #[test]
    fn test_compressed_output_has_matching_magic() {
        let data = b"packwright payload ".repeat(64);
        for codec in CODECS {
            let compressed = compress(&data, codec).unwrap();
            assert_eq!(CompressionFormat::from_magic_bytes(&compressed), codec);
            assert_eq!(decompress_auto(&compressed).unwrap(), data);
        }
    }

    #[test]
    fn test_compression_is_deterministic() {
        let data = b"same input, same bytes".repeat(32);
        for codec in CODECS {
            assert_eq!(compress(&data, codec).unwrap(), compress(&data, codec).unwrap());
        }
    }

    #[test]
    fn test_decompress_gzip() {
        // Minimal gzip of "hello"
        let gzip_data: &[u8] = &[
            0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0xcb, 0x48, 0xcd, 0xc9,
            0xc9, 0x07, 0x00, 0x86, 0xa6, 0x10, 0x36, 0x05, 0x00, 0x00, 0x00,
        ];
        let result = decompress(gzip_data, CompressionFormat::Gzip).unwrap();
        assert_eq!(result, b"hello");
    }

    #[test]
    fn test_format_from_magic_bytes_short_input() {
        assert_eq!(CompressionFormat::from_magic_bytes(&[0x1f]), CompressionFormat::None);
        assert_eq!(CompressionFormat::from_magic_bytes(&[]), CompressionFormat::None);
    }
}
