// src/hash.rs

//! Digest algorithms for package content
//!
//! | Use | Algorithm | Why |
//! |-----|-----------|-----|
//! | DEB `md5sums` | MD5 | Required by dpkg |
//! | RPM file digests | SHA-256 | `FILEDIGESTALGO` 8 |
//! | RPM signature header | MD5 + SHA-256 | Header+payload / header-only digests |

use md5::Md5;
use sha2::{Digest, Sha256};
use std::fmt;

/// Hash algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    /// MD5, only for formats that mandate it
    #[default]
    Md5,
    /// SHA-256
    Sha256,
}

impl HashAlgorithm {
    /// Get the hash output length in bytes
    #[inline]
    pub const fn output_len(&self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha256 => 32,
        }
    }

    /// Get the hash output length as a hex string
    #[inline]
    pub const fn hex_len(&self) -> usize {
        self.output_len() * 2
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
        }
    }

    /// Algorithm identifier used by RPM's `FILEDIGESTALGO` tag (PGP hash ids)
    #[inline]
    pub const fn rpm_algo_id(&self) -> u32 {
        match self {
            Self::Md5 => 1,
            Self::Sha256 => 8,
        }
    }

    /// Raw digest bytes of `data`
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Md5 => Md5::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
        }
    }

    /// Lowercase hex digest of `data`
    pub fn hex_digest(&self, data: &[u8]) -> String {
        hex::encode(self.digest(data))
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Compute SHA-256 hash of data and return as hex string
pub fn sha256_hex(data: &[u8]) -> String {
    HashAlgorithm::Sha256.hex_digest(data)
}

/// Compute MD5 hash of data and return as hex string
pub fn md5_hex(data: &[u8]) -> String {
    HashAlgorithm::Md5.hex_digest(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_md5_known_values() {
        assert_eq!(md5_hex(b"hello world\n"), "6f5902ac237024bdd0c176cb93063dc4");
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_lengths_match_output() {
        for algo in [HashAlgorithm::Md5, HashAlgorithm::Sha256] {
            assert_eq!(algo.digest(b"abc").len(), algo.output_len());
            assert_eq!(algo.hex_digest(b"abc").len(), algo.hex_len());
        }
    }

    #[test]
    fn test_names_and_rpm_ids() {
        assert_eq!(HashAlgorithm::Sha256.to_string(), "sha256");
        assert_eq!(HashAlgorithm::Md5.rpm_algo_id(), 1);
        assert_eq!(HashAlgorithm::Sha256.rpm_algo_id(), 8);
    }
}
