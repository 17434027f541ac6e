// src/hash.rs

//! Checksums of repodata streams
//!
//! repomd.xml lists a checksum for every stream it references. The SHA-2
//! family is verified here; older algorithms (`md5`, `sha`/`sha1`) are
//! recognised so callers can skip them, but never computed.

use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::fmt;
use std::str::FromStr;

/// Checksum algorithm named by a `type` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Digest length as a hex string
    #[inline]
    pub const fn hex_len(&self) -> usize {
        match self {
            Self::Sha224 => 56,
            Self::Sha256 => 64,
            Self::Sha384 => 96,
            Self::Sha512 => 128,
        }
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha224" | "sha-224" => Ok(Self::Sha224),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha384" | "sha-384" => Ok(Self::Sha384),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            "md5" | "sha" | "sha1" | "sha-1" => Err(HashError::Unsupported(s.to_string())),
            _ => Err(HashError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Checksum errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// Not a checksum type repodata uses
    UnknownAlgorithm(String),
    /// A legacy algorithm that is recognised but not verified
    Unsupported(String),
}

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAlgorithm(name) => write!(f, "unknown checksum type: {}", name),
            Self::Unsupported(name) => write!(f, "unsupported checksum type: {}", name),
        }
    }
}

impl std::error::Error for HashError {}

/// Hex digest of a byte slice
pub fn hash_bytes(algorithm: HashAlgorithm, data: &[u8]) -> String {
    match algorithm {
        HashAlgorithm::Sha224 => hex::encode(Sha224::digest(data)),
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
        HashAlgorithm::Sha384 => hex::encode(Sha384::digest(data)),
        HashAlgorithm::Sha512 => hex::encode(Sha512::digest(data)),
    }
}

/// Verification failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The expected value cannot be a digest of this algorithm
    Malformed {
        expected: String,
        algorithm: HashAlgorithm,
    },
    Mismatch {
        expected: String,
        actual: String,
        algorithm: HashAlgorithm,
    },
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed {
                expected,
                algorithm,
            } => write!(
                f,
                "{} checksum '{}' is not {} hex digits",
                algorithm,
                expected,
                algorithm.hex_len()
            ),
            Self::Mismatch {
                expected,
                actual,
                algorithm,
            } => write!(f, "{} mismatch: expected {}, got {}", algorithm, expected, actual),
        }
    }
}

impl std::error::Error for VerifyError {}

/// Verify bytes match an expected hex digest (case-insensitive)
///
/// A digest of the wrong length or with non-hex characters is rejected
/// before anything is hashed.
pub fn verify_bytes(data: &[u8], expected: &str, algorithm: HashAlgorithm) -> Result<(), VerifyError> {
    let wanted = expected.trim().to_ascii_lowercase();
    if wanted.len() != algorithm.hex_len() || !wanted.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(VerifyError::Malformed {
            expected: expected.to_string(),
            algorithm,
        });
    }

    let actual = hash_bytes(algorithm, data);
    if actual == wanted {
        Ok(())
    } else {
        Err(VerifyError::Mismatch {
            expected: expected.to_string(),
            actual,
            algorithm,
        })
    }
}
