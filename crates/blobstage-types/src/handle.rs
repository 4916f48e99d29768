use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Hash algorithm used to identify staged content.
///
/// A closed enumeration: an algorithm name that does not parse never makes
/// it into a [`ContentHandle`], so there is no "unknown algorithm" path at
/// verification time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    Sha256,
    Sha512,
    Blake3,
}

impl HashAlgorithm {
    /// Digest length in bytes for this algorithm.
    pub const fn digest_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha512 => 64,
            Self::Blake3 => 32,
        }
    }

    /// Canonical lowercase name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            "blake3" => Ok(Self::Blake3),
            other => Err(TypeError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Immutable identity of the content a session is staging.
///
/// A handle names the expected bytes (algorithm + digest), a caller-supplied
/// label, and the owner-scoping metadata (expiry timestamp and tag) that the
/// session table uses to distinguish otherwise-identical content. The handle
/// never changes for the lifetime of its session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHandle {
    algorithm: HashAlgorithm,
    digest: Vec<u8>,
    label: String,
    expiry_ms: u64,
    tag: i64,
}

impl ContentHandle {
    /// Create a handle, validating the digest length against the algorithm.
    pub fn new(
        algorithm: HashAlgorithm,
        digest: Vec<u8>,
        label: impl Into<String>,
        expiry_ms: u64,
        tag: i64,
    ) -> Result<Self, TypeError> {
        if digest.len() != algorithm.digest_len() {
            return Err(TypeError::InvalidDigestLength {
                expected: algorithm.digest_len(),
                actual: digest.len(),
            });
        }
        Ok(Self {
            algorithm,
            digest,
            label: label.into(),
            expiry_ms,
            tag,
        })
    }

    /// Create a handle from a hex-encoded digest string.
    pub fn from_hex_digest(
        algorithm: HashAlgorithm,
        digest_hex: &str,
        label: impl Into<String>,
        expiry_ms: u64,
        tag: i64,
    ) -> Result<Self, TypeError> {
        let digest = hex::decode(digest_hex).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::new(algorithm, digest, label, expiry_ms, tag)
    }

    /// The digest algorithm.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The expected digest bytes.
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Hex-encoded expected digest.
    pub fn digest_hex(&self) -> String {
        hex::encode(&self.digest)
    }

    /// The caller-supplied label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Expiry timestamp in milliseconds since the epoch (0 = no expiry).
    pub fn expiry_ms(&self) -> u64 {
        self.expiry_ms
    }

    /// Caller-scoped tag distinguishing otherwise-identical content.
    pub fn tag(&self) -> i64 {
        self.tag
    }
}

impl fmt::Display for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.algorithm,
            hex::encode(&self.digest[..4.min(self.digest.len())])
        )
    }
}
