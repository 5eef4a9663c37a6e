//! Content checksums in `algorithm:hexdigest` form.
//!
//! The catalog's canonical algorithm is SHA-256; the prefix keeps the
//! stored strings self-describing so a future algorithm can coexist with
//! old records.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

pub const SHA256: &str = "sha256";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    algorithm: String,
    digest: String,
}

impl Checksum {
    /// Digest a byte slice with the canonical algorithm.
    pub fn sha256_of(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self {
            algorithm: SHA256.to_string(),
            digest: hex::encode(hasher.finalize()),
        }
    }

    /// Wrap an already-computed hex SHA-256 digest.
    pub fn from_sha256_hex(digest: impl Into<String>) -> Self {
        Self {
            algorithm: SHA256.to_string(),
            digest: digest.into().to_ascii_lowercase(),
        }
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn is_sha256(&self) -> bool {
        self.algorithm == SHA256
    }

    /// Compare against a raw hex SHA-256 digest, case-insensitively.
    pub fn matches_sha256_hex(&self, other: &str) -> bool {
        self.is_sha256() && self.digest.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.digest)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid checksum `{0}`: expected `algorithm:hexdigest`")]
pub struct ChecksumParseError(String);

impl FromStr for Checksum {
    type Err = ChecksumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (algorithm, digest) = s
            .split_once(':')
            .ok_or_else(|| ChecksumParseError(s.to_string()))?;
        if algorithm.is_empty()
            || digest.is_empty()
            || !digest.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(ChecksumParseError(s.to_string()));
        }
        Ok(Self {
            algorithm: algorithm.to_ascii_lowercase(),
            digest: digest.to_ascii_lowercase(),
        })
    }
}

impl Serialize for Checksum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}
