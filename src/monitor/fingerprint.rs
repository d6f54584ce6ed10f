//! SHA-256 content fingerprints.
//!
//! A page's fingerprint is the SHA-256 of its text encoded as UTF-8, rendered
//! as 64 lowercase hex characters. No normalization is applied: whitespace,
//! timestamps, or any other byte-level change yields a different digest.

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LEN: usize = 64;

/// Hex-encoded SHA-256 fingerprint of page content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

/// A string that is not a 64-character hex digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a SHA-256 hex digest: {0:?}")]
pub struct InvalidDigest(pub String);

impl Digest {
    /// The digest as lowercase hex.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines.
    #[must_use]
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Digest {
    type Err = InvalidDigest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = s.len() == DIGEST_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit());
        if !valid {
            return Err(InvalidDigest(s.to_string()));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for Digest {
    type Error = InvalidDigest;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

/// Fingerprint page text.
#[must_use]
pub fn fingerprint(content: &str) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Digest(format!("{:x}", hasher.finalize()))
}
