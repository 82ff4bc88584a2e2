//! # Hashing Utilities
//!
//! SHA-256 based hashing for transaction ids and anything else that needs a
//! stable content address.
//!
//! Transaction ids use the double construction `SHA-256(SHA-256(body))`,
//! which rules out length-extension games on the id even though the body
//! encoding is already length-prefixed.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use super::keys::KeyError;

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use tally_protocol::crypto::sha256;
///
/// let hash = sha256(b"tally");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the double-SHA-256 hash: `SHA-256(SHA-256(data))`.
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

// ---------------------------------------------------------------------------
// SecureHash
// ---------------------------------------------------------------------------

/// A 32-byte digest used as a content address (transaction ids).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SecureHash([u8; 32]);

impl SecureHash {
    /// Wraps raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// `SHA-256(SHA-256(data))` as a `SecureHash`.
    pub fn double_sha256(data: &[u8]) -> Self {
        Self(double_sha256(data))
    }

    /// The all-zero hash. Never the id of a real transaction.
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lower-case hex, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl FromStr for SecureHash {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidPublicKey)?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self(arr))
    }
}

impl fmt::Display for SecureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for SecureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureHash({})", self.short())
    }
}
