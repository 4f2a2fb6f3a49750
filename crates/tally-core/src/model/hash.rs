//! Opaque hex-printable byte strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a value is not a valid hex string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed hex string: {0:?}")]
pub struct HexParseError(pub String);

fn decode_hex(raw: &str) -> Result<Vec<u8>, HexParseError> {
    hex::decode(raw).map_err(|_| HexParseError(raw.to_string()))
}

/// An opaque hash identifying a transaction or a query.
///
/// The executor never inspects hash contents; it only compares them and
/// prints them in hex. Hashes arrive either from callers (query hashes,
/// pagination cursors) or from block storage (transaction hashes).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hash(Vec<u8>);

impl Hash {
    /// Wraps raw hash bytes.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Parses a hash from its hex form.
    ///
    /// # Errors
    ///
    /// Returns [`HexParseError`] if the value is not an even-length string
    /// over `[0-9a-fA-F]`.
    pub fn from_hex(raw: &str) -> Result<Self, HexParseError> {
        decode_hex(raw).map(Self)
    }

    /// The raw hash bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex rendering, as stored in `position_by_hash`.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A signatory or peer public key, stored hex-encoded in the ledger state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Parses a key from its hex form.
    ///
    /// # Errors
    ///
    /// Returns [`HexParseError`] if the value is not an even-length string
    /// over `[0-9a-fA-F]`.
    pub fn from_hex(raw: &str) -> Result<Self, HexParseError> {
        decode_hex(raw).map(Self)
    }

    /// The raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
