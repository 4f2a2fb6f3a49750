//! Validated ledger identifiers.
//!
//! Identifier values are checked against the ledger grammar when they are
//! constructed. Several query plans embed identifiers as SQL string
//! literals, so the grammar check is a safety invariant of these types,
//! not just a convenience: an [`AccountId`] that exists is safe to embed.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static ACCOUNT_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[a-z0-9_]+@[a-z0-9_]+$").expect("account id pattern is valid")
});

static ASSET_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[a-z0-9_]+#[a-z0-9_]+$").expect("asset id pattern is valid")
});

static ROLE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-z0-9_]+$").expect("role id pattern is valid"));

/// Error returned when an identifier does not match the ledger grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    /// Account ids are `name@domain`, both segments lowercase `[a-z0-9_]+`.
    #[error("malformed account id: {0:?}")]
    Account(String),

    /// Asset ids are `name#domain`, both segments lowercase `[a-z0-9_]+`.
    #[error("malformed asset id: {0:?}")]
    Asset(String),

    /// Role ids are a single lowercase `[a-z0-9_]+` segment.
    #[error("malformed role id: {0:?}")]
    Role(String),
}

/// An account identifier of the form `name@domain`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Parses and validates an account id.
    ///
    /// # Errors
    ///
    /// Returns [`IdParseError::Account`] if the value does not match
    /// `name@domain` with both segments in `[a-z0-9_]+`.
    pub fn new(id: impl Into<String>) -> Result<Self, IdParseError> {
        let id = id.into();
        if ACCOUNT_ID_RE.is_match(&id) {
            Ok(Self(id))
        } else {
            Err(IdParseError::Account(id))
        }
    }

    /// The full `name@domain` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name segment, before the `@`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.split_once('@').map_or("", |(name, _)| name)
    }

    /// The domain segment, after the `@`.
    ///
    /// The ledger schema stores only the full id, so domain comparisons
    /// are computed here rather than in SQL.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AccountId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// An asset identifier of the form `name#domain`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Parses and validates an asset id.
    ///
    /// # Errors
    ///
    /// Returns [`IdParseError::Asset`] if the value does not match
    /// `name#domain` with both segments in `[a-z0-9_]+`.
    pub fn new(id: impl Into<String>) -> Result<Self, IdParseError> {
        let id = id.into();
        if ASSET_ID_RE.is_match(&id) {
            Ok(Self(id))
        } else {
            Err(IdParseError::Asset(id))
        }
    }

    /// The full `name#domain` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The domain segment, after the `#`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('#').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AssetId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// A role identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RoleId(String);

impl RoleId {
    /// Parses and validates a role id.
    ///
    /// # Errors
    ///
    /// Returns [`IdParseError::Role`] if the value is not a single
    /// `[a-z0-9_]+` segment.
    pub fn new(id: impl Into<String>) -> Result<Self, IdParseError> {
        let id = id.into();
        if ROLE_ID_RE.is_match(&id) {
            Ok(Self(id))
        } else {
            Err(IdParseError::Role(id))
        }
    }

    /// The role name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoleId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for RoleId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}
