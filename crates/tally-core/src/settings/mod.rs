//! Operator-tunable settings stored in the ledger state.
//!
//! Settings live in the single `setting` key/value table. Lookups are
//! best effort: a database error reads as "not set", and a value that
//! fails to parse falls back to its documented default. Both cases are
//! silent towards the caller so that an upgraded writer can introduce
//! values an older reader does not understand yet.

use rusqlite::{Connection, OptionalExtension};
use tracing::error;

/// Key of the maximum transaction description size setting.
pub const MAX_DESCRIPTION_SIZE_KEY: &str = "MaxDescriptionSize";

/// Default applied when `MaxDescriptionSize` is absent or malformed.
pub const DEFAULT_MAX_DESCRIPTION_SIZE: u64 = 64;

/// Reads one raw setting value.
///
/// Returns `None` if the key is absent or the lookup fails; failures are
/// logged, not surfaced.
#[must_use]
pub fn setting_value(conn: &Connection, key: &str) -> Option<String> {
    let result = conn
        .query_row(
            "SELECT setting_value FROM setting WHERE setting_key = :key",
            rusqlite::named_params! {":key": key},
            |row| row.get(0),
        )
        .optional();

    match result {
        Ok(value) => value,
        Err(e) => {
            error!(key, "failed to execute setting query: {e}");
            None
        }
    }
}

/// Typed view of the known settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Upper bound on transaction description length, in bytes.
    pub max_description_size: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_description_size: DEFAULT_MAX_DESCRIPTION_SIZE,
        }
    }
}

impl Settings {
    /// Loads the known settings, substituting defaults where needed.
    #[must_use]
    pub fn load(conn: &Connection) -> Self {
        Self {
            max_description_size: parse_or_default(
                setting_value(conn, MAX_DESCRIPTION_SIZE_KEY),
                DEFAULT_MAX_DESCRIPTION_SIZE,
            ),
        }
    }
}

/// Full-string integer parse; trailing garbage falls back to the default.
fn parse_or_default(value: Option<String>, default: u64) -> u64 {
    value
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}
