//! Ledger-state schema bootstrap and per-session SQL extensions.

use rusqlite::functions::{Aggregate, Context, FunctionFlags};
use rusqlite::Connection;

/// Schema SQL embedded at compile time.
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Applies the ledger-state schema to a connection.
///
/// Idempotent; every statement guards with `IF NOT EXISTS`. The writer
/// side owns the data, this exists for embedders and tests.
///
/// # Errors
///
/// Returns an error if any schema statement fails.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

/// Bitwise-OR aggregate over integer capability masks.
///
/// The permission CTEs fold the masks of every role an account holds with
/// `COALESCE(bit_or(rp.permission), 0)`; SQLite has no native bitwise
/// aggregate, so it is registered per session.
struct BitOr;

impl Aggregate<i64, Option<i64>> for BitOr {
    fn init(&self, _ctx: &mut Context<'_>) -> rusqlite::Result<i64> {
        Ok(0)
    }

    fn step(&self, ctx: &mut Context<'_>, acc: &mut i64) -> rusqlite::Result<()> {
        *acc |= ctx.get::<i64>(0)?;
        Ok(())
    }

    fn finalize(&self, _ctx: &mut Context<'_>, acc: Option<i64>) -> rusqlite::Result<Option<i64>> {
        // NULL over the empty set, like the built-in aggregates.
        Ok(acc)
    }
}

/// Registers the SQL functions the query plans rely on.
///
/// Must be called on every session before executing queries;
/// [`crate::executor::QueryExecutor::new`] does this.
///
/// # Errors
///
/// Returns an error if registration fails.
pub fn prepare_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_aggregate_function(
        "bit_or",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        BitOr,
    )
}
