//! Decoding of permission-gated rowsets.
//!
//! Gated plans right-outer-join their data rows with the one-row
//! `has_perms` expression, so the statement always yields at least one
//! row and every data column is nullable. The decoder splits each row
//! into an optional data tuple and the trailing permission columns,
//! discards incomplete data tuples (they only occur on the padding row
//! of an empty data set), and reads the permission flags from the first
//! row; the permission columns are constant across the rowset.

use rusqlite::{Connection, Row, ToSql};

/// Trailing permission columns of a gated row.
pub(crate) trait PermColumns: Sized {
    /// Decodes the permission columns starting at `offset`.
    fn decode(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self>;

    /// True when at least one permission flag is set.
    fn any(&self) -> bool;
}

impl PermColumns for bool {
    fn decode(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        row.get(offset)
    }

    fn any(&self) -> bool {
        *self
    }
}

impl PermColumns for (bool, bool) {
    fn decode(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok((row.get(offset)?, row.get(offset + 1)?))
    }

    fn any(&self) -> bool {
        self.0 || self.1
    }
}

/// A decoded gated rowset: complete data tuples plus the permission
/// flags shared by every row.
pub(crate) struct Gated<D, P> {
    pub rows: Vec<D>,
    pub perms: P,
}

/// Runs a gated statement and decodes its rowset.
///
/// `decode_data` reads the leading data columns and returns `None` when
/// any of them is null. `data_width` is the column index where the
/// permission columns start.
pub(crate) fn run_gated<D, P>(
    conn: &Connection,
    sql: &str,
    params: &[(&str, &dyn ToSql)],
    data_width: usize,
    decode_data: impl Fn(&Row<'_>) -> rusqlite::Result<Option<D>>,
) -> rusqlite::Result<Gated<D, P>>
where
    P: PermColumns,
{
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;

    let mut decoded = Vec::new();
    let mut perms: Option<P> = None;
    while let Some(row) = rows.next()? {
        if perms.is_none() {
            perms = Some(P::decode(row, data_width)?);
        }
        if let Some(data) = decode_data(row)? {
            decoded.push(data);
        }
    }

    // The has_perms join guarantees a row; an empty rowset means the
    // statement lost its gate.
    let perms = perms.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
    Ok(Gated {
        rows: decoded,
        perms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn padding_row_is_discarded_but_perm_survives() {
        let gated: Gated<i64, bool> = run_gated(
            &conn(),
            "SELECT NULL AS v, 1 AS perm",
            &[],
            1,
            |row| Ok(row.get::<_, Option<i64>>(0)?),
        )
        .unwrap();

        assert!(gated.rows.is_empty());
        assert!(gated.perms);
    }

    #[test]
    fn complete_rows_are_kept_in_order() {
        let gated: Gated<i64, bool> = run_gated(
            &conn(),
            "SELECT 10 AS v, 0 AS perm UNION ALL SELECT 20, 0 ORDER BY v",
            &[],
            1,
            |row| Ok(row.get::<_, Option<i64>>(0)?),
        )
        .unwrap();

        assert_eq!(gated.rows, vec![10, 20]);
        assert!(!gated.perms);
    }

    #[test]
    fn two_permission_columns_decode_pairwise() {
        let gated: Gated<i64, (bool, bool)> = run_gated(
            &conn(),
            "SELECT NULL AS v, 0 AS my_perm, 1 AS all_perm",
            &[],
            1,
            |row| Ok(row.get::<_, Option<i64>>(0)?),
        )
        .unwrap();

        assert_eq!(gated.perms, (false, true));
        assert!(gated.perms.any());
    }

    #[test]
    fn empty_rowset_is_an_error() {
        let result: rusqlite::Result<Gated<i64, bool>> = run_gated(
            &conn(),
            "SELECT 1 AS v, 1 AS perm WHERE 0",
            &[],
            1,
            |row| Ok(row.get::<_, Option<i64>>(0)?),
        );
        assert!(matches!(result, Err(rusqlite::Error::QueryReturnedNoRows)));
    }
}
