//! Database schema definitions.
//!
//! The durable layer is a single key-value table: one row per namespaced
//! key holding a JSON document. Contact records and the migration history
//! both live here, under different keys.

use rusqlite::{Connection, Result};

/// Base schema, applied on every open. All statements are idempotent.
pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS kv_store (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_kv_store_updated_at ON kv_store(updated_at);
";

/// Apply the base schema to a connection.
///
/// # Errors
///
/// Returns an error if a statement fails to execute.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_applies_to_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();

        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='kv_store'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        apply_schema(&conn).unwrap();
    }
}
