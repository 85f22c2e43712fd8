//! Key/value settings persisted by the hub itself (e.g. the seed checksum).

use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DatabaseError};

pub fn get(db: &Database, key: &str) -> Result<Option<String>, DatabaseError> {
    db.with_conn(|conn| get_with(conn, key))
}

pub fn set(db: &Database, key: &str, value: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| set_with(conn, key, value))
}

pub(crate) fn get_with(conn: &Connection, key: &str) -> Result<Option<String>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT value FROM setting WHERE key = ?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?)
}

pub(crate) fn set_with(conn: &Connection, key: &str, value: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO setting (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}
