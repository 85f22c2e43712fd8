//! Database module for persistent storage.
//!
//! Uses rusqlite (SQLite) with a thread-safe `Database` handle.
//! All access is serialized through a `Mutex<Connection>`.

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod application_repo;
pub mod archetype_repo;
pub mod assessment_repo;
pub mod bucket_repo;
pub mod error;
pub mod file_repo;
pub mod group_repo;
pub mod identity_repo;
pub mod migrations;
pub mod query;
pub mod questionnaire_repo;
pub mod report_repo;
pub mod rule_repo;
pub mod ruleset_repo;
pub mod setting_repo;
pub mod stakeholder_repo;
pub mod tag_repo;
pub mod task_repo;

pub use error::DatabaseError;

/// Thread-safe database handle wrapping a single rusqlite connection.
///
/// Cloning is cheap (inner `Arc`). All access is serialized through
/// a `Mutex`, which is fine for SQLite (which serializes writes anyway).
/// The connection slot is emptied by [`Database::close`]; every clone
/// observes the closed state.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl Database {
    /// Opens (or creates) the database at the given path and runs all
    /// pending migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        tracing::info!(path = %path.display(), "Database opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Opens an in-memory database for testing. Runs all migrations.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    /// Provides locked access to the underlying connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let guard = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        let conn = guard.as_ref().ok_or(DatabaseError::Closed)?;
        f(conn)
    }

    /// Runs `f` inside a transaction. Committed when `f` succeeds,
    /// rolled back otherwise.
    pub fn transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<DatabaseError>,
    {
        let guard = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        let conn = guard.as_ref().ok_or(DatabaseError::Closed)?;
        let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;
        let value = f(&tx)?;
        tx.commit().map_err(DatabaseError::from)?;
        Ok(value)
    }

    /// Closes the connection. Idempotent.
    pub fn close(&self) -> Result<(), DatabaseError> {
        let mut guard = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        match guard.take() {
            Some(conn) => conn.close().map_err(|(_, e)| DatabaseError::Sqlite(e)),
            None => Ok(()),
        }
    }

    /// Whether [`Database::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.conn.lock().map(|g| g.is_none()).unwrap_or(true)
    }
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

pub(crate) fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Decodes an RFC 3339 text column. An unparseable value is a
/// conversion failure, never a substitute time.
pub(crate) fn timestamp_column(
    row: &Row<'_>,
    column: &str,
) -> Result<DateTime<Utc>, rusqlite::Error> {
    let idx = row.as_ref().column_index(column)?;
    let text: String = row.get(idx)?;
    parse_timestamp(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn optional_timestamp_column(
    row: &Row<'_>,
    column: &str,
) -> Result<Option<DateTime<Utc>>, rusqlite::Error> {
    let idx = row.as_ref().column_index(column)?;
    let text: Option<String> = row.get(idx)?;
    text.as_deref()
        .map(parse_timestamp)
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Rows keyed by id, each decoded on its own so one unreadable row does
/// not hide the rest.
pub type Scan<T> = Vec<(i64, Result<T, DatabaseError>)>;

/// Reads the row id, then decodes the row with `decode`.
pub(crate) fn scan_row<T>(
    row: &Row<'_>,
    decode: impl FnOnce(&Row<'_>) -> Result<T, rusqlite::Error>,
) -> Result<(i64, Result<T, DatabaseError>), rusqlite::Error> {
    let id: i64 = row.get("id")?;
    Ok((id, decode(row).map_err(DatabaseError::from)))
}

/// Decodes a JSON text column.
pub(crate) fn json_column<T: DeserializeOwned>(
    row: &Row<'_>,
    column: &str,
) -> Result<T, rusqlite::Error> {
    let idx = row.as_ref().column_index(column)?;
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Decodes a text column through `FromStr`.
pub(crate) fn parsed_column<T>(row: &Row<'_>, column: &str) -> Result<T, rusqlite::Error>
where
    T: FromStr<Err = String>,
{
    let idx = row.as_ref().column_index(column)?;
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, DatabaseError> {
    Ok(serde_json::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let count: u32 =
                conn.query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))?;
            assert!(count > 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_open_file_db() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("hub.db");
        let db = Database::open(&path).unwrap();
        db.with_conn(|conn| {
            let count: u32 =
                conn.query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))?;
            assert!(count > 0);
            Ok(())
        })
        .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_database_is_clone() {
        let db = Database::open_in_memory().unwrap();
        let db2 = db.clone();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO bucket (path, create_time) \
                 VALUES ('/tmp/b1', '2026-01-01T00:00:00+00:00')",
                [],
            )?;
            Ok(())
        })
        .unwrap();
        db2.with_conn(|conn| {
            let count: u32 = conn.query_row("SELECT COUNT(*) FROM bucket", [], |r| r.get(0))?;
            assert_eq!(count, 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::open_in_memory().unwrap();
        let result: Result<(), DatabaseError> = db.transaction(|conn| {
            conn.execute(
                "INSERT INTO bucket (path, create_time) \
                 VALUES ('/tmp/b1', '2026-01-01T00:00:00+00:00')",
                [],
            )?;
            Err(DatabaseError::LockPoisoned)
        });
        assert!(result.is_err());

        let count: u32 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM bucket", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_close_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let other = db.clone();
        db.close().unwrap();
        db.close().unwrap();
        assert!(other.is_closed());
        let result = other.with_conn(|_| Ok(()));
        assert!(matches!(result, Err(DatabaseError::Closed)));
    }

    #[test]
    fn test_parse_timestamp_roundtrip() {
        let now = Utc::now();
        let parsed = parse_timestamp(&format_timestamp(now)).unwrap();
        assert_eq!(parsed, now);
    }

    #[test]
    fn test_unparseable_timestamp_column_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        let result = db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT 'garbage' AS create_time, NULL AS expiration, 'soon' AS started",
                [],
                |row| {
                    assert!(optional_timestamp_column(row, "expiration")?.is_none());
                    assert!(optional_timestamp_column(row, "started").is_err());
                    timestamp_column(row, "create_time")
                },
            )?)
        });
        assert!(matches!(
            result,
            Err(DatabaseError::Sqlite(rusqlite::Error::FromSqlConversionFailure(..)))
        ));
    }
}
