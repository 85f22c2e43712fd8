//! Bucket repository. A bucket row owns the directory at `path`.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{
    format_timestamp, optional_timestamp_column, scan_row, timestamp_column, Database,
    DatabaseError, Scan,
};
use crate::model::Bucket;

fn from_row(row: &Row<'_>) -> Result<Bucket, rusqlite::Error> {
    Ok(Bucket {
        id: row.get("id")?,
        path: row.get("path")?,
        expiration: optional_timestamp_column(row, "expiration")?,
        create_time: timestamp_column(row, "create_time")?,
    })
}

/// Creates a fresh directory under `root` and records it as a bucket.
pub fn create(db: &Database, root: &Path) -> Result<Bucket, DatabaseError> {
    let path = root.join(Uuid::new_v4().to_string());
    std::fs::create_dir_all(&path).map_err(|e| DatabaseError::Io {
        path: path.clone(),
        source: e,
    })?;
    let bucket = insert(db, &path.to_string_lossy())?;
    tracing::debug!(id = bucket.id, path = %path.display(), "Bucket created");
    Ok(bucket)
}

/// Records an existing directory as a bucket.
pub fn insert(db: &Database, path: &str) -> Result<Bucket, DatabaseError> {
    let now = Utc::now();
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO bucket (path, create_time) VALUES (?1, ?2)",
            params![path, format_timestamp(now)],
        )?;
        Ok(Bucket {
            id: conn.last_insert_rowid(),
            path: path.to_string(),
            expiration: None,
            create_time: now,
        })
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Bucket>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row("SELECT * FROM bucket WHERE id = ?1", params![id], from_row)
            .optional()?)
    })
}

pub fn list(db: &Database) -> Result<Vec<Bucket>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM bucket ORDER BY id")?;
        let rows = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Every bucket in id order, each row decoded independently.
pub fn scan(db: &Database) -> Result<Scan<Bucket>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM bucket ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| scan_row(row, from_row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Sets or clears the orphan expiration mark.
pub fn set_expiration(
    db: &Database,
    id: i64,
    expiration: Option<DateTime<Utc>>,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE bucket SET expiration = ?2 WHERE id = ?1",
            params![id, expiration.map(format_timestamp)],
        )?;
        Ok(())
    })
}

/// Deletes the row only; the directory is the caller's concern.
pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute("DELETE FROM bucket WHERE id = ?1", params![id])?;
        Ok(n > 0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_makes_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let bucket = create(&db, dir.path()).unwrap();

        assert!(Path::new(&bucket.path).is_dir());
        assert!(bucket.path.starts_with(&*dir.path().to_string_lossy()));
        let found = find_by_id(&db, bucket.id).unwrap().unwrap();
        assert_eq!(found.path, bucket.path);
        assert!(found.expiration.is_none());
    }

    #[test]
    fn test_set_and_clear_expiration() {
        let db = Database::open_in_memory().unwrap();
        let bucket = insert(&db, "/tmp/b1").unwrap();
        let when = Utc::now();

        set_expiration(&db, bucket.id, Some(when)).unwrap();
        let found = find_by_id(&db, bucket.id).unwrap().unwrap();
        assert_eq!(found.expiration.unwrap().timestamp(), when.timestamp());

        set_expiration(&db, bucket.id, None).unwrap();
        assert!(find_by_id(&db, bucket.id).unwrap().unwrap().expiration.is_none());
    }

    #[test]
    fn test_delete() {
        let db = Database::open_in_memory().unwrap();
        let bucket = insert(&db, "/tmp/b1").unwrap();
        assert!(delete(&db, bucket.id).unwrap());
        assert!(list(&db).unwrap().is_empty());
    }
}
