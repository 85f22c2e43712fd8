//! File repository. A file row owns the regular file at `path`.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{
    format_timestamp, optional_timestamp_column, scan_row, timestamp_column, Database,
    DatabaseError, Scan,
};
use crate::model::File;

fn from_row(row: &Row<'_>) -> Result<File, rusqlite::Error> {
    Ok(File {
        id: row.get("id")?,
        name: row.get("name")?,
        encoding: row.get("encoding")?,
        path: row.get("path")?,
        expiration: optional_timestamp_column(row, "expiration")?,
        create_time: timestamp_column(row, "create_time")?,
    })
}

/// Writes `content` to a new file under `root` and records it.
pub fn create(
    db: &Database,
    root: &Path,
    name: &str,
    content: &[u8],
) -> Result<File, DatabaseError> {
    std::fs::create_dir_all(root).map_err(|e| DatabaseError::Io {
        path: root.to_path_buf(),
        source: e,
    })?;
    let path = root.join(Uuid::new_v4().to_string());
    std::fs::write(&path, content).map_err(|e| DatabaseError::Io {
        path: path.clone(),
        source: e,
    })?;
    insert(db, name, &path.to_string_lossy())
}

/// Records an existing file.
pub fn insert(db: &Database, name: &str, path: &str) -> Result<File, DatabaseError> {
    db.with_conn(|conn| insert_with(conn, name, path))
}

pub(crate) fn insert_with(
    conn: &Connection,
    name: &str,
    path: &str,
) -> Result<File, DatabaseError> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO file (name, path, create_time) VALUES (?1, ?2, ?3)",
        params![name, path, format_timestamp(now)],
    )?;
    Ok(File {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        encoding: String::new(),
        path: path.to_string(),
        expiration: None,
        create_time: now,
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<File>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row("SELECT * FROM file WHERE id = ?1", params![id], from_row)
            .optional()?)
    })
}

pub fn list(db: &Database) -> Result<Vec<File>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM file ORDER BY id")?;
        let rows = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Every file in id order, each row decoded independently.
pub fn scan(db: &Database) -> Result<Scan<File>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM file ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| scan_row(row, from_row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn set_expiration(
    db: &Database,
    id: i64,
    expiration: Option<DateTime<Utc>>,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE file SET expiration = ?2 WHERE id = ?1",
            params![id, expiration.map(format_timestamp)],
        )?;
        Ok(())
    })
}

pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute("DELETE FROM file WHERE id = ?1", params![id])?;
        Ok(n > 0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_writes_content() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_in_memory().unwrap();
        let file = create(&db, dir.path(), "rules.yaml", b"- rule").unwrap();

        assert_eq!(std::fs::read(&file.path).unwrap(), b"- rule");
        let found = find_by_id(&db, file.id).unwrap().unwrap();
        assert_eq!(found.name, "rules.yaml");
    }

    #[test]
    fn test_expiration_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let file = insert(&db, "a", "/tmp/f1").unwrap();
        set_expiration(&db, file.id, Some(Utc::now())).unwrap();
        assert!(find_by_id(&db, file.id).unwrap().unwrap().expiration.is_some());

        assert!(delete(&db, file.id).unwrap());
        assert!(list(&db).unwrap().is_empty());
    }
}
