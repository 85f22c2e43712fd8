//! Identity repository. Secret fields are encrypted on write and
//! decrypted on read.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::{format_timestamp, Database, DatabaseError};
use crate::model::Identity;
use crate::secret::{self, Cipher};

fn from_row(row: &Row<'_>) -> Result<Identity, rusqlite::Error> {
    Ok(Identity {
        id: row.get("id")?,
        name: row.get("name")?,
        kind: row.get("kind")?,
        description: row.get("description")?,
        user: row.get("user")?,
        password: row.get("password")?,
        key: row.get("key")?,
        settings: row.get("settings")?,
    })
}

fn sealed(identity: &Identity, cipher: &Cipher) -> Result<Identity, DatabaseError> {
    let mut copy = identity.clone();
    secret::encrypt(&mut copy, cipher)?;
    Ok(copy)
}

fn opened(mut identity: Identity, cipher: &Cipher) -> Result<Identity, DatabaseError> {
    secret::decrypt(&mut identity, cipher)?;
    Ok(identity)
}

pub fn insert(db: &Database, identity: &Identity, cipher: &Cipher) -> Result<i64, DatabaseError> {
    let m = sealed(identity, cipher)?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO identity (name, kind, description, user, password, key, settings,
             create_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                m.name,
                m.kind,
                m.description,
                m.user,
                m.password,
                m.key,
                m.settings,
                format_timestamp(Utc::now()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn update(db: &Database, identity: &Identity, cipher: &Cipher) -> Result<(), DatabaseError> {
    let m = sealed(identity, cipher)?;
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE identity SET name = ?2, kind = ?3, description = ?4, user = ?5,
             password = ?6, key = ?7, settings = ?8
             WHERE id = ?1",
            params![
                m.id,
                m.name,
                m.kind,
                m.description,
                m.user,
                m.password,
                m.key,
                m.settings,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(
    db: &Database,
    id: i64,
    cipher: &Cipher,
) -> Result<Option<Identity>, DatabaseError> {
    let found = db.with_conn(|conn| {
        Ok(conn
            .query_row("SELECT * FROM identity WHERE id = ?1", params![id], from_row)
            .optional()?)
    })?;
    found.map(|m| opened(m, cipher)).transpose()
}

pub fn list(db: &Database, cipher: &Cipher) -> Result<Vec<Identity>, DatabaseError> {
    let rows = db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM identity ORDER BY id")?;
        let rows = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })?;
    rows.into_iter().map(|m| opened(m, cipher)).collect()
}

/// Encrypts any secret still stored as plaintext, in one transaction.
/// Returns the number of identities rewritten.
pub fn seal_all(db: &Database, cipher: &Cipher) -> Result<usize, DatabaseError> {
    db.transaction(|conn| {
        let stored = {
            let mut stmt = conn.prepare("SELECT * FROM identity ORDER BY id")?;
            let rows = stmt
                .query_map([], from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        let mut sealed_count = 0;
        for m in stored {
            let s = sealed(&m, cipher)?;
            if s == m {
                continue;
            }
            conn.execute(
                "UPDATE identity SET password = ?2, key = ?3, settings = ?4 WHERE id = ?1",
                params![s.id, s.password, s.key, s.settings],
            )?;
            sealed_count += 1;
        }
        Ok(sealed_count)
    })
}

pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute("DELETE FROM identity WHERE id = ?1", params![id])?;
        Ok(n > 0)
    })
}
