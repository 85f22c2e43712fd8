//! Stakeholder repository: stakeholders and stakeholder groups.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::{format_timestamp, Database, DatabaseError};
use crate::model::{Stakeholder, StakeholderGroup};

fn from_row(row: &Row<'_>) -> Result<Stakeholder, rusqlite::Error> {
    Ok(Stakeholder {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        job_function_id: row.get("job_function_id")?,
    })
}

/// Inserts a stakeholder and returns its id.
pub fn insert(
    db: &Database,
    name: &str,
    email: &str,
    job_function_id: Option<i64>,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO stakeholder (name, email, job_function_id, create_time)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, email, job_function_id, format_timestamp(Utc::now())],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Inserts a stakeholder group and returns its id.
pub fn insert_group(db: &Database, name: &str, description: &str) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO stakeholder_group (name, description, create_time) VALUES (?1, ?2, ?3)",
            params![name, description, format_timestamp(Utc::now())],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Stakeholder>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM stakeholder WHERE id = ?1",
                params![id],
                from_row,
            )
            .optional()?)
    })
}

pub fn find_group(db: &Database, id: i64) -> Result<Option<StakeholderGroup>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT id, name, description FROM stakeholder_group WHERE id = ?1",
                params![id],
                |row| {
                    Ok(StakeholderGroup {
                        id: row.get("id")?,
                        name: row.get("name")?,
                        description: row.get("description")?,
                    })
                },
            )
            .optional()?)
    })
}
