//! Tag repository: tags and tag categories.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_timestamp, Database, DatabaseError};
use crate::model::{Tag, TagCategory};

fn tag_from_row(row: &Row<'_>) -> Result<Tag, rusqlite::Error> {
    Ok(Tag {
        id: row.get("id")?,
        name: row.get("name")?,
        category_id: row.get("category_id")?,
    })
}

fn category_from_row(row: &Row<'_>) -> Result<TagCategory, rusqlite::Error> {
    Ok(TagCategory {
        id: row.get("id")?,
        uuid: row.get("uuid")?,
        name: row.get("name")?,
        color: row.get("color")?,
    })
}

/// Inserts a tag category and returns its id.
pub fn insert_category(db: &Database, name: &str, color: &str) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO tag_category (name, color, create_time) VALUES (?1, ?2, ?3)",
            params![name, color, format_timestamp(Utc::now())],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Inserts a tag and returns it.
pub fn insert(db: &Database, category_id: i64, name: &str) -> Result<Tag, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO tag (name, category_id, create_time) VALUES (?1, ?2, ?3)",
            params![name, category_id, format_timestamp(Utc::now())],
        )?;
        Ok(Tag {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            category_id,
        })
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Tag>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row("SELECT * FROM tag WHERE id = ?1", params![id], tag_from_row)
            .optional()?)
    })
}

pub fn find_category(db: &Database, id: i64) -> Result<Option<TagCategory>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM tag_category WHERE id = ?1",
                params![id],
                category_from_row,
            )
            .optional()?)
    })
}

/// Lists every tag paired with its category name.
pub fn list_categorized(db: &Database) -> Result<Vec<(String, Tag)>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, t.category_id, c.name AS category_name
             FROM tag t JOIN tag_category c ON c.id = t.category_id
             ORDER BY t.id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>("category_name")?, tag_from_row(row)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Loads the tags linked to `owner_id` through a join table.
///
/// `join_table` and `owner_column` come from the calling repository, never
/// from user input.
pub(crate) fn tags_through(
    conn: &Connection,
    join_table: &str,
    owner_column: &str,
    owner_id: i64,
) -> Result<Vec<Tag>, DatabaseError> {
    let sql = format!(
        "SELECT DISTINCT t.id, t.name, t.category_id
         FROM {join_table} j JOIN tag t ON t.id = j.tag_id
         WHERE j.{owner_column} = ?1
         ORDER BY t.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let tags = stmt
        .query_map(params![owner_id], tag_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}
