//! Rules and migration targets. Both may reference stored files.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::{format_timestamp, json_column, to_json, Database, DatabaseError};
use crate::model::{Rule, Target};

fn rule_from_row(row: &Row<'_>) -> Result<Rule, rusqlite::Error> {
    Ok(Rule {
        id: row.get("id")?,
        name: row.get("name")?,
        rule_set_id: row.get("rule_set_id")?,
        labels: json_column(row, "labels")?,
        file_id: row.get("file_id")?,
    })
}

fn target_from_row(row: &Row<'_>) -> Result<Target, rusqlite::Error> {
    Ok(Target {
        id: row.get("id")?,
        uuid: row.get("uuid")?,
        name: row.get("name")?,
        description: row.get("description")?,
        provider: row.get("provider")?,
        choice: row.get("choice")?,
        labels: json_column(row, "labels")?,
        image_id: row.get("image_id")?,
        rule_set_id: row.get("rule_set_id")?,
    })
}

pub fn insert_rule(db: &Database, rule: &Rule) -> Result<i64, DatabaseError> {
    let labels = to_json(&rule.labels)?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO rule (name, rule_set_id, labels, file_id, create_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                rule.name,
                rule.rule_set_id,
                labels,
                rule.file_id,
                format_timestamp(Utc::now()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Rules of one rule set, in id order.
pub fn list_rules(db: &Database, rule_set_id: i64) -> Result<Vec<Rule>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM rule WHERE rule_set_id = ?1 ORDER BY id")?;
        let rows = stmt
            .query_map(params![rule_set_id], rule_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

pub fn insert_target(db: &Database, target: &Target) -> Result<i64, DatabaseError> {
    let labels = to_json(&target.labels)?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO target (uuid, name, description, provider, choice, labels, image_id,
             rule_set_id, create_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                target.uuid,
                target.name,
                target.description,
                target.provider,
                target.choice,
                labels,
                target.image_id,
                target.rule_set_id,
                format_timestamp(Utc::now()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn find_target(db: &Database, id: i64) -> Result<Option<Target>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM target WHERE id = ?1",
                params![id],
                target_from_row,
            )
            .optional()?)
    })
}

pub fn list_targets(db: &Database) -> Result<Vec<Target>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM target ORDER BY id")?;
        let rows = stmt
            .query_map([], target_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Points a target at a new image file, or clears it.
pub fn set_target_image(
    db: &Database,
    id: i64,
    image_id: Option<i64>,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE target SET image_id = ?2 WHERE id = ?1",
            params![id, image_id],
        )?;
        Ok(())
    })
}
