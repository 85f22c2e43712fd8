//! Task group repository.

use std::collections::HashSet;

use rusqlite::{params, OptionalExtension, Row};

use super::{
    format_timestamp, json_column, parsed_column, scan_row, timestamp_column, to_json,
    Database, DatabaseError, Scan,
};
use crate::model::{GroupMode, TaskGroup, TaskState};

fn from_row(row: &Row<'_>) -> Result<TaskGroup, rusqlite::Error> {
    let state: String = row.get("state")?;
    let state = if state.is_empty() {
        None
    } else {
        Some(parsed_column::<TaskState>(row, "state")?)
    };
    Ok(TaskGroup {
        id: row.get("id")?,
        name: row.get("name")?,
        state,
        mode: parsed_column::<GroupMode>(row, "mode")?,
        list: json_column(row, "list")?,
        bucket_id: row.get("bucket_id")?,
        create_time: timestamp_column(row, "create_time")?,
    })
}

fn state_text(group: &TaskGroup) -> &'static str {
    group.state.as_ref().map(TaskState::as_str).unwrap_or("")
}

/// Inserts a group and returns its id. `create_time` comes from the group.
pub fn insert(db: &Database, group: &TaskGroup) -> Result<i64, DatabaseError> {
    let list = to_json(&group.list)?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO task_group (name, state, mode, list, bucket_id, create_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                group.name,
                state_text(group),
                group.mode.as_str(),
                list,
                group.bucket_id,
                format_timestamp(group.create_time),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn update(db: &Database, group: &TaskGroup) -> Result<(), DatabaseError> {
    let list = to_json(&group.list)?;
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE task_group SET name = ?2, state = ?3, mode = ?4, list = ?5, bucket_id = ?6
             WHERE id = ?1",
            params![
                group.id,
                group.name,
                state_text(group),
                group.mode.as_str(),
                list,
                group.bucket_id,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<TaskGroup>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM task_group WHERE id = ?1",
                params![id],
                from_row,
            )
            .optional()?)
    })
}

/// Deletes the group; member tasks are deleted with it.
pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute("DELETE FROM task_group WHERE id = ?1", params![id])?;
        Ok(n > 0)
    })
}

/// Ids of every group in pipeline mode.
pub fn pipeline_ids(db: &Database) -> Result<HashSet<i64>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT id FROM task_group WHERE mode = ?1")?;
        let ids = stmt
            .query_map(params![GroupMode::Pipeline.as_str()], |r| r.get(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    })
}

/// Every group paired with the number of tasks that reference it. Each
/// group row is decoded independently.
pub fn scan_with_task_count(db: &Database) -> Result<Scan<(TaskGroup, u64)>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT g.*, COUNT(t.id) AS task_count
             FROM task_group g
             LEFT JOIN task t ON t.task_group_id = g.id
             GROUP BY g.id
             ORDER BY g.id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                scan_row(row, |row| {
                    let group = from_row(row)?;
                    let count: i64 = row.get("task_count")?;
                    Ok((group, count.max(0) as u64))
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
