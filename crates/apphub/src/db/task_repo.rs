//! Task repository for the `task` table.
//!
//! `ttl`, `attached` and `events` are JSON columns. The pod name is an
//! empty string when the task has no pod.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use super::{
    format_timestamp, json_column, optional_timestamp_column, parsed_column, scan_row,
    timestamp_column, to_json, Database, DatabaseError, Scan,
};
use crate::model::{Task, TaskState};

fn from_row(row: &Row<'_>) -> Result<Task, rusqlite::Error> {
    Ok(Task {
        id: row.get("id")?,
        name: row.get("name")?,
        addon: row.get("addon")?,
        state: parsed_column(row, "state")?,
        application_id: row.get("application_id")?,
        task_group_id: row.get("task_group_id")?,
        ttl: json_column(row, "ttl")?,
        create_time: timestamp_column(row, "create_time")?,
        started: optional_timestamp_column(row, "started")?,
        terminated: optional_timestamp_column(row, "terminated")?,
        pod: row.get("pod")?,
        bucket_id: row.get("bucket_id")?,
        attached: json_column(row, "attached")?,
        events: json_column(row, "events")?,
    })
}

/// Inserts a task and returns its id. `create_time` is taken from the
/// task so callers can backdate it.
pub fn insert(db: &Database, task: &Task) -> Result<i64, DatabaseError> {
    let ttl = to_json(&task.ttl)?;
    let attached = to_json(&task.attached)?;
    let events = to_json(&task.events)?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO task (name, addon, state, application_id, task_group_id, ttl, started,
             terminated, pod, bucket_id, attached, events, create_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                task.name,
                task.addon,
                task.state.as_str(),
                task.application_id,
                task.task_group_id,
                ttl,
                task.started.map(format_timestamp),
                task.terminated.map(format_timestamp),
                task.pod,
                task.bucket_id,
                attached,
                events,
                format_timestamp(task.create_time),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Saves every mutable column of the task.
pub fn update(db: &Database, task: &Task) -> Result<(), DatabaseError> {
    let ttl = to_json(&task.ttl)?;
    let attached = to_json(&task.attached)?;
    let events = to_json(&task.events)?;
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE task SET name = ?2, addon = ?3, state = ?4, application_id = ?5,
             task_group_id = ?6, ttl = ?7, started = ?8, terminated = ?9, pod = ?10,
             bucket_id = ?11, attached = ?12, events = ?13
             WHERE id = ?1",
            params![
                task.id,
                task.name,
                task.addon,
                task.state.as_str(),
                task.application_id,
                task.task_group_id,
                ttl,
                task.started.map(format_timestamp),
                task.terminated.map(format_timestamp),
                task.pod,
                task.bucket_id,
                attached,
                events,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Task>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row("SELECT * FROM task WHERE id = ?1", params![id], from_row)
            .optional()?)
    })
}

pub fn list(db: &Database) -> Result<Vec<Task>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM task ORDER BY id")?;
        let rows = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Every task in id order, each row decoded independently.
pub fn scan(db: &Database) -> Result<Scan<Task>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM task ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| scan_row(row, from_row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Lists tasks in any of the given states, in id order.
pub fn list_by_states(db: &Database, states: &[TaskState]) -> Result<Vec<Task>, DatabaseError> {
    if states.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; states.len()].join(", ");
    let sql = format!(
        "SELECT * FROM task WHERE state IN ({}) ORDER BY id",
        placeholders
    );
    let values: Vec<Value> = states
        .iter()
        .map(|s| Value::from(s.as_str().to_string()))
        .collect();
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Deletes the task. Its report goes with it.
pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute("DELETE FROM task WHERE id = ?1", params![id])?;
        Ok(n > 0)
    })
}
