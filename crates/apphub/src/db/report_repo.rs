//! Task report repository. One report per task.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::{format_timestamp, json_column, to_json, Database, DatabaseError};
use crate::model::TaskReport;

fn from_row(row: &Row<'_>) -> Result<TaskReport, rusqlite::Error> {
    Ok(TaskReport {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        status: row.get("status")?,
        total: row.get("total")?,
        completed: row.get("completed")?,
        activity: json_column(row, "activity")?,
        attached: json_column(row, "attached")?,
    })
}

pub fn insert(db: &Database, report: &TaskReport) -> Result<i64, DatabaseError> {
    let activity = to_json(&report.activity)?;
    let attached = to_json(&report.attached)?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO task_report (task_id, status, total, completed, activity, attached,
             create_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                report.task_id,
                report.status,
                report.total,
                report.completed,
                activity,
                attached,
                format_timestamp(Utc::now()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn update(db: &Database, report: &TaskReport) -> Result<(), DatabaseError> {
    let activity = to_json(&report.activity)?;
    let attached = to_json(&report.attached)?;
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE task_report SET status = ?2, total = ?3, completed = ?4, activity = ?5,
             attached = ?6
             WHERE id = ?1",
            params![
                report.id,
                report.status,
                report.total,
                report.completed,
                activity,
                attached,
            ],
        )?;
        Ok(())
    })
}

pub fn find_by_task(db: &Database, task_id: i64) -> Result<Option<TaskReport>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM task_report WHERE task_id = ?1",
                params![task_id],
                from_row,
            )
            .optional()?)
    })
}
