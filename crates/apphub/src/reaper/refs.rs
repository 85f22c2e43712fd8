//! Reference tables for buckets and files.
//!
//! Each model lists the columns that point at a bucket or a file. A
//! scalar column holds the id directly; a JSON list column holds
//! `[{"id": .., ...}]` attachment objects.

use rusqlite::params;

use crate::db::{Database, DatabaseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Bucket,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    JsonList,
}

#[derive(Debug, Clone, Copy)]
pub struct RefField {
    pub column: &'static str,
    pub kind: RefKind,
    pub shape: Shape,
}

/// A table and its reference-bearing columns.
#[derive(Debug, Clone, Copy)]
pub struct RefModel {
    pub table: &'static str,
    pub fields: &'static [RefField],
}

impl RefModel {
    fn fields_of(&self, kind: RefKind) -> impl Iterator<Item = &'static RefField> {
        self.fields.iter().filter(move |f| f.kind == kind)
    }
}

const fn scalar(column: &'static str, kind: RefKind) -> RefField {
    RefField {
        column,
        kind,
        shape: Shape::Scalar,
    }
}

const fn json_list(column: &'static str, kind: RefKind) -> RefField {
    RefField {
        column,
        kind,
        shape: Shape::JsonList,
    }
}

pub const APPLICATION: RefModel = RefModel {
    table: "application",
    fields: &[scalar("bucket_id", RefKind::Bucket)],
};

pub const TASK_GROUP: RefModel = RefModel {
    table: "task_group",
    fields: &[scalar("bucket_id", RefKind::Bucket)],
};

pub const TASK: RefModel = RefModel {
    table: "task",
    fields: &[
        scalar("bucket_id", RefKind::Bucket),
        json_list("attached", RefKind::File),
    ],
};

pub const TASK_REPORT: RefModel = RefModel {
    table: "task_report",
    fields: &[json_list("attached", RefKind::File)],
};

pub const RULE: RefModel = RefModel {
    table: "rule",
    fields: &[scalar("file_id", RefKind::File)],
};

pub const TARGET: RefModel = RefModel {
    table: "target",
    fields: &[scalar("image_id", RefKind::File)],
};

/// Models that may hold a bucket.
pub const BUCKET_MODELS: &[RefModel] = &[APPLICATION, TASK_GROUP, TASK];

/// Looks up a model by table name.
pub fn model(table: &str) -> Option<RefModel> {
    [APPLICATION, TASK_GROUP, TASK, TASK_REPORT, RULE, TARGET]
        .into_iter()
        .find(|m| m.table == table)
}

/// Number of rows in `model` referencing `id` through any field of `kind`.
/// Zero when the model has no such field.
pub fn count(
    db: &Database,
    model: &RefModel,
    kind: RefKind,
    id: i64,
) -> Result<u64, DatabaseError> {
    let clauses: Vec<String> = model
        .fields_of(kind)
        .map(|f| match f.shape {
            Shape::Scalar => format!("t.{} = ?1", f.column),
            Shape::JsonList => format!(
                "EXISTS (SELECT 1 FROM json_each(t.{}) j WHERE json_extract(j.value, '$.id') = ?1)",
                f.column
            ),
        })
        .collect();
    if clauses.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "SELECT COUNT(*) FROM {} t WHERE {}",
        model.table,
        clauses.join(" OR ")
    );
    db.with_conn(|conn| {
        let n: i64 = conn.query_row(&sql, params![id], |r| r.get(0))?;
        Ok(n.max(0) as u64)
    })
}

/// Whether any row of `models` references `id` through a field of
/// `kind`. Stops at the first model with a reference.
pub fn busy(
    db: &Database,
    models: &[RefModel],
    kind: RefKind,
    id: i64,
) -> Result<bool, DatabaseError> {
    for model in models {
        if count(db, model, kind, id)? > 0 {
            return Ok(true);
        }
    }
    Ok(false)
}
