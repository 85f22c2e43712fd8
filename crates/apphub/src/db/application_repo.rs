//! Application repository: applications, their tags and identities.

use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::query::{self, Select};
use super::{assessment_repo, format_timestamp, tag_repo, to_json, Database, DatabaseError};
use crate::model::{Application, AssessmentOwner, Repository, Tag};

/// How a tag filter combines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMatch {
    /// Applications carrying at least one of the tags.
    Any,
    /// Applications carrying every one of the tags.
    All,
}

fn from_row(row: &Row<'_>) -> Result<Application, rusqlite::Error> {
    let repository: Option<String> = row.get("repository")?;
    let repository = match repository {
        Some(text) => Some(serde_json::from_str::<Repository>(&text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };
    Ok(Application {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        repository,
        binary: row.get("binary")?,
        comments: row.get("comments")?,
        bucket_id: row.get("bucket_id")?,
        tags: Vec::new(),
        identities: Vec::new(),
        assessments: Vec::new(),
    })
}

fn load_associations(conn: &Connection, app: &mut Application) -> Result<(), DatabaseError> {
    app.tags = tag_repo::tags_through(conn, "application_tag", "application_id", app.id)?;
    let mut stmt = conn.prepare(
        "SELECT identity_id FROM application_identity WHERE application_id = ?1 \
         ORDER BY identity_id",
    )?;
    app.identities = stmt
        .query_map(params![app.id], |r| r.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    app.assessments = assessment_repo::list_for_owner(conn, AssessmentOwner::Application(app.id))?;
    Ok(())
}

/// Inserts an application with its tags and identity links; returns its id.
///
/// Tags are recorded with an empty source. Embedded assessments are not
/// written; use `assessment_repo::insert`.
pub fn insert(db: &Database, app: &Application) -> Result<i64, DatabaseError> {
    let repository = app.repository.as_ref().map(to_json).transpose()?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO application (name, description, repository, binary, comments, bucket_id,
             create_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                app.name,
                app.description,
                repository,
                app.binary,
                app.comments,
                app.bucket_id,
                format_timestamp(Utc::now()),
            ],
        )?;
        let id = conn.last_insert_rowid();
        for tag in &app.tags {
            conn.execute(
                "INSERT OR IGNORE INTO application_tag (application_id, tag_id, source) \
                 VALUES (?1, ?2, '')",
                params![id, tag.id],
            )?;
        }
        for identity in &app.identities {
            conn.execute(
                "INSERT INTO application_identity (application_id, identity_id) VALUES (?1, ?2)",
                params![id, identity],
            )?;
        }
        Ok(id)
    })
}

/// Updates the scalar fields of an application.
pub fn update(db: &Database, app: &Application) -> Result<(), DatabaseError> {
    let repository = app.repository.as_ref().map(to_json).transpose()?;
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE application SET name = ?2, description = ?3, repository = ?4, binary = ?5,
             comments = ?6, bucket_id = ?7
             WHERE id = ?1",
            params![
                app.id,
                app.name,
                app.description,
                repository,
                app.binary,
                app.comments,
                app.bucket_id,
            ],
        )?;
        Ok(())
    })
}

/// Points the application at a bucket, or detaches it.
pub fn set_bucket(db: &Database, id: i64, bucket_id: Option<i64>) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE application SET bucket_id = ?2 WHERE id = ?1",
            params![id, bucket_id],
        )?;
        Ok(())
    })
}

/// Applies a tag from the given source (e.g. `""` for manual, or an
/// analysis name). Re-applying is a no-op.
pub fn add_tag(db: &Database, id: i64, tag_id: i64, source: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT OR IGNORE INTO application_tag (application_id, tag_id, source) \
             VALUES (?1, ?2, ?3)",
            params![id, tag_id, source],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Application>, DatabaseError> {
    db.with_conn(|conn| {
        let found = conn
            .query_row(
                "SELECT * FROM application WHERE id = ?1",
                params![id],
                from_row,
            )
            .optional()?;
        match found {
            Some(mut app) => {
                load_associations(conn, &mut app)?;
                Ok(Some(app))
            }
            None => Ok(None),
        }
    })
}

/// Lists all applications with tags, identities and assessments.
pub fn list(db: &Database) -> Result<Vec<Application>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM application ORDER BY id")?;
        let mut apps = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        for app in &mut apps {
            load_associations(conn, app)?;
        }
        Ok(apps)
    })
}

pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute("DELETE FROM application WHERE id = ?1", params![id])?;
        Ok(n > 0)
    })
}

/// Ids of applications matching the tag filter.
pub fn ids_by_tags(
    db: &Database,
    tag_ids: &[i64],
    mode: TagMatch,
) -> Result<Vec<i64>, DatabaseError> {
    let parts: Vec<Select> = tag_ids
        .iter()
        .map(|id| {
            Select::new(
                "SELECT application_id FROM application_tag WHERE tag_id = ?",
                vec![Value::from(*id)],
            )
        })
        .collect();
    let select = match mode {
        TagMatch::Any => query::union(&parts),
        TagMatch::All => query::intersect(&parts),
    };
    let mut ids = query::ids(db, &select)?;
    ids.sort_unstable();
    Ok(ids)
}

/// Streams `(application id, tags)` for every application, in application
/// id order. Untagged applications are visited with an empty list.
///
/// `f` runs while the connection is locked and must not touch the store.
pub fn for_each_tag_set<F>(db: &Database, mut f: F) -> Result<(), DatabaseError>
where
    F: FnMut(i64, Vec<Tag>),
{
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT a.id AS app_id, t.id AS tag_id, t.name, t.category_id
             FROM application a
             LEFT JOIN application_tag j ON j.application_id = a.id
             LEFT JOIN tag t ON t.id = j.tag_id
             ORDER BY a.id, t.id",
        )?;
        let mut rows = stmt.query([])?;
        let mut current: Option<(i64, Vec<Tag>)> = None;
        while let Some(row) = rows.next()? {
            let app_id: i64 = row.get("app_id")?;
            let tag = match row.get::<_, Option<i64>>("tag_id")? {
                Some(id) => Some(Tag {
                    id,
                    name: row.get("name")?,
                    category_id: row.get("category_id")?,
                }),
                None => None,
            };
            if !matches!(current, Some((id, _)) if id == app_id) {
                if let Some((id, tags)) = current.take() {
                    f(id, tags);
                }
                current = Some((app_id, Vec::new()));
            }
            if let (Some((_, tags)), Some(tag)) = (current.as_mut(), tag) {
                tags.push(tag);
            }
        }
        if let Some((id, tags)) = current {
            f(id, tags);
        }
        Ok(())
    })
}
