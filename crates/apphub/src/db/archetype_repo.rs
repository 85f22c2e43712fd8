//! Archetype repository.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{assessment_repo, format_timestamp, tag_repo, Database, DatabaseError};
use crate::model::{Archetype, AssessmentOwner};

fn from_row(row: &Row<'_>) -> Result<Archetype, rusqlite::Error> {
    Ok(Archetype {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        comments: row.get("comments")?,
        ..Default::default()
    })
}

fn ids(conn: &Connection, sql: &str, id: i64) -> Result<Vec<i64>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map(params![id], |r| r.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

fn load_associations(conn: &Connection, archetype: &mut Archetype) -> Result<(), DatabaseError> {
    archetype.criteria_tags =
        tag_repo::tags_through(conn, "archetype_criteria_tag", "archetype_id", archetype.id)?;
    archetype.tags = tag_repo::tags_through(conn, "archetype_tag", "archetype_id", archetype.id)?;
    archetype.stakeholders = ids(
        conn,
        "SELECT stakeholder_id FROM archetype_stakeholder WHERE archetype_id = ?1 \
         ORDER BY stakeholder_id",
        archetype.id,
    )?;
    archetype.stakeholder_groups = ids(
        conn,
        "SELECT stakeholder_group_id FROM archetype_stakeholder_group WHERE archetype_id = ?1
         ORDER BY stakeholder_group_id",
        archetype.id,
    )?;
    archetype.assessments =
        assessment_repo::list_for_owner(conn, AssessmentOwner::Archetype(archetype.id))?;
    Ok(())
}

/// Inserts an archetype with criteria tags, tags and stakeholder links;
/// returns its id.
pub fn insert(db: &Database, archetype: &Archetype) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO archetype (name, description, comments, create_time) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                archetype.name,
                archetype.description,
                archetype.comments,
                format_timestamp(Utc::now()),
            ],
        )?;
        let id = conn.last_insert_rowid();
        for tag in &archetype.criteria_tags {
            conn.execute(
                "INSERT OR IGNORE INTO archetype_criteria_tag (archetype_id, tag_id) \
                 VALUES (?1, ?2)",
                params![id, tag.id],
            )?;
        }
        for tag in &archetype.tags {
            conn.execute(
                "INSERT OR IGNORE INTO archetype_tag (archetype_id, tag_id) VALUES (?1, ?2)",
                params![id, tag.id],
            )?;
        }
        for stakeholder in &archetype.stakeholders {
            conn.execute(
                "INSERT INTO archetype_stakeholder (archetype_id, stakeholder_id) VALUES (?1, ?2)",
                params![id, stakeholder],
            )?;
        }
        for group in &archetype.stakeholder_groups {
            conn.execute(
                "INSERT INTO archetype_stakeholder_group (archetype_id, stakeholder_group_id) \
                 VALUES (?1, ?2)",
                params![id, group],
            )?;
        }
        Ok(id)
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Archetype>, DatabaseError> {
    db.with_conn(|conn| {
        let found = conn
            .query_row("SELECT * FROM archetype WHERE id = ?1", params![id], from_row)
            .optional()?;
        match found {
            Some(mut archetype) => {
                load_associations(conn, &mut archetype)?;
                Ok(Some(archetype))
            }
            None => Ok(None),
        }
    })
}

/// Lists every archetype with all associations preloaded.
pub fn list(db: &Database) -> Result<Vec<Archetype>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM archetype ORDER BY id")?;
        let mut list = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        for archetype in &mut list {
            load_associations(conn, archetype)?;
        }
        Ok(list)
    })
}

pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute("DELETE FROM archetype WHERE id = ?1", params![id])?;
        Ok(n > 0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::stakeholder_repo;

    #[test]
    fn test_insert_and_list() {
        let db = Database::open_in_memory().unwrap();
        let category = tag_repo::insert_category(&db, "Language", "").unwrap();
        let java = tag_repo::insert(&db, category, "Java").unwrap();
        let web = tag_repo::insert(&db, category, "Web").unwrap();
        let group = stakeholder_repo::insert_group(&db, "Architects", "").unwrap();

        let id = insert(
            &db,
            &Archetype {
                name: "Java web".into(),
                criteria_tags: vec![java.clone()],
                tags: vec![web.clone()],
                stakeholder_groups: vec![group],
                ..Default::default()
            },
        )
        .unwrap();

        let all = list(&db).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].criteria_tags, vec![java]);
        assert_eq!(all[0].tags, vec![web]);
        assert_eq!(all[0].stakeholder_groups, vec![group]);

        assert!(delete(&db, id).unwrap());
        assert!(find_by_id(&db, id).unwrap().is_none());
    }
}
