//! Questionnaire repository.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

use super::{format_timestamp, json_column, to_json, Database, DatabaseError};
use crate::model::Questionnaire;

fn from_row(row: &Row<'_>) -> Result<Questionnaire, rusqlite::Error> {
    Ok(Questionnaire {
        id: row.get("id")?,
        uuid: row.get("uuid")?,
        name: row.get("name")?,
        description: row.get("description")?,
        required: row.get("required")?,
        sections: json_column(row, "sections")?,
        thresholds: json_column(row, "thresholds")?,
        risk_messages: json_column(row, "risk_messages")?,
    })
}

/// Inserts a questionnaire and returns its id.
pub fn insert(db: &Database, questionnaire: &Questionnaire) -> Result<i64, DatabaseError> {
    let sections = to_json(&questionnaire.sections)?;
    let thresholds = to_json(&questionnaire.thresholds)?;
    let messages = to_json(&questionnaire.risk_messages)?;
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO questionnaire (uuid, name, description, required, sections, thresholds,
             risk_messages, create_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                questionnaire.uuid,
                questionnaire.name,
                questionnaire.description,
                questionnaire.required,
                sections,
                thresholds,
                messages,
                format_timestamp(Utc::now()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Flips the `required` flag.
pub fn set_required(db: &Database, id: i64, required: bool) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE questionnaire SET required = ?2 WHERE id = ?1",
            params![id, required],
        )?;
        Ok(())
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Questionnaire>, DatabaseError> {
    db.with_conn(|conn| {
        Ok(conn
            .query_row(
                "SELECT * FROM questionnaire WHERE id = ?1",
                params![id],
                from_row,
            )
            .optional()?)
    })
}

pub fn list(db: &Database) -> Result<Vec<Questionnaire>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM questionnaire ORDER BY id")?;
        let rows = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Ids of every questionnaire marked required.
pub fn required_ids(db: &Database) -> Result<Vec<i64>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT id FROM questionnaire WHERE required = 1 ORDER BY id")?;
        let ids = stmt
            .query_map([], |r| r.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Section, Thresholds};

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        let q = Questionnaire {
            name: "Cloud readiness".into(),
            required: true,
            sections: vec![Section {
                name: "Application details".into(),
                ..Default::default()
            }],
            thresholds: Thresholds {
                red: 5,
                yellow: 30,
                unknown: 15,
            },
            ..Default::default()
        };
        let id = insert(&db, &q).unwrap();
        let found = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(found.name, "Cloud readiness");
        assert_eq!(found.sections, q.sections);
        assert_eq!(found.thresholds, q.thresholds);
    }

    #[test]
    fn test_required_ids() {
        let db = test_db();
        let a = insert(
            &db,
            &Questionnaire {
                name: "a".into(),
                required: true,
                ..Default::default()
            },
        )
        .unwrap();
        let b = insert(
            &db,
            &Questionnaire {
                name: "b".into(),
                required: false,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(required_ids(&db).unwrap(), vec![a]);

        set_required(&db, b, true).unwrap();
        assert_eq!(required_ids(&db).unwrap(), vec![a, b]);
        assert_eq!(list(&db).unwrap().len(), 2);
    }
}
