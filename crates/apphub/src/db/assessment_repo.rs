//! Assessment repository.
//!
//! Sections, thresholds and risk messages are JSON columns. Stakeholder
//! links live in `assessment_stakeholder` / `assessment_stakeholder_group`.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_timestamp, json_column, to_json, Database, DatabaseError};
use crate::model::{Assessment, AssessmentOwner};

fn from_row(row: &Row<'_>) -> Result<Assessment, rusqlite::Error> {
    let application_id: Option<i64> = row.get("application_id")?;
    let archetype_id: Option<i64> = row.get("archetype_id")?;
    let owner = match (application_id, archetype_id) {
        (Some(id), _) => AssessmentOwner::Application(id),
        (None, Some(id)) => AssessmentOwner::Archetype(id),
        (None, None) => {
            return Err(rusqlite::Error::InvalidColumnType(
                0,
                "application_id".to_string(),
                rusqlite::types::Type::Null,
            ))
        }
    };
    Ok(Assessment {
        id: row.get("id")?,
        owner,
        questionnaire_id: row.get("questionnaire_id")?,
        sections: json_column(row, "sections")?,
        thresholds: json_column(row, "thresholds")?,
        risk_messages: json_column(row, "risk_messages")?,
        stakeholders: Vec::new(),
        stakeholder_groups: Vec::new(),
    })
}

fn owner_columns(owner: AssessmentOwner) -> (Option<i64>, Option<i64>) {
    match owner {
        AssessmentOwner::Application(id) => (Some(id), None),
        AssessmentOwner::Archetype(id) => (None, Some(id)),
    }
}

/// Inserts an assessment with its stakeholder links and returns its id.
pub fn insert(db: &Database, assessment: &Assessment) -> Result<i64, DatabaseError> {
    let sections = to_json(&assessment.sections)?;
    let thresholds = to_json(&assessment.thresholds)?;
    let messages = to_json(&assessment.risk_messages)?;
    let (application_id, archetype_id) = owner_columns(assessment.owner);
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO assessment (application_id, archetype_id, questionnaire_id, sections,
             thresholds, risk_messages, create_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                application_id,
                archetype_id,
                assessment.questionnaire_id,
                sections,
                thresholds,
                messages,
                format_timestamp(Utc::now()),
            ],
        )?;
        let id = conn.last_insert_rowid();
        link_stakeholders(conn, id, assessment)?;
        Ok(id)
    })
}

/// Saves the answered sections and thresholds of an existing assessment.
pub fn update(db: &Database, assessment: &Assessment) -> Result<(), DatabaseError> {
    let sections = to_json(&assessment.sections)?;
    let thresholds = to_json(&assessment.thresholds)?;
    let messages = to_json(&assessment.risk_messages)?;
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE assessment SET sections = ?2, thresholds = ?3, risk_messages = ?4 \
             WHERE id = ?1",
            params![assessment.id, sections, thresholds, messages],
        )?;
        conn.execute(
            "DELETE FROM assessment_stakeholder WHERE assessment_id = ?1",
            params![assessment.id],
        )?;
        conn.execute(
            "DELETE FROM assessment_stakeholder_group WHERE assessment_id = ?1",
            params![assessment.id],
        )?;
        link_stakeholders(conn, assessment.id, assessment)
    })
}

fn link_stakeholders(
    conn: &Connection,
    id: i64,
    assessment: &Assessment,
) -> Result<(), DatabaseError> {
    for stakeholder in &assessment.stakeholders {
        conn.execute(
            "INSERT INTO assessment_stakeholder (assessment_id, stakeholder_id) VALUES (?1, ?2)",
            params![id, stakeholder],
        )?;
    }
    for group in &assessment.stakeholder_groups {
        conn.execute(
            "INSERT INTO assessment_stakeholder_group (assessment_id, stakeholder_group_id) \
             VALUES (?1, ?2)",
            params![id, group],
        )?;
    }
    Ok(())
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<Assessment>, DatabaseError> {
    db.with_conn(|conn| {
        let found = conn
            .query_row("SELECT * FROM assessment WHERE id = ?1", params![id], from_row)
            .optional()?;
        match found {
            Some(mut assessment) => {
                load_stakeholders(conn, &mut assessment)?;
                Ok(Some(assessment))
            }
            None => Ok(None),
        }
    })
}

pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let n = conn.execute("DELETE FROM assessment WHERE id = ?1", params![id])?;
        Ok(n > 0)
    })
}

/// Lists the assessments of one owner, stakeholders included.
pub(crate) fn list_for_owner(
    conn: &Connection,
    owner: AssessmentOwner,
) -> Result<Vec<Assessment>, DatabaseError> {
    let (sql, id) = match owner {
        AssessmentOwner::Application(id) => (
            "SELECT * FROM assessment WHERE application_id = ?1 ORDER BY id",
            id,
        ),
        AssessmentOwner::Archetype(id) => (
            "SELECT * FROM assessment WHERE archetype_id = ?1 ORDER BY id",
            id,
        ),
    };
    let mut stmt = conn.prepare(sql)?;
    let mut list = stmt
        .query_map(params![id], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    for assessment in &mut list {
        load_stakeholders(conn, assessment)?;
    }
    Ok(list)
}

fn load_stakeholders(conn: &Connection, assessment: &mut Assessment) -> Result<(), DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT stakeholder_id FROM assessment_stakeholder WHERE assessment_id = ?1 \
         ORDER BY stakeholder_id",
    )?;
    assessment.stakeholders = stmt
        .query_map(params![assessment.id], |r| r.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    let mut stmt = conn.prepare(
        "SELECT stakeholder_group_id FROM assessment_stakeholder_group WHERE assessment_id = ?1
         ORDER BY stakeholder_group_id",
    )?;
    assessment.stakeholder_groups = stmt
        .query_map(params![assessment.id], |r| r.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(())
}
