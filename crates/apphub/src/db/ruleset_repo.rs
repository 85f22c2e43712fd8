//! Rule set repository and the dependency graph between rule sets.

use std::collections::{HashSet, VecDeque};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_timestamp, Database, DatabaseError};
use crate::model::RuleSet;

fn from_row(row: &Row<'_>) -> Result<RuleSet, rusqlite::Error> {
    Ok(RuleSet {
        id: row.get("id")?,
        uuid: row.get("uuid")?,
        name: row.get("name")?,
        description: row.get("description")?,
        depends_on: Vec::new(),
    })
}

/// Whether adding the edge `rule_set -> depends_on` would close a cycle.
///
/// Walks the existing graph breadth-first from `rule_set` through its
/// dependents; reaching `depends_on` means `depends_on` already
/// (transitively) depends on `rule_set`. `dependents(id)` returns the ids
/// of rule sets that depend on `id`.
pub(crate) fn closes_cycle<F, E>(
    rule_set: i64,
    depends_on: i64,
    mut dependents: F,
) -> Result<bool, E>
where
    F: FnMut(i64) -> Result<Vec<i64>, E>,
{
    if rule_set == depends_on {
        return Ok(true);
    }
    let mut visited = HashSet::from([rule_set]);
    let mut queue = VecDeque::from([rule_set]);
    while let Some(next) = queue.pop_front() {
        for dependent in dependents(next)? {
            if dependent == depends_on {
                return Ok(true);
            }
            if visited.insert(dependent) {
                queue.push_back(dependent);
            }
        }
    }
    Ok(false)
}

pub(crate) fn dependents_with(conn: &Connection, id: i64) -> Result<Vec<i64>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT rule_set_id FROM rule_set_dependency WHERE depends_on_id = ?1 ORDER BY rule_set_id",
    )?;
    let ids = stmt
        .query_map(params![id], |r| r.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

fn dependencies_with(conn: &Connection, id: i64) -> Result<Vec<i64>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT depends_on_id FROM rule_set_dependency WHERE rule_set_id = ?1 \
         ORDER BY depends_on_id",
    )?;
    let ids = stmt
        .query_map(params![id], |r| r.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

/// Adds `rule_set -> depends_on` after checking it keeps the graph acyclic.
pub(crate) fn add_dependency_with(
    conn: &Connection,
    rule_set: i64,
    depends_on: i64,
) -> Result<(), DatabaseError> {
    if closes_cycle(rule_set, depends_on, |id| dependents_with(conn, id))? {
        return Err(DatabaseError::DependencyCycle {
            rule_set,
            depends_on,
        });
    }
    conn.execute(
        "INSERT OR IGNORE INTO rule_set_dependency (rule_set_id, depends_on_id) VALUES (?1, ?2)",
        params![rule_set, depends_on],
    )?;
    Ok(())
}

/// Inserts a rule set without dependencies; returns its id.
pub fn insert(db: &Database, rule_set: &RuleSet) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO rule_set (uuid, name, description, create_time) VALUES (?1, ?2, ?3, ?4)",
            params![
                rule_set.uuid,
                rule_set.name,
                rule_set.description,
                format_timestamp(Utc::now()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

pub fn add_dependency(db: &Database, rule_set: i64, depends_on: i64) -> Result<(), DatabaseError> {
    db.with_conn(|conn| add_dependency_with(conn, rule_set, depends_on))
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<RuleSet>, DatabaseError> {
    db.with_conn(|conn| {
        let found = conn
            .query_row("SELECT * FROM rule_set WHERE id = ?1", params![id], from_row)
            .optional()?;
        match found {
            Some(mut m) => {
                m.depends_on = dependencies_with(conn, m.id)?;
                Ok(Some(m))
            }
            None => Ok(None),
        }
    })
}

pub fn list(db: &Database) -> Result<Vec<RuleSet>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM rule_set ORDER BY id")?;
        let mut list = stmt
            .query_map([], from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        for m in &mut list {
            m.depends_on = dependencies_with(conn, m.id)?;
        }
        Ok(list)
    })
}
