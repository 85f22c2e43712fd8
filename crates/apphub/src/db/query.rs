//! Raw compound queries.
//!
//! Sub-selects are rendered to SQL and joined with `UNION` or `INTERSECT`,
//! then executed as a single raw statement. Placeholders must be
//! anonymous (`?`) so parameters concatenate in order.

use rusqlite::types::Value;

use super::{Database, DatabaseError};

/// A rendered select returning a single id column.
#[derive(Debug, Clone)]
pub struct Select {
    sql: String,
    params: Vec<Value>,
}

impl Select {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// Rows present in any of `parts`.
pub fn union(parts: &[Select]) -> Select {
    compose(parts, "UNION")
}

/// Rows present in every one of `parts`.
pub fn intersect(parts: &[Select]) -> Select {
    compose(parts, "INTERSECT")
}

fn compose(parts: &[Select], operator: &str) -> Select {
    if parts.is_empty() {
        return Select::new("SELECT NULL WHERE 0", Vec::new());
    }
    let sql = parts
        .iter()
        .map(|p| p.sql.as_str())
        .collect::<Vec<_>>()
        .join(&format!(" {} ", operator));
    let params = parts.iter().flat_map(|p| p.params.iter().cloned()).collect();
    Select { sql, params }
}

/// Executes `select` and collects the id column.
pub fn ids(db: &Database, select: &Select) -> Result<Vec<i64>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&select.sql)?;
        let ids = stmt
            .query_map(rusqlite::params_from_iter(select.params.iter()), |r| {
                r.get::<_, Option<i64>>(0)
            })?
            .filter_map(|r| r.transpose())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    })
}
