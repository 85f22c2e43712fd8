//! Database migration system.
//!
//! Tracks applied migrations in a `_migrations` table and applies
//! pending ones in order. ALTER TABLE ADD COLUMN migrations are skipped
//! when the column already exists so re-runs stay idempotent.

use rusqlite::Connection;

use super::error::DatabaseError;

/// A single migration definition.
struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
    kind: MigrationKind,
}

enum MigrationKind {
    /// Execute the SQL directly.
    Standard,
    /// ALTER TABLE ADD COLUMN, skipped if the column already exists.
    AddColumn {
        table: &'static str,
        column: &'static str,
    },
}

/// All migrations in order. Each is applied at most once.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_inventory_tables",
        sql: include_str!("sql/001_create_inventory.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 2,
        description: "create_assessment_tables",
        sql: include_str!("sql/002_create_assessments.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 3,
        description: "create_task_tables",
        sql: include_str!("sql/003_create_tasks.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 4,
        description: "add_attached_to_task_report",
        sql: include_str!("sql/004_add_attached_to_task_report.sql"),
        kind: MigrationKind::AddColumn {
            table: "task_report",
            column: "attached",
        },
    },
    Migration {
        version: 5,
        description: "create_catalog_tables",
        sql: include_str!("sql/005_create_catalog.sql"),
        kind: MigrationKind::Standard,
    },
];

/// Runs all pending migrations on the given connection.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        log::info!(
            "Running migration v{}: {}",
            migration.version,
            migration.description
        );

        let should_run = match &migration.kind {
            MigrationKind::Standard => true,
            MigrationKind::AddColumn { table, column } => !column_exists(conn, table, column)?,
        };

        if should_run {
            conn.execute_batch(migration.sql)
                .map_err(|e| DatabaseError::Migration {
                    version: migration.version,
                    reason: e.to_string(),
                })?;
        } else {
            log::info!(
                "Skipping migration v{} (condition not met)",
                migration.version
            );
        }

        conn.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.description],
        )?;
    }

    Ok(())
}

/// Checks whether a column exists on a table using `PRAGMA table_info`.
fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DatabaseError::Migration {
            version: 0,
            reason: format!("Invalid table name: {}", table),
        });
    }
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let exists = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .any(|r| r.map(|name| name == column).unwrap_or(false));
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrated() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        run_all(&conn).unwrap();
        conn
    }

    #[test]
    fn test_migrations_run_on_fresh_db() {
        let conn = migrated();
        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = migrated();
        run_all(&conn).unwrap();

        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_column_exists_check() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE test_tbl (id TEXT, name TEXT);")
            .unwrap();

        assert!(column_exists(&conn, "test_tbl", "id").unwrap());
        assert!(!column_exists(&conn, "test_tbl", "missing").unwrap());
        assert!(column_exists(&conn, "bad;name", "id").is_err());
    }

    #[test]
    fn test_task_report_has_attached() {
        let conn = migrated();
        assert!(column_exists(&conn, "task_report", "attached").unwrap());
    }

    #[test]
    fn test_assessment_owner_is_exclusive() {
        let conn = migrated();
        conn.execute_batch(
            "INSERT INTO questionnaire (name, create_time)
             VALUES ('q', '2026-01-01T00:00:00+00:00');
             INSERT INTO application (name, create_time) VALUES ('a', '2026-01-01T00:00:00+00:00');
             INSERT INTO archetype (name, create_time) VALUES ('x', '2026-01-01T00:00:00+00:00');",
        )
        .unwrap();

        let both = conn.execute(
            "INSERT INTO assessment (application_id, archetype_id, questionnaire_id, create_time)
             VALUES (1, 1, 1, '2026-01-01T00:00:00+00:00')",
            [],
        );
        assert!(both.is_err());

        let neither = conn.execute(
            "INSERT INTO assessment (questionnaire_id, create_time)
             VALUES (1, '2026-01-01T00:00:00+00:00')",
            [],
        );
        assert!(neither.is_err());
    }
}
