//! Database error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error from rusqlite.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error when creating directories or files.
    #[error("IO error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A migration failed to apply.
    #[error("Migration failed at version {version}: {reason}")]
    Migration { version: u32, reason: String },

    /// A JSON column could not be encoded.
    #[error("JSON column encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A secret field could not be encrypted or decrypted.
    #[error("Secret field error: {0}")]
    Secret(#[from] crate::secret::SecretError),

    /// Adding the dependency would close a cycle.
    #[error(
        "RuleSet {rule_set} cannot depend on {depends_on}: cyclic dependencies are not allowed"
    )]
    DependencyCycle { rule_set: i64, depends_on: i64 },

    /// The database lock was poisoned.
    #[error("Database lock poisoned")]
    LockPoisoned,

    /// The handle was closed by the lifecycle manager.
    #[error("Database closed")]
    Closed,
}
