//! Persistent side-stores owned by the hub.

use chrono::{DateTime, Utc};

/// A directory on the hub's volume. `expiration` is set only while the
/// bucket is an orphan.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub id: i64,
    pub path: String,
    pub expiration: Option<DateTime<Utc>>,
    pub create_time: DateTime<Utc>,
}

/// A single file on the hub's volume. Same expiration rules as [`Bucket`].
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub id: i64,
    pub name: String,
    pub encoding: String,
    pub path: String,
    pub expiration: Option<DateTime<Utc>>,
    pub create_time: DateTime<Utc>,
}
