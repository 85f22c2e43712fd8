//! Orphan expiration shared by buckets and files.
//!
//! An unreferenced row is marked to expire `ttl` minutes later. A row
//! referenced again before that has its mark cleared. Once the mark has
//! passed, the path on disk is removed first and the row second, so a
//! failed removal leaves the row for the next cycle.

use std::io;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};

use super::ReapError;
use crate::db::{bucket_repo, file_repo, Database, DatabaseError};
use crate::model::{Bucket, File};

/// What a single reclaim step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Referenced and unmarked.
    Busy,
    /// Referenced again; the mark was removed.
    Cleared,
    /// Newly orphaned; an expiration was set.
    Marked,
    /// Orphaned, expiration not reached.
    Waiting,
    /// Expired; path and row removed.
    Deleted,
}

pub(crate) trait Resource {
    fn id(&self) -> i64;
    fn path(&self) -> &Path;
    fn expiration(&self) -> Option<DateTime<Utc>>;
    fn set_expiration(
        db: &Database,
        id: i64,
        at: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError>;
    fn delete_row(db: &Database, id: i64) -> Result<bool, DatabaseError>;
    fn remove(path: &Path) -> io::Result<()>;
}

impl Resource for Bucket {
    fn id(&self) -> i64 {
        self.id
    }

    fn path(&self) -> &Path {
        Path::new(&self.path)
    }

    fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    fn set_expiration(
        db: &Database,
        id: i64,
        at: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError> {
        bucket_repo::set_expiration(db, id, at)
    }

    fn delete_row(db: &Database, id: i64) -> Result<bool, DatabaseError> {
        bucket_repo::delete(db, id)
    }

    fn remove(path: &Path) -> io::Result<()> {
        std::fs::remove_dir_all(path)
    }
}

impl Resource for File {
    fn id(&self) -> i64 {
        self.id
    }

    fn path(&self) -> &Path {
        Path::new(&self.path)
    }

    fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    fn set_expiration(
        db: &Database,
        id: i64,
        at: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError> {
        file_repo::set_expiration(db, id, at)
    }

    fn delete_row(db: &Database, id: i64) -> Result<bool, DatabaseError> {
        file_repo::delete(db, id)
    }

    fn remove(path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}

pub(crate) fn reclaim<R: Resource>(
    db: &Database,
    resource: &R,
    busy: bool,
    ttl_minutes: u64,
    now: DateTime<Utc>,
) -> Result<Outcome, ReapError> {
    let id = resource.id();
    if busy {
        if resource.expiration().is_none() {
            return Ok(Outcome::Busy);
        }
        R::set_expiration(db, id, None)?;
        tracing::debug!(id, "Expiration cleared");
        return Ok(Outcome::Cleared);
    }

    let Some(expiration) = resource.expiration() else {
        let minutes = i64::try_from(ttl_minutes).unwrap_or(i64::MAX);
        let at = now
            .checked_add_signed(Duration::minutes(minutes))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        R::set_expiration(db, id, Some(at))?;
        tracing::debug!(id, expiration = %at, "Orphan marked");
        return Ok(Outcome::Marked);
    };

    if now <= expiration {
        return Ok(Outcome::Waiting);
    }

    let path = resource.path();
    match R::remove(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(ReapError::Remove {
                path: path.to_path_buf(),
                source: e,
            })
        }
    }
    R::delete_row(db, id)?;
    tracing::info!(id, path = %path.display(), "Orphan deleted");
    Ok(Outcome::Deleted)
}
