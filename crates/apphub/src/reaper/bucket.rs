//! Orphaned bucket sweep.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::reclaim::{reclaim, Outcome};
use super::refs::{self, RefKind};
use super::{ReapError, Reaper};
use crate::db::{bucket_repo, Database};
use crate::model::Bucket;
use crate::settings::Settings;

pub struct BucketReaper {
    db: Database,
    settings: Arc<Settings>,
}

impl BucketReaper {
    pub fn new(db: Database, settings: Arc<Settings>) -> Self {
        Self { db, settings }
    }

    fn reap_bucket(&self, bucket: &Bucket, now: DateTime<Utc>) -> Result<Outcome, ReapError> {
        let busy = refs::busy(&self.db, refs::BUCKET_MODELS, RefKind::Bucket, bucket.id)?;
        reclaim(&self.db, bucket, busy, self.settings.bucket.ttl, now)
    }
}

impl Reaper for BucketReaper {
    fn name(&self) -> &'static str {
        "bucket"
    }

    fn reap(&self, now: DateTime<Utc>) -> Result<(), ReapError> {
        let mut deleted = 0usize;
        for (id, row) in bucket_repo::scan(&self.db)? {
            let bucket = match row {
                Ok(bucket) => bucket,
                Err(e) => {
                    tracing::error!(bucket = id, error = %e, "Bucket row unreadable");
                    continue;
                }
            };
            match self.reap_bucket(&bucket, now) {
                Ok(Outcome::Deleted) => deleted += 1,
                Ok(_) => {}
                Err(e) => tracing::error!(bucket = id, error = %e, "Bucket reap failed"),
            }
        }
        if deleted > 0 {
            tracing::info!(deleted, "Buckets reaped");
        }
        Ok(())
    }
}
