//! Orphaned file sweep. The models scanned for references come from
//! `file.refs`; unknown names are rejected when settings are validated.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::reclaim::{reclaim, Outcome};
use super::refs::{self, RefKind, RefModel};
use super::{ReapError, Reaper};
use crate::db::{file_repo, Database};
use crate::model::File;
use crate::settings::Settings;

pub struct FileReaper {
    db: Database,
    settings: Arc<Settings>,
    models: Vec<RefModel>,
}

impl FileReaper {
    pub fn new(db: Database, settings: Arc<Settings>) -> Self {
        let models = settings
            .file
            .refs
            .iter()
            .filter_map(|name| {
                let model = refs::model(name);
                if model.is_none() {
                    tracing::warn!(model = %name, "Unknown file reference model ignored");
                }
                model
            })
            .collect();
        Self { db, settings, models }
    }

    fn reap_file(&self, file: &File, now: DateTime<Utc>) -> Result<Outcome, ReapError> {
        let busy = refs::busy(&self.db, &self.models, RefKind::File, file.id)?;
        reclaim(&self.db, file, busy, self.settings.file.ttl, now)
    }
}

impl Reaper for FileReaper {
    fn name(&self) -> &'static str {
        "file"
    }

    fn reap(&self, now: DateTime<Utc>) -> Result<(), ReapError> {
        let mut deleted = 0usize;
        for (id, row) in file_repo::scan(&self.db)? {
            let file = match row {
                Ok(file) => file,
                Err(e) => {
                    tracing::error!(file = id, error = %e, "File row unreadable");
                    continue;
                }
            };
            match self.reap_file(&file, now) {
                Ok(Outcome::Deleted) => deleted += 1,
                Ok(_) => {}
                Err(e) => tracing::error!(file = id, error = %e, "File reap failed"),
            }
        }
        if deleted > 0 {
            tracing::info!(deleted, "Files reaped");
        }
        Ok(())
    }
}
