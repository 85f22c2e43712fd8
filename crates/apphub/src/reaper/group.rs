//! Task group sweep.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{older_than, ReapError, Reaper};
use crate::db::{group_repo, Database};
use crate::model::{TaskGroup, TaskState};
use crate::settings::Settings;

/// Ready groups keep their bucket this long after creation.
const READY_RETENTION_MINUTES: u64 = 60;

pub struct GroupReaper {
    db: Database,
    settings: Arc<Settings>,
}

impl GroupReaper {
    pub fn new(db: Database, settings: Arc<Settings>) -> Self {
        Self { db, settings }
    }

    fn reap_group(
        &self,
        group: &mut TaskGroup,
        tasks: u64,
        now: DateTime<Utc>,
    ) -> Result<(), ReapError> {
        match group.state {
            None | Some(TaskState::Created) => {
                if older_than(group.create_time, now, self.settings.hub.task.reaper.created) {
                    self.delete(group)?;
                }
            }
            Some(TaskState::Ready) => {
                if older_than(group.create_time, now, READY_RETENTION_MINUTES) {
                    self.release(group)?;
                    if tasks == 0 {
                        self.delete(group)?;
                    }
                }
            }
            Some(_) => {}
        }
        Ok(())
    }

    fn release(&self, group: &mut TaskGroup) -> Result<(), ReapError> {
        if group.bucket_id.is_none() && group.list.is_empty() {
            return Ok(());
        }
        if group.bucket_id.take().is_some() {
            tracing::info!(group = group.id, "Group bucket released");
        }
        group.list.clear();
        group_repo::update(&self.db, group)?;
        Ok(())
    }

    fn delete(&self, group: &TaskGroup) -> Result<(), ReapError> {
        if group_repo::delete(&self.db, group.id)? {
            tracing::info!(group = group.id, "Group deleted");
        }
        Ok(())
    }
}

impl Reaper for GroupReaper {
    fn name(&self) -> &'static str {
        "group"
    }

    fn reap(&self, now: DateTime<Utc>) -> Result<(), ReapError> {
        for (id, row) in group_repo::scan_with_task_count(&self.db)? {
            let (mut group, tasks) = match row {
                Ok(row) => row,
                Err(e) => {
                    tracing::error!(group = id, error = %e, "Group row unreadable");
                    continue;
                }
            };
            if let Err(e) = self.reap_group(&mut group, tasks, now) {
                tracing::error!(group = id, error = %e, "Group reap failed");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::db::{bucket_repo, task_repo};
    use crate::model::{GroupMode, Task};

    fn group(db: &Database, state: Option<TaskState>, age_minutes: i64, path: &str) -> i64 {
        let mut g = TaskGroup::new("g", GroupMode::Batch);
        g.state = state;
        g.create_time = Utc::now() - Duration::minutes(age_minutes);
        g.bucket_id = Some(bucket_repo::insert(db, path).unwrap().id);
        g.list = vec![serde_json::json!({"name": "t1"})];
        group_repo::insert(db, &g).unwrap()
    }

    fn reaper(db: &Database) -> GroupReaper {
        GroupReaper::new(db.clone(), Arc::new(Settings::default()))
    }

    #[test]
    fn test_created_groups_deleted_after_delay() {
        let db = Database::open_in_memory().unwrap();
        let old = group(&db, Some(TaskState::Created), 5000, "/b1");
        let stateless = group(&db, None, 5000, "/b2");
        let young = group(&db, Some(TaskState::Created), 10, "/b3");

        reaper(&db).reap(Utc::now()).unwrap();

        assert!(group_repo::find_by_id(&db, old).unwrap().is_none());
        assert!(group_repo::find_by_id(&db, stateless).unwrap().is_none());
        assert!(group_repo::find_by_id(&db, young).unwrap().is_some());
    }

    #[test]
    fn test_ready_groups_released_and_empty_deleted() {
        let db = Database::open_in_memory().unwrap();
        let empty = group(&db, Some(TaskState::Ready), 90, "/b1");
        let busy = group(&db, Some(TaskState::Ready), 90, "/b2");
        let recent = group(&db, Some(TaskState::Ready), 30, "/b3");
        let mut task = Task::new("t", TaskState::Running);
        task.task_group_id = Some(busy);
        task_repo::insert(&db, &task).unwrap();

        reaper(&db).reap(Utc::now()).unwrap();

        assert!(group_repo::find_by_id(&db, empty).unwrap().is_none());

        let busy = group_repo::find_by_id(&db, busy).unwrap().unwrap();
        assert!(busy.bucket_id.is_none());
        assert!(busy.list.is_empty());

        let recent = group_repo::find_by_id(&db, recent).unwrap().unwrap();
        assert!(recent.bucket_id.is_some());
    }
}
