//! Task state sweep.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{older_than, ReapError, Reaper};
use crate::cluster::{self, PodClient};
use crate::db::{group_repo, task_repo, Database};
use crate::model::task::RELEASED;
use crate::model::{Task, TaskState};
use crate::settings::Settings;

/// Releases, deletes and un-pods tasks by state and age.
///
/// Ages are measured from a per-state mark: creation for queued tasks,
/// termination (or creation) for finished ones. A per-task TTL deletes;
/// without one the configured delay only releases.
pub struct TaskReaper {
    db: Database,
    settings: Arc<Settings>,
    client: Arc<dyn PodClient>,
}

impl TaskReaper {
    pub fn new(db: Database, settings: Arc<Settings>, client: Arc<dyn PodClient>) -> Self {
        Self {
            db,
            settings,
            client,
        }
    }

    fn reap_task(
        &self,
        task: &mut Task,
        pipelined: &HashSet<i64>,
        now: DateTime<Utc>,
    ) -> Result<(), ReapError> {
        let ttl = task.ttl;
        let delay = self.settings.hub.task.reaper;
        let retention = self.settings.hub.task.pod.retention;
        match task.state {
            TaskState::Created => {
                let in_pipeline = task.task_group_id.is_some_and(|id| pipelined.contains(&id));
                if ttl.created > 0 {
                    if older_than(task.create_time, now, ttl.created) {
                        if in_pipeline {
                            self.release(task)?;
                        } else {
                            self.delete(task)?;
                        }
                    }
                } else if older_than(task.create_time, now, delay.created) {
                    self.release(task)?;
                }
            }
            TaskState::Pending | TaskState::Postponed | TaskState::Ready => {
                if ttl.pending > 0 && older_than(task.create_time, now, ttl.pending) {
                    self.delete(task)?;
                }
            }
            TaskState::Running => {
                let mark = task.terminated.or(task.started).unwrap_or(task.create_time);
                if ttl.running > 0 && older_than(mark, now, ttl.running) {
                    self.delete(task)?;
                }
            }
            TaskState::Succeeded | TaskState::Canceled => {
                self.reap_finished(task, now, ttl.succeeded, delay.succeeded, retention.succeeded)?;
            }
            TaskState::Failed => {
                self.reap_finished(task, now, ttl.failed, delay.failed, retention.failed)?;
            }
        }
        Ok(())
    }

    fn reap_finished(
        &self,
        task: &mut Task,
        now: DateTime<Utc>,
        ttl: u64,
        release_after: u64,
        retain_pod: u64,
    ) -> Result<(), ReapError> {
        let mark = task.terminated.unwrap_or(task.create_time);
        if ttl > 0 {
            if older_than(mark, now, ttl) {
                return self.delete(task);
            }
        } else if older_than(mark, now, release_after) {
            self.release(task)?;
        }
        if older_than(mark, now, retain_pod) {
            self.pod_delete(task)?;
        }
        Ok(())
    }

    /// Drops the task's bucket and attachments, keeping the row.
    fn release(&self, task: &mut Task) -> Result<(), ReapError> {
        if task.bucket_id.is_none() && task.attached.is_empty() {
            return Ok(());
        }
        if task.bucket_id.take().is_some() {
            tracing::info!(task = task.id, "Task bucket released");
        }
        task.attached.clear();
        task.event(RELEASED, "");
        task_repo::update(&self.db, task)?;
        Ok(())
    }

    fn pod_delete(&self, task: &mut Task) -> Result<(), ReapError> {
        if task.pod.is_empty() {
            return Ok(());
        }
        if let Err(e) = cluster::delete_pod(self.client.as_ref(), &task.pod) {
            tracing::error!(task = task.id, pod = %task.pod, error = %e, "Pod delete failed");
        }
        task.pod.clear();
        task_repo::update(&self.db, task)?;
        tracing::info!(task = task.id, "Task pod deleted");
        Ok(())
    }

    fn delete(&self, task: &Task) -> Result<(), ReapError> {
        if !task.pod.is_empty() {
            if let Err(e) = cluster::delete_pod(self.client.as_ref(), &task.pod) {
                tracing::error!(task = task.id, pod = %task.pod, error = %e, "Pod delete failed");
            }
        }
        if task_repo::delete(&self.db, task.id)? {
            tracing::info!(task = task.id, "Task deleted");
        }
        Ok(())
    }
}

impl Reaper for TaskReaper {
    fn name(&self) -> &'static str {
        "task"
    }

    fn reap(&self, now: DateTime<Utc>) -> Result<(), ReapError> {
        let pipelined = group_repo::pipeline_ids(&self.db)?;
        for (id, row) in task_repo::scan(&self.db)? {
            let mut task = match row {
                Ok(task) => task,
                Err(e) => {
                    tracing::error!(task = id, error = %e, "Task row unreadable");
                    continue;
                }
            };
            if let Err(e) = self.reap_task(&mut task, &pipelined, now) {
                tracing::error!(task = id, error = %e, "Task reap failed");
            }
        }
        Ok(())
    }
}
