//! Periodic reconcilers for tasks, task groups, buckets and files.
//!
//! The [`Supervisor`] runs every reaper in order on one thread, then
//! sleeps for `frequency.reaper` minutes or until cancelled. A reaper
//! that fails on one row logs it and moves on; the next cycle retries.

mod bucket;
mod error;
mod file;
mod group;
mod reclaim;
pub mod refs;
mod task;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::cluster::PodClient;
use crate::db::Database;
use crate::lifecycle::{CancelToken, Completion, Runnable};
use crate::settings::Settings;

pub use bucket::BucketReaper;
pub use error::ReapError;
pub use file::FileReaper;
pub use group::GroupReaper;
pub use reclaim::Outcome;
pub use task::TaskReaper;

pub trait Reaper: Send + Sync {
    fn name(&self) -> &'static str;

    /// One pass over the reaper's rows as of `now`.
    fn reap(&self, now: DateTime<Utc>) -> Result<(), ReapError>;

    fn run(&self) {
        let _span = tracing::debug_span!("reaper", name = self.name()).entered();
        tracing::debug!("Reaping");
        if let Err(e) = self.reap(Utc::now()) {
            tracing::error!(error = %e, "Reaper pass failed");
        }
    }
}

/// True once more than `minutes` have passed since `mark`.
pub(crate) fn older_than(mark: DateTime<Utc>, now: DateTime<Utc>, minutes: u64) -> bool {
    let limit = i64::try_from(minutes).unwrap_or(i64::MAX).saturating_mul(60);
    (now - mark).num_seconds() > limit
}

/// Hosts the reapers as a single long-lived runnable.
pub struct Supervisor {
    reapers: Arc<Vec<Box<dyn Reaper>>>,
    interval: Duration,
}

impl Supervisor {
    /// The standard reaper set, in dependency order.
    pub fn new(db: Database, settings: Arc<Settings>, client: Arc<dyn PodClient>) -> Self {
        let interval = Duration::from_secs(settings.frequency.reaper.saturating_mul(60));
        let reapers: Vec<Box<dyn Reaper>> = vec![
            Box::new(TaskReaper::new(db.clone(), Arc::clone(&settings), client)),
            Box::new(GroupReaper::new(db.clone(), Arc::clone(&settings))),
            Box::new(BucketReaper::new(db.clone(), Arc::clone(&settings))),
            Box::new(FileReaper::new(db, settings)),
        ];
        Self::with_reapers(reapers, interval)
    }

    pub fn with_reapers(reapers: Vec<Box<dyn Reaper>>, interval: Duration) -> Self {
        Self {
            reapers: Arc::new(reapers),
            interval,
        }
    }

    /// Runs every reaper once.
    pub fn cycle(&self) {
        cycle(&self.reapers);
    }
}

fn cycle(reapers: &[Box<dyn Reaper>]) {
    let start = Instant::now();
    for reaper in reapers {
        reaper.run();
    }
    tracing::info!(
        duration_ms = start.elapsed().as_millis() as u64,
        "Reaper cycle finished"
    );
}

impl Runnable for Supervisor {
    fn name(&self) -> &str {
        "reaper"
    }

    fn run(&mut self, cancel: CancelToken, done: Completion) {
        let reapers = Arc::clone(&self.reapers);
        let interval = self.interval;
        let spawned = std::thread::Builder::new()
            .name("reaper".to_string())
            .spawn(move || {
                let _done = done;
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to build reaper runtime");
                        return;
                    }
                };
                rt.block_on(async {
                    while !cancel.is_cancelled() {
                        cycle(&reapers);
                        tokio::select! {
                            _ = tokio::time::sleep(interval) => {}
                            _ = cancel.cancelled() => break,
                        }
                    }
                });
                tracing::info!("Reaper supervisor stopped");
            });
        if let Err(e) = spawned {
            tracing::error!(error = %e, "Failed to spawn reaper thread");
        }
    }
}
