//! Long-lived runnables under one cancellation scope.
//!
//! The [`Manager`] starts every registered [`Runnable`] with a shared
//! [`CancelToken`] and a [`Completion`] handle. Stopping cancels the token
//! and waits until every runnable has dropped its completion handle, then
//! closes the store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tokio::sync::watch;

use crate::db::Database;

/// Cooperative cancellation signal. Clones observe the same signal.
#[derive(Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Held by a runnable while it works. Dropping the last one releases
/// [`Manager::stop`].
#[derive(Clone)]
pub struct Completion {
    _tx: Sender<()>,
}

/// A long-lived worker. `run` must return promptly, leaving the work on
/// its own thread, and must drop `done` when that work ends.
pub trait Runnable {
    fn name(&self) -> &str;

    fn run(&mut self, cancel: CancelToken, done: Completion);
}

struct Running {
    cancel: CancelToken,
    done: Receiver<()>,
}

pub struct Manager {
    db: Database,
    shutdown_timeout: Duration,
    runnables: Vec<Box<dyn Runnable>>,
    running: Option<Running>,
}

impl Manager {
    pub fn new(db: Database, shutdown_timeout: Duration) -> Self {
        Self {
            db,
            shutdown_timeout,
            runnables: Vec::new(),
            running: None,
        }
    }

    pub fn register(&mut self, runnable: Box<dyn Runnable>) {
        self.runnables.push(runnable);
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Starts every registered runnable. Does nothing when already running.
    pub fn run(&mut self) {
        if self.running.is_some() {
            return;
        }
        let cancel = CancelToken::new();
        let (tx, rx) = crossbeam_channel::unbounded();
        for runnable in &mut self.runnables {
            tracing::info!(runnable = runnable.name(), "Starting");
            runnable.run(cancel.clone(), Completion { _tx: tx.clone() });
        }
        self.running = Some(Running { cancel, done: rx });
    }

    /// Cancels all runnables, waits for them and closes the store.
    /// Does nothing when not running.
    ///
    /// # Panics
    /// Panics when the runnables outlive the shutdown timeout or the store
    /// fails to close.
    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        tracing::info!("Stopping runnables");
        running.cancel.cancel();

        let deadline = Instant::now() + self.shutdown_timeout;
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            match running.done.recv_timeout(left) {
                Ok(()) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => panic!(
                    "Runnables did not stop within {}s",
                    self.shutdown_timeout.as_secs()
                ),
            }
        }

        if let Err(e) = self.db.close() {
            panic!("Failed to close database: {}", e);
        }
        tracing::info!("Stopped");
    }
}
