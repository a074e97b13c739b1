//! Deferred work: a fire-once debouncer and a fire-periodic poll loop.
//!
//! Both own their tokio tasks and can be cancelled deterministically; the
//! acquisition engine cancels them on disposal so no timer fires after the
//! consumer is gone.

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Debouncer
// ---------------------------------------------------------------------------

/// Runs a task once the caller has been idle for `delay`.
///
/// At most one task is outstanding: scheduling again aborts the previous
/// one, whether it is still waiting or already running.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm the timer with `task`, replacing any pending one.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
            debug!("debounce re-armed");
        }
    }

    /// Abort the outstanding task, if any. Returns whether one was live.
    pub fn cancel(&self) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match pending.take() {
            Some(handle) => {
                let live = !handle.is_finished();
                handle.abort();
                live
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ---------------------------------------------------------------------------
// Periodic poll
// ---------------------------------------------------------------------------

/// Handle to a task started by [`spawn_periodic`].
#[derive(Debug)]
pub struct PollHandle {
    cancel_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

impl PollHandle {
    /// Stop the loop, interrupting a run in progress, and wait for it.
    pub async fn stop(self) -> Result<()> {
        let _ = self.cancel_tx.send(());
        match self.join.await {
            Ok(()) => Ok(()),
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(e).context("poll task failed"),
        }
    }

    /// Abort without waiting, for use from synchronous drop paths.
    pub fn abort(self) {
        self.join.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Run `job` now and then every `period` until stopped.
///
/// Ticks missed while a run is in progress are skipped, not queued.
///
/// # Panics
///
/// Panics if `period` is zero.
pub fn spawn_periodic<F, Fut>(period: Duration, mut job: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (cancel_tx, mut cancel_rx) = broadcast::channel(1);
    let join = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel_rx.recv() => {
                    info!("poll loop shutdown requested");
                    break;
                }
                _ = async {
                    ticker.tick().await;
                    job().await;
                } => {}
            }
        }
    });

    PollHandle { cancel_tx, join }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
