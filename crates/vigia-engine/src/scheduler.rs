//! Periodic and on-demand reconciliation triggers.
//!
//! The scheduler owns its background task: `start` spawns it, `stop` (or
//! drop) aborts it. Ticks are fixed-rate wall-clock, anchored so that one
//! tick lands on local midnight; they are not relative to prior run duration.
//!
//! A run-level lock guarantees at most one run executes at a time. A trigger
//! that finds the lock held is skipped and logged, never queued. Runs are not
//! cancellable once started; guarding a stuck run with a watchdog is a
//! deployment concern.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Local, NaiveTime};
use tokio::{
  sync::Mutex,
  task::JoinHandle,
  time::{Instant, MissedTickBehavior},
};
use uuid::Uuid;

use vigia_core::{audit::RunMode, store::DocumentStore};

use crate::reconcile::{Reconciler, RunSummary};

/// Default cadence: midnight and every six hours after it.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(6 * 60 * 60);

/// Default pause before the run fired shortly after process startup.
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_secs(15);

pub struct Scheduler<S: DocumentStore + 'static> {
  reconciler:    Arc<Reconciler<S>>,
  period:        Duration,
  startup_delay: Duration,
  run_lock:      Arc<Mutex<()>>,
  handle:        Option<JoinHandle<()>>,
}

impl<S: DocumentStore + 'static> Scheduler<S> {
  pub fn new(reconciler: Arc<Reconciler<S>>) -> Self {
    Self {
      reconciler,
      period: DEFAULT_PERIOD,
      startup_delay: DEFAULT_STARTUP_DELAY,
      run_lock: Arc::new(Mutex::new(())),
      handle: None,
    }
  }

  pub fn with_period(mut self, period: Duration) -> Self {
    self.period = period;
    self
  }

  pub fn with_startup_delay(mut self, delay: Duration) -> Self {
    self.startup_delay = delay;
    self
  }

  /// Spawn the background trigger task. Calling `start` twice is a no-op.
  pub fn start(&mut self) {
    if self.handle.is_some() {
      return;
    }

    let reconciler = Arc::clone(&self.reconciler);
    let run_lock = Arc::clone(&self.run_lock);
    let period = self.period;
    let startup_delay = self.startup_delay;

    self.handle = Some(tokio::spawn(async move {
      tokio::time::sleep(startup_delay).await;
      guarded_run(&run_lock, &reconciler, "startup").await;

      let first_tick =
        Instant::now() + delay_until_next_boundary(Local::now(), period);
      let mut ticker = tokio::time::interval_at(first_tick, period);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

      loop {
        ticker.tick().await;
        guarded_run(&run_lock, &reconciler, "scheduled").await;
      }
    }));
  }

  /// Abort the background task. Safe to call when not started.
  pub fn stop(&mut self) {
    if let Some(handle) = self.handle.take() {
      handle.abort();
    }
  }

  /// The administrative "run now" trigger.
  ///
  /// Returns `Ok(None)` when another run already holds the lock — the
  /// request is skipped, not queued.
  pub async fn run_now(
    &self,
    actor: Option<Uuid>,
  ) -> crate::error::Result<Option<RunSummary>, S::Error> {
    let Ok(_guard) = self.run_lock.try_lock() else {
      tracing::warn!("reconciliation already running, skipping on-demand run");
      return Ok(None);
    };
    let summary = self.reconciler.run(actor, RunMode::Manual).await?;
    Ok(Some(summary))
  }
}

impl<S: DocumentStore + 'static> Drop for Scheduler<S> {
  fn drop(&mut self) {
    self.stop();
  }
}

async fn guarded_run<S: DocumentStore>(
  run_lock: &Mutex<()>,
  reconciler: &Reconciler<S>,
  trigger: &str,
) {
  let Ok(_guard) = run_lock.try_lock() else {
    tracing::warn!(trigger, "reconciliation already running, skipping");
    return;
  };

  match reconciler.run(None, RunMode::Automatic).await {
    Ok(summary) => tracing::info!(
      trigger,
      total = summary.total_reviewed,
      updated = summary.updated,
      errors = summary.errors,
      "reconciliation run complete"
    ),
    Err(error) => {
      tracing::error!(trigger, error = %error, "reconciliation run failed");
    }
  }
}

/// Seconds until the next multiple of `period` counted from local midnight.
/// With the six-hour default this lands ticks on 00:00, 06:00, 12:00, 18:00.
fn delay_until_next_boundary(now: DateTime<Local>, period: Duration) -> Duration {
  let period_secs = period.as_secs().max(1) as i64;
  let midnight = now.date_naive().and_time(NaiveTime::MIN);
  let elapsed = (now.naive_local() - midnight).num_seconds().max(0);
  let next = (elapsed / period_secs + 1) * period_secs;
  Duration::from_secs((next - elapsed) as u64)
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn local(h: u32, m: u32, s: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 6, 1, h, m, s).unwrap()
  }

  #[test]
  fn boundary_lands_on_the_next_six_hour_mark() {
    let period = Duration::from_secs(6 * 60 * 60);

    let delay = delay_until_next_boundary(local(4, 30, 0), period);
    assert_eq!(delay, Duration::from_secs(90 * 60));

    let delay = delay_until_next_boundary(local(23, 59, 59), period);
    assert_eq!(delay, Duration::from_secs(1));
  }

  #[test]
  fn boundary_on_a_tick_moves_to_the_following_one() {
    let period = Duration::from_secs(6 * 60 * 60);
    let delay = delay_until_next_boundary(local(6, 0, 0), period);
    assert_eq!(delay, Duration::from_secs(6 * 60 * 60));
  }
}
