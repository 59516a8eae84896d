//! Periodic trigger for sync cycles and sweep pages.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument};

use crate::errors::SyncError;
use crate::sweep::{QueueAllSweep, SweepOutcome};
use crate::sync::{BatchSync, CycleOutcome};

/// Sweep interval used when none is configured.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Overrides the `batch-interval` setting when set and non-zero.
    pub batch_interval: Option<Duration>,
    /// Zero falls back to [`DEFAULT_SWEEP_INTERVAL`].
    pub sweep_interval: Duration,
    /// Run a sync cycle right away instead of after the first interval.
    pub run_immediately: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_interval: None,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            run_immediately: false,
        }
    }
}

/// Drives [`BatchSync`] and [`QueueAllSweep`] on two independent timers.
pub struct Scheduler {
    sync: Arc<BatchSync>,
    sweep: Arc<QueueAllSweep>,
    config: SchedulerConfig,
    shutdown_tx: broadcast::Sender<()>,
}

impl Scheduler {
    pub fn new(sync: Arc<BatchSync>, sweep: Arc<QueueAllSweep>, config: SchedulerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            sync,
            sweep,
            config,
            shutdown_tx,
        }
    }

    /// Handle that stops [`Scheduler::run`] when sent to.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Ask a running scheduler to stop after the current tick.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Run until Ctrl-C or a shutdown request.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), SyncError> {
        let batch_every = match self.config.batch_interval.filter(|d| !d.is_zero()) {
            Some(interval) => interval,
            None => self.sync.interval().await?,
        };
        let sweep_every = non_zero_or(self.config.sweep_interval, DEFAULT_SWEEP_INTERVAL);

        info!(
            batch_interval_secs = batch_every.as_secs(),
            sweep_interval_secs = sweep_every.as_secs(),
            "Starting scheduler"
        );

        let first_batch = if self.config.run_immediately {
            Instant::now()
        } else {
            Instant::now() + batch_every
        };
        let mut batch_timer = interval_at(first_batch, batch_every);
        batch_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut sweep_timer = interval_at(Instant::now() + sweep_every, sweep_every);
        sweep_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                _ = batch_timer.tick() => {
                    let outcome = self.sync.run_cycle().await;
                    log_cycle(&outcome);
                }
                _ = sweep_timer.tick() => {
                    let outcome = self.sweep.run_page().await;
                    debug!(outcome = ?outcome, "Sweep tick finished");
                    if let SweepOutcome::Failed(e) = outcome {
                        error!(error = %e, "Sweep tick failed");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        info!("Scheduler stopped");
        Ok(())
    }
}

fn non_zero_or(interval: Duration, fallback: Duration) -> Duration {
    if interval.is_zero() {
        fallback
    } else {
        interval
    }
}

fn log_cycle(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Sent { documents, deleted } => {
            info!(documents = documents, deleted = deleted, "Sync tick sent a batch")
        }
        CycleOutcome::SendFailed { documents, error } => {
            error!(documents = documents, error = %error, "Sync tick could not send its batch")
        }
        CycleOutcome::Failed(error) => error!(error = %error, "Sync tick failed"),
        other => debug!(outcome = ?other, "Sync tick finished"),
    }
}
