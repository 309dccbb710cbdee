use crate::phase::Phase;
use crate::preparer::TaskPreparer;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

/// Runs a training sweep then a testing sweep on every tick
pub struct Scheduler {
    preparer: Arc<TaskPreparer>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(preparer: Arc<TaskPreparer>, interval: Duration) -> Self {
        Self { preparer, interval }
    }

    /// One training sweep followed by one testing sweep. A sweep that cannot
    /// list its tasks is logged and left for the next tick.
    pub async fn tick(&self) {
        for phase in Phase::ALL {
            match self.preparer.sweep(phase).await {
                Ok(report) => info!(
                    phase = %phase,
                    prepared = report.prepared.len(),
                    failed = report.failed.len(),
                    "Sweep completed"
                ),
                Err(e) => error!(phase = %phase, error = %e, "Sweep aborted, retrying next tick"),
            }
        }
    }

    /// Tick until `shutdown` resolves. A running tick is never interrupted.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = self.interval.as_secs(), "Scheduler started");
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => self.tick().await,
            }
        }
        info!("Scheduler stopped");
    }
}
