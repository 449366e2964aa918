//! In-process cadence loops for `beacon serve`: the 5-minute alert sweep
//! and the hourly threshold check. The orchestrator itself holds no
//! scheduler; these loops only invoke its idempotent entry point, the
//! same one the external cron endpoints hit.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

use crate::engine::{Clock, EvaluationOrchestrator};

const HOURLY_CHECK_SECS: u64 = 3600;

pub struct Scheduler {
    orchestrator: Arc<EvaluationOrchestrator>,
    clock: Arc<dyn Clock>,
    sweep_interval: Duration,
}

impl Scheduler {
    pub fn new(
        orchestrator: Arc<EvaluationOrchestrator>,
        clock: Arc<dyn Clock>,
        sweep_interval_secs: u64,
    ) -> Self {
        Self {
            orchestrator,
            clock,
            sweep_interval: Duration::from_secs(sweep_interval_secs.max(60)),
        }
    }

    /// Run the cadence loops until the task is dropped at shutdown
    pub async fn run(self) {
        info!(
            sweep_secs = self.sweep_interval.as_secs(),
            "alert scheduler started"
        );

        // First sweep right away; the hourly check waits a full period so
        // startup does not double-evaluate.
        let mut sweep = interval_at(Instant::now(), self.sweep_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut hourly = interval_at(
            Instant::now() + Duration::from_secs(HOURLY_CHECK_SECS),
            Duration::from_secs(HOURLY_CHECK_SECS),
        );
        hourly.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = sweep.tick() => self.run_sweep("sweep").await,
                _ = hourly.tick() => self.run_sweep("hourly").await,
            }
        }
    }

    async fn run_sweep(&self, label: &str) {
        let date = self.clock.today();
        match self.orchestrator.evaluate_all_centers(date).await {
            Ok(summary) => info!(
                label,
                %date,
                fired = summary.fired,
                suppressed = summary.suppressed,
                failed = summary.failed,
                "scheduled evaluation completed"
            ),
            Err(e) => error!(label, error = %e, "scheduled evaluation failed"),
        }
    }
}
