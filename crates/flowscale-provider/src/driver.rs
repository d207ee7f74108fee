//! Cycle driver.
//!
//! Runs `refresh_metrics` on a fixed interval. Cycles are serialized: the
//! ticker skips ticks that land while a cycle is still running, so overruns
//! never stack. Each cycle runs under a deadline so a wedged metric source
//! cannot back up the loop forever.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::orchestrator::Orchestrator;

const MIN_CYCLE_DEADLINE: Duration = Duration::from_secs(30);
const MAX_CYCLE_DEADLINE: Duration = Duration::from_secs(300);

/// Ticker that drives metric-collection cycles.
pub struct CycleDriver {
    orchestrator: Arc<Orchestrator>,
    polling_interval: Option<Duration>,
}

impl CycleDriver {
    /// `polling_interval = None` means on-demand only: the driver exits
    /// immediately and cycles run only through external invocation.
    pub fn new(orchestrator: Arc<Orchestrator>, polling_interval: Option<Duration>) -> Self {
        Self {
            orchestrator,
            polling_interval,
        }
    }

    /// Run the polling loop until shutdown is signalled.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let Some(interval) = self.polling_interval else {
            info!("no polling interval configured; metrics refresh on demand only");
            return;
        };

        info!(interval_secs = interval.as_secs(), "starting metric polling");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick of a tokio interval fires immediately; consume it
        // so the first cycle happens one interval after startup.
        ticker.tick().await;

        let deadline = cycle_deadline(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match tokio::time::timeout(deadline, self.orchestrator.refresh_metrics()).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => error!(error = %e, "failed to refresh metrics"),
                        Err(_) => error!(
                            deadline_secs = deadline.as_secs(),
                            "metric refresh cycle exceeded its deadline"
                        ),
                    }
                }
                _ = shutdown.changed() => {
                    info!("polling stopped");
                    return;
                }
            }
        }
    }
}

/// The per-cycle deadline: at least the polling interval, capped so a
/// stuck cycle cannot defer shutdown indefinitely.
fn cycle_deadline(interval: Duration) -> Duration {
    interval.clamp(MIN_CYCLE_DEADLINE, MAX_CYCLE_DEADLINE)
}
