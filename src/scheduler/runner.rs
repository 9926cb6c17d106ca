use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::ScheduleConfig;
use crate::engine::{BillingError, BillingOrchestrator, RetryPolicy};
use crate::events::EventSink;
use crate::gateway::PaymentProvider;
use crate::storage::BillingStore;

/// Triggers billing runs on boot and on a recurring schedule
pub struct BillingScheduler<S, P, E, R> {
    orchestrator: BillingOrchestrator<S, P, E, R>,
    config: ScheduleConfig,
}

impl<S, P, E, R> BillingScheduler<S, P, E, R>
where
    S: BillingStore + 'static,
    P: PaymentProvider + 'static,
    E: EventSink + 'static,
    R: RetryPolicy + 'static,
{
    pub fn new(orchestrator: BillingOrchestrator<S, P, E, R>, config: ScheduleConfig) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    /// Run the trigger loop until `shutdown` is cancelled.
    ///
    /// Runs already launched keep going after shutdown; they release the run
    /// guard themselves.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, shutdown: CancellationToken) {
        if self.config.run_on_boot {
            debug!(delay_ms = self.config.boot_delay.as_millis() as u64, "Boot run scheduled");
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Billing scheduler stopped");
                    return;
                }
                _ = tokio::time::sleep(self.config.boot_delay) => self.trigger("boot"),
            }
        }

        loop {
            let delay = self.config.schedule.delay_from(Utc::now());
            debug!(delay_secs = delay.as_secs(), "Next billing run scheduled");

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => self.trigger("schedule"),
            }
        }

        info!("Billing scheduler stopped");
    }

    fn trigger(&self, reason: &'static str) {
        match self.orchestrator.start_run() {
            // Detached: the run reports through events and releases its own guard
            Ok(_) => info!(reason, "Billing run triggered"),
            Err(BillingError::AlreadyRunning) => {
                warn!(reason, "Skipping trigger, run in progress")
            }
            Err(e) => error!(reason, error = %e, "Could not trigger billing run"),
        }
    }
}
