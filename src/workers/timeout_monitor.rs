use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::alerting::AlertingGate;
use crate::observability::Metrics;
use crate::store::StoreHandle;

/// Periodically reclaims jobs whose assigned encoder has stopped pinging.
/// Runs as a supervised long-lived task with its own interval timer;
/// double-execution of a tick is harmless since the release step
/// re-evaluates its predicate per row. Each tick also re-checks whether
/// fallback has ever been serviced, firing the activation latch if so —
/// the second of its two trigger paths, alongside a successful claim.
pub struct TimeoutMonitor {
    store: StoreHandle,
    alerting: Arc<AlertingGate>,
    metrics: Arc<Metrics>,
    ttl: chrono::Duration,
    tick_interval: Duration,
}

impl TimeoutMonitor {
    pub fn new(
        store: StoreHandle,
        alerting: Arc<AlertingGate>,
        metrics: Arc<Metrics>,
        ttl_secs: i64,
        tick_interval_secs: u64,
    ) -> Self {
        Self {
            store,
            alerting,
            metrics,
            ttl: chrono::Duration::seconds(ttl_secs),
            tick_interval: Duration::from_secs(tick_interval_secs),
        }
    }

    /// Runs until the process shuts down. Fires immediately on the first
    /// tick, then every `tick_interval` thereafter.
    pub async fn run(self) {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(ttl_secs = self.ttl.num_seconds(), "timeout monitor started");

        loop {
            ticker.tick().await;
            if let Err(err) = self.tick().await {
                error!(error = %err, "timeout monitor tick failed");
            }
        }
    }

    async fn tick(&self) -> crate::store::Result<()> {
        let store = match self.store.get().await {
            Ok(store) => store,
            Err(err) => {
                debug!(error = %err, "timeout monitor tick skipped: store unavailable");
                return Ok(());
            }
        };
        let cutoff = Utc::now() - self.ttl;
        let released = store.release_timed_out(cutoff).await?;

        if released > 0 {
            info!(released, "released timed-out jobs");
            self.metrics.jobs_timed_out(released as u64);
            self.alerting.timeout_release(released).await;
        } else {
            debug!("timeout monitor tick: nothing to release");
        }

        if store.is_first_aid_serviced().await? {
            self.alerting.activate_fallback().await;
        }

        Ok(())
    }
}
