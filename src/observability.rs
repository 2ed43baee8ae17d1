//! Observability: a counter handle exposed read-only through the health
//! endpoint. No external metrics exporter is in scope.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    claims_succeeded: AtomicU64,
    claims_rejected: AtomicU64,
    jobs_timed_out: AtomicU64,
    jobs_healed: AtomicU64,
    notification_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim_succeeded(&self) {
        self.claims_succeeded.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "claims_succeeded", "metric incremented");
    }

    pub fn claim_rejected(&self) {
        self.claims_rejected.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "claims_rejected", "metric incremented");
    }

    pub fn jobs_timed_out(&self, count: u64) {
        self.jobs_timed_out.fetch_add(count, Ordering::Relaxed);
        tracing::debug!(counter = "jobs_timed_out", count, "metric incremented");
    }

    pub fn jobs_healed(&self, count: u64) {
        self.jobs_healed.fetch_add(count, Ordering::Relaxed);
        tracing::debug!(counter = "jobs_healed", count, "metric incremented");
    }

    pub fn notification_failed(&self) {
        self.notification_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "notification_failures", "metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            claims_succeeded: self.claims_succeeded.load(Ordering::Relaxed),
            claims_rejected: self.claims_rejected.load(Ordering::Relaxed),
            jobs_timed_out: self.jobs_timed_out.load(Ordering::Relaxed),
            jobs_healed: self.jobs_healed.load(Ordering::Relaxed),
            notification_failures: self.notification_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSnapshot {
    pub claims_succeeded: u64,
    pub claims_rejected: u64,
    pub jobs_timed_out: u64,
    pub jobs_healed: u64,
    pub notification_failures: u64,
}
