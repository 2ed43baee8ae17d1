//! Operator notifications and the first-fallback-activation latch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::observability::Metrics;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, severity: Severity, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    High,
}

/// Posts notifications to a webhook URL, best-effort. Never surfaces a
/// failure to the caller; errors are logged and swallowed.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    metrics: Arc<Metrics>,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>, metrics: Arc<Metrics>) -> Self {
        Self { client, url: url.into(), metrics }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, severity: Severity, message: &str) {
        let body = serde_json::json!({
            "severity": match severity {
                Severity::Info => "info",
                Severity::High => "high",
            },
            "message": message,
        });

        if let Err(err) = self.client.post(&self.url).json(&body).send().await {
            warn!(error = %err, "notification delivery failed");
            self.metrics.notification_failed();
        }
    }
}

/// Used when no webhook URL is configured; notifications are silently
/// dropped except for a debug-level trace.
#[derive(Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, _severity: Severity, message: &str) {
        tracing::debug!(message, "notifications disabled, dropping");
    }
}

/// One-shot latch for the first fallback activation, plus pass-through
/// helpers for the Timeout Monitor's and Healer's secondary, un-latched
/// notifications.
pub struct AlertingGate {
    notifier: Box<dyn Notifier>,
    fired: AtomicBool,
}

impl AlertingGate {
    pub fn new(notifier: Box<dyn Notifier>) -> Self {
        Self {
            notifier,
            fired: AtomicBool::new(false),
        }
    }

    /// Fire the "fallback activated" alert at most once per process
    /// lifetime. Subsequent calls are no-ops.
    pub async fn activate_fallback(&self) {
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("fallback activation latch fired");
        self.notifier
            .notify(Severity::High, "Aid fallback dispatch activated for the first time")
            .await;
    }

    pub async fn timeout_release(&self, count: usize) {
        self.notifier
            .notify(Severity::Info, &format!("Timeout Monitor released {count} stale claim(s)"))
            .await;
    }

    pub async fn job_healed(&self, owner: &str, permlink: &str) {
        self.notifier
            .notify(Severity::Info, &format!("Healer repaired stuck job {owner}/{permlink}"))
            .await;
    }

    pub async fn heal_cycle_summary(&self, repaired: usize) {
        self.notifier
            .notify(Severity::Info, &format!("Healer cycle repaired {repaired} job(s)"))
            .await;
    }
}
