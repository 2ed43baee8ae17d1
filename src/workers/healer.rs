use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::alerting::AlertingGate;
use crate::domain::Job;
use crate::observability::Metrics;
use crate::store::StoreHandle;
use crate::video::{VideoRecordClient, VideoRecordPatch};

/// Periodic reconciler that repairs two specific inconsistencies: jobs
/// that carry a result but were never marked complete, and completed jobs
/// whose downstream video record never got its `video_v2` derivation.
pub struct VideoHealer {
    store: StoreHandle,
    video_client: Arc<dyn VideoRecordClient>,
    alerting: Arc<AlertingGate>,
    metrics: Arc<Metrics>,
    job_window: chrono::Duration,
    record_window: chrono::Duration,
    tick_interval: Duration,
}

impl VideoHealer {
    pub fn new(
        store: StoreHandle,
        video_client: Arc<dyn VideoRecordClient>,
        alerting: Arc<AlertingGate>,
        metrics: Arc<Metrics>,
        job_window_secs: i64,
        record_window_secs: i64,
        tick_interval_secs: u64,
    ) -> Self {
        Self {
            store,
            video_client,
            alerting,
            metrics,
            job_window: chrono::Duration::seconds(job_window_secs),
            record_window: chrono::Duration::seconds(record_window_secs),
            tick_interval: Duration::from_secs(tick_interval_secs),
        }
    }

    pub async fn run(self) {
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("video healer started");

        loop {
            ticker.tick().await;
            if let Err(err) = self.tick().await {
                error!(error = %err, "healer tick failed");
            }
        }
    }

    async fn tick(&self) -> crate::store::Result<()> {
        self.heal_stuck_jobs().await?;
        self.heal_missing_video_records().await?;
        Ok(())
    }

    /// Phase A: promote jobs with a result but non-complete status.
    async fn heal_stuck_jobs(&self) -> crate::store::Result<()> {
        let store = match self.store.get().await {
            Ok(store) => store,
            Err(err) => {
                debug!(error = %err, "healer tick skipped: store unavailable");
                return Ok(());
            }
        };
        let since = Utc::now() - self.job_window;
        let repaired = store.heal_stuck_jobs(since).await?;

        if repaired.is_empty() {
            debug!("healer: no stuck jobs this cycle");
            return Ok(());
        }

        self.metrics.jobs_healed(repaired.len() as u64);

        let sample: Vec<String> = repaired
            .iter()
            .take(5)
            .map(|job| format!("{}/{}", job.metadata.video_owner, job.metadata.video_permlink))
            .collect();
        info!(count = repaired.len(), sample = ?sample, "healed stuck jobs");
        self.alerting.heal_cycle_summary(repaired.len()).await;

        Ok(())
    }

    /// Phase B: patch video records whose `video_v2` derivation is missing.
    async fn heal_missing_video_records(&self) -> crate::store::Result<()> {
        let store = match self.store.get().await {
            Ok(store) => store,
            Err(err) => {
                debug!(error = %err, "healer tick skipped: store unavailable");
                return Ok(());
            }
        };
        let since = Utc::now() - self.job_window;
        let jobs = store.recently_completed(since).await?;

        let mut repaired = 0usize;
        for job in &jobs {
            if self.heal_one_video_record(job).await {
                repaired += 1;
            }
        }

        if repaired > 0 {
            self.alerting.heal_cycle_summary(repaired).await;
        }

        Ok(())
    }

    /// Returns true if this job's video record was patched.
    async fn heal_one_video_record(&self, job: &Job) -> bool {
        let cid = match &job.result {
            Some(result) if !result.cid.is_empty() => &result.cid,
            _ => return false,
        };
        let owner = &job.metadata.video_owner;
        let permlink = &job.metadata.video_permlink;

        let record = match self.video_client.get(owner, permlink).await {
            Ok(Some(record)) => record,
            Ok(None) => return false,
            Err(err) => {
                warn!(owner, permlink, error = %err, "video record lookup failed");
                return false;
            }
        };

        if !record.needs_healing(Utc::now(), self.record_window) {
            return false;
        }

        let patch = VideoRecordPatch {
            status: "published".to_string(),
            video_v2: derive_video_v2(cid),
        };

        match self.video_client.patch(owner, permlink, patch).await {
            Ok(()) => {
                info!(owner, permlink, cid, "video record healed");
                self.alerting.job_healed(owner, permlink).await;
                true
            }
            Err(err) => {
                warn!(owner, permlink, error = %err, "video record patch failed");
                false
            }
        }
    }
}

fn derive_video_v2(cid: &str) -> String {
    format!("ipfs://{cid}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::NullNotifier;
    use crate::domain::{Input, JobMetadata, JobResult, JobStatus, StorageMetadata};
    use crate::store::JobStore;
    use crate::video::InMemoryVideoRecordClient;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;
    use tempfile::TempDir;

    fn healer() -> (VideoHealer, StoreHandle, Arc<InMemoryVideoRecordClient>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = StoreHandle::ready(JobStore::open(dir.path().join("jobs")).unwrap());
        let video_client = InMemoryVideoRecordClient::shared();
        let alerting = Arc::new(AlertingGate::new(Box::new(NullNotifier)));
        let metrics = Arc::new(Metrics::new());

        let healer = VideoHealer::new(
            store.clone(),
            video_client.clone(),
            alerting,
            metrics,
            3600,
            86_400,
            3600,
        );
        (healer, store, video_client, dir)
    }

    #[tokio::test]
    async fn stuck_job_heal_is_idempotent_across_ticks() {
        let (healer, store, _video, _dir) = healer();
        let now = Utc::now();

        let mut job = Job::new_unassigned(
            "j1",
            JobMetadata { video_owner: "alice".into(), video_permlink: "video".into() },
            StorageMetadata(json!({})),
            Input { uri: "ipfs://raw".into(), size: 1 },
            now,
        );
        job.status = JobStatus::Assigned;
        job.assigned_to = Some("enc-a".into());
        job.last_pinged = Some(now);
        job.result = Some(JobResult { cid: "bafy1".into(), extra: Default::default() });
        let store_ref = store.get().await.unwrap();
        store_ref.insert(job).await.unwrap();

        healer.heal_stuck_jobs().await.unwrap();
        let row = store_ref.get("j1").await.unwrap().unwrap();
        assert_eq!(row.status, JobStatus::Complete);

        healer.heal_stuck_jobs().await.unwrap();
        let repaired_again = store_ref.heal_stuck_jobs(now - ChronoDuration::hours(1)).await.unwrap();
        assert!(repaired_again.is_empty());
    }

    #[tokio::test]
    async fn missing_video_record_is_patched() {
        let (healer, store, video, _dir) = healer();
        let now = Utc::now();

        let mut job = Job::new_unassigned(
            "j2",
            JobMetadata { video_owner: "alice".into(), video_permlink: "video".into() },
            StorageMetadata(json!({})),
            Input { uri: "ipfs://raw".into(), size: 1 },
            now,
        );
        job.status = JobStatus::Complete;
        job.completed_at = Some(now);
        job.result = Some(JobResult { cid: "bafy2".into(), extra: Default::default() });
        store.get().await.unwrap().insert(job).await.unwrap();

        video
            .seed(crate::domain::VideoRecord {
                owner: "alice".into(),
                permlink: "video".into(),
                status: "published".into(),
                video_v2: None,
                created: now - ChronoDuration::hours(2),
            })
            .await;

        healer.heal_missing_video_records().await.unwrap();

        let record = video.get("alice", "video").await.unwrap().unwrap();
        assert_eq!(record.video_v2.as_deref(), Some("ipfs://bafy2"));
    }
}
