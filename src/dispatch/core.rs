use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::alerting::AlertingGate;
use crate::domain::{Job, JobResult, JobStatus, JobSummary, Progress};
use crate::observability::Metrics;
use crate::store::StoreHandle;

use super::error::DispatchError;

/// The only component that mutates authoritative job state from
/// encoder-driven requests. Callers are expected to have already resolved
/// and authorized the caller's DID via [`crate::auth`]; this core only
/// enforces per-job ownership, not registry membership.
pub struct AidDispatchCore {
    store: StoreHandle,
    alerting: Arc<AlertingGate>,
    metrics: Arc<Metrics>,
    list_jobs_cap: usize,
}

impl AidDispatchCore {
    pub fn new(
        store: StoreHandle,
        alerting: Arc<AlertingGate>,
        metrics: Arc<Metrics>,
        list_jobs_cap: usize,
    ) -> Self {
        Self {
            store,
            alerting,
            metrics,
            list_jobs_cap,
        }
    }

    /// Lists unassigned jobs for a given encoder to pick up. Read-only;
    /// never returns a job owned by any encoder.
    pub async fn list_jobs(&self) -> Result<Vec<JobSummary>, DispatchError> {
        let store = self.store.get().await?;
        let jobs = store.list_unassigned(self.list_jobs_cap).await?;
        Ok(jobs.iter().map(JobSummary::from).collect())
    }

    /// Claims a job for the given encoder. Fires the fallback activation
    /// latch on the first successful claim this process sees.
    pub async fn claim_job(&self, did: &str, job_id: &str) -> Result<Job, DispatchError> {
        let store = self.store.get().await?;
        let now = Utc::now();
        match store.claim_atomic(job_id, did, now).await? {
            Some(job) => {
                info!(job_id, did, "job claimed");
                self.metrics.claim_succeeded();
                self.alerting.activate_fallback().await;
                Ok(job)
            }
            None => {
                warn!(job_id, did, "claim rejected: job not unassigned");
                self.metrics.claim_rejected();
                Err(DispatchError::JobAlreadyAssigned)
            }
        }
    }

    /// Records progress against the claiming encoder's own job. Existence
    /// of a job owned by a different DID is masked as `JobNotFound`.
    pub async fn update_job(
        &self,
        did: &str,
        job_id: &str,
        status: JobStatus,
        progress: Progress,
    ) -> Result<Job, DispatchError> {
        if !progress.in_range() {
            return Err(DispatchError::InvalidRequest("progress must be in [0, 100]".into()));
        }
        if !matches!(status, JobStatus::Assigned | JobStatus::Running | JobStatus::Failed) {
            return Err(DispatchError::InvalidRequest(
                "status must be one of assigned, running, failed".into(),
            ));
        }

        let store = self.store.get().await?;
        let now = Utc::now();
        match store.update_progress(job_id, did, status, progress, now).await? {
            Some(job) => Ok(job),
            None => {
                warn!(job_id, did, "update rejected: not owner or job missing");
                Err(DispatchError::JobNotFound)
            }
        }
    }

    /// Marks a job complete with its result. Idempotent: repeating a
    /// complete for an already-complete job owned by `did` succeeds with
    /// the original observable outcome.
    pub async fn complete_job(
        &self,
        did: &str,
        job_id: &str,
        result: JobResult,
    ) -> Result<Job, DispatchError> {
        if result.cid.is_empty() {
            return Err(DispatchError::InvalidCid);
        }

        let store = self.store.get().await?;
        let now = Utc::now();
        match store.complete_job(job_id, did, result, now).await? {
            Some(job) => {
                info!(job_id, did, "job completed");
                Ok(job)
            }
            None => {
                warn!(job_id, did, "complete rejected: not owner or job missing");
                Err(DispatchError::JobNotFound)
            }
        }
    }

    /// Fetches a job's full detail, reporting whether `did` owns it.
    /// Read-only.
    pub async fn get_job(&self, did: &str, job_id: &str) -> Result<(Job, bool), DispatchError> {
        let store = self.store.get().await?;
        let job = store.get(job_id).await?.ok_or(DispatchError::JobNotFound)?;
        let owned = job.is_owned_by(did);
        Ok((job, owned))
    }

    /// No auth required. Reports whether the job store is reachable.
    pub async fn store_connected(&self) -> bool {
        self.store.is_connected().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerting::{AlertingGate, NullNotifier};
    use crate::domain::{Input, JobMetadata, StorageMetadata};
    use crate::store::JobStore;
    use serde_json::json;
    use tempfile::TempDir;

    fn core() -> (AidDispatchCore, StoreHandle, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = StoreHandle::ready(JobStore::open(dir.path().join("jobs")).unwrap());
        let alerting = Arc::new(AlertingGate::new(Box::new(NullNotifier)));
        let metrics = Arc::new(Metrics::new());
        (AidDispatchCore::new(store.clone(), alerting, metrics, 100), store, dir)
    }

    async fn seed(store: &StoreHandle, id: &str) {
        let job = Job::new_unassigned(
            id,
            JobMetadata { video_owner: "alice".into(), video_permlink: "video".into() },
            StorageMetadata(json!({"bucket": "ipfs"})),
            Input { uri: "ipfs://raw".into(), size: 10 },
            Utc::now(),
        );
        store.get().await.unwrap().insert(job).await.unwrap();
    }

    #[tokio::test]
    async fn hijack_attempt_returns_job_not_found() {
        let (core, store, _dir) = core();
        seed(&store, "j3").await;
        core.claim_job("enc-a", "j3").await.unwrap();

        let result = core
            .complete_job("enc-b", "j3", JobResult { cid: "bafy".into(), extra: Default::default() })
            .await;

        assert!(matches!(result, Err(DispatchError::JobNotFound)));
    }

    #[tokio::test]
    async fn invalid_progress_rejected_before_touching_store() {
        let (core, store, _dir) = core();
        seed(&store, "j1").await;
        core.claim_job("enc-a", "j1").await.unwrap();

        let result = core
            .update_job("enc-a", "j1", JobStatus::Running, Progress { download_pct: 200, pct: 50 })
            .await;

        assert!(matches!(result, Err(DispatchError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn get_job_reports_ownership() {
        let (core, store, _dir) = core();
        seed(&store, "j1").await;
        core.claim_job("enc-a", "j1").await.unwrap();

        let (_, owned_by_owner) = core.get_job("enc-a", "j1").await.unwrap();
        let (_, owned_by_stranger) = core.get_job("enc-b", "j1").await.unwrap();

        assert!(owned_by_owner);
        assert!(!owned_by_stranger);
    }

    #[tokio::test]
    async fn unavailable_store_fails_open() {
        let alerting = Arc::new(AlertingGate::new(Box::new(NullNotifier)));
        let metrics = Arc::new(Metrics::new());
        let dir = TempDir::new().unwrap();
        let store = StoreHandle::connecting(dir.path().join("jobs"), std::time::Duration::from_millis(0));
        let core = AidDispatchCore::new(store, alerting, metrics, 100);

        let result = core.list_jobs().await;
        assert!(matches!(result, Err(DispatchError::StoreUnavailable(_))));
    }
}
