use std::path::Path;

use chrono::{DateTime, Utc};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::{Job, JobResult, JobStatus, Progress};

use super::error::Result;

fn encode_job_key(job_id: &str) -> Vec<u8> {
    format!("job:{job_id}").into_bytes()
}

/// Fjall-backed job collection implementing the Job Store Gateway. All
/// mutating operations are predicated compare-and-set style
/// transitions; they are serialized behind a single in-process lock so
/// that a single row transitions atomically even though Fjall itself has
/// no native conditional-update primitive.
pub struct JobStore {
    keyspace: Keyspace,
    jobs: PartitionHandle,
    write_lock: Mutex<()>,
}

impl JobStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening job store");

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let keyspace = Config::new(path).open()?;
        let jobs = keyspace.open_partition("jobs", PartitionCreateOptions::default())?;

        Ok(Self {
            keyspace,
            jobs,
            write_lock: Mutex::new(()),
        })
    }

    fn read_row(&self, job_id: &str) -> Result<Option<Job>> {
        match self.jobs.get(encode_job_key(job_id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_row(&self, job: &Job) -> Result<()> {
        let key = encode_job_key(&job.id);
        let value = serde_json::to_vec(job)?;
        self.jobs.insert(key, value)?;
        Ok(())
    }

    /// Seed a job into the store. Not part of the Aid API surface — jobs
    /// are created by the primary gateway (out of core); this is the entry
    /// point fixtures and the out-of-core ingestion path use.
    pub async fn insert(&self, job: Job) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_row(&job)
    }

    pub async fn get(&self, job_id: &str) -> Result<Option<Job>> {
        self.read_row(job_id)
    }

    /// Unassigned jobs, newest first.
    pub async fn list_unassigned(&self, limit: usize) -> Result<Vec<Job>> {
        let mut jobs = Vec::new();
        for item in self.jobs.iter() {
            let (_, value) = item?;
            let job: Job = serde_json::from_slice(&value)?;
            if job.status == JobStatus::Unassigned {
                jobs.push(job);
            }
        }
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs.truncate(limit);
        Ok(jobs)
    }

    /// Atomically claims an unassigned job for `did`. Returns the
    /// post-image on success, `None` if the `{id, status=unassigned}`
    /// predicate did not hold (job missing or already owned).
    pub async fn claim_atomic(
        &self,
        job_id: &str,
        did: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Job>> {
        let _guard = self.write_lock.lock().await;

        let mut job = match self.read_row(job_id)? {
            Some(job) if job.status == JobStatus::Unassigned => job,
            _ => return Ok(None),
        };

        job.status = JobStatus::Assigned;
        job.assigned_to = Some(did.to_string());
        job.assigned_date = Some(now);
        job.last_pinged = Some(now);

        self.write_row(&job)?;
        debug!(job_id, did, "job claimed");
        Ok(Some(job))
    }

    /// Records heartbeat progress for the owning encoder. Predicated on
    /// `{id, assigned_to = did}`. A completed job is left untouched and
    /// the unmodified row is returned so retries stay
    /// idempotent-on-ownership.
    pub async fn update_progress(
        &self,
        job_id: &str,
        did: &str,
        status: JobStatus,
        progress: Progress,
        now: DateTime<Utc>,
    ) -> Result<Option<Job>> {
        let _guard = self.write_lock.lock().await;

        let mut job = match self.read_row(job_id)? {
            Some(job) if job.is_owned_by(did) => job,
            _ => return Ok(None),
        };

        if job.status == JobStatus::Complete {
            return Ok(Some(job));
        }

        job.last_pinged = Some(now);
        job.status = status;
        job.progress = Some(progress);

        self.write_row(&job)?;
        debug!(job_id, did, ?status, "job progress updated");
        Ok(Some(job))
    }

    /// Marks a job complete with its result. Predicated on
    /// `{id, assigned_to = did}`. Idempotent: repeating a complete for an
    /// already-complete job owned by the same DID returns the original
    /// post-image without mutating `result` or `completed_at` again.
    pub async fn complete_job(
        &self,
        job_id: &str,
        did: &str,
        result: JobResult,
        now: DateTime<Utc>,
    ) -> Result<Option<Job>> {
        let _guard = self.write_lock.lock().await;

        let mut job = match self.read_row(job_id)? {
            Some(job) if job.is_owned_by(did) => job,
            _ => return Ok(None),
        };

        if job.status == JobStatus::Complete {
            return Ok(Some(job));
        }

        job.status = JobStatus::Complete;
        job.completed_at = Some(now);
        job.result = Some(result);

        self.write_row(&job)?;
        info!(job_id, did, "job completed");
        Ok(Some(job))
    }

    /// Bulk release of every `{Assigned, Running}` row whose `last_pinged`
    /// predates `cutoff`.
    /// A single logical mutation; re-running it on an unchanged store is
    /// harmless because the predicate is re-evaluated per row.
    pub async fn release_timed_out(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let mut released = 0;
        let mut to_write = Vec::new();

        for item in self.jobs.iter() {
            let (_, value) = item?;
            let job: Job = serde_json::from_slice(&value)?;

            let stale = matches!(job.status, JobStatus::Assigned | JobStatus::Running)
                && job.last_pinged.is_some_and(|ts| ts < cutoff);

            if stale {
                let mut job = job;
                job.status = JobStatus::Unassigned;
                job.assigned_to = None;
                job.assigned_date = None;
                job.last_pinged = None;
                to_write.push(job);
            }
        }

        for job in &to_write {
            self.write_row(job)?;
            released += 1;
        }

        if released > 0 {
            info!(released, "released timed-out jobs");
        }
        Ok(released)
    }

    /// Jobs completed since `since`, for the Healer's video-record pass.
    pub async fn recently_completed(&self, since: DateTime<Utc>) -> Result<Vec<Job>> {
        let mut jobs = Vec::new();
        for item in self.jobs.iter() {
            let (_, value) = item?;
            let job: Job = serde_json::from_slice(&value)?;
            if job.status == JobStatus::Complete && job.completed_at.is_some_and(|ts| ts >= since) {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    /// Promotes any job with `result.cid` set but `status != Complete`,
    /// whose last activity (`last_pinged`, falling back to `created_at`)
    /// falls within the window, to `Complete`.
    pub async fn heal_stuck_jobs(&self, since: DateTime<Utc>) -> Result<Vec<Job>> {
        let _guard = self.write_lock.lock().await;

        let mut repaired = Vec::new();

        for item in self.jobs.iter() {
            let (_, value) = item?;
            let mut job: Job = serde_json::from_slice(&value)?;

            let recent_activity = job.last_pinged.unwrap_or(job.created_at);
            let stuck = job.result.is_some()
                && job.status != JobStatus::Complete
                && recent_activity >= since;

            if stuck {
                job.status = JobStatus::Complete;
                job.completed_at = Some(since.max(recent_activity));
                self.write_row(&job)?;
                repaired.push(job);
            }
        }

        if !repaired.is_empty() {
            info!(count = repaired.len(), "healed stuck jobs");
        }
        Ok(repaired)
    }

    /// True iff exactly one completed job exists in this store. This
    /// crate's store only ever contains jobs the Aid plane has seen, so
    /// "completed" here always means a completed Aid-dispatched job (see
    /// DESIGN.md for the provenance caveat).
    pub async fn is_first_aid_serviced(&self) -> Result<bool> {
        let mut completed = 0usize;
        for item in self.jobs.iter() {
            let (_, value) = item?;
            let job: Job = serde_json::from_slice(&value)?;
            if job.status == JobStatus::Complete {
                completed += 1;
                if completed > 1 {
                    return Ok(false);
                }
            }
        }
        Ok(completed == 1)
    }

    pub fn health_check(&self) -> Result<()> {
        let _ = self.jobs.len()?;
        Ok(())
    }

    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Input, JobMetadata, StorageMetadata};
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (JobStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = JobStore::open(dir.path().join("jobs")).unwrap();
        (store, dir)
    }

    fn seed(id: &str, created_at: DateTime<Utc>) -> Job {
        Job::new_unassigned(
            id,
            JobMetadata {
                video_owner: "alice".into(),
                video_permlink: "my-video".into(),
            },
            StorageMetadata(json!({"bucket": "ipfs", "path": "raw/1"})),
            Input {
                uri: "ipfs://raw/1".into(),
                size: 1024,
            },
            created_at,
        )
    }

    #[tokio::test]
    async fn claim_is_exclusive() {
        let (store, _dir) = store();
        let now = Utc::now();
        store.insert(seed("j1", now)).await.unwrap();

        let first = store.claim_atomic("j1", "enc-a", now).await.unwrap();
        let second = store.claim_atomic("j1", "enc-b", now).await.unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(first.unwrap().assigned_to.as_deref(), Some("enc-a"));
    }

    #[tokio::test]
    async fn non_owner_update_is_rejected() {
        let (store, _dir) = store();
        let now = Utc::now();
        store.insert(seed("j1", now)).await.unwrap();
        store.claim_atomic("j1", "enc-a", now).await.unwrap();

        let result = store
            .update_progress(
                "j1",
                "enc-b",
                JobStatus::Running,
                Progress { download_pct: 100, pct: 50 },
                now,
            )
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn complete_is_idempotent_for_owner() {
        let (store, _dir) = store();
        let now = Utc::now();
        store.insert(seed("j1", now)).await.unwrap();
        store.claim_atomic("j1", "enc-a", now).await.unwrap();

        let result = JobResult { cid: "bafy1".into(), extra: Default::default() };
        let first = store.complete_job("j1", "enc-a", result.clone(), now).await.unwrap().unwrap();
        let second = store.complete_job("j1", "enc-a", result.clone(), now).await.unwrap().unwrap();

        assert_eq!(first.completed_at, second.completed_at);
        assert_eq!(first.result, second.result);
    }

    #[tokio::test]
    async fn hijack_attempt_masked_as_missing() {
        let (store, _dir) = store();
        let now = Utc::now();
        store.insert(seed("j1", now)).await.unwrap();
        store.claim_atomic("j1", "enc-a", now).await.unwrap();

        let result = JobResult { cid: "bafy1".into(), extra: Default::default() };
        let outcome = store.complete_job("j1", "enc-b", result, now).await.unwrap();
        assert!(outcome.is_none());

        let row = store.get("j1").await.unwrap().unwrap();
        assert_eq!(row.status, JobStatus::Assigned);
    }

    #[tokio::test]
    async fn timeout_releases_stale_claims() {
        let (store, _dir) = store();
        let now = Utc::now();
        store.insert(seed("j1", now)).await.unwrap();
        store
            .claim_atomic("j1", "enc-a", now - chrono::Duration::minutes(70))
            .await
            .unwrap();

        let cutoff = now - chrono::Duration::minutes(60);
        let released = store.release_timed_out(cutoff).await.unwrap();

        assert_eq!(released, 1);
        let row = store.get("j1").await.unwrap().unwrap();
        assert_eq!(row.status, JobStatus::Unassigned);
        assert!(row.assigned_to.is_none());
    }

    #[tokio::test]
    async fn heal_is_idempotent() {
        let (store, _dir) = store();
        let now = Utc::now();
        let mut job = seed("j1", now);
        job.status = JobStatus::Assigned;
        job.assigned_to = Some("enc-a".into());
        job.last_pinged = Some(now);
        job.result = Some(JobResult { cid: "bafy2".into(), extra: Default::default() });
        store.insert(job).await.unwrap();

        let window_start = now - chrono::Duration::hours(1);
        let first = store.heal_stuck_jobs(window_start).await.unwrap();
        let second = store.heal_stuck_jobs(window_start).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 0);
    }

    #[tokio::test]
    async fn first_aid_serviced_latches_at_one() {
        let (store, _dir) = store();
        let now = Utc::now();
        assert!(!store.is_first_aid_serviced().await.unwrap());

        store.insert(seed("j1", now)).await.unwrap();
        store.claim_atomic("j1", "enc-a", now).await.unwrap();
        store
            .complete_job("j1", "enc-a", JobResult { cid: "bafy1".into(), extra: Default::default() }, now)
            .await
            .unwrap();
        assert!(store.is_first_aid_serviced().await.unwrap());

        store.insert(seed("j2", now)).await.unwrap();
        store.claim_atomic("j2", "enc-b", now).await.unwrap();
        store
            .complete_job("j2", "enc-b", JobResult { cid: "bafy2".into(), extra: Default::default() }, now)
            .await
            .unwrap();
        assert!(!store.is_first_aid_serviced().await.unwrap());
    }
}
