use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle state of a [`Job`].
///
/// Terminal states are `Complete` and `Failed`. Any non-terminal state may
/// transition back to `Unassigned` via the Timeout Monitor; only the current
/// owner may move a job forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Unassigned,
    Assigned,
    Running,
    Complete,
    Failed,
}

/// Immutable-after-creation identity of the video this job encodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobMetadata {
    pub video_owner: String,
    pub video_permlink: String,
}

/// Opaque descriptor of where the source media lives. The Aid core never
/// interprets this value; it is round-tripped to the encoder verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StorageMetadata(pub Value);

/// Source media location and size, handed to the encoder on claim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Input {
    pub uri: String,
    pub size: u64,
}

/// Encoder-reported progress. Both fields are percentages in `[0, 100]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Progress {
    pub download_pct: u8,
    pub pct: u8,
}

impl Progress {
    pub fn in_range(&self) -> bool {
        self.download_pct <= 100 && self.pct <= 100
    }
}

/// Result of a successful encode. `cid` is required; `extra` carries
/// any additional encoder-reported fields without the core needing to
/// know their shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobResult {
    pub cid: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, Value>,
}

/// The canonical unit of work.
///
/// Ownership and timestamps are only ever mutated by [`crate::store::JobStore`]
/// under its compare-and-set operations, never assembled by hand by callers:
/// `assigned_to` is populated exactly when a claim succeeds and stays set
/// through completion so a finished job still answers ownership queries;
/// `completed_at` and `result` appear together, exactly once, on the
/// transition into `Complete`; and timestamps only ever advance
/// (`created_at <= assigned_date <= last_pinged <= completed_at`, when
/// present). The only path back from `Assigned`/`Running` to `Unassigned`
/// is the Timeout Monitor releasing a claim whose `last_pinged` has gone
/// stale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub assigned_date: Option<DateTime<Utc>>,
    pub last_pinged: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,
    pub metadata: JobMetadata,
    pub storage_metadata: StorageMetadata,
    pub input: Input,
    pub progress: Option<Progress>,
    pub result: Option<JobResult>,
}

impl Job {
    /// Construct a fresh, unassigned job as the primary gateway would
    /// insert it. Used by test seeding and by the admin-side creation path
    /// (out of core, but the constructor is shared so fixtures stay honest).
    pub fn new_unassigned(
        id: impl Into<String>,
        metadata: JobMetadata,
        storage_metadata: StorageMetadata,
        input: Input,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Unassigned,
            created_at,
            assigned_date: None,
            last_pinged: None,
            completed_at: None,
            assigned_to: None,
            metadata,
            storage_metadata,
            input,
            progress: None,
            result: None,
        }
    }

    pub fn is_owned_by(&self, did: &str) -> bool {
        self.assigned_to.as_deref() == Some(did)
    }
}

/// Trimmed view returned by list-jobs; never exposes another encoder's
/// ownership details because list-jobs only ever returns unassigned jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub metadata: JobMetadata,
    pub input: Input,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            created_at: job.created_at,
            metadata: job.metadata.clone(),
            input: job.input.clone(),
        }
    }
}
