use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Job, JobResult, JobStatus, JobSummary, Progress};
use crate::observability::MetricsSnapshot;

/// Legacy fallback for carrying the encoder DID in the request body
/// instead of the `x-encoder-did` header.
fn default_encoder_did() -> Option<String> {
    None
}

#[derive(Debug, Deserialize)]
pub struct ListJobsRequest {
    #[serde(default = "default_encoder_did")]
    pub encoder_did: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub success: bool,
    pub jobs: Vec<JobSummary>,
}

#[derive(Debug, Deserialize)]
pub struct ClaimJobRequest {
    pub job_id: String,
    #[serde(default = "default_encoder_did")]
    pub encoder_did: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClaimJobResponse {
    pub success: bool,
    pub job_id: String,
    pub assigned_to: String,
    pub assigned_at: DateTime<Utc>,
    pub job_details: Job,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJobRequest {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: Progress,
    #[serde(default = "default_encoder_did")]
    pub encoder_did: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateJobResponse {
    pub success: bool,
    pub job_id: String,
    pub status: JobStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteJobRequest {
    pub job_id: String,
    pub result: JobResult,
    #[serde(default = "default_encoder_did")]
    pub encoder_did: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompleteJobResponse {
    pub success: bool,
    pub job_id: String,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct GetJobRequest {
    pub job_id: String,
    #[serde(default = "default_encoder_did")]
    pub encoder_did: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GetJobResponse {
    pub success: bool,
    pub job: Job,
    pub is_owned_by_requester: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub store_connected: bool,
    pub timestamp: DateTime<Utc>,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}
