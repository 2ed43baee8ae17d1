use axum::{extract::State, http::HeaderMap, response::IntoResponse, Json};
use chrono::Utc;

use crate::auth;

use super::error::ApiError;
use super::models::{
    ClaimJobRequest, ClaimJobResponse, CompleteJobRequest, CompleteJobResponse, GetJobRequest,
    GetJobResponse, HealthResponse, ListJobsRequest, ListJobsResponse, UpdateJobRequest,
    UpdateJobResponse,
};
use super::state::AppState;

/// `GET /aid/v1/health` — no auth required.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let store_connected = state.core.store_connected().await;
    Json(HealthResponse {
        status: if store_connected { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        store_connected,
        timestamp: Utc::now(),
        metrics: state.metrics.snapshot(),
    })
}

/// `POST /aid/v1/list-jobs`.
pub async fn list_jobs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ListJobsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth::authorize(&state.registry, &headers, request.encoder_did.as_deref()).await?;

    let jobs = state.core.list_jobs().await?;
    Ok(Json(ListJobsResponse { success: true, jobs }))
}

/// `POST /aid/v1/claim-job`.
pub async fn claim_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ClaimJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let encoder = auth::authorize(&state.registry, &headers, request.encoder_did.as_deref()).await?;

    let job = state.core.claim_job(&encoder.encoder_id, &request.job_id).await?;
    Ok(Json(ClaimJobResponse {
        success: true,
        job_id: job.id.clone(),
        assigned_to: encoder.encoder_id,
        assigned_at: job.assigned_date.unwrap_or(job.created_at),
        job_details: job,
    }))
}

/// `POST /aid/v1/update-job`.
pub async fn update_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<UpdateJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let encoder = auth::authorize(&state.registry, &headers, request.encoder_did.as_deref()).await?;

    let job = state
        .core
        .update_job(&encoder.encoder_id, &request.job_id, request.status, request.progress)
        .await?;

    Ok(Json(UpdateJobResponse {
        success: true,
        job_id: job.id,
        status: job.status,
        updated_at: job.last_pinged.unwrap_or_else(Utc::now),
    }))
}

/// `POST /aid/v1/get-job`. Read-only; returns `is_owned_by_requester` so a
/// caller can distinguish its own in-flight jobs without an extra round trip.
pub async fn get_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<GetJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let encoder = auth::authorize(&state.registry, &headers, request.encoder_did.as_deref()).await?;

    let (job, is_owned_by_requester) = state.core.get_job(&encoder.encoder_id, &request.job_id).await?;
    Ok(Json(GetJobResponse { success: true, job, is_owned_by_requester }))
}

/// `POST /aid/v1/complete-job`.
pub async fn complete_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CompleteJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let encoder = auth::authorize(&state.registry, &headers, request.encoder_did.as_deref()).await?;

    let job = state
        .core
        .complete_job(&encoder.encoder_id, &request.job_id, request.result)
        .await?;

    Ok(Json(CompleteJobResponse {
        success: true,
        job_id: job.id,
        completed_at: job.completed_at.unwrap_or_else(Utc::now),
    }))
}
