use axum::http::StatusCode;
use thiserror::Error;

use crate::store::StoreError;

/// Tagged error collapsing the Aid Dispatch Core's failure modes into a
/// single `{code, message, http_status}` shape, carried through to the API
/// layer's error envelope.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("encoder {0} is not registered")]
    EncoderNotAuthorized(String),

    #[error("encoder {0} is registered but inactive")]
    EncoderInactive(String),

    #[error("job not found")]
    JobNotFound,

    #[error("job already assigned")]
    JobAlreadyAssigned,

    #[error("job already completed")]
    JobAlreadyCompleted,

    #[error("job is not owned by the requesting encoder")]
    JobNotOwned,

    #[error("result.cid must be non-empty")]
    InvalidCid,

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl DispatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            DispatchError::InvalidCid => StatusCode::BAD_REQUEST,
            DispatchError::EncoderNotAuthorized(_) => StatusCode::FORBIDDEN,
            DispatchError::EncoderInactive(_) => StatusCode::FORBIDDEN,
            // Existence is deliberately masked for non-owner mutation
            // attempts to update or complete a job owned by someone else.
            DispatchError::JobNotFound | DispatchError::JobNotOwned => StatusCode::NOT_FOUND,
            DispatchError::JobAlreadyAssigned => StatusCode::CONFLICT,
            DispatchError::JobAlreadyCompleted => StatusCode::CONFLICT,
            DispatchError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::InvalidRequest(_) => "INVALID_REQUEST",
            DispatchError::InvalidCid => "INVALID_CID",
            DispatchError::EncoderNotAuthorized(_) => "ENCODER_NOT_AUTHORIZED",
            DispatchError::EncoderInactive(_) => "ENCODER_INACTIVE",
            DispatchError::JobNotFound | DispatchError::JobNotOwned => "JOB_NOT_FOUND",
            DispatchError::JobAlreadyAssigned => "JOB_ALREADY_ASSIGNED",
            DispatchError::JobAlreadyCompleted => "JOB_ALREADY_COMPLETED",
            DispatchError::StoreUnavailable(_) => "INTERNAL_ERROR",
        }
    }

    /// Transient store errors are safe to retry; update/complete are
    /// idempotent-on-ownership.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DispatchError::StoreUnavailable(_))
    }
}
