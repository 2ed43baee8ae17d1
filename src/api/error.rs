use axum::{response::IntoResponse, Json};

use crate::dispatch::DispatchError;

use super::models::ErrorResponse;

/// Thin wrapper so [`DispatchError`] can implement [`IntoResponse`] without
/// the dispatch layer depending on axum.
pub struct ApiError(pub DispatchError);

impl From<DispatchError> for ApiError {
    fn from(value: DispatchError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        let body = ErrorResponse {
            success: false,
            error: self.0.to_string(),
            code: self.0.code(),
        };
        (status, Json(body)).into_response()
    }
}
