//! The closed set of domain error kinds. Only the HTTP boundary maps
//! these to status codes; everywhere else they're matched directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("no feasible route: {0}")]
    Infeasible(String),

    #[error("distance-matrix provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("driver-state store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("transient internal error: {0}")]
    TransientInternal(String),
}

impl AppError {
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::ValidationError(_) => 422,
            AppError::Infeasible(_) => 422,
            AppError::ProviderUnavailable(_) => 503,
            AppError::StoreUnavailable(_) => 503,
            AppError::TransientInternal(_) => 500,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
