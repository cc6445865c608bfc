//! HTTP error mapping.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use funnel_core::api::ApiResponse;
use funnel_core::core::{CoreError, ImportError};
use tracing::{error, warn};

/// An error rendered as `{success: false, error}` with a status code.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let status = match &err {
            CoreError::InvestorNotFound { .. }
            | CoreError::Import(ImportError::SourceNotFound { .. }) => StatusCode::NOT_FOUND,
            CoreError::InvalidInput { .. }
            | CoreError::Import(ImportError::Parse { .. } | ImportError::Empty { .. }) => {
                StatusCode::BAD_REQUEST
            }
            CoreError::PoolTimeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            CoreError::Import(ImportError::Read { .. }) | CoreError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            // `{:#}` keeps the anyhow context chain on one line
            message: format!("{err:#}"),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = %self.status, error = %self.message, "request failed");
        } else {
            warn!(status = %self.status, error = %self.message, "request rejected");
        }
        (self.status, Json(ApiResponse::<()>::failure(self.message))).into_response()
    }
}
