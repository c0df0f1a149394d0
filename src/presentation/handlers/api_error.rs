use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::ports::OutputStoreError;
use crate::application::services::{InferenceError, RuntimeError, SeparationError, ValidationError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_kind: &'static str,
    pub message: String,
}

/// Every failure the gateway reports, as `{ error_kind, message }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    /// An extractor rejected the body. A body over the size limit keeps its 413.
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        match status {
            StatusCode::PAYLOAD_TOO_LARGE => Self::new(status, "validation_error", message),
            _ => Self::validation(message),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let status = match err {
            ValidationError::MediaTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(status, "validation_error", err.to_string())
    }
}

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::ModelUnavailable(_) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "model_unavailable",
                err.to_string(),
            ),
            RuntimeError::InferenceTimeout(_) => {
                Self::new(StatusCode::GATEWAY_TIMEOUT, "inference_error", err.to_string())
            }
            RuntimeError::UnsupportedInput(_) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "inference_error",
                err.to_string(),
            ),
            RuntimeError::Inference(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "inference_error",
                err.to_string(),
            ),
        }
    }
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Validation(e) => e.into(),
            InferenceError::Runtime(e) => e.into(),
        }
    }
}

impl From<OutputStoreError> for ApiError {
    fn from(err: OutputStoreError) -> Self {
        match err {
            OutputStoreError::NotFound(_) => Self::not_found(err.to_string()),
            _ => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                err.to_string(),
            ),
        }
    }
}

impl From<SeparationError> for ApiError {
    fn from(err: SeparationError) -> Self {
        match err {
            SeparationError::Inference(e) => e.into(),
            SeparationError::Storage(e) => e.into(),
            SeparationError::InvalidFilename(_) => Self::validation(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(kind = self.kind, status = %self.status, message = %self.message, "Request failed");
        } else {
            tracing::warn!(kind = self.kind, status = %self.status, message = %self.message, "Request rejected");
        }

        (
            self.status,
            Json(ErrorResponse {
                error_kind: self.kind,
                message: self.message,
            }),
        )
            .into_response()
    }
}
