//! Error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::detector::DetectorError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Upload errors
    InvalidImage,
    NoFaceDetected,

    // Resource errors
    SessionNotFound,

    // Detector errors
    DetectorFailure(String),
    DetectorTimeout,

    // Transport errors (logged at the ws boundary, never sent mid-stream)
    ConnectionFailure(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::InvalidImage => (StatusCode::BAD_REQUEST, "Invalid image".to_string()),
            AppError::NoFaceDetected => (StatusCode::BAD_REQUEST, "No face detected".to_string()),
            AppError::SessionNotFound => (StatusCode::NOT_FOUND, "Session not found".to_string()),
            AppError::DetectorFailure(msg) => {
                tracing::error!("Detector failure: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::DetectorTimeout => {
                tracing::error!("Detector invocation timed out");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Detector timed out".to_string(),
                )
            }
            AppError::ConnectionFailure(msg) => {
                tracing::error!("Connection failure: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Connection failure".to_string(),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<DetectorError> for AppError {
    fn from(err: DetectorError) -> Self {
        match err {
            DetectorError::Timeout => AppError::DetectorTimeout,
            other => AppError::DetectorFailure(other.to_string()),
        }
    }
}
