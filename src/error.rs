//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` to provide consistent error formatting.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
///
/// All errors that can occur in the application are represented by this enum.
/// Each variant implements automatic conversion to HTTP responses via `IntoResponse`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Service with the given ID was not found
    #[error("Service not found: {0}")]
    ServiceNotFound(u64),

    /// Request fields are missing or invalid
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Uploaded attachment is not an image
    #[error("Invalid attachment type: {0} (only image/* is accepted)")]
    InvalidAttachmentType(String),

    /// Uploaded attachment exceeds the size limit
    #[error("Attachment too large: {0} bytes (limit is 5 MiB)")]
    AttachmentTooLarge(usize),

    /// Multipart request body could not be read
    #[error("Malformed multipart body: {0}")]
    Multipart(String),

    /// Error occurred while reading or writing the catalog document
    #[error("Storage error: {0}")]
    Storage(#[from] crate::state::StorageError),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ServiceNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InvalidAttachmentType(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::AttachmentTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            AppError::Multipart(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            // Storage and internal failures are logged with full detail; the
            // client only ever sees a generic message.
            AppError::Storage(ref e) => {
                tracing::error!("storage failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(ref e) => {
                tracing::error!("internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
