//! Attachment intake service
//!
//! Validates uploaded image payloads, assigns them collision-resistant names,
//! and writes them into the upload directory. The returned reference path is
//! what gets stored on the record and later served statically.

use crate::error::AppError;
use crate::state::StorageError;
use axum::body::Bytes;
use std::path::Path;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

/// Maximum accepted attachment size (5 MiB)
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

/// Public path prefix under which stored attachments are served
pub const UPLOADS_PREFIX: &str = "/uploads";

/// An uploaded file as extracted from the multipart body
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Original filename as sent by the client (untrusted)
    pub filename: String,
    /// Declared media type (untrusted)
    pub content_type: String,
    /// Raw payload
    pub data: Bytes,
}

/// Attachment intake operations
pub struct UploadService;

impl UploadService {
    /// Replace every character outside `[A-Za-z0-9.]` with `_`
    ///
    /// Strips path separators and anything else that could make the original
    /// filename traverse out of the upload directory.
    pub fn sanitize_filename(original: &str) -> String {
        original
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
            .collect()
    }

    /// Validate the attachment and reject it before anything touches disk
    ///
    /// Wrong media type and oversized payload are distinct error kinds so the
    /// HTTP boundary can answer 400 vs 413.
    pub fn validate(attachment: &Attachment) -> Result<(), AppError> {
        if !attachment.content_type.starts_with("image/") {
            return Err(AppError::InvalidAttachmentType(
                attachment.content_type.clone(),
            ));
        }
        if attachment.data.len() > MAX_ATTACHMENT_BYTES {
            return Err(AppError::AttachmentTooLarge(attachment.data.len()));
        }
        Ok(())
    }

    /// Validate and persist an attachment, returning its reference path
    ///
    /// The stored name is `<uuid-v4>-<sanitized original>`; the upload
    /// directory is created recursively if absent. Nothing is written for a
    /// rejected payload.
    pub async fn store(upload_dir: &Path, attachment: Attachment) -> Result<String, AppError> {
        Self::validate(&attachment)?;

        let stored_name = format!(
            "{}-{}",
            Uuid::new_v4(),
            Self::sanitize_filename(&attachment.filename)
        );

        fs::create_dir_all(upload_dir)
            .await
            .map_err(StorageError::Io)?;
        fs::write(upload_dir.join(&stored_name), &attachment.data)
            .await
            .map_err(StorageError::Io)?;

        info!(
            "stored attachment {} ({} bytes)",
            stored_name,
            attachment.data.len()
        );

        Ok(format!("{}/{}", UPLOADS_PREFIX, stored_name))
    }
}
