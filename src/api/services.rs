//! Catalog API handlers
//!
//! HTTP request handlers for service CRUD operations. Create and update take
//! a multipart form (`name`, `price`, `quantity`, `description`,
//! `onPromotion`, optional `image` file); the handlers only parse the body
//! and delegate to the catalog service.

use crate::error::AppError;
use crate::services::catalog::{CatalogService, ServiceForm};
use crate::services::uploads::Attachment;
use crate::state::{AppState, ServiceRecord};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Response for a successful delete
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Human-readable confirmation
    pub message: String,
    /// The record that was removed
    pub service: ServiceRecord,
}

/// Pull the form fields and the optional `image` file out of the multipart body
async fn read_form(mut multipart: Multipart) -> Result<(ServiceForm, Option<Attachment>), AppError> {
    let mut form = ServiceForm::default();
    let mut attachment = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Multipart(e.to_string()))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "name" => form.name = Some(read_text(field).await?),
            "price" => form.price = Some(read_text(field).await?),
            "quantity" => form.quantity = Some(read_text(field).await?),
            "description" => form.description = Some(read_text(field).await?),
            "onPromotion" => form.on_promotion = Some(read_text(field).await?),
            "image" => {
                let filename = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Multipart(e.to_string()))?;

                // A file input submitted empty arrives without a filename;
                // treat it the same as no attachment at all
                if let Some(filename) = filename.filter(|f| !f.is_empty()) {
                    attachment = Some(Attachment {
                        filename,
                        content_type: content_type.unwrap_or_default(),
                        data,
                    });
                }
            }
            other => {
                warn!("unknown multipart field: {}", other);
            }
        }
    }

    Ok((form, attachment))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Multipart(e.to_string()))
}

/// GET /api/services - List all services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ServiceRecord>>, AppError> {
    let services = CatalogService::list(&state).await?;
    Ok(Json(services))
}

/// GET /api/services/:id - Get a specific service
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<ServiceRecord>, AppError> {
    let service = CatalogService::get(&state, id).await?;
    Ok(Json(service))
}

/// POST /api/services - Create a new service
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ServiceRecord>), AppError> {
    let (form, attachment) = read_form(multipart).await?;
    let service = CatalogService::create(&state, form, attachment).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

/// PUT /api/services/:id - Update a service
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    multipart: Multipart,
) -> Result<Json<ServiceRecord>, AppError> {
    let (form, attachment) = read_form(multipart).await?;
    let service = CatalogService::update(&state, id, form, attachment).await?;
    Ok(Json(service))
}

/// DELETE /api/services/:id - Delete a service
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<DeleteResponse>, AppError> {
    let service = CatalogService::delete(&state, id).await?;
    Ok(Json(DeleteResponse {
        message: "Service deleted".to_string(),
        service,
    }))
}
