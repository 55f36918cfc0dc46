//! API module
//!
//! Contains HTTP request handlers for the catalog endpoints and the router
//! assembling them.

pub mod services;

use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;
use tower_http::services::ServeDir;

/// Body limit for multipart requests
///
/// Axum's default of 2 MB would cut uploads off before the intake's own
/// 5 MiB check could answer with the dedicated too-large error, so the
/// transport limit sits comfortably above it.
const BODY_LIMIT_BYTES: usize = 8 * 1024 * 1024;

/// Build the application router
///
/// Routes, body limit, and static `/uploads` serving; observability and CORS
/// layers are added by the binary on top of this.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/services",
            get(services::list_services).post(services::create_service),
        )
        .route(
            "/api/services/:id",
            get(services::get_service)
                .put(services::update_service)
                .delete(services::delete_service),
        )
        .nest_service("/uploads", ServeDir::new(&state.upload_dir))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state)
}
