// State management module
// Handles application state and catalog document persistence

pub mod app_state;
pub mod document;

pub use app_state::AppState;
pub use document::{CatalogDocument, DocumentStore, ServiceRecord, StorageError};
