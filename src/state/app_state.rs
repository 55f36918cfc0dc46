// Application state management
// Shared handle over the document store and the upload directory

use crate::config::Config;
use crate::state::document::DocumentStore;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, MutexGuard};

/// Shared application state
///
/// The catalog file is the only mutable shared resource. Two concurrent
/// mutations that each load, edit, and save the document would silently lose
/// one of the edits, so every load-mutate-save sequence must run under
/// `lock_writes`. Plain reads go straight to the store.
#[derive(Debug)]
pub struct AppState {
    /// Document store backing the catalog
    pub store: DocumentStore,
    /// Directory where attachments are written
    pub upload_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl AppState {
    /// Build state from configuration
    pub fn new(config: &Config) -> Self {
        Self {
            store: DocumentStore::new(&config.storage.db_path),
            upload_dir: config.storage.upload_dir.clone(),
            write_lock: Mutex::new(()),
        }
    }

    /// Build state with explicit paths (used by tests)
    pub fn with_paths(db_path: impl Into<PathBuf>, upload_dir: impl AsRef<Path>) -> Self {
        Self {
            store: DocumentStore::new(db_path.into()),
            upload_dir: upload_dir.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Acquire the single-writer lock serializing all load-mutate-save
    /// sequences against the catalog document
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }
}
