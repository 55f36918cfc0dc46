// Catalog document persistence
// Handles loading and saving the whole service collection as one JSON file

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Error types for document store operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    /// Unique identifier, assigned at insertion and never reused for updates
    pub id: u64,
    /// Display name, trimmed and non-empty
    pub name: String,
    /// Unit price, non-negative
    pub price: f64,
    /// Units in stock
    pub quantity: u64,
    /// Free-form description, trimmed and non-empty
    pub description: String,
    /// Whether the service is currently on promotion
    pub on_promotion: bool,
    /// Reference path to a stored attachment (`/uploads/<name>`), if any
    #[serde(default)]
    pub image_ref: Option<String>,
    /// Set once at creation
    pub created_at: DateTime<Utc>,
    /// Set on every modification; absent until the first update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// The persisted document: the whole collection in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// All service records
    pub services: Vec<ServiceRecord>,
}

impl CatalogDocument {
    /// Next id for a freshly inserted record: `max(existing ids) + 1`, or 1
    /// for an empty collection. Gaps left by deletions are never backfilled.
    pub fn next_id(&self) -> u64 {
        self.services
            .iter()
            .map(|s| s.id)
            .max()
            .map_or(1, |max| max + 1)
    }

    /// Position of the record with the given id, if present
    pub fn position(&self, id: u64) -> Option<usize> {
        self.services.iter().position(|s| s.id == id)
    }
}

/// Owns the JSON file backing the catalog
///
/// Every mutation is "load whole document, mutate in memory, save whole
/// document"; callers are expected to hold the application's write lock
/// around that sequence.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    /// Create a store backed by the given file path. Nothing is touched on
    /// disk until the first `load` or `save`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted document
    ///
    /// A missing file is initialized to an empty collection and returned;
    /// unparseable content is a fatal `StorageError` and is not recovered.
    pub async fn load(&self) -> Result<CatalogDocument, StorageError> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let doc = CatalogDocument::default();
                self.save(&doc).await?;
                Ok(doc)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the persisted document in full, pretty-printed
    pub async fn save(&self, doc: &CatalogDocument) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(doc)?;
        fs::write(&self.path, json).await?;
        Ok(())
    }
}
