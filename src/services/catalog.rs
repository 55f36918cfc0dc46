//! Catalog service
//!
//! Business logic for the service records: field validation and
//! normalization, id allocation, and the load-mutate-save CRUD cycle over
//! the catalog document. HTTP handlers stay thin and delegate here.

use crate::error::AppError;
use crate::services::uploads::{Attachment, UploadService};
use crate::state::{AppState, ServiceRecord};
use chrono::Utc;
use tracing::info;

/// Raw form fields as they arrive from the multipart body
///
/// Everything is an optional string at this point; `validate` turns the
/// loose input into typed record fields or rejects the request.
#[derive(Debug, Default, Clone)]
pub struct ServiceForm {
    /// `name` form field
    pub name: Option<String>,
    /// `price` form field
    pub price: Option<String>,
    /// `quantity` form field
    pub quantity: Option<String>,
    /// `description` form field
    pub description: Option<String>,
    /// `onPromotion` form field
    pub on_promotion: Option<String>,
}

/// Validated, typed record fields ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFields {
    /// Trimmed display name
    pub name: String,
    /// Parsed unit price
    pub price: f64,
    /// Parsed stock count
    pub quantity: u64,
    /// Trimmed description
    pub description: String,
    /// Promotion flag
    pub on_promotion: bool,
}

fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

impl ServiceForm {
    /// Validate and normalize the form
    ///
    /// `name`, `price`, `quantity` and `description` must all be present and
    /// non-empty; numeric fields must parse cleanly (a non-numeric price is a
    /// validation error, never a NaN record). `onPromotion` follows the form
    /// convention: the literal `"true"` means true, anything else is false.
    pub fn validate(&self) -> Result<RecordFields, AppError> {
        let (Some(name), Some(price), Some(quantity), Some(description)) = (
            required(self.name.as_deref()),
            required(self.price.as_deref()),
            required(self.quantity.as_deref()),
            required(self.description.as_deref()),
        ) else {
            return Err(AppError::Validation("missing required fields".to_string()));
        };

        let price: f64 = price
            .parse()
            .map_err(|_| AppError::Validation(format!("price is not a number: {price}")))?;
        if !price.is_finite() || price < 0.0 {
            return Err(AppError::Validation(format!(
                "price must be a non-negative number, got {price}"
            )));
        }

        let quantity: u64 = quantity.parse().map_err(|_| {
            AppError::Validation(format!(
                "quantity must be a non-negative integer, got {quantity}"
            ))
        })?;

        Ok(RecordFields {
            name: name.to_string(),
            price,
            quantity,
            description: description.to_string(),
            on_promotion: self.on_promotion.as_deref() == Some("true"),
        })
    }
}

/// Catalog CRUD operations
pub struct CatalogService;

impl CatalogService {
    /// List all records in stored order
    pub async fn list(state: &AppState) -> Result<Vec<ServiceRecord>, AppError> {
        Ok(state.store.load().await?.services)
    }

    /// Look up a single record by id
    pub async fn get(state: &AppState, id: u64) -> Result<ServiceRecord, AppError> {
        let doc = state.store.load().await?;
        doc.services
            .into_iter()
            .find(|s| s.id == id)
            .ok_or(AppError::ServiceNotFound(id))
    }

    /// Create a record, optionally storing an attachment first
    ///
    /// Field validation and attachment intake both run before anything is
    /// written to the catalog document, so a rejected request leaves the
    /// collection untouched.
    pub async fn create(
        state: &AppState,
        form: ServiceForm,
        attachment: Option<Attachment>,
    ) -> Result<ServiceRecord, AppError> {
        let fields = form.validate()?;

        let image_ref = match attachment {
            Some(attachment) => Some(UploadService::store(&state.upload_dir, attachment).await?),
            None => None,
        };

        let _guard = state.lock_writes().await;
        let mut doc = state.store.load().await?;
        let record = ServiceRecord {
            id: doc.next_id(),
            name: fields.name,
            price: fields.price,
            quantity: fields.quantity,
            description: fields.description,
            on_promotion: fields.on_promotion,
            image_ref,
            created_at: Utc::now(),
            updated_at: None,
        };
        doc.services.push(record.clone());
        state.store.save(&doc).await?;

        info!("created service {} ({})", record.id, record.name);
        Ok(record)
    }

    /// Overwrite the editable fields of an existing record
    ///
    /// `id` and `createdAt` are preserved; `imageRef` only changes when a
    /// new attachment was supplied. The previous attachment file stays on
    /// disk when replaced.
    pub async fn update(
        state: &AppState,
        id: u64,
        form: ServiceForm,
        attachment: Option<Attachment>,
    ) -> Result<ServiceRecord, AppError> {
        let fields = form.validate()?;

        let _guard = state.lock_writes().await;
        let mut doc = state.store.load().await?;
        let index = doc.position(id).ok_or(AppError::ServiceNotFound(id))?;

        let image_ref = match attachment {
            Some(attachment) => Some(UploadService::store(&state.upload_dir, attachment).await?),
            None => None,
        };

        let record = &mut doc.services[index];
        record.name = fields.name;
        record.price = fields.price;
        record.quantity = fields.quantity;
        record.description = fields.description;
        record.on_promotion = fields.on_promotion;
        if let Some(reference) = image_ref {
            record.image_ref = Some(reference);
        }
        record.updated_at = Some(Utc::now());

        let updated = record.clone();
        state.store.save(&doc).await?;

        info!("updated service {}", id);
        Ok(updated)
    }

    /// Remove a record from the collection, returning it
    ///
    /// The associated attachment file, if any, stays on disk.
    pub async fn delete(state: &AppState, id: u64) -> Result<ServiceRecord, AppError> {
        let _guard = state.lock_writes().await;
        let mut doc = state.store.load().await?;
        let index = doc.position(id).ok_or(AppError::ServiceNotFound(id))?;
        let removed = doc.services.remove(index);
        state.store.save(&doc).await?;

        info!("deleted service {}", id);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use tempfile::{tempdir, TempDir};

    fn test_state() -> (TempDir, AppState) {
        let dir = tempdir().expect("Failed to create temp dir");
        let state = AppState::with_paths(
            dir.path().join("services.json"),
            dir.path().join("uploads"),
        );
        (dir, state)
    }

    fn valid_form(name: &str, price: &str) -> ServiceForm {
        ServiceForm {
            name: Some(name.to_string()),
            price: Some(price.to_string()),
            quantity: Some("10".to_string()),
            description: Some("2m".to_string()),
            on_promotion: None,
        }
    }

    fn png(len: usize) -> Attachment {
        Attachment {
            filename: "photo.png".to_string(),
            content_type: "image/png".to_string(),
            data: Bytes::from(vec![0u8; len]),
        }
    }

    #[test]
    fn test_validate_missing_fields() {
        let mut form = valid_form("Cable HDMI", "9.99");
        form.description = None;
        let err = form.validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("missing required fields"));
    }

    #[test]
    fn test_validate_whitespace_only_is_missing() {
        let mut form = valid_form("   ", "9.99");
        form.name = Some("   ".to_string());
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_validate_trims_text_fields() {
        let mut form = valid_form("  Cable HDMI  ", "9.99");
        form.description = Some(" 2m ".to_string());
        let fields = form.validate().unwrap();
        assert_eq!(fields.name, "Cable HDMI");
        assert_eq!(fields.description, "2m");
    }

    #[test]
    fn test_validate_rejects_non_numeric_price() {
        let form = valid_form("Cable HDMI", "cheap");
        assert!(matches!(
            form.validate().unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        let form = valid_form("Cable HDMI", "-1.0");
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_quantity() {
        let mut form = valid_form("Cable HDMI", "9.99");
        form.quantity = Some("-3".to_string());
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_on_promotion_only_literal_true() {
        let mut form = valid_form("Cable HDMI", "9.99");
        form.on_promotion = Some("true".to_string());
        assert!(form.validate().unwrap().on_promotion);

        form.on_promotion = Some("yes".to_string());
        assert!(!form.validate().unwrap().on_promotion);

        form.on_promotion = None;
        assert!(!form.validate().unwrap().on_promotion);
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let (_dir, state) = test_state();

        let first = CatalogService::create(&state, valid_form("Cable HDMI", "9.99"), None)
            .await
            .unwrap();
        let second = CatalogService::create(&state, valid_form("Mouse", "19.99"), None)
            .await
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.image_ref, None);
        assert!(!first.on_promotion);
    }

    #[tokio::test]
    async fn test_get_returns_created_record() {
        let (_dir, state) = test_state();
        let created = CatalogService::create(&state, valid_form("Cable HDMI", "9.99"), None)
            .await
            .unwrap();

        let fetched = CatalogService::get(&state, created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_get_missing_id_is_not_found() {
        let (_dir, state) = test_state();
        let result = CatalogService::get(&state, 99).await;
        assert!(matches!(result, Err(AppError::ServiceNotFound(99))));
    }

    #[tokio::test]
    async fn test_ids_are_never_backfilled() {
        let (_dir, state) = test_state();
        for name in ["a", "b", "c"] {
            CatalogService::create(&state, valid_form(name, "1.0"), None)
                .await
                .unwrap();
        }
        CatalogService::delete(&state, 2).await.unwrap();
        CatalogService::delete(&state, 3).await.unwrap();

        // Collection is now {1}; max ever allocated was 3, but the allocator
        // only looks at the current snapshot: next is max(1) + 1
        let next = CatalogService::create(&state, valid_form("d", "1.0"), None)
            .await
            .unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn test_gap_in_ids_allocates_past_max() {
        let (_dir, state) = test_state();
        for name in ["a", "b", "c"] {
            CatalogService::create(&state, valid_form(name, "1.0"), None)
                .await
                .unwrap();
        }
        CatalogService::delete(&state, 2).await.unwrap();

        // {1, 3} allocates 4, never the gap
        let next = CatalogService::create(&state, valid_form("d", "1.0"), None)
            .await
            .unwrap();
        assert_eq!(next.id, 4);
    }

    #[tokio::test]
    async fn test_create_with_attachment_sets_image_ref() {
        let (_dir, state) = test_state();
        let record = CatalogService::create(&state, valid_form("Cable HDMI", "9.99"), Some(png(64)))
            .await
            .unwrap();

        let reference = record.image_ref.unwrap();
        assert!(reference.starts_with("/uploads/"));
        let stored = state
            .upload_dir
            .join(reference.strip_prefix("/uploads/").unwrap());
        assert!(stored.exists());
    }

    #[tokio::test]
    async fn test_rejected_attachment_leaves_collection_unchanged() {
        let (_dir, state) = test_state();
        let bad = Attachment {
            filename: "notes.txt".to_string(),
            content_type: "text/plain".to_string(),
            data: Bytes::from_static(b"hello"),
        };

        let result =
            CatalogService::create(&state, valid_form("Cable HDMI", "9.99"), Some(bad)).await;
        assert!(matches!(result, Err(AppError::InvalidAttachmentType(_))));

        assert!(CatalogService::list(&state).await.unwrap().is_empty());
        assert!(!state.upload_dir.exists());
    }

    #[tokio::test]
    async fn test_missing_fields_rejected_before_any_write() {
        let (_dir, state) = test_state();
        let result =
            CatalogService::create(&state, ServiceForm::default(), Some(png(64))).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        // Neither the attachment nor the document was written
        assert!(!state.upload_dir.exists());
        assert!(CatalogService::list(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_preserves_id_and_created_at() {
        let (_dir, state) = test_state();
        let created = CatalogService::create(&state, valid_form("Cable HDMI", "9.99"), None)
            .await
            .unwrap();

        let updated =
            CatalogService::update(&state, created.id, valid_form("Cable HDMI", "7.99"), None)
                .await
                .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.price, 7.99);
        let updated_at = updated.updated_at.expect("updatedAt should be set");
        assert!(updated_at >= created.created_at);
    }

    #[tokio::test]
    async fn test_update_without_attachment_keeps_image_ref() {
        let (_dir, state) = test_state();
        let created = CatalogService::create(&state, valid_form("Cable HDMI", "9.99"), Some(png(32)))
            .await
            .unwrap();

        let updated =
            CatalogService::update(&state, created.id, valid_form("Cable HDMI", "7.99"), None)
                .await
                .unwrap();
        assert_eq!(updated.image_ref, created.image_ref);
    }

    #[tokio::test]
    async fn test_update_with_attachment_replaces_reference_not_file() {
        let (_dir, state) = test_state();
        let created = CatalogService::create(&state, valid_form("Cable HDMI", "9.99"), Some(png(32)))
            .await
            .unwrap();
        let old_reference = created.image_ref.clone().unwrap();

        let updated = CatalogService::update(
            &state,
            created.id,
            valid_form("Cable HDMI", "7.99"),
            Some(png(48)),
        )
        .await
        .unwrap();

        let new_reference = updated.image_ref.unwrap();
        assert_ne!(new_reference, old_reference);
        // The replaced file is intentionally left behind
        let old_file = state
            .upload_dir
            .join(old_reference.strip_prefix("/uploads/").unwrap());
        assert!(old_file.exists());
    }

    #[tokio::test]
    async fn test_update_missing_id_is_not_found() {
        let (_dir, state) = test_state();
        let result = CatalogService::update(&state, 7, valid_form("x", "1.0"), None).await;
        assert!(matches!(result, Err(AppError::ServiceNotFound(7))));
    }

    #[tokio::test]
    async fn test_delete_removes_from_list() {
        let (_dir, state) = test_state();
        let created = CatalogService::create(&state, valid_form("Cable HDMI", "9.99"), None)
            .await
            .unwrap();

        let removed = CatalogService::delete(&state, created.id).await.unwrap();
        assert_eq!(removed, created);

        assert!(CatalogService::list(&state).await.unwrap().is_empty());
        assert!(matches!(
            CatalogService::get(&state, created.id).await,
            Err(AppError::ServiceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_keeps_attachment_file() {
        let (_dir, state) = test_state();
        let created = CatalogService::create(&state, valid_form("Cable HDMI", "9.99"), Some(png(16)))
            .await
            .unwrap();
        let reference = created.image_ref.clone().unwrap();

        CatalogService::delete(&state, created.id).await.unwrap();

        let file = state
            .upload_dir
            .join(reference.strip_prefix("/uploads/").unwrap());
        assert!(file.exists());
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let (_dir, state) = test_state();
        for name in ["first", "second", "third"] {
            CatalogService::create(&state, valid_form(name, "1.0"), None)
                .await
                .unwrap();
        }

        let names: Vec<String> = CatalogService::list(&state)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_concurrent_creates_do_not_lose_updates() {
        let (_dir, state) = test_state();
        let state = std::sync::Arc::new(state);

        let mut handles = Vec::new();
        for i in 0..8 {
            let state = state.clone();
            handles.push(tokio::spawn(async move {
                CatalogService::create(&state, valid_form(&format!("svc-{i}"), "1.0"), None).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let records = CatalogService::list(&state).await.unwrap();
        assert_eq!(records.len(), 8);
        let mut ids: Vec<u64> = records.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=8).collect::<Vec<u64>>());
    }
}
