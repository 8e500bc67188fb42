//! Generic collection panel workflow
//!
//! Every admin panel is the same state machine around one document
//! store collection: fetch and mirror the collection, add records
//! (optionally uploading a binary first), and delete records (metadata
//! first, binary best-effort afterwards). The panel owns its in-memory
//! mirror for its own lifetime; nothing is shared across panels.
//!
//! Sequencing invariants:
//! - within `add`, the upload must complete before the persist begins;
//! - within `remove`, the document store delete must complete before
//!   the object store delete is attempted;
//! - operations on different panels or different records interleave
//!   freely with no ordering guarantee between them.

pub mod grouping;

use crate::errors::{AppError, Result};
use crate::metrics::{record_orphan, record_panel_op};
use crate::model::{
    council::{self, CouncilMember, CouncilPatch, CouncilSchema},
    CollectionSchema,
};
use crate::store::{
    DeleteOutcome, DocumentStore, ObjectStore, OrderBy, RawDocument, ResourceKind, StoreError,
};
use chrono::Utc;
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::Arc;

/// Panel lifecycle state
///
/// `Error` retains the last known list; `Deleting` carries the busy
/// record's id so the rest of the list stays interactive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelState {
    Loading,
    Idle,
    Error(String),
    Submitting,
    Deleting(String),
}

/// A file attached to an add operation
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

/// Upload size ceilings, enforced client-side before any network call
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub image_max_bytes: usize,
    pub pdf_max_bytes: usize,
}

impl UploadLimits {
    pub fn max_for(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Image => self.image_max_bytes,
            ResourceKind::Raw => self.pdf_max_bytes,
        }
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            image_max_bytes: 10 * 1024 * 1024,
            pdf_max_bytes: 50 * 1024 * 1024,
        }
    }
}

impl From<&crate::config::UploadConfig> for UploadLimits {
    fn from(config: &crate::config::UploadConfig) -> Self {
        Self {
            image_max_bytes: config.image_max_bytes,
            pdf_max_bytes: config.pdf_max_bytes,
        }
    }
}

/// One admin panel instance mirroring a single collection
pub struct Panel<S: CollectionSchema> {
    docs: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
    limits: UploadLimits,
    state: PanelState,
    records: Vec<S::Record>,
    _schema: PhantomData<S>,
}

impl<S: CollectionSchema> Panel<S> {
    pub fn new(
        docs: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
        limits: UploadLimits,
    ) -> Self {
        Self {
            docs,
            objects,
            limits,
            state: PanelState::Loading,
            records: Vec::new(),
            _schema: PhantomData,
        }
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    /// The panel's current mirror of the collection
    pub fn records(&self) -> &[S::Record] {
        &self.records
    }

    /// Fetch the collection, newest first
    ///
    /// Requests server-side descending order by creation timestamp;
    /// when the store rejects the ordered query with a precondition
    /// failure, falls back to an unordered fetch plus a client-side
    /// stable sort (timestamp-less records last, ties keep fetch
    /// order). A failed fetch moves the panel to the error state but
    /// keeps the last known list.
    pub async fn list(&mut self) -> Result<&[S::Record]> {
        self.state = PanelState::Loading;

        let (docs, needs_sort) = match self
            .docs
            .list(S::COLLECTION, Some(OrderBy::newest_first()))
            .await
        {
            Ok(docs) => (docs, false),
            Err(StoreError::PreconditionFailed { message }) => {
                tracing::debug!(
                    collection = S::COLLECTION,
                    reason = %message,
                    "server-side ordering unsupported, sorting client-side"
                );
                match self.docs.list(S::COLLECTION, None).await {
                    Ok(docs) => (docs, true),
                    Err(err) => return Err(self.fetch_failed(err)),
                }
            }
            Err(err) => return Err(self.fetch_failed(err)),
        };

        let mut decoded = Vec::with_capacity(docs.len());
        for doc in &docs {
            match S::decode(doc) {
                Ok(record) => decoded.push(record),
                Err(err) => {
                    self.state = PanelState::Error(err.to_string());
                    record_panel_op(S::KIND.name(), "list", "decode_error");
                    return Err(err);
                }
            }
        }

        if needs_sort {
            decoded.sort_by(|a, b| newest_first(S::created_at(a), S::created_at(b)));
        }

        self.records = decoded;
        self.state = PanelState::Idle;
        record_panel_op(S::KIND.name(), "list", "ok");
        Ok(&self.records)
    }

    /// Re-fetch after a failed load
    pub async fn retry(&mut self) -> Result<&[S::Record]> {
        self.list().await
    }

    /// Add a record, uploading its binary first when the panel has one
    ///
    /// Validation runs before any network call; on upload failure the
    /// draft is untouched so the caller can retry; on persist failure
    /// the already-uploaded binary is left orphaned (logged, accepted).
    pub async fn add(&mut self, draft: &S::Draft, file: Option<FilePayload>) -> Result<S::Record> {
        if let Err(err) = self.validate_add(draft, file.as_ref()) {
            record_panel_op(S::KIND.name(), "add", "validation_error");
            return Err(err);
        }

        self.state = PanelState::Submitting;

        // Upload sub-phase strictly precedes the persist sub-phase.
        let uploaded = match (S::FILE, file) {
            (Some(policy), Some(payload)) => {
                match self
                    .objects
                    .upload(payload.bytes, policy.kind, policy.folder)
                    .await
                {
                    Ok(obj) => Some(obj),
                    Err(err) => {
                        self.state = PanelState::Idle;
                        record_panel_op(S::KIND.name(), "add", "upload_error");
                        return Err(AppError::Upload {
                            message: err.to_string(),
                        });
                    }
                }
            }
            _ => None,
        };

        let fields = S::encode(draft, uploaded.as_ref());
        let id = match self.docs.create(S::COLLECTION, fields.clone()).await {
            Ok(id) => id,
            Err(err) => {
                if let Some(obj) = &uploaded {
                    tracing::warn!(
                        collection = S::COLLECTION,
                        url = %obj.url,
                        "binary uploaded but metadata persist failed, leaving orphan"
                    );
                    record_orphan(S::COLLECTION);
                }
                self.state = PanelState::Idle;
                record_panel_op(S::KIND.name(), "add", "persist_error");
                return Err(AppError::Persist {
                    message: err.to_string(),
                });
            }
        };

        let record = S::decode(&RawDocument {
            id,
            fields,
            created_at: Some(Utc::now()),
        })?;

        // Newest first, matching the list ordering.
        self.records.insert(0, record.clone());
        self.state = PanelState::Idle;
        record_panel_op(S::KIND.name(), "add", "ok");
        Ok(record)
    }

    /// Delete a record, requiring an explicit confirmation
    ///
    /// The document store delete gates everything: on its failure the
    /// record stays in the list; on its success the record is removed
    /// locally regardless of the subsequent best-effort object store
    /// delete, whose failure is logged and never surfaced.
    pub async fn remove(&mut self, id: &str, confirmed: bool) -> Result<()> {
        if !confirmed {
            record_panel_op(S::KIND.name(), "remove", "validation_error");
            return Err(AppError::ConfirmationRequired);
        }

        let record = self
            .records
            .iter()
            .find(|r| S::id(r) == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound {
                resource_type: S::COLLECTION.to_string(),
                id: id.to_string(),
            })?;

        self.state = PanelState::Deleting(id.to_string());

        if let Err(err) = self.docs.delete(S::COLLECTION, id).await {
            self.state = PanelState::Idle;
            record_panel_op(S::KIND.name(), "remove", "persist_error");
            return Err(AppError::Persist {
                message: err.to_string(),
            });
        }

        self.records.retain(|r| S::id(r) != id);

        if let (Some(policy), Some(file)) = (S::FILE, S::file_ref(&record)) {
            self.delete_binary(id, file, policy.kind).await;
        }

        self.state = PanelState::Idle;
        record_panel_op(S::KIND.name(), "remove", "ok");
        Ok(())
    }

    /// Best-effort companion delete of a record's hosted binary
    async fn delete_binary(&self, id: &str, file: &crate::model::FileRef, kind: ResourceKind) {
        let Some(handle) = file.delete_handle.as_deref() else {
            tracing::warn!(
                collection = S::COLLECTION,
                record = id,
                url = %file.url,
                "record deleted but binary has no delete handle, leaving orphan"
            );
            record_orphan(S::COLLECTION);
            return;
        };

        match self.objects.delete(handle, kind).await {
            Ok(DeleteOutcome::Deleted) | Ok(DeleteOutcome::NotFound) => {}
            Ok(DeleteOutcome::Failed) => {
                tracing::warn!(
                    collection = S::COLLECTION,
                    record = id,
                    handle,
                    "object store refused binary delete, leaving orphan"
                );
                record_orphan(S::COLLECTION);
            }
            Err(err) => {
                tracing::warn!(
                    collection = S::COLLECTION,
                    record = id,
                    handle,
                    error = %err,
                    "binary delete failed, leaving orphan"
                );
                record_orphan(S::COLLECTION);
            }
        }
    }

    fn validate_add(&self, draft: &S::Draft, file: Option<&FilePayload>) -> Result<()> {
        S::validate(draft)?;

        match (S::FILE, file) {
            (Some(_), None) => Err(AppError::MissingField {
                field: "file".to_string(),
            }),
            (Some(policy), Some(payload)) => {
                if !policy.accepts(&payload.content_type) {
                    return Err(AppError::UnsupportedMediaType {
                        message: format!(
                            "{} not accepted for {} uploads",
                            payload.content_type,
                            S::KIND.name()
                        ),
                    });
                }
                let limit = self.limits.max_for(policy.kind);
                if payload.bytes.len() > limit {
                    return Err(AppError::PayloadTooLarge {
                        size: payload.bytes.len(),
                        limit,
                    });
                }
                Ok(())
            }
            (None, Some(_)) => Err(AppError::Validation {
                message: format!("{} panel does not accept file uploads", S::KIND.name()),
                field: Some("file".to_string()),
            }),
            (None, None) => Ok(()),
        }
    }

    fn fetch_failed(&mut self, err: StoreError) -> AppError {
        // Last known list is retained for the error state.
        self.state = PanelState::Error(err.to_string());
        record_panel_op(S::KIND.name(), "list", "fetch_error");
        AppError::Fetch {
            message: err.to_string(),
        }
    }
}

impl Panel<CouncilSchema> {
    /// Partially update a council member
    ///
    /// The only edit operation in the system. Validation (non-empty
    /// patch, one-directional status) runs before the store update is
    /// invoked.
    pub async fn edit(&mut self, id: &str, patch: &CouncilPatch) -> Result<CouncilMember> {
        let position = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound {
                resource_type: CouncilSchema::COLLECTION.to_string(),
                id: id.to_string(),
            })?;

        if let Err(err) = council::validate_patch(&self.records[position], patch) {
            record_panel_op("council", "edit", "validation_error");
            return Err(err);
        }

        self.state = PanelState::Submitting;

        if let Err(err) = self
            .docs
            .update(CouncilSchema::COLLECTION, id, patch.to_fields())
            .await
        {
            self.state = PanelState::Idle;
            record_panel_op("council", "edit", "persist_error");
            return Err(AppError::Persist {
                message: err.to_string(),
            });
        }

        let member = &mut self.records[position];
        if let Some(designation) = &patch.designation {
            member.designation = designation.trim().to_string();
        }
        if let Some(period) = &patch.period_of_service {
            member.period_of_service = period.trim().to_string();
        }
        if let Some(status) = patch.status {
            member.status = status;
        }

        self.state = PanelState::Idle;
        record_panel_op("council", "edit", "ok");
        Ok(self.records[position].clone())
    }
}

/// Descending creation-time order with timestamp-less records last
fn newest_first(
    a: Option<chrono::DateTime<Utc>>,
    b: Option<chrono::DateTime<Utc>>,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AwardDraft, AwardSchema, CouncilDraft, CouncilStatus, GallerySchema, MemberDraft,
        MemberSchema, MembershipCategory,
    };
    use crate::store::{MemoryDocumentStore, MemoryObjectStore};
    use serde_json::json;

    fn stores() -> (Arc<MemoryDocumentStore>, Arc<MemoryObjectStore>) {
        (
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MemoryObjectStore::new()),
        )
    }

    fn panel<S: CollectionSchema>(
        docs: &Arc<MemoryDocumentStore>,
        objects: &Arc<MemoryObjectStore>,
    ) -> Panel<S> {
        Panel::new(docs.clone(), objects.clone(), UploadLimits::default())
    }

    fn png(len: usize) -> FilePayload {
        FilePayload {
            bytes: vec![0u8; len],
            content_type: "image/png".to_string(),
            filename: "photo.png".to_string(),
        }
    }

    fn award_draft() -> AwardDraft {
        AwardDraft {
            name: "A. Winner".into(),
            prize_name: "Gold Medal".into(),
        }
    }

    fn member_draft() -> MemberDraft {
        MemberDraft {
            name: "Dr. A".into(),
            designation: "Professor".into(),
            organisation: "Constituent College".into(),
            address: "Main Road".into(),
            mobile: "9800000000".into(),
            email: "a@college.edu".into(),
            membership_type: MembershipCategory::AnnualTeacher,
        }
    }

    #[tokio::test]
    async fn test_add_with_file_uses_store_url() {
        let (docs, objects) = stores();
        let mut panel = panel::<AwardSchema>(&docs, &objects);
        panel.list().await.unwrap();

        let award = panel.add(&award_draft(), Some(png(64))).await.unwrap();

        // The url came from the object store response, never synthesized.
        assert!(award.image.url.starts_with("memory://image/awards/"));
        assert!(award.image.delete_handle.is_some());
        assert_eq!(*panel.state(), PanelState::Idle);
        assert_eq!(panel.records().len(), 1);
    }

    #[tokio::test]
    async fn test_add_validation_blocks_all_network_calls() {
        let (docs, objects) = stores();
        let mut panel = panel::<MemberSchema>(&docs, &objects);
        panel.list().await.unwrap();

        let mut draft = member_draft();
        draft.email = "".into();

        let err = panel.add(&draft, None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(docs.create_calls(), 0);
        assert_eq!(objects.upload_calls(), 0);
    }

    #[tokio::test]
    async fn test_add_missing_file_rejected_before_network() {
        let (docs, objects) = stores();
        let mut panel = panel::<AwardSchema>(&docs, &objects);
        panel.list().await.unwrap();

        let err = panel.add(&award_draft(), None).await.unwrap_err();
        assert!(matches!(err, AppError::MissingField { .. }));
        assert_eq!(objects.upload_calls(), 0);
        assert_eq!(docs.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_add_wrong_mime_rejected() {
        let (docs, objects) = stores();
        let mut panel = panel::<AwardSchema>(&docs, &objects);
        panel.list().await.unwrap();

        let pdf = FilePayload {
            bytes: vec![0u8; 16],
            content_type: "application/pdf".to_string(),
            filename: "not-a-photo.pdf".to_string(),
        };
        let err = panel.add(&award_draft(), Some(pdf)).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType { .. }));
        assert_eq!(objects.upload_calls(), 0);
    }

    #[tokio::test]
    async fn test_add_oversized_image_rejected() {
        let (docs, objects) = stores();
        let limits = UploadLimits {
            image_max_bytes: 32,
            pdf_max_bytes: 64,
        };
        let mut panel: Panel<AwardSchema> = Panel::new(docs.clone(), objects.clone(), limits);
        panel.list().await.unwrap();

        let err = panel.add(&award_draft(), Some(png(33))).await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge { .. }));
        assert_eq!(objects.upload_calls(), 0);
    }

    #[tokio::test]
    async fn test_add_upload_failure_aborts_before_persist() {
        let (docs, objects) = stores();
        objects.fail_next_upload(StoreError::Unavailable {
            message: "hosting down".into(),
        });

        let mut panel = panel::<AwardSchema>(&docs, &objects);
        panel.list().await.unwrap();

        let err = panel.add(&award_draft(), Some(png(64))).await.unwrap_err();
        assert!(matches!(err, AppError::Upload { .. }));
        // Persist never started; no orphan record.
        assert_eq!(docs.create_calls(), 0);
        assert_eq!(*panel.state(), PanelState::Idle);
    }

    #[tokio::test]
    async fn test_add_persist_failure_leaves_orphan_binary() {
        let (docs, objects) = stores();
        docs.fail_next_create(StoreError::Unavailable {
            message: "db down".into(),
        });

        let mut panel = panel::<AwardSchema>(&docs, &objects);
        panel.list().await.unwrap();

        let err = panel.add(&award_draft(), Some(png(64))).await.unwrap_err();
        assert!(matches!(err, AppError::Persist { .. }));
        // Binary was uploaded and stays behind; no compensating delete.
        assert_eq!(objects.upload_calls(), 1);
        assert_eq!(objects.delete_calls(), 0);
        assert!(panel.records().is_empty());
    }

    #[tokio::test]
    async fn test_remove_requires_confirmation() {
        let (docs, objects) = stores();
        let id = docs.seed("member", MemberSchema::encode(&member_draft(), None));

        let mut panel = panel::<MemberSchema>(&docs, &objects);
        panel.list().await.unwrap();
        let deletes_before = docs.delete_calls();

        let err = panel.remove(&id, false).await.unwrap_err();
        assert!(matches!(err, AppError::ConfirmationRequired));
        assert_eq!(docs.delete_calls(), deletes_before);
        assert_eq!(panel.records().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_keeps_record_when_store_delete_fails() {
        let (docs, objects) = stores();
        let id = docs.seed("member", MemberSchema::encode(&member_draft(), None));

        let mut panel = panel::<MemberSchema>(&docs, &objects);
        panel.list().await.unwrap();

        docs.fail_next_delete(StoreError::Unavailable {
            message: "db down".into(),
        });
        let err = panel.remove(&id, true).await.unwrap_err();
        assert!(matches!(err, AppError::Persist { .. }));
        assert_eq!(panel.records().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_succeeds_despite_binary_delete_failure() {
        let (docs, objects) = stores();
        let mut panel = panel::<GallerySchema>(&docs, &objects);
        panel.list().await.unwrap();

        let draft = crate::model::GalleryDraft {
            heading: "Convocation".into(),
        };
        let image = panel.add(&draft, Some(png(64))).await.unwrap();

        objects.fail_next_delete(StoreError::Unavailable {
            message: "hosting down".into(),
        });

        // Binary delete failure is logged, never surfaced.
        panel.remove(&image.id, true).await.unwrap();
        assert!(panel.records().is_empty());
        assert_eq!(objects.delete_calls(), 1);
    }

    #[tokio::test]
    async fn test_remove_tolerates_missing_delete_handle() {
        let (docs, objects) = stores();
        objects.withhold_handles();

        let mut panel = panel::<GallerySchema>(&docs, &objects);
        panel.list().await.unwrap();

        let draft = crate::model::GalleryDraft {
            heading: "Sports Day".into(),
        };
        let image = panel.add(&draft, Some(png(16))).await.unwrap();
        assert!(image.image.delete_handle.is_none());

        panel.remove(&image.id, true).await.unwrap();
        assert!(panel.records().is_empty());
        // No handle, so no delete attempt was possible.
        assert_eq!(objects.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_list_ordering_fallback_on_precondition_failure() {
        let (docs, objects) = stores();
        docs.deny_ordering();

        let old = chrono::Utc::now() - chrono::Duration::days(2);
        let mid = chrono::Utc::now() - chrono::Duration::days(1);
        let newest = chrono::Utc::now();

        let a = docs.seed_at("member", MemberSchema::encode(&member_draft(), None), Some(old));
        let b = docs.seed_at("member", MemberSchema::encode(&member_draft(), None), Some(newest));
        let untimed = docs.seed_at("member", MemberSchema::encode(&member_draft(), None), None);
        let c = docs.seed_at("member", MemberSchema::encode(&member_draft(), None), Some(mid));

        let mut panel = panel::<MemberSchema>(&docs, &objects);
        let records = panel.list().await.unwrap();

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        // Descending by creation time, timestamp-less last.
        assert_eq!(ids, vec![b.as_str(), c.as_str(), a.as_str(), untimed.as_str()]);
        // Ordered attempt plus unordered fallback.
        assert_eq!(docs.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_list_failure_retains_last_known_records() {
        let (docs, objects) = stores();
        docs.seed("member", MemberSchema::encode(&member_draft(), None));

        let mut panel = panel::<MemberSchema>(&docs, &objects);
        panel.list().await.unwrap();
        assert_eq!(panel.records().len(), 1);

        docs.fail_next_list(StoreError::Unavailable {
            message: "db down".into(),
        });
        let err = panel.list().await.unwrap_err();
        assert!(matches!(err, AppError::Fetch { .. }));
        assert!(matches!(panel.state(), PanelState::Error(_)));
        assert_eq!(panel.records().len(), 1);

        // Retry recovers.
        panel.retry().await.unwrap();
        assert_eq!(*panel.state(), PanelState::Idle);
    }

    #[tokio::test]
    async fn test_list_fails_closed_on_malformed_document() {
        let (docs, objects) = stores();
        docs.seed("member", json!({"name": "half a record"}));

        let mut panel = panel::<MemberSchema>(&docs, &objects);
        let err = panel.list().await.unwrap_err();
        assert!(matches!(err, AppError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_council_edit_past_to_current_rejected_before_update() {
        let (docs, objects) = stores();
        let draft = CouncilDraft {
            name: "Prof. B".into(),
            designation: "Secretary".into(),
            period_of_service: "2016-2020".into(),
            status: CouncilStatus::Past,
        };
        let id = docs.seed("council", crate::model::CouncilSchema::encode(&draft, None));

        let mut panel = panel::<CouncilSchema>(&docs, &objects);
        panel.list().await.unwrap();

        let patch = CouncilPatch {
            status: Some(CouncilStatus::Current),
            ..Default::default()
        };
        let err = panel.edit(&id, &patch).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(docs.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_council_edit_applies_patch() {
        let (docs, objects) = stores();
        let draft = CouncilDraft {
            name: "Prof. B".into(),
            designation: "Secretary".into(),
            period_of_service: "2020-2024".into(),
            status: CouncilStatus::Current,
        };
        let id = docs.seed("council", crate::model::CouncilSchema::encode(&draft, None));

        let mut panel = panel::<CouncilSchema>(&docs, &objects);
        panel.list().await.unwrap();

        let patch = CouncilPatch {
            designation: Some("President".into()),
            status: Some(CouncilStatus::Past),
            ..Default::default()
        };
        let updated = panel.edit(&id, &patch).await.unwrap();
        assert_eq!(updated.designation, "President");
        assert_eq!(updated.status, CouncilStatus::Past);
        assert_eq!(docs.update_calls(), 1);
    }
}
