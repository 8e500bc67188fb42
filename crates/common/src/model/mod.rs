//! Typed per-collection record schemas
//!
//! The document store returns untyped field bags; every collection gets
//! an explicit schema that decodes at the store boundary and fails
//! closed (`AppError::Fetch`) on malformed documents rather than
//! propagating missing fields into the rest of the system.
//!
//! Category fields are kept as raw strings on decoded records so that
//! documents carrying retired category values still load and can be
//! surfaced in an "Uncategorized" bucket by the grouping view; drafts
//! use the closed enumerations, so new records can only carry declared
//! categories.

pub mod award;
pub mod council;
pub mod gallery;
pub mod journal;
pub mod member;
pub mod notice;

pub use award::{Award, AwardDraft, AwardSchema};
pub use council::{CouncilDraft, CouncilMember, CouncilPatch, CouncilSchema, CouncilStatus};
pub use gallery::{GalleryDraft, GalleryImage, GallerySchema};
pub use journal::{Journal, JournalDraft, JournalSchema};
pub use member::{Member, MemberDraft, MemberSchema, MembershipCategory};
pub use notice::{Notice, NoticeCategory, NoticeDraft, NoticeSchema};

use crate::errors::{AppError, Result};
use crate::store::{RawDocument, ResourceKind, StoredObject};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Closed set of admin panels, one per collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    Awards,
    Gallery,
    Journals,
    Members,
    Council,
    Notices,
}

impl PanelKind {
    pub const ALL: [PanelKind; 6] = [
        PanelKind::Awards,
        PanelKind::Gallery,
        PanelKind::Journals,
        PanelKind::Members,
        PanelKind::Council,
        PanelKind::Notices,
    ];

    /// Collection name this panel mirrors in the document store
    pub fn collection(&self) -> &'static str {
        match self {
            PanelKind::Awards => "award_prize",
            PanelKind::Gallery => "gallery",
            PanelKind::Journals => "journals",
            PanelKind::Members => "member",
            PanelKind::Council => "council",
            PanelKind::Notices => "news_announcement",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PanelKind::Awards => "awards",
            PanelKind::Gallery => "gallery",
            PanelKind::Journals => "journals",
            PanelKind::Members => "members",
            PanelKind::Council => "council",
            PanelKind::Notices => "notices",
        }
    }
}

/// Reference to a binary hosted in the object store
///
/// The url is always the one the object store returned at upload time,
/// never synthesized. A missing delete handle makes deletion of the
/// binary best-effort/impossible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_handle: Option<String>,
}

impl From<&StoredObject> for FileRef {
    fn from(obj: &StoredObject) -> Self {
        Self {
            url: obj.url.clone(),
            delete_handle: obj.delete_handle.clone(),
        }
    }
}

/// File requirements of a panel that accepts uploads
#[derive(Debug, Clone, Copy)]
pub struct FilePolicy {
    pub kind: ResourceKind,
    pub folder: &'static str,
    /// Accepted content-type prefixes
    pub accepted: &'static [&'static str],
}

impl FilePolicy {
    pub fn accepts(&self, content_type: &str) -> bool {
        self.accepted.iter().any(|a| content_type.starts_with(a))
    }
}

/// Schema of one document store collection
///
/// Binds a panel to its collection name, its file requirements, and
/// the encode/decode/validate steps of the generic CRUD workflow.
pub trait CollectionSchema: Send + Sync + 'static {
    type Record: Clone + Send + Sync + Serialize + 'static;
    type Draft: Send + Sync;

    const COLLECTION: &'static str;
    const KIND: PanelKind;
    /// File requirements; `None` for metadata-only panels
    const FILE: Option<FilePolicy>;

    /// Client-side precondition check, run before any network call
    fn validate(draft: &Self::Draft) -> Result<()>;

    /// Encode a draft (plus the uploaded file, when the panel has one)
    /// into the field bag persisted to the document store
    fn encode(draft: &Self::Draft, file: Option<&StoredObject>) -> serde_json::Value;

    /// Decode a raw document, failing closed on malformed input
    fn decode(doc: &RawDocument) -> Result<Self::Record>;

    fn id(record: &Self::Record) -> &str;
    fn created_at(record: &Self::Record) -> Option<DateTime<Utc>>;
    fn file_ref(record: &Self::Record) -> Option<&FileRef>;
}

/// Deserialize a document's field bag into a typed shape, mapping any
/// failure to a fetch error naming the offending document.
pub(crate) fn decode_fields<T: DeserializeOwned>(collection: &str, doc: &RawDocument) -> Result<T> {
    serde_json::from_value(doc.fields.clone()).map_err(|e| AppError::Fetch {
        message: format!("malformed {} document {}: {}", collection, doc.id, e),
    })
}

/// Map validator output onto the local validation error type
pub(crate) fn run_validator(draft: &impl validator::Validate) -> Result<()> {
    draft.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_panel_collections_are_fixed() {
        assert_eq!(PanelKind::Awards.collection(), "award_prize");
        assert_eq!(PanelKind::Notices.collection(), "news_announcement");
        assert_eq!(PanelKind::ALL.len(), 6);
    }

    #[test]
    fn test_decode_fails_closed_on_malformed_document() {
        let doc = RawDocument {
            id: "doc-9".into(),
            fields: json!({"name": "A"}), // missing prize_name and image
            created_at: None,
        };
        let err = AwardSchema::decode(&doc).unwrap_err();
        assert!(matches!(err, AppError::Fetch { .. }));
        assert!(err.to_string().contains("doc-9"));
    }

    #[test]
    fn test_file_policy_accepts_prefixes() {
        let policy = FilePolicy {
            kind: crate::store::ResourceKind::Image,
            folder: "gallery",
            accepted: &["image/"],
        };
        assert!(policy.accepts("image/png"));
        assert!(policy.accepts("image/jpeg"));
        assert!(!policy.accepts("application/pdf"));
    }
}
