//! Journals collection schema
//!
//! Journal issues carry a hosted PDF. The PDF is uploaded as a raw
//! resource; uploading it as an image would yield a wrongly-typed URL.

use super::{decode_fields, run_validator, CollectionSchema, FilePolicy, FileRef, PanelKind};
use crate::errors::Result;
use crate::store::{RawDocument, ResourceKind, StoredObject};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

/// A published journal issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journal {
    pub id: String,
    pub title: String,
    pub description: String,
    pub publish_date: NaiveDate,
    pub pdf: FileRef,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JournalDraft {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,

    /// Optional blurb shown on the public journals page
    #[serde(default)]
    pub description: String,

    pub publish_date: NaiveDate,
}

#[derive(Deserialize)]
struct JournalFields {
    title: String,
    #[serde(default)]
    description: String,
    publish_date: NaiveDate,
    pdf: FileRef,
}

pub struct JournalSchema;

impl CollectionSchema for JournalSchema {
    type Record = Journal;
    type Draft = JournalDraft;

    const COLLECTION: &'static str = "journals";
    const KIND: PanelKind = PanelKind::Journals;
    const FILE: Option<FilePolicy> = Some(FilePolicy {
        kind: ResourceKind::Raw,
        folder: "journals",
        accepted: &["application/pdf"],
    });

    fn validate(draft: &Self::Draft) -> Result<()> {
        run_validator(draft)
    }

    fn encode(draft: &Self::Draft, file: Option<&StoredObject>) -> serde_json::Value {
        json!({
            "title": draft.title.trim(),
            "description": draft.description.trim(),
            "publish_date": draft.publish_date,
            "pdf": file.map(FileRef::from),
        })
    }

    fn decode(doc: &RawDocument) -> Result<Self::Record> {
        let fields: JournalFields = decode_fields(Self::COLLECTION, doc)?;
        Ok(Journal {
            id: doc.id.clone(),
            title: fields.title,
            description: fields.description,
            publish_date: fields.publish_date,
            pdf: fields.pdf,
            created_at: doc.created_at,
        })
    }

    fn id(record: &Self::Record) -> &str {
        &record.id
    }

    fn created_at(record: &Self::Record) -> Option<DateTime<Utc>> {
        record.created_at
    }

    fn file_ref(record: &Self::Record) -> Option<&FileRef> {
        Some(&record.pdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_policy_rejects_images() {
        let policy = JournalSchema::FILE.unwrap();
        assert!(policy.accepts("application/pdf"));
        assert!(!policy.accepts("image/png"));
        assert_eq!(policy.kind, ResourceKind::Raw);
    }

    #[test]
    fn test_decode_roundtrip() {
        let doc = RawDocument {
            id: "doc-3".into(),
            fields: json!({
                "title": "Vol. 12",
                "publish_date": "2025-06-01",
                "pdf": {"url": "https://cdn.example/raw/journals/3.pdf", "delete_handle": "journals/3"},
            }),
            created_at: Some(Utc::now()),
        };
        let journal = JournalSchema::decode(&doc).unwrap();
        assert_eq!(journal.title, "Vol. 12");
        assert_eq!(journal.description, "");
        assert_eq!(
            journal.publish_date,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
    }
}
