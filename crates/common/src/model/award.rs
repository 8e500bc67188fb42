//! Awards collection schema

use super::{decode_fields, run_validator, CollectionSchema, FilePolicy, FileRef, PanelKind};
use crate::errors::Result;
use crate::store::{RawDocument, ResourceKind, StoredObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

/// An award winner entry with its hosted photograph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Award {
    pub id: String,
    pub name: String,
    pub prize_name: String,
    pub image: FileRef,
    pub created_at: Option<DateTime<Utc>>,
}

/// Unsaved award input; the photograph travels separately as the
/// upload payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AwardDraft {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "prize_name is required"))]
    pub prize_name: String,
}

#[derive(Deserialize)]
struct AwardFields {
    name: String,
    prize_name: String,
    image: FileRef,
}

pub struct AwardSchema;

impl CollectionSchema for AwardSchema {
    type Record = Award;
    type Draft = AwardDraft;

    const COLLECTION: &'static str = "award_prize";
    const KIND: PanelKind = PanelKind::Awards;
    const FILE: Option<FilePolicy> = Some(FilePolicy {
        kind: ResourceKind::Image,
        folder: "awards",
        accepted: &["image/"],
    });

    fn validate(draft: &Self::Draft) -> Result<()> {
        run_validator(draft)
    }

    fn encode(draft: &Self::Draft, file: Option<&StoredObject>) -> serde_json::Value {
        json!({
            "name": draft.name.trim(),
            "prize_name": draft.prize_name.trim(),
            "image": file.map(FileRef::from),
        })
    }

    fn decode(doc: &RawDocument) -> Result<Self::Record> {
        let fields: AwardFields = decode_fields(Self::COLLECTION, doc)?;
        Ok(Award {
            id: doc.id.clone(),
            name: fields.name,
            prize_name: fields.prize_name,
            image: fields.image,
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
        Some(&record.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_requires_both_fields() {
        let draft = AwardDraft {
            name: "".into(),
            prize_name: "Best Paper".into(),
        };
        assert!(AwardSchema::validate(&draft).is_err());
    }

    #[test]
    fn test_encode_uses_stored_object_url() {
        let draft = AwardDraft {
            name: " A. Winner ".into(),
            prize_name: "Gold Medal".into(),
        };
        let stored = StoredObject {
            url: "https://cdn.example/awards/1.jpg".into(),
            delete_handle: Some("awards/1".into()),
        };
        let fields = AwardSchema::encode(&draft, Some(&stored));
        assert_eq!(fields["name"], "A. Winner");
        assert_eq!(fields["image"]["url"], "https://cdn.example/awards/1.jpg");
    }
}
