//! Gallery collection schema

use super::{decode_fields, run_validator, CollectionSchema, FilePolicy, FileRef, PanelKind};
use crate::errors::Result;
use crate::store::{RawDocument, ResourceKind, StoredObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

/// A captioned gallery image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: String,
    pub heading: String,
    pub image: FileRef,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GalleryDraft {
    #[validate(length(min = 1, message = "heading is required"))]
    pub heading: String,
}

#[derive(Deserialize)]
struct GalleryFields {
    heading: String,
    image: FileRef,
}

pub struct GallerySchema;

impl CollectionSchema for GallerySchema {
    type Record = GalleryImage;
    type Draft = GalleryDraft;

    const COLLECTION: &'static str = "gallery";
    const KIND: PanelKind = PanelKind::Gallery;
    const FILE: Option<FilePolicy> = Some(FilePolicy {
        kind: ResourceKind::Image,
        folder: "gallery",
        accepted: &["image/"],
    });

    fn validate(draft: &Self::Draft) -> Result<()> {
        run_validator(draft)
    }

    fn encode(draft: &Self::Draft, file: Option<&StoredObject>) -> serde_json::Value {
        json!({
            "heading": draft.heading.trim(),
            "image": file.map(FileRef::from),
        })
    }

    fn decode(doc: &RawDocument) -> Result<Self::Record> {
        let fields: GalleryFields = decode_fields(Self::COLLECTION, doc)?;
        Ok(GalleryImage {
            id: doc.id.clone(),
            heading: fields.heading,
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
