//! Notices collection schema

use super::{decode_fields, run_validator, CollectionSchema, FilePolicy, FileRef, PanelKind};
use crate::errors::Result;
use crate::store::{RawDocument, StoredObject};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use validator::Validate;

/// The seven declared notice categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeCategory {
    #[serde(rename = "Conferences & Seminars")]
    ConferencesSeminars,
    #[serde(rename = "Research Highlights")]
    ResearchHighlights,
    #[serde(rename = "Membership Notices")]
    MembershipNotices,
    #[serde(rename = "Academic & Student Activities")]
    AcademicStudentActivities,
    #[serde(rename = "Feature Articles")]
    FeatureArticles,
    #[serde(rename = "Security & Technical Updates")]
    SecurityTechnicalUpdates,
    #[serde(rename = "General Notices")]
    GeneralNotices,
}

impl NoticeCategory {
    pub const ALL: [NoticeCategory; 7] = [
        NoticeCategory::ConferencesSeminars,
        NoticeCategory::ResearchHighlights,
        NoticeCategory::MembershipNotices,
        NoticeCategory::AcademicStudentActivities,
        NoticeCategory::FeatureArticles,
        NoticeCategory::SecurityTechnicalUpdates,
        NoticeCategory::GeneralNotices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeCategory::ConferencesSeminars => "Conferences & Seminars",
            NoticeCategory::ResearchHighlights => "Research Highlights",
            NoticeCategory::MembershipNotices => "Membership Notices",
            NoticeCategory::AcademicStudentActivities => "Academic & Student Activities",
            NoticeCategory::FeatureArticles => "Feature Articles",
            NoticeCategory::SecurityTechnicalUpdates => "Security & Technical Updates",
            NoticeCategory::GeneralNotices => "General Notices",
        }
    }
}

impl fmt::Display for NoticeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A news/announcement entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Raw category string; matched against the declared categories
    pub category: String,
    pub date: NaiveDate,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NoticeDraft {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,

    pub category: NoticeCategory,

    /// Defaults to today when absent
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Deserialize)]
struct NoticeFields {
    title: String,
    content: String,
    category: String,
    date: NaiveDate,
}

pub struct NoticeSchema;

impl CollectionSchema for NoticeSchema {
    type Record = Notice;
    type Draft = NoticeDraft;

    const COLLECTION: &'static str = "news_announcement";
    const KIND: PanelKind = PanelKind::Notices;
    const FILE: Option<FilePolicy> = None;

    fn validate(draft: &Self::Draft) -> Result<()> {
        run_validator(draft)
    }

    fn encode(draft: &Self::Draft, _file: Option<&StoredObject>) -> serde_json::Value {
        let date = draft.date.unwrap_or_else(|| Utc::now().date_naive());
        json!({
            "title": draft.title.trim(),
            "content": draft.content.trim(),
            "category": draft.category.as_str(),
            "date": date,
        })
    }

    fn decode(doc: &RawDocument) -> Result<Self::Record> {
        let fields: NoticeFields = decode_fields(Self::COLLECTION, doc)?;
        Ok(Notice {
            id: doc.id.clone(),
            title: fields.title,
            content: fields.content,
            category: fields.category,
            date: fields.date,
            created_at: doc.created_at,
        })
    }

    fn id(record: &Self::Record) -> &str {
        &record.id
    }

    fn created_at(record: &Self::Record) -> Option<DateTime<Utc>> {
        record.created_at
    }

    fn file_ref(_record: &Self::Record) -> Option<&FileRef> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_defaults_date_to_today() {
        let draft = NoticeDraft {
            title: "AGM".into(),
            content: "Annual general meeting".into(),
            category: NoticeCategory::GeneralNotices,
            date: None,
        };
        let fields = NoticeSchema::encode(&draft, None);
        assert_eq!(
            fields["date"],
            json!(Utc::now().date_naive())
        );
        assert_eq!(fields["category"], "General Notices");
    }

    #[test]
    fn test_category_strings_are_stable() {
        assert_eq!(NoticeCategory::ALL.len(), 7);
        assert_eq!(
            NoticeCategory::SecurityTechnicalUpdates.as_str(),
            "Security & Technical Updates"
        );
    }
}
