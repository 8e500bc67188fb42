//! Council collection schema
//!
//! The only collection with an edit operation. Council membership
//! status is one-directional: a past member can never be moved back to
//! current.

use super::{decode_fields, run_validator, CollectionSchema, FilePolicy, FileRef, PanelKind};
use crate::errors::{AppError, Result};
use crate::store::{RawDocument, StoredObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use validator::Validate;

/// Council membership status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouncilStatus {
    Current,
    Past,
}

impl fmt::Display for CouncilStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CouncilStatus::Current => "current",
            CouncilStatus::Past => "past",
        })
    }
}

/// A council member, current or past
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilMember {
    pub id: String,
    pub name: String,
    pub designation: String,
    pub period_of_service: String,
    pub status: CouncilStatus,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CouncilDraft {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "designation is required"))]
    pub designation: String,

    #[validate(length(min = 1, message = "period_of_service is required"))]
    pub period_of_service: String,

    pub status: CouncilStatus,
}

/// Partial update to an existing council member
///
/// At least one field must be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CouncilPatch {
    pub designation: Option<String>,
    pub period_of_service: Option<String>,
    pub status: Option<CouncilStatus>,
}

impl CouncilPatch {
    pub fn is_empty(&self) -> bool {
        self.designation.is_none() && self.period_of_service.is_none() && self.status.is_none()
    }

    /// Fields to send to the document store
    pub fn to_fields(&self) -> serde_json::Value {
        let mut fields = serde_json::Map::new();
        if let Some(designation) = &self.designation {
            fields.insert("designation".into(), json!(designation.trim()));
        }
        if let Some(period) = &self.period_of_service {
            fields.insert("period_of_service".into(), json!(period.trim()));
        }
        if let Some(status) = self.status {
            fields.insert("status".into(), json!(status));
        }
        serde_json::Value::Object(fields)
    }
}

#[derive(Deserialize)]
struct CouncilFields {
    name: String,
    designation: String,
    period_of_service: String,
    status: CouncilStatus,
}

pub struct CouncilSchema;

impl CollectionSchema for CouncilSchema {
    type Record = CouncilMember;
    type Draft = CouncilDraft;

    const COLLECTION: &'static str = "council";
    const KIND: PanelKind = PanelKind::Council;
    const FILE: Option<FilePolicy> = None;

    fn validate(draft: &Self::Draft) -> Result<()> {
        run_validator(draft)
    }

    fn encode(draft: &Self::Draft, _file: Option<&StoredObject>) -> serde_json::Value {
        json!({
            "name": draft.name.trim(),
            "designation": draft.designation.trim(),
            "period_of_service": draft.period_of_service.trim(),
            "status": draft.status,
        })
    }

    fn decode(doc: &RawDocument) -> Result<Self::Record> {
        let fields: CouncilFields = decode_fields(Self::COLLECTION, doc)?;
        Ok(CouncilMember {
            id: doc.id.clone(),
            name: fields.name,
            designation: fields.designation,
            period_of_service: fields.period_of_service,
            status: fields.status,
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

/// Validate a patch against the member it targets
///
/// Rejects empty patches and the forbidden past-to-current status
/// transition; both are caught before the store update is invoked.
pub fn validate_patch(member: &CouncilMember, patch: &CouncilPatch) -> Result<()> {
    if patch.is_empty() {
        return Err(AppError::Validation {
            message: "at least one of designation, period_of_service, status must be provided"
                .to_string(),
            field: None,
        });
    }

    if member.status == CouncilStatus::Past && patch.status == Some(CouncilStatus::Current) {
        return Err(AppError::Validation {
            message: "past members cannot be moved back to current status".to_string(),
            field: Some("status".to_string()),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(status: CouncilStatus) -> CouncilMember {
        CouncilMember {
            id: "doc-1".into(),
            name: "Prof. B".into(),
            designation: "Secretary".into(),
            period_of_service: "2020-2024".into(),
            status,
            created_at: None,
        }
    }

    #[test]
    fn test_empty_patch_rejected() {
        let err = validate_patch(&member(CouncilStatus::Current), &CouncilPatch::default());
        assert!(err.is_err());
    }

    #[test]
    fn test_past_to_current_rejected() {
        let patch = CouncilPatch {
            status: Some(CouncilStatus::Current),
            ..Default::default()
        };
        assert!(validate_patch(&member(CouncilStatus::Past), &patch).is_err());
    }

    #[test]
    fn test_current_to_past_allowed() {
        let patch = CouncilPatch {
            status: Some(CouncilStatus::Past),
            ..Default::default()
        };
        assert!(validate_patch(&member(CouncilStatus::Current), &patch).is_ok());
    }

    #[test]
    fn test_patch_fields_only_carry_present_values() {
        let patch = CouncilPatch {
            designation: Some("Treasurer".into()),
            ..Default::default()
        };
        let fields = patch.to_fields();
        assert_eq!(fields["designation"], "Treasurer");
        assert!(fields.get("status").is_none());
    }
}
