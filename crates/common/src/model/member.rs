//! Members collection schema
//!
//! Membership tiers are a fixed enumeration. Drafts carry the closed
//! enum so new records can only use declared tiers; decoded records
//! keep the raw string so legacy documents with retired tiers still
//! load and fall into the grouping view's "Uncategorized" bucket.

use super::{decode_fields, run_validator, CollectionSchema, FilePolicy, FileRef, PanelKind};
use crate::errors::Result;
use crate::store::{RawDocument, StoredObject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use validator::Validate;

/// The seven declared membership tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipCategory {
    #[serde(rename = "Life Member(Constituent College Teacher)")]
    LifeConstituentCollegeTeacher,
    #[serde(rename = "Life Member (Affiliated College Teacher)")]
    LifeAffiliatedCollegeTeacher,
    #[serde(rename = "Annual Member(Teacher)")]
    AnnualTeacher,
    #[serde(rename = "Institutional Member")]
    Institutional,
    #[serde(rename = "Research Scholar")]
    ResearchScholar,
    #[serde(rename = "Student Member")]
    Student,
    #[serde(rename = "Donor Member")]
    Donor,
}

impl MembershipCategory {
    pub const ALL: [MembershipCategory; 7] = [
        MembershipCategory::LifeConstituentCollegeTeacher,
        MembershipCategory::LifeAffiliatedCollegeTeacher,
        MembershipCategory::AnnualTeacher,
        MembershipCategory::Institutional,
        MembershipCategory::ResearchScholar,
        MembershipCategory::Student,
        MembershipCategory::Donor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipCategory::LifeConstituentCollegeTeacher => {
                "Life Member(Constituent College Teacher)"
            }
            MembershipCategory::LifeAffiliatedCollegeTeacher => {
                "Life Member (Affiliated College Teacher)"
            }
            MembershipCategory::AnnualTeacher => "Annual Member(Teacher)",
            MembershipCategory::Institutional => "Institutional Member",
            MembershipCategory::ResearchScholar => "Research Scholar",
            MembershipCategory::Student => "Student Member",
            MembershipCategory::Donor => "Donor Member",
        }
    }
}

impl fmt::Display for MembershipCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A society member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub designation: String,
    pub organisation: String,
    pub address: String,
    pub mobile: String,
    pub email: String,
    /// Raw tier string; matched against the declared tiers for display
    pub membership_type: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MemberDraft {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "designation is required"))]
    pub designation: String,

    #[validate(length(min = 1, message = "organisation is required"))]
    pub organisation: String,

    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,

    #[validate(length(min = 1, message = "mobile is required"))]
    pub mobile: String,

    #[validate(email(message = "a valid email is required"))]
    pub email: String,

    pub membership_type: MembershipCategory,
}

#[derive(Deserialize)]
struct MemberFields {
    name: String,
    designation: String,
    organisation: String,
    address: String,
    mobile: String,
    email: String,
    membership_type: String,
}

pub struct MemberSchema;

impl CollectionSchema for MemberSchema {
    type Record = Member;
    type Draft = MemberDraft;

    const COLLECTION: &'static str = "member";
    const KIND: PanelKind = PanelKind::Members;
    const FILE: Option<FilePolicy> = None;

    fn validate(draft: &Self::Draft) -> Result<()> {
        run_validator(draft)
    }

    fn encode(draft: &Self::Draft, _file: Option<&StoredObject>) -> serde_json::Value {
        json!({
            "name": draft.name.trim(),
            "designation": draft.designation.trim(),
            "organisation": draft.organisation.trim(),
            "address": draft.address.trim(),
            "mobile": draft.mobile.trim(),
            "email": draft.email.trim(),
            "membership_type": draft.membership_type.as_str(),
        })
    }

    fn decode(doc: &RawDocument) -> Result<Self::Record> {
        let fields: MemberFields = decode_fields(Self::COLLECTION, doc)?;
        Ok(Member {
            id: doc.id.clone(),
            name: fields.name,
            designation: fields.designation,
            organisation: fields.organisation,
            address: fields.address,
            mobile: fields.mobile,
            email: fields.email,
            membership_type: fields.membership_type,
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

    fn draft() -> MemberDraft {
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

    #[test]
    fn test_valid_draft_passes() {
        assert!(MemberSchema::validate(&draft()).is_ok());
    }

    #[test]
    fn test_missing_email_rejected() {
        let mut d = draft();
        d.email = "".into();
        assert!(MemberSchema::validate(&d).is_err());
    }

    #[test]
    fn test_malformed_email_rejected() {
        let mut d = draft();
        d.email = "not-an-email".into();
        assert!(MemberSchema::validate(&d).is_err());
    }

    #[test]
    fn test_category_strings_are_stable() {
        assert_eq!(MembershipCategory::ALL.len(), 7);
        assert_eq!(
            MembershipCategory::Donor.to_string(),
            "Donor Member"
        );
    }
}
