//! Built-in placeholder data for the public pages
//!
//! When the document store is unreachable or a collection is empty,
//! the public handlers fall back to these fixed records so visitors
//! never see a blank region. Every set has at least one item. Records
//! use the `placeholder-` id prefix so responses can flag them.

use crate::model::{
    Award, CouncilMember, CouncilStatus, FileRef, GalleryImage, Journal, Member, Notice,
};
use chrono::NaiveDate;

/// Id prefix shared by every placeholder record
pub const PLACEHOLDER_ID_PREFIX: &str = "placeholder-";

pub fn is_placeholder_id(id: &str) -> bool {
    id.starts_with(PLACEHOLDER_ID_PREFIX)
}

fn image(path: &str) -> FileRef {
    FileRef {
        url: format!("/static/placeholders/{path}"),
        delete_handle: None,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    // Components are compile-time constants below; fall back to the
    // epoch rather than panicking if one is ever out of range.
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

pub fn awards() -> Vec<Award> {
    vec![Award {
        id: format!("{PLACEHOLDER_ID_PREFIX}award-1"),
        name: "Dr. Example Laureate".into(),
        prize_name: "Young Scientist Award".into(),
        image: image("award.jpg"),
        created_at: None,
    }]
}

pub fn gallery() -> Vec<GalleryImage> {
    vec![
        GalleryImage {
            id: format!("{PLACEHOLDER_ID_PREFIX}gallery-1"),
            heading: "Annual Conference".into(),
            image: image("gallery-1.jpg"),
            created_at: None,
        },
        GalleryImage {
            id: format!("{PLACEHOLDER_ID_PREFIX}gallery-2"),
            heading: "Workshop Session".into(),
            image: image("gallery-2.jpg"),
            created_at: None,
        },
    ]
}

pub fn journals() -> Vec<Journal> {
    vec![Journal {
        id: format!("{PLACEHOLDER_ID_PREFIX}journal-1"),
        title: "Society Journal, Inaugural Issue".into(),
        description: "Selected papers from the inaugural annual conference.".into(),
        publish_date: date(2023, 1, 15),
        pdf: FileRef {
            url: "/static/placeholders/journal-1.pdf".into(),
            delete_handle: None,
        },
        created_at: None,
    }]
}

pub fn members() -> Vec<Member> {
    vec![Member {
        id: format!("{PLACEHOLDER_ID_PREFIX}member-1"),
        name: "Dr. Example Member".into(),
        designation: "Professor".into(),
        organisation: "Constituent College".into(),
        address: "University Road".into(),
        mobile: "0000000000".into(),
        email: "member@example.org".into(),
        membership_type: "Life Member(Constituent College Teacher)".into(),
        created_at: None,
    }]
}

pub fn council() -> Vec<CouncilMember> {
    vec![
        CouncilMember {
            id: format!("{PLACEHOLDER_ID_PREFIX}council-1"),
            name: "Prof. Example President".into(),
            designation: "President".into(),
            period_of_service: "2023-2027".into(),
            status: CouncilStatus::Current,
            created_at: None,
        },
        CouncilMember {
            id: format!("{PLACEHOLDER_ID_PREFIX}council-2"),
            name: "Dr. Example Secretary".into(),
            designation: "General Secretary".into(),
            period_of_service: "2023-2027".into(),
            status: CouncilStatus::Current,
            created_at: None,
        },
    ]
}

pub fn notices() -> Vec<Notice> {
    vec![Notice {
        id: format!("{PLACEHOLDER_ID_PREFIX}notice-1"),
        title: "Welcome to the Society Portal".into(),
        content: "Announcements and notices will appear here.".into(),
        category: "General Notices".into(),
        date: date(2023, 1, 1),
        created_at: None,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_set_has_at_least_one_item() {
        assert!(!awards().is_empty());
        assert!(!gallery().is_empty());
        assert!(!journals().is_empty());
        assert!(!members().is_empty());
        assert!(!council().is_empty());
        assert!(!notices().is_empty());
    }

    #[test]
    fn test_placeholder_ids_are_flagged() {
        for item in gallery() {
            assert!(is_placeholder_id(&item.id));
        }
        assert!(is_placeholder_id(&notices()[0].id));
        assert!(!is_placeholder_id("doc-1"));
    }

    #[test]
    fn test_placeholder_binaries_carry_no_delete_handle() {
        assert!(awards()[0].image.delete_handle.is_none());
        assert!(journals()[0].pdf.delete_handle.is_none());
    }
}
