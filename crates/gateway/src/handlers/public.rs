//! Public read-only page handlers
//!
//! No auth and no mutation. When the document store is unreachable or
//! a collection is empty the response degrades to the built-in
//! placeholder set, flagged as such, so the public site never renders
//! an empty region.

use crate::AppState;
use axum::{extract::State, Json};
use portal_common::{
    metrics::record_placeholder,
    model::{
        Award, CollectionSchema, CouncilMember, CouncilStatus, GalleryImage, Journal, Member,
        MembershipCategory, Notice, NoticeCategory,
    },
    panel::{
        grouping::{group_by, GroupedRecords},
        UploadLimits,
    },
    placeholder, Panel,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct PublicList<R> {
    /// True when the records come from the built-in placeholder set
    pub placeholder: bool,
    pub records: Vec<R>,
}

#[derive(Serialize)]
pub struct PublicGroups<R> {
    pub placeholder: bool,
    pub groups: GroupedRecords<R>,
}

/// Fetch a collection for public display; `None` means fall back to
/// the placeholder set
async fn fetch<S: CollectionSchema>(state: &AppState) -> Option<Vec<S::Record>> {
    let mut panel: Panel<S> = Panel::new(
        state.docs.clone(),
        state.objects.clone(),
        UploadLimits::from(&state.config.uploads),
    );
    match panel.list().await {
        Ok(records) if !records.is_empty() => Some(records.to_vec()),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(
                collection = S::COLLECTION,
                error = %e,
                "public fetch failed, serving placeholder data"
            );
            None
        }
    }
}

fn list_or_placeholder<S: CollectionSchema>(
    fetched: Option<Vec<S::Record>>,
    fallback: Vec<S::Record>,
) -> PublicList<S::Record> {
    match fetched {
        Some(records) => PublicList {
            placeholder: false,
            records,
        },
        None => {
            record_placeholder(S::COLLECTION);
            PublicList {
                placeholder: true,
                records: fallback,
            }
        }
    }
}

pub async fn awards(State(state): State<AppState>) -> Json<PublicList<Award>> {
    use portal_common::model::AwardSchema;
    let fetched = fetch::<AwardSchema>(&state).await;
    Json(list_or_placeholder::<AwardSchema>(fetched, placeholder::awards()))
}

pub async fn gallery(State(state): State<AppState>) -> Json<PublicList<GalleryImage>> {
    use portal_common::model::GallerySchema;
    let fetched = fetch::<GallerySchema>(&state).await;
    Json(list_or_placeholder::<GallerySchema>(fetched, placeholder::gallery()))
}

pub async fn journals(State(state): State<AppState>) -> Json<PublicList<Journal>> {
    use portal_common::model::JournalSchema;
    let fetched = fetch::<JournalSchema>(&state).await;
    Json(list_or_placeholder::<JournalSchema>(fetched, placeholder::journals()))
}

/// Members grouped by membership tier
pub async fn members(State(state): State<AppState>) -> Json<PublicGroups<Member>> {
    use portal_common::model::MemberSchema;
    let (placeholder, records) = match fetch::<MemberSchema>(&state).await {
        Some(records) => (false, records),
        None => {
            record_placeholder(MemberSchema::COLLECTION);
            (true, placeholder::members())
        }
    };

    let tiers: Vec<&str> = MembershipCategory::ALL.iter().map(|c| c.as_str()).collect();
    let groups = group_by(&records, &tiers, |m: &Member| m.membership_type.as_str());
    Json(PublicGroups { placeholder, groups })
}

fn council_status(member: &CouncilMember) -> &'static str {
    match member.status {
        CouncilStatus::Current => "current",
        CouncilStatus::Past => "past",
    }
}

/// Council grouped into current and past members
pub async fn council(State(state): State<AppState>) -> Json<PublicGroups<CouncilMember>> {
    use portal_common::model::CouncilSchema;
    let (placeholder, records) = match fetch::<CouncilSchema>(&state).await {
        Some(records) => (false, records),
        None => {
            record_placeholder(CouncilSchema::COLLECTION);
            (true, placeholder::council())
        }
    };

    let groups = group_by(&records, &["current", "past"], |m| council_status(m));
    Json(PublicGroups { placeholder, groups })
}

/// Notices grouped by category
pub async fn notices(State(state): State<AppState>) -> Json<PublicGroups<Notice>> {
    use portal_common::model::NoticeSchema;
    let (placeholder, records) = match fetch::<NoticeSchema>(&state).await {
        Some(records) => (false, records),
        None => {
            record_placeholder(NoticeSchema::COLLECTION);
            (true, placeholder::notices())
        }
    };

    let categories: Vec<&str> = NoticeCategory::ALL.iter().map(|c| c.as_str()).collect();
    let groups = group_by(&records, &categories, |n: &Notice| n.category.as_str());
    Json(PublicGroups { placeholder, groups })
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_common::{
        auth::{JwtManager, MemoryAuthProvider},
        config::AppConfig,
        store::{MemoryDocumentStore, MemoryObjectStore, StoreError},
    };
    use serde_json::json;
    use std::sync::Arc;

    fn test_state(docs: Arc<MemoryDocumentStore>) -> AppState {
        AppState {
            config: Arc::new(AppConfig::default()),
            docs,
            objects: Arc::new(MemoryObjectStore::new()),
            auth: Arc::new(MemoryAuthProvider::new()),
            jwt: Arc::new(JwtManager::new("test_secret", 3600)),
        }
    }

    #[tokio::test]
    async fn test_empty_collection_serves_placeholder() {
        let docs = Arc::new(MemoryDocumentStore::new());
        let state = test_state(docs);

        let Json(response) = gallery(State(state)).await;
        assert!(response.placeholder);
        assert!(!response.records.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_store_serves_placeholder() {
        let docs = Arc::new(MemoryDocumentStore::new());
        docs.fail_next_list(StoreError::Unavailable {
            message: "down".into(),
        });
        let state = test_state(docs);

        let Json(response) = awards(State(state)).await;
        assert!(response.placeholder);
        assert!(!response.records.is_empty());
    }

    #[tokio::test]
    async fn test_populated_collection_is_not_flagged() {
        let docs = Arc::new(MemoryDocumentStore::new());
        docs.seed(
            "gallery",
            json!({"heading": "Convocation", "image": {"url": "https://cdn.example/g/1.jpg"}}),
        );
        let state = test_state(docs);

        let Json(response) = gallery(State(state)).await;
        assert!(!response.placeholder);
        assert_eq!(response.records.len(), 1);
    }

    #[tokio::test]
    async fn test_notices_group_unknown_category_as_uncategorized() {
        let docs = Arc::new(MemoryDocumentStore::new());
        docs.seed(
            "news_announcement",
            json!({
                "title": "AGM",
                "content": "Annual general meeting",
                "category": "General Notices",
                "date": "2024-03-01",
            }),
        );
        docs.seed(
            "news_announcement",
            json!({
                "title": "Old notice",
                "content": "From a retired category",
                "category": "Legacy Bulletins",
                "date": "2019-01-01",
            }),
        );
        let state = test_state(docs);

        let Json(response) = notices(State(state)).await;
        assert!(!response.placeholder);
        assert_eq!(response.groups.bucket("General Notices").unwrap().len(), 1);
        assert_eq!(response.groups.uncategorized.len(), 1);
        assert_eq!(response.groups.uncategorized[0].title, "Old notice");
    }

    #[tokio::test]
    async fn test_council_groups_by_status() {
        let docs = Arc::new(MemoryDocumentStore::new());
        docs.seed(
            "council",
            json!({
                "name": "Prof. A",
                "designation": "President",
                "period_of_service": "2023-2027",
                "status": "current",
            }),
        );
        docs.seed(
            "council",
            json!({
                "name": "Prof. B",
                "designation": "President",
                "period_of_service": "2019-2023",
                "status": "past",
            }),
        );
        let state = test_state(docs);

        let Json(response) = council(State(state)).await;
        assert_eq!(response.groups.bucket("current").unwrap().len(), 1);
        assert_eq!(response.groups.bucket("past").unwrap().len(), 1);
        assert!(response.groups.uncategorized.is_empty());
    }
}
