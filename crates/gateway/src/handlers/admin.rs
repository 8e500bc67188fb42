//! Admin panel handlers
//!
//! Every route requires a JWT session. Each request builds a panel
//! over the shared store clients; deletes and edits list the
//! collection first so the panel's mirror carries the record (and its
//! binary delete handle) being operated on.

use crate::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use portal_common::{
    auth::Session,
    errors::{AppError, Result},
    model::{
        Award, AwardDraft, AwardSchema, CollectionSchema, CouncilDraft, CouncilMember,
        CouncilPatch, CouncilSchema, GalleryDraft, GalleryImage, GallerySchema, Journal,
        JournalDraft, JournalSchema, Member, MemberDraft, MemberSchema, Notice, NoticeDraft,
        NoticeSchema,
    },
    panel::{FilePayload, UploadLimits},
    Panel,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

fn panel<S: CollectionSchema>(state: &AppState) -> Panel<S> {
    Panel::new(
        state.docs.clone(),
        state.objects.clone(),
        UploadLimits::from(&state.config.uploads),
    )
}

async fn list<S: CollectionSchema>(state: &AppState) -> Result<Json<Vec<S::Record>>> {
    let mut panel = panel::<S>(state);
    let records = panel.list().await?;
    Ok(Json(records.to_vec()))
}

async fn remove<S: CollectionSchema>(state: &AppState, id: &str, confirm: bool) -> Result<StatusCode> {
    // Confirmation gates everything, including the mirror fetch.
    if !confirm {
        return Err(AppError::ConfirmationRequired);
    }
    let mut panel = panel::<S>(state);
    panel.list().await?;
    panel.remove(id, true).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Split a multipart body into its text fields and the `file` part
async fn read_upload(
    mut multipart: Multipart,
) -> Result<(serde_json::Map<String, serde_json::Value>, Option<FilePayload>)> {
    let mut fields = serde_json::Map::new();
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| AppError::Validation {
        message: format!("malformed multipart body: {}", e),
        field: None,
    })? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let filename = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation {
                    message: format!("failed to read file part: {}", e),
                    field: Some("file".to_string()),
                })?
                .to_vec();
            file = Some(FilePayload {
                bytes,
                content_type,
                filename,
            });
        } else {
            let text = field.text().await.map_err(|e| AppError::Validation {
                message: format!("failed to read field {}: {}", name, e),
                field: Some(name.clone()),
            })?;
            fields.insert(name, serde_json::Value::String(text));
        }
    }

    Ok((fields, file))
}

fn draft_from_fields<D: DeserializeOwned>(
    fields: serde_json::Map<String, serde_json::Value>,
) -> Result<D> {
    serde_json::from_value(serde_json::Value::Object(fields)).map_err(|e| AppError::Validation {
        message: format!("invalid form fields: {}", e),
        field: None,
    })
}

// Awards

pub async fn list_awards(
    State(state): State<AppState>,
    _session: Session,
) -> Result<Json<Vec<Award>>> {
    list::<AwardSchema>(&state).await
}

pub async fn add_award(
    State(state): State<AppState>,
    _session: Session,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Award>)> {
    let (fields, file) = read_upload(multipart).await?;
    let draft: AwardDraft = draft_from_fields(fields)?;
    let record = panel::<AwardSchema>(&state).add(&draft, file).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn remove_award(
    State(state): State<AppState>,
    _session: Session,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<StatusCode> {
    remove::<AwardSchema>(&state, &id, query.confirm).await
}

// Gallery

pub async fn list_gallery(
    State(state): State<AppState>,
    _session: Session,
) -> Result<Json<Vec<GalleryImage>>> {
    list::<GallerySchema>(&state).await
}

pub async fn add_gallery_image(
    State(state): State<AppState>,
    _session: Session,
    multipart: Multipart,
) -> Result<(StatusCode, Json<GalleryImage>)> {
    let (fields, file) = read_upload(multipart).await?;
    let draft: GalleryDraft = draft_from_fields(fields)?;
    let record = panel::<GallerySchema>(&state).add(&draft, file).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn remove_gallery_image(
    State(state): State<AppState>,
    _session: Session,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<StatusCode> {
    remove::<GallerySchema>(&state, &id, query.confirm).await
}

// Journals

pub async fn list_journals(
    State(state): State<AppState>,
    _session: Session,
) -> Result<Json<Vec<Journal>>> {
    list::<JournalSchema>(&state).await
}

pub async fn add_journal(
    State(state): State<AppState>,
    _session: Session,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Journal>)> {
    let (fields, file) = read_upload(multipart).await?;
    let draft: JournalDraft = draft_from_fields(fields)?;
    let record = panel::<JournalSchema>(&state).add(&draft, file).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn remove_journal(
    State(state): State<AppState>,
    _session: Session,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<StatusCode> {
    remove::<JournalSchema>(&state, &id, query.confirm).await
}

// Members

pub async fn list_members(
    State(state): State<AppState>,
    _session: Session,
) -> Result<Json<Vec<Member>>> {
    list::<MemberSchema>(&state).await
}

pub async fn add_member(
    State(state): State<AppState>,
    _session: Session,
    Json(draft): Json<MemberDraft>,
) -> Result<(StatusCode, Json<Member>)> {
    let record = panel::<MemberSchema>(&state).add(&draft, None).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn remove_member(
    State(state): State<AppState>,
    _session: Session,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<StatusCode> {
    remove::<MemberSchema>(&state, &id, query.confirm).await
}

// Council

pub async fn list_council(
    State(state): State<AppState>,
    _session: Session,
) -> Result<Json<Vec<CouncilMember>>> {
    list::<CouncilSchema>(&state).await
}

pub async fn add_council_member(
    State(state): State<AppState>,
    _session: Session,
    Json(draft): Json<CouncilDraft>,
) -> Result<(StatusCode, Json<CouncilMember>)> {
    let record = panel::<CouncilSchema>(&state).add(&draft, None).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// The single edit operation in the system
pub async fn edit_council_member(
    State(state): State<AppState>,
    _session: Session,
    Path(id): Path<String>,
    Json(patch): Json<CouncilPatch>,
) -> Result<Json<CouncilMember>> {
    let mut panel = panel::<CouncilSchema>(&state);
    panel.list().await?;
    let updated = panel.edit(&id, &patch).await?;
    Ok(Json(updated))
}

pub async fn remove_council_member(
    State(state): State<AppState>,
    _session: Session,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<StatusCode> {
    remove::<CouncilSchema>(&state, &id, query.confirm).await
}

// Notices

pub async fn list_notices(
    State(state): State<AppState>,
    _session: Session,
) -> Result<Json<Vec<Notice>>> {
    list::<NoticeSchema>(&state).await
}

pub async fn add_notice(
    State(state): State<AppState>,
    _session: Session,
    Json(draft): Json<NoticeDraft>,
) -> Result<(StatusCode, Json<Notice>)> {
    let record = panel::<NoticeSchema>(&state).add(&draft, None).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn remove_notice(
    State(state): State<AppState>,
    _session: Session,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<StatusCode> {
    remove::<NoticeSchema>(&state, &id, query.confirm).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use portal_common::{
        auth::{JwtManager, MemoryAuthProvider, Principal},
        config::AppConfig,
        model::{CouncilStatus, MembershipCategory},
        store::{MemoryDocumentStore, MemoryObjectStore},
    };
    use serde_json::json;
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn test_state(docs: Arc<MemoryDocumentStore>) -> AppState {
        AppState {
            config: Arc::new(AppConfig::default()),
            docs,
            objects: Arc::new(MemoryObjectStore::new()),
            auth: Arc::new(MemoryAuthProvider::new()),
            jwt: Arc::new(JwtManager::new("test_secret", 3600)),
        }
    }

    fn session() -> Session {
        Session {
            principal: Principal {
                id: "user-1".into(),
                email: "admin@example.org".into(),
            },
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
            membership_type: MembershipCategory::Student,
        }
    }

    #[tokio::test]
    async fn test_admin_routes_require_a_session() {
        let state = test_state(Arc::new(MemoryDocumentStore::new()));
        let app = crate::create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/admin/members")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_add_member_persists_and_returns_record() {
        let docs = Arc::new(MemoryDocumentStore::new());
        let state = test_state(docs.clone());

        let (status, Json(member)) =
            add_member(State(state), session(), Json(member_draft()))
                .await
                .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(member.membership_type, "Student Member");
        assert_eq!(docs.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_remove_without_confirm_is_rejected_before_any_store_call() {
        let docs = Arc::new(MemoryDocumentStore::new());
        let id = docs.seed(
            "member",
            json!({
                "name": "Dr. A",
                "designation": "Professor",
                "organisation": "College",
                "address": "Road",
                "mobile": "9800000000",
                "email": "a@college.edu",
                "membership_type": "Student Member",
            }),
        );
        let state = test_state(docs.clone());

        let err = remove_member(
            State(state),
            session(),
            Path(id),
            Query(DeleteQuery { confirm: false }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::ConfirmationRequired));
        assert_eq!(docs.list_calls(), 0);
        assert_eq!(docs.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_remove_with_confirm_deletes() {
        let docs = Arc::new(MemoryDocumentStore::new());
        let id = docs.seed(
            "council",
            json!({
                "name": "Prof. B",
                "designation": "Secretary",
                "period_of_service": "2020-2024",
                "status": "current",
            }),
        );
        let state = test_state(docs.clone());

        let status = remove_council_member(
            State(state),
            session(),
            Path(id),
            Query(DeleteQuery { confirm: true }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(docs.delete_calls(), 1);
    }

    #[tokio::test]
    async fn test_edit_council_member_applies_patch() {
        let docs = Arc::new(MemoryDocumentStore::new());
        let id = docs.seed(
            "council",
            json!({
                "name": "Prof. B",
                "designation": "Secretary",
                "period_of_service": "2020-2024",
                "status": "current",
            }),
        );
        let state = test_state(docs.clone());

        let patch = CouncilPatch {
            status: Some(CouncilStatus::Past),
            ..Default::default()
        };
        let Json(updated) = edit_council_member(State(state), session(), Path(id), Json(patch))
            .await
            .unwrap();

        assert_eq!(updated.status, CouncilStatus::Past);
        assert_eq!(docs.update_calls(), 1);
    }

    #[test]
    fn test_draft_from_fields_surfaces_missing_fields() {
        let mut fields = serde_json::Map::new();
        fields.insert("name".into(), json!("A. Winner"));

        let err = draft_from_fields::<AwardDraft>(fields).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
