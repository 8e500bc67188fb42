//! Sign-in, sign-up and sign-out handlers
//!
//! Successful sign-in/sign-up issues a JWT session token; admin
//! handlers decode it per request. Sign-out is client-side token
//! disposal, so the endpoint only notifies the provider.

use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use portal_common::{
    auth::{Principal, Session},
    errors::Result,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub identifier: String,
    pub secret: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub principal: Principal,
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<SessionResponse>> {
    let principal = state
        .auth
        .sign_in(&request.identifier, &request.secret)
        .await?;
    let token = state.jwt.issue_token(&principal)?;

    tracing::info!(principal = %principal.id, "signed in");
    Ok(Json(SessionResponse { token, principal }))
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let principal = state
        .auth
        .sign_up(&request.identifier, &request.secret)
        .await?;
    let token = state.jwt.issue_token(&principal)?;

    tracing::info!(principal = %principal.id, "account created");
    Ok((StatusCode::CREATED, Json(SessionResponse { token, principal })))
}

pub async fn sign_out(State(state): State<AppState>, session: Session) -> Result<StatusCode> {
    state.auth.sign_out(&session.principal).await?;
    tracing::info!(principal = %session.principal.id, "signed out");
    Ok(StatusCode::NO_CONTENT)
}
