// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account endpoints: sign-up, sign-in and sign-out.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{extractor::bearer_token, Auth, AuthError, AuthenticatedUser};
use crate::auth::session::Session;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Bearer token for the `Authorization` header.
    pub token: Uuid,
    pub user: AuthenticatedUser,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            user: session.user,
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/sign-up",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Account created and signed in", body = SessionResponse),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Invalid email or password too short"),
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AuthError> {
    let session = state.auth.sign_up(&request.email, &request.password).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

#[utoipa::path(
    post,
    path = "/v1/auth/sign-in",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 401, description = "Invalid login credentials"),
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<SessionResponse>, AuthError> {
    let session = state.auth.sign_in(&request.email, &request.password).await?;
    Ok(Json(session.into()))
}

#[utoipa::path(
    post,
    path = "/v1/auth/sign-out",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Missing or invalid session"),
    )
)]
pub async fn sign_out(
    State(state): State<AppState>,
    Auth(user): Auth,
    headers: HeaderMap,
) -> Result<StatusCode, AuthError> {
    let token = bearer_token(&headers)?;
    state.auth.sign_out(&token).await?;
    info!(user_id = %user.user_id, "Signed out");
    Ok(StatusCode::NO_CONTENT)
}
