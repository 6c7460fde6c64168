// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verification status and route gating endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::{Auth, OptionalAuth};
use crate::error::ApiError;
use crate::state::AppState;
use crate::status::{fetch_status, gate, Route, RouteDecision, VerificationStatus};

#[derive(Debug, Deserialize, IntoParams)]
pub struct AccessQuery {
    /// Client route, e.g. `/kyc`.
    pub route: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessResponse {
    pub route: String,
    pub decision: RouteDecision,
}

/// Existing verifications of the current user.
#[utoipa::path(
    get,
    path = "/v1/verification/status",
    tag = "Verification",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Latest KYC and KYB records", body = VerificationStatus),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Status query failed"),
    )
)]
pub async fn get_status(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<VerificationStatus>, ApiError> {
    let status = fetch_status(state.backend.as_ref(), &user.user_id).await?;
    Ok(Json(status))
}

/// Whether the client may render `route`, or where it should go instead.
#[utoipa::path(
    get,
    path = "/v1/routes/access",
    tag = "Verification",
    params(AccessQuery),
    responses(
        (status = 200, description = "Gate decision", body = AccessResponse),
        (status = 404, description = "Unknown route"),
    )
)]
pub async fn route_access(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<AccessQuery>,
) -> Result<Json<AccessResponse>, ApiError> {
    let route: Route = query.route.parse().map_err(ApiError::not_found)?;

    let status = match (&user, route.wizard()) {
        (Some(user), Some(_)) => fetch_status(state.backend.as_ref(), &user.user_id).await?,
        _ => VerificationStatus::default(),
    };

    Ok(Json(AccessResponse {
        route: route.path().to_string(),
        decision: gate(route, user.as_ref(), &status),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use crate::gateway::{KycFields, NewVerification, VerificationBackend};
    use crate::models::{IdentityDocumentType, VerificationState, WalletAddress};
    use axum::http::StatusCode;

    fn kyc_record() -> NewVerification {
        NewVerification::Kyc(KycFields {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            date_of_birth: "1990-12-10".into(),
            email: "ada@example.com".into(),
            phone: "+33612345678".into(),
            document_type: IdentityDocumentType::Passport,
            document_number: "P1234567".into(),
            document_expiry: "2031-01-01".into(),
            wallet_address: WalletAddress(format!("0x{}", "ab".repeat(20))),
        })
    }

    async fn access(state: &AppState, user: Option<AuthenticatedUser>, route: &str) -> RouteDecision {
        let Json(body) = route_access(
            State(state.clone()),
            OptionalAuth(user),
            Query(AccessQuery { route: route.into() }),
        )
        .await
        .unwrap();
        body.decision
    }

    #[tokio::test]
    async fn status_reflects_stored_records() {
        let (state, _dir) = AppState::for_tests();
        let session = state.auth.sign_up("ada@example.com", "secret1").await.unwrap();

        let Json(status) = get_status(State(state.clone()), Auth(session.user.clone()))
            .await
            .unwrap();
        assert!(!status.has_any());

        state
            .backend
            .insert_verification(&session.user.user_id, &kyc_record())
            .await
            .unwrap();

        let Json(status) = get_status(State(state), Auth(session.user)).await.unwrap();
        assert!(status.has_kyc);
        assert!(!status.has_kyb);
        assert_eq!(status.kyc_status, Some(VerificationState::Pending));
    }

    #[tokio::test]
    async fn access_follows_the_gate() {
        let (state, _dir) = AppState::for_tests();
        let session = state.auth.sign_up("ada@example.com", "secret1").await.unwrap();
        let user = Some(session.user.clone());

        assert_eq!(access(&state, None, "/").await, RouteDecision::Render);
        assert_eq!(
            access(&state, None, "/kyc").await,
            RouteDecision::Redirect { to: "/" }
        );
        assert_eq!(access(&state, user.clone(), "/kyb").await, RouteDecision::Render);

        state
            .backend
            .insert_verification(&session.user.user_id, &kyc_record())
            .await
            .unwrap();
        assert_eq!(
            access(&state, user.clone(), "/kyb").await,
            RouteDecision::Redirect { to: "/" }
        );
        assert_eq!(access(&state, user, "/").await, RouteDecision::Render);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (state, _dir) = AppState::for_tests();
        let err = route_access(
            State(state),
            OptionalAuth(None),
            Query(AccessQuery {
                route: "/admin".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
