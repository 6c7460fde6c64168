// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::AuthenticatedUser,
    i18n::Locale,
    models::{
        CompanyType, DocumentUploadRequest, FieldUpdateRequest, IdentityDocumentType,
        VerificationKind, VerificationState, WalletAddress,
    },
    state::AppState,
    status::{RouteDecision, VerificationStatus},
};

pub mod auth;
pub mod health;
pub mod i18n;
pub mod status;
pub mod users;
pub mod wizards;

/// Largest accepted request body. Leaves room for a base64-encoded document
/// somewhat over the 10 MiB limit so that it is rejected with a typed reason.
pub const MAX_REQUEST_BODY: usize = 24 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/sign-up", post(auth::sign_up))
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/sign-out", post(auth::sign_out))
        .route("/users/me", get(users::get_current_user))
        .route("/verification/status", get(status::get_status))
        .route("/routes/access", get(status::route_access))
        .route("/i18n/{locale}/{key}", get(i18n::translate))
        // `{id}` is the verification kind for POST and the wizard id otherwise.
        .route(
            "/wizards/{id}",
            post(wizards::create_wizard)
                .get(wizards::get_wizard)
                .delete(wizards::discard_wizard),
        )
        .route("/wizards/{id}/fields", patch(wizards::update_field))
        .route("/wizards/{id}/fields/{field}/blur", post(wizards::blur_field))
        .route(
            "/wizards/{id}/documents/{slot}",
            put(wizards::attach_document).delete(wizards::detach_document),
        )
        .route("/wizards/{id}/next", post(wizards::next_step))
        .route("/wizards/{id}/back", post(wizards::previous_step))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        auth::sign_up,
        auth::sign_in,
        auth::sign_out,
        users::get_current_user,
        status::get_status,
        status::route_access,
        i18n::translate,
        wizards::create_wizard,
        wizards::get_wizard,
        wizards::discard_wizard,
        wizards::update_field,
        wizards::blur_field,
        wizards::attach_document,
        wizards::detach_document,
        wizards::next_step,
        wizards::previous_step
    ),
    components(
        schemas(
            AuthenticatedUser,
            Locale,
            VerificationKind,
            VerificationState,
            IdentityDocumentType,
            CompanyType,
            WalletAddress,
            FieldUpdateRequest,
            DocumentUploadRequest,
            VerificationStatus,
            RouteDecision,
            auth::CredentialsRequest,
            auth::SessionResponse,
            users::UserMeResponse,
            status::AccessResponse,
            i18n::TranslationResponse,
            health::ReadyResponse,
            health::HealthResponse,
            wizards::WizardView,
            wizards::FieldMessage,
            wizards::Message
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Auth", description = "Email/password accounts and sessions"),
        (name = "Users", description = "Current user"),
        (name = "Verification", description = "Verification status and route gating"),
        (name = "I18n", description = "Message catalogs"),
        (name = "Wizards", description = "KYC and KYB verification wizards")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _dir) = AppState::for_tests();
        let app = router(state);
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }

    #[test]
    fn openapi_lists_wizard_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/v1/wizards/{id}/next"));
        assert!(doc.paths.paths.contains_key("/v1/wizards/{kind}"));
        assert!(doc.paths.paths.contains_key("/health/ready"));
    }
}
