// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wizard endpoints.
//!
//! Each wizard lives in the in-memory registry under a random id and belongs
//! to the user who opened it. Other users get 404 for it.
//!
//! `next` on the last data-entry step submits the draft. The registry lock is
//! released while the gateway runs; the wizard's own submitting flag keeps
//! concurrent `next`/`back` calls out in the meantime.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use base64ct::{Base64, Encoding};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::i18n::LangQuery;
use crate::auth::{Auth, AuthenticatedUser};
use crate::error::ApiError;
use crate::i18n::Locale;
use crate::models::{DocumentUploadRequest, FieldUpdateRequest, UploadedDocument, VerificationKind};
use crate::state::{close_idle_wizards, AppState, WizardSession};
use crate::status::{fetch_status, gate, Route, RouteDecision};
use crate::wizard::session::new_wizard;
use crate::wizard::{NextOutcome, RuleContext, WizardError};

/// A translated message and the key it came from.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Message {
    pub key: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FieldMessage {
    pub field: String,
    pub key: String,
    pub message: String,
}

/// Everything a client needs to render a wizard.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WizardView {
    pub id: Uuid,
    pub kind: VerificationKind,
    /// 1-based step; `total_steps` once submitted.
    pub step: u8,
    pub total_steps: u8,
    pub title_key: String,
    pub title: String,
    pub submitted: bool,
    pub submitting: bool,
    /// Simulated upload progress, 0-100.
    pub progress: u8,
    pub touched: Vec<String>,
    /// Errors of touched fields on the current step.
    pub errors: Vec<FieldMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Message>,
    /// Draft values. Attached documents show name, type and size only.
    #[schema(value_type = Object)]
    pub draft: serde_json::Value,
}

fn render(state: &AppState, locale: Locale, id: Uuid, session: &WizardSession) -> WizardView {
    let snapshot = session.wizard.snapshot();
    let translate = |key: &str| state.translator.translate(locale, key).to_string();

    WizardView {
        id,
        kind: snapshot.kind,
        step: snapshot.step,
        total_steps: snapshot.total_steps,
        title_key: snapshot.title_key.to_string(),
        title: translate(snapshot.title_key),
        submitted: snapshot.submitted,
        submitting: snapshot.submitting,
        progress: session.progress.value(),
        touched: snapshot.touched.iter().map(|f| f.to_string()).collect(),
        errors: snapshot
            .errors
            .iter()
            .map(|(field, key)| FieldMessage {
                field: field.to_string(),
                key: key.to_string(),
                message: translate(key),
            })
            .collect(),
        notice: snapshot.notice.map(|key| Message {
            key: key.to_string(),
            message: translate(key),
        }),
        draft: snapshot.draft,
    }
}

fn not_found() -> ApiError {
    ApiError::not_found("Wizard not found")
}

fn owned_mut<'a>(
    registry: &'a mut HashMap<Uuid, WizardSession>,
    id: &Uuid,
    user: &AuthenticatedUser,
) -> Result<&'a mut WizardSession, ApiError> {
    registry
        .get_mut(id)
        .filter(|session| session.is_owned_by(&user.user_id))
        .ok_or_else(not_found)
}

/// Run `edit` on an owned wizard and render the result.
async fn edit_wizard(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
    locale: Locale,
    edit: impl FnOnce(&mut WizardSession, &RuleContext) -> Result<(), ApiError>,
) -> Result<Json<WizardView>, ApiError> {
    let ctx = RuleContext::now();
    let mut registry = state.wizards.write().await;
    let session = owned_mut(&mut registry, &id, user)?;
    edit(session, &ctx)?;
    Ok(Json(render(state, locale, id, session)))
}

/// Open a new wizard. Users with an existing verification are sent home.
///
/// Opening a wizard replaces the caller's earlier idle wizard of the same
/// kind; its draft is discarded.
#[utoipa::path(
    post,
    path = "/v1/wizards/{kind}",
    tag = "Wizards",
    security(("bearer" = [])),
    params(
        ("kind" = VerificationKind, Path, description = "kyc or kyb"),
        ("lang" = Option<Locale>, Query, description = "Message locale")
    ),
    responses(
        (status = 201, description = "Wizard opened", body = WizardView),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "A verification already exists; see redirect"),
    )
)]
pub async fn create_wizard(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(kind): Path<VerificationKind>,
    Query(lang): Query<LangQuery>,
) -> Result<(StatusCode, Json<WizardView>), ApiError> {
    let status = fetch_status(state.backend.as_ref(), &user.user_id).await?;
    if let RouteDecision::Redirect { to } = gate(Route::from(kind), Some(&user), &status) {
        info!(user_id = %user.user_id, %kind, "Wizard closed by existing verification");
        return Err(ApiError::conflict("A verification already exists for this account")
            .with_code("already_verified")
            .with_redirect(to));
    }

    let id = Uuid::new_v4();
    let session = WizardSession::new(&user.user_id, new_wizard(kind, Some(&user.email)));
    let view = render(&state, lang.resolve(&state), id, &session);

    let replaced = {
        let mut registry = state.wizards.write().await;
        let replaced = close_idle_wizards(&mut registry, &user.user_id, kind);
        registry.insert(id, session);
        replaced
    };

    info!(wizard_id = %id, user_id = %user.user_id, %kind, replaced, "Wizard opened");
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get,
    path = "/v1/wizards/{id}",
    tag = "Wizards",
    security(("bearer" = [])),
    params(
        ("id" = Uuid, Path, description = "Wizard id"),
        ("lang" = Option<Locale>, Query, description = "Message locale")
    ),
    responses(
        (status = 200, description = "Wizard view", body = WizardView),
        (status = 404, description = "Wizard not found"),
    )
)]
pub async fn get_wizard(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<Uuid>,
    Query(lang): Query<LangQuery>,
) -> Result<Json<WizardView>, ApiError> {
    let registry = state.wizards.read().await;
    let session = registry
        .get(&id)
        .filter(|session| session.is_owned_by(&user.user_id))
        .ok_or_else(not_found)?;
    Ok(Json(render(&state, lang.resolve(&state), id, session)))
}

/// Discard the draft. Nothing is persisted. Refused while a submission is
/// in flight.
#[utoipa::path(
    delete,
    path = "/v1/wizards/{id}",
    tag = "Wizards",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Wizard id")),
    responses(
        (status = 204, description = "Wizard discarded"),
        (status = 404, description = "Wizard not found"),
        (status = 409, description = "Submission in progress"),
    )
)]
pub async fn discard_wizard(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut registry = state.wizards.write().await;
    if owned_mut(&mut registry, &id, &user)?.wizard.is_submitting() {
        return Err(WizardError::Busy.into());
    }
    registry.remove(&id);
    info!(wizard_id = %id, "Wizard discarded");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/v1/wizards/{id}/fields",
    tag = "Wizards",
    security(("bearer" = [])),
    params(
        ("id" = Uuid, Path, description = "Wizard id"),
        ("lang" = Option<Locale>, Query, description = "Message locale")
    ),
    request_body = FieldUpdateRequest,
    responses(
        (status = 200, description = "Field updated", body = WizardView),
        (status = 404, description = "Wizard not found"),
        (status = 409, description = "Wizard busy or finished"),
        (status = 422, description = "Unknown field or invalid value"),
    )
)]
pub async fn update_field(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<Uuid>,
    Query(lang): Query<LangQuery>,
    Json(request): Json<FieldUpdateRequest>,
) -> Result<Json<WizardView>, ApiError> {
    let locale = lang.resolve(&state);
    edit_wizard(&state, &user, id, locale, |session, ctx| {
        Ok(session.wizard.update_json(request, ctx)?)
    })
    .await
}

#[utoipa::path(
    post,
    path = "/v1/wizards/{id}/fields/{field}/blur",
    tag = "Wizards",
    security(("bearer" = [])),
    params(
        ("id" = Uuid, Path, description = "Wizard id"),
        ("field" = String, Path, description = "Field name"),
        ("lang" = Option<Locale>, Query, description = "Message locale")
    ),
    responses(
        (status = 200, description = "Field marked touched", body = WizardView),
        (status = 404, description = "Wizard not found"),
        (status = 422, description = "Unknown field"),
    )
)]
pub async fn blur_field(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path((id, field)): Path<(Uuid, String)>,
    Query(lang): Query<LangQuery>,
) -> Result<Json<WizardView>, ApiError> {
    let locale = lang.resolve(&state);
    edit_wizard(&state, &user, id, locale, |session, ctx| {
        Ok(session.wizard.blur(&field, ctx)?)
    })
    .await
}

fn decode_upload(request: DocumentUploadRequest) -> Result<UploadedDocument, ApiError> {
    let file_name = request.file_name.trim();
    if file_name.is_empty() || file_name.contains(['/', '\\', '\0']) || file_name == ".." {
        return Err(ApiError::unprocessable("Invalid file name").with_code("invalid_file_name"));
    }
    let content = Base64::decode_vec(request.content_base64.trim()).map_err(|_| {
        ApiError::unprocessable("Document content is not valid base64").with_code("invalid_base64")
    })?;
    Ok(UploadedDocument::new(file_name, request.mime_type, content))
}

/// Attach a file to a document slot. Type and size are checked immediately.
#[utoipa::path(
    put,
    path = "/v1/wizards/{id}/documents/{slot}",
    tag = "Wizards",
    security(("bearer" = [])),
    params(
        ("id" = Uuid, Path, description = "Wizard id"),
        ("slot" = String, Path, description = "Document slot, e.g. id_front or registration_doc"),
        ("lang" = Option<Locale>, Query, description = "Message locale")
    ),
    request_body = DocumentUploadRequest,
    responses(
        (status = 200, description = "Document attached", body = WizardView),
        (status = 404, description = "Wizard not found"),
        (status = 422, description = "Unknown slot, bad encoding, unsupported type or too large"),
    )
)]
pub async fn attach_document(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path((id, slot)): Path<(Uuid, String)>,
    Query(lang): Query<LangQuery>,
    Json(request): Json<DocumentUploadRequest>,
) -> Result<Json<WizardView>, ApiError> {
    let document = decode_upload(request)?;
    let locale = lang.resolve(&state);
    edit_wizard(&state, &user, id, locale, |session, ctx| {
        Ok(session.wizard.attach_named(&slot, document, ctx)?)
    })
    .await
}

#[utoipa::path(
    delete,
    path = "/v1/wizards/{id}/documents/{slot}",
    tag = "Wizards",
    security(("bearer" = [])),
    params(
        ("id" = Uuid, Path, description = "Wizard id"),
        ("slot" = String, Path, description = "Document slot"),
        ("lang" = Option<Locale>, Query, description = "Message locale")
    ),
    responses(
        (status = 200, description = "Document removed", body = WizardView),
        (status = 404, description = "Wizard not found"),
        (status = 422, description = "Unknown slot"),
    )
)]
pub async fn detach_document(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path((id, slot)): Path<(Uuid, String)>,
    Query(lang): Query<LangQuery>,
) -> Result<Json<WizardView>, ApiError> {
    let locale = lang.resolve(&state);
    edit_wizard(&state, &user, id, locale, |session, ctx| {
        Ok(session.wizard.detach_named(&slot, ctx)?)
    })
    .await
}

/// Validate the current step and advance, or submit from the last
/// data-entry step.
#[utoipa::path(
    post,
    path = "/v1/wizards/{id}/next",
    tag = "Wizards",
    security(("bearer" = [])),
    params(
        ("id" = Uuid, Path, description = "Wizard id"),
        ("lang" = Option<Locale>, Query, description = "Message locale")
    ),
    responses(
        (status = 200, description = "Advanced or submitted", body = WizardView),
        (status = 404, description = "Wizard not found"),
        (status = 409, description = "Wizard busy or finished"),
        (status = 422, description = "Step has invalid fields", body = WizardView),
        (status = 502, description = "Submission failed"),
    )
)]
pub async fn next_step(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<Uuid>,
    Query(lang): Query<LangQuery>,
) -> Result<(StatusCode, Json<WizardView>), ApiError> {
    let locale = lang.resolve(&state);
    let ctx = RuleContext::now();

    let (submission, progress) = {
        let mut registry = state.wizards.write().await;
        let session = owned_mut(&mut registry, &id, &user)?;
        match session.wizard.next(&ctx)? {
            NextOutcome::Advanced { .. } => {
                return Ok((StatusCode::OK, Json(render(&state, locale, id, session))));
            }
            NextOutcome::Blocked { .. } => {
                return Ok((
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(render(&state, locale, id, session)),
                ));
            }
            NextOutcome::Submit(submission) => {
                session.progress.start();
                (submission, session.progress.clone())
            }
        }
    };

    info!(wizard_id = %id, user_id = %user.user_id, "Submitting verification");
    let result = state.gateway.submit(Some(&user), submission).await;

    let mut registry = state.wizards.write().await;
    let session = registry.get_mut(&id);
    match result {
        Ok(record) => {
            progress.complete();
            info!(wizard_id = %id, record_id = %record.id, "Verification submitted");
            let Some(session) = session else {
                warn!(
                    wizard_id = %id,
                    record_id = %record.id,
                    "Wizard closed while its submission ran; verification kept"
                );
                return Err(ApiError::conflict(
                    "The verification was submitted but its wizard is no longer open",
                )
                .with_code("wizard_closed")
                .with_redirect("/"));
            };
            session.wizard.complete_submission(true)?;
            Ok((StatusCode::OK, Json(render(&state, locale, id, session))))
        }
        Err(e) => {
            progress.fail();
            warn!(wizard_id = %id, error = %e, "Verification submission failed");
            if let Some(session) = session {
                session.wizard.complete_submission(false)?;
            }
            Err(e.into())
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/wizards/{id}/back",
    tag = "Wizards",
    security(("bearer" = [])),
    params(
        ("id" = Uuid, Path, description = "Wizard id"),
        ("lang" = Option<Locale>, Query, description = "Message locale")
    ),
    responses(
        (status = 200, description = "Moved back one step", body = WizardView),
        (status = 404, description = "Wizard not found"),
        (status = 409, description = "At first step, busy or finished"),
    )
)]
pub async fn previous_step(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<Uuid>,
    Query(lang): Query<LangQuery>,
) -> Result<Json<WizardView>, ApiError> {
    let locale = lang.resolve(&state);
    edit_wizard(&state, &user, id, locale, |session, _| {
        session.wizard.back()?;
        Ok(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::storage::{DocumentRepository, VerificationRepository};

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G'];

    struct Harness {
        state: AppState,
        user: AuthenticatedUser,
        _dir: tempfile::TempDir,
    }

    impl Harness {
        async fn new() -> Self {
            let (state, dir) = AppState::for_tests();
            let session = state.auth.sign_up("ada@example.com", "secret1").await.unwrap();
            Self {
                state,
                user: session.user,
                _dir: dir,
            }
        }

        fn lang(&self) -> Query<LangQuery> {
            Query(LangQuery::default())
        }

        async fn open(&self, kind: VerificationKind) -> Result<WizardView, ApiError> {
            create_wizard(
                State(self.state.clone()),
                Auth(self.user.clone()),
                Path(kind),
                self.lang(),
            )
            .await
            .map(|(_, Json(view))| view)
        }

        async fn set(&self, id: Uuid, field: &str, value: serde_json::Value) -> WizardView {
            let Json(view) = update_field(
                State(self.state.clone()),
                Auth(self.user.clone()),
                Path(id),
                self.lang(),
                Json(FieldUpdateRequest {
                    field: field.into(),
                    value,
                }),
            )
            .await
            .unwrap();
            view
        }

        async fn attach(&self, id: Uuid, slot: &str) -> Result<WizardView, ApiError> {
            attach_document(
                State(self.state.clone()),
                Auth(self.user.clone()),
                Path((id, slot.to_string())),
                self.lang(),
                Json(DocumentUploadRequest {
                    file_name: format!("{slot}.png"),
                    mime_type: "image/png".into(),
                    content_base64: Base64::encode_string(PNG),
                }),
            )
            .await
            .map(|Json(view)| view)
        }

        async fn next(&self, id: Uuid) -> Result<(StatusCode, WizardView), ApiError> {
            next_step(
                State(self.state.clone()),
                Auth(self.user.clone()),
                Path(id),
                self.lang(),
            )
            .await
            .map(|(status, Json(view))| (status, view))
        }

        async fn back(&self, id: Uuid) -> Result<WizardView, ApiError> {
            previous_step(
                State(self.state.clone()),
                Auth(self.user.clone()),
                Path(id),
                self.lang(),
            )
            .await
            .map(|Json(view)| view)
        }

        /// Fill a passport KYC up to the wallet step.
        async fn fill_kyc(&self, id: Uuid) {
            self.set(id, "first_name", json!("Ada")).await;
            self.set(id, "last_name", json!("Lovelace")).await;
            self.set(id, "date_of_birth", json!("1990-12-10")).await;
            self.set(id, "phone", json!("+33612345678")).await;
            assert_eq!(self.next(id).await.unwrap().0, StatusCode::OK);

            self.set(id, "document_type", json!("passport")).await;
            self.set(id, "document_number", json!("P1234567")).await;
            self.set(id, "document_expiry", json!("2031-01-01")).await;
            self.attach(id, "passport_page").await.unwrap();
            assert_eq!(self.next(id).await.unwrap().0, StatusCode::OK);

            self.attach(id, "selfie").await.unwrap();
            assert_eq!(self.next(id).await.unwrap().0, StatusCode::OK);

            self.set(id, "wallet_address", json!(format!("0x{}", "ab".repeat(20))))
                .await;
        }
    }

    #[tokio::test]
    async fn open_prefills_email_and_starts_at_step_one() {
        let h = Harness::new().await;
        let view = h.open(VerificationKind::Kyc).await.unwrap();
        assert_eq!(view.step, 1);
        assert_eq!(view.total_steps, 5);
        assert_eq!(view.title_key, "personal.info");
        assert_eq!(view.draft["email"], "ada@example.com");
        assert!(view.errors.is_empty());
    }

    #[tokio::test]
    async fn blocked_next_returns_422_with_translated_errors() {
        let h = Harness::new().await;
        let id = h.open(VerificationKind::Kyc).await.unwrap().id;

        let (status, view) = h.next(id).await.unwrap();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(view.step, 1);
        assert!(view.errors.iter().any(|e| e.field == "first_name"));
        assert_eq!(view.notice.unwrap().key, "fill.required");

        let view = h.set(id, "first_name", json!("Ada")).await;
        assert!(!view.errors.iter().any(|e| e.field == "first_name"));
    }

    #[tokio::test]
    async fn attach_rejects_bad_documents() {
        let h = Harness::new().await;
        let id = h.open(VerificationKind::Kyc).await.unwrap().id;

        let err = attach_document(
            State(h.state.clone()),
            Auth(h.user.clone()),
            Path((id, "selfie".to_string())),
            h.lang(),
            Json(DocumentUploadRequest {
                file_name: "run.exe".into(),
                mime_type: "application/x-msdownload".into(),
                content_base64: Base64::encode_string(b"MZ"),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code, Some("unsupported_type"));

        let err = attach_document(
            State(h.state.clone()),
            Auth(h.user.clone()),
            Path((id, "selfie".to_string())),
            h.lang(),
            Json(DocumentUploadRequest {
                file_name: "me.png".into(),
                mime_type: "image/png".into(),
                content_base64: "***".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, Some("invalid_base64"));

        let err = h.attach(id, "birth_certificate").await.unwrap_err();
        assert_eq!(err.code, Some("unknown_field"));
    }

    #[tokio::test]
    async fn full_kyc_flow_persists_record_and_documents() {
        let h = Harness::new().await;
        let id = h.open(VerificationKind::Kyc).await.unwrap().id;
        h.fill_kyc(id).await;

        let (status, view) = h.next(id).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(view.submitted);
        assert_eq!(view.progress, 100);
        assert_eq!(view.title_key, "verification.submitted");

        let records = VerificationRepository::new(&h.state.storage)
            .list_for_user(&h.user.user_id, VerificationKind::Kyc)
            .unwrap();
        assert_eq!(records.len(), 1);

        let documents = DocumentRepository::new(&h.state.storage)
            .list_for_verification(&records[0].id)
            .unwrap();
        let mut types: Vec<_> = documents.iter().map(|d| d.document_type.as_str()).collect();
        types.sort_unstable();
        assert_eq!(types, ["passport_page", "selfie"]);

        let err = h.back(id).await.unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        let err = h.next(id).await.unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        // Both wizards are now closed to this user.
        for kind in [VerificationKind::Kyc, VerificationKind::Kyb] {
            let err = h.open(kind).await.unwrap_err();
            assert_eq!(err.status, StatusCode::CONFLICT);
            assert_eq!(err.redirect, Some("/"));
        }
    }

    #[tokio::test]
    async fn failed_submission_keeps_step_and_retry_adds_a_record() {
        let h = Harness::new().await;
        let id = h.open(VerificationKind::Kyc).await.unwrap().id;
        h.fill_kyc(id).await;

        // A plain file where the user's object directory should be makes
        // every upload fail after the record row is written.
        let buckets = h.state.storage.paths().bucket_dir("verifications");
        std::fs::create_dir_all(&buckets).unwrap();
        let blocker = buckets.join(&h.user.user_id);
        std::fs::write(&blocker, b"").unwrap();

        let err = h.next(id).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.code, Some("submission_failed"));
        assert!(err.message.starts_with("I/O error"), "{}", err.message);

        let Json(view) = get_wizard(
            State(h.state.clone()),
            Auth(h.user.clone()),
            Path(id),
            h.lang(),
        )
        .await
        .unwrap();
        assert_eq!(view.step, 4);
        assert!(!view.submitted);
        assert!(!view.submitting);
        assert_eq!(view.progress, 0);
        assert_eq!(view.notice.unwrap().key, "verification.failed");

        let records = VerificationRepository::new(&h.state.storage);
        assert_eq!(
            records
                .list_for_user(&h.user.user_id, VerificationKind::Kyc)
                .unwrap()
                .len(),
            1
        );

        std::fs::remove_file(&blocker).unwrap();
        let (status, view) = h.next(id).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(view.submitted);
        assert_eq!(view.progress, 100);
        assert!(view.notice.is_none());

        // The row from the failed attempt is not rolled back.
        assert_eq!(
            records
                .list_for_user(&h.user.user_id, VerificationKind::Kyc)
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn reopening_replaces_the_idle_wizard_of_that_kind() {
        let h = Harness::new().await;
        let first = h.open(VerificationKind::Kyc).await.unwrap().id;
        let kyb = h.open(VerificationKind::Kyb).await.unwrap().id;

        let mut latest = first;
        for _ in 0..50 {
            latest = h.open(VerificationKind::Kyc).await.unwrap().id;
        }

        let registry = h.state.wizards.read().await;
        assert_eq!(registry.len(), 2);
        assert!(registry.contains_key(&latest));
        assert!(registry.contains_key(&kyb));
        assert!(!registry.contains_key(&first));
    }

    #[tokio::test]
    async fn wizard_mid_submission_cannot_be_discarded_or_replaced() {
        let h = Harness::new().await;
        let id = h.open(VerificationKind::Kyc).await.unwrap().id;
        h.fill_kyc(id).await;

        {
            let mut registry = h.state.wizards.write().await;
            let session = registry.get_mut(&id).unwrap();
            let outcome = session.wizard.next(&RuleContext::now()).unwrap();
            assert!(matches!(outcome, NextOutcome::Submit(_)));
        }

        let err = discard_wizard(State(h.state.clone()), Auth(h.user.clone()), Path(id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, Some("busy"));

        let fresh = h.open(VerificationKind::Kyc).await.unwrap().id;
        let registry = h.state.wizards.read().await;
        assert!(registry.contains_key(&id));
        assert!(registry.contains_key(&fresh));
    }

    #[tokio::test]
    async fn back_moves_one_step_and_stops_at_first() {
        let h = Harness::new().await;
        let id = h.open(VerificationKind::Kyc).await.unwrap().id;

        let err = h.back(id).await.unwrap_err();
        assert_eq!(err.code, Some("at_first_step"));

        h.set(id, "first_name", json!("Ada")).await;
        h.set(id, "last_name", json!("Lovelace")).await;
        h.set(id, "date_of_birth", json!("1990-12-10")).await;
        h.set(id, "phone", json!("+33612345678")).await;
        assert_eq!(h.next(id).await.unwrap().1.step, 2);

        let view = h.back(id).await.unwrap();
        assert_eq!(view.step, 1);
        assert_eq!(view.draft["first_name"], "Ada");
    }

    #[tokio::test]
    async fn wizards_are_private_to_their_owner() {
        let h = Harness::new().await;
        let id = h.open(VerificationKind::Kyb).await.unwrap().id;

        let other = h.state.auth.sign_up("eve@example.com", "secret1").await.unwrap();
        let err = get_wizard(
            State(h.state.clone()),
            Auth(other.user.clone()),
            Path(id),
            h.lang(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err = discard_wizard(State(h.state.clone()), Auth(other.user), Path(id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let status = discard_wizard(State(h.state.clone()), Auth(h.user.clone()), Path(id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(h.state.wizards.read().await.is_empty());
    }

    #[tokio::test]
    async fn blur_marks_field_and_shows_french_error() {
        let h = Harness::new().await;
        let id = h.open(VerificationKind::Kyc).await.unwrap().id;
        h.set(id, "phone", json!("12345")).await;

        let Json(view) = blur_field(
            State(h.state.clone()),
            Auth(h.user.clone()),
            Path((id, "phone".to_string())),
            Query(LangQuery {
                lang: Some(Locale::Fr),
            }),
        )
        .await
        .unwrap();
        let error = view.errors.iter().find(|e| e.field == "phone").unwrap();
        assert_eq!(error.key, "phone.format");
        assert_eq!(
            error.message,
            h.state.translator.translate(Locale::Fr, "phone.format")
        );
        assert!(view.touched.contains(&"phone".to_string()));
    }
}
