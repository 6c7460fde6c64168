// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::i18n::Locale;
use crate::state::AppState;

/// Optional `?lang=` selector shared by endpoints that return messages.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LangQuery {
    pub lang: Option<Locale>,
}

impl LangQuery {
    pub fn resolve(&self, state: &AppState) -> Locale {
        self.lang.unwrap_or(state.config.default_locale)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TranslationResponse {
    pub locale: Locale,
    pub key: String,
    /// Translated text, or the key itself when the catalog lacks it.
    pub text: String,
}

#[utoipa::path(
    get,
    path = "/v1/i18n/{locale}/{key}",
    tag = "I18n",
    params(
        ("locale" = String, Path, description = "Locale code (en or fr)"),
        ("key" = String, Path, description = "Message key")
    ),
    responses(
        (status = 200, description = "Translated message", body = TranslationResponse),
        (status = 404, description = "Unsupported locale"),
    )
)]
pub async fn translate(
    State(state): State<AppState>,
    Path((locale, key)): Path<(String, String)>,
) -> Result<Json<TranslationResponse>, ApiError> {
    let locale: Locale = locale.parse().map_err(ApiError::not_found)?;
    let text = state.translator.translate(locale, &key).to_string();
    Ok(Json(TranslationResponse { locale, key, text }))
}
