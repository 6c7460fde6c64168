// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::gateway::{BackendError, SubmissionError};
use crate::storage::StorageError;
use crate::wizard::WizardError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Machine-readable reason, when the client can act on it.
    pub code: Option<&'static str>,
    /// Where the client should navigate instead.
    pub redirect: Option<&'static str>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
            redirect: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_redirect(mut self, to: &'static str) -> Self {
        self.redirect = Some(to);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code,
            redirect: self.redirect,
        });
        (self.status, body).into_response()
    }
}

impl From<WizardError> for ApiError {
    fn from(e: WizardError) -> Self {
        let message = e.to_string();
        match e {
            WizardError::Busy => Self::conflict(message).with_code("busy"),
            WizardError::Finished => Self::conflict(message).with_code("finished"),
            WizardError::AtFirstStep => Self::conflict(message).with_code("at_first_step"),
            WizardError::NotSubmitting => Self::conflict(message).with_code("not_submitting"),
            WizardError::UnknownField(_) => Self::unprocessable(message).with_code("unknown_field"),
            WizardError::InvalidValue { .. } => {
                Self::unprocessable(message).with_code("invalid_value")
            }
            WizardError::DocumentRejected(rejection) => {
                Self::unprocessable(message).with_code(rejection.code())
            }
        }
    }
}

impl From<SubmissionError> for ApiError {
    fn from(e: SubmissionError) -> Self {
        match e {
            SubmissionError::Unauthenticated => {
                Self::unauthorized(e.user_message()).with_code("unauthenticated")
            }
            other => Self::bad_gateway(other.user_message()).with_code("submission_failed"),
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(e: BackendError) -> Self {
        error!(error = %e, "Backend request failed");
        Self::bad_gateway(e.message)
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        error!(error = %e, "Storage failure");
        Self::internal("Storage error")
    }
}
