// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verification status query and route gate.
//!
//! A user gets one verification, of either kind. Once a KYC or KYB record
//! exists the wizards are closed and the user is sent back to the landing
//! page. The gate is a routing policy; the backend itself does not prevent
//! duplicate records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;
use crate::gateway::{BackendError, VerificationBackend};
use crate::models::{VerificationKind, VerificationState};

/// Landing page path, the target of every redirect.
pub const LANDING: &str = "/";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VerificationStatus {
    pub has_kyc: bool,
    pub has_kyb: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kyc_status: Option<VerificationState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kyb_status: Option<VerificationState>,
}

impl VerificationStatus {
    pub fn has_any(&self) -> bool {
        self.has_kyc || self.has_kyb
    }
}

/// Both kinds are queried concurrently; each query returns the most recent
/// record of its kind.
pub async fn fetch_status(
    backend: &dyn VerificationBackend,
    user_id: &str,
) -> Result<VerificationStatus, BackendError> {
    let (kyc, kyb) = tokio::try_join!(
        backend.latest_verification(user_id, VerificationKind::Kyc),
        backend.latest_verification(user_id, VerificationKind::Kyb),
    )?;

    Ok(VerificationStatus {
        has_kyc: kyc.is_some(),
        has_kyb: kyb.is_some(),
        kyc_status: kyc.map(|r| r.status),
        kyb_status: kyb.map(|r| r.status),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Kyc,
    Kyb,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => LANDING,
            Route::Kyc => "/kyc",
            Route::Kyb => "/kyb",
        }
    }

    /// Wizard served by this route, if any.
    pub fn wizard(&self) -> Option<VerificationKind> {
        match self {
            Route::Landing => None,
            Route::Kyc => Some(VerificationKind::Kyc),
            Route::Kyb => Some(VerificationKind::Kyb),
        }
    }
}

impl From<VerificationKind> for Route {
    fn from(kind: VerificationKind) -> Self {
        match kind {
            VerificationKind::Kyc => Route::Kyc,
            VerificationKind::Kyb => Route::Kyb,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_end_matches('/') {
            "" => Ok(Route::Landing),
            "/kyc" => Ok(Route::Kyc),
            "/kyb" => Ok(Route::Kyb),
            other => Err(format!("unknown route: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RouteDecision {
    Render,
    Redirect { to: &'static str },
}

/// Decide whether `route` may be shown. `status` is ignored for anonymous
/// users and for the landing page.
pub fn gate(
    route: Route,
    user: Option<&AuthenticatedUser>,
    status: &VerificationStatus,
) -> RouteDecision {
    let Some(kind) = route.wizard() else {
        return RouteDecision::Render;
    };
    if user.is_none() {
        return RouteDecision::Redirect { to: LANDING };
    }

    let wrong_wizard = match kind {
        VerificationKind::Kyc => status.has_kyb,
        VerificationKind::Kyb => status.has_kyc,
    };
    if status.has_any() || wrong_wizard {
        return RouteDecision::Redirect { to: LANDING };
    }
    RouteDecision::Render
}
