// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The user behind a valid session.
///
/// Passed explicitly to the submission gateway and the route gate.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Account id (UUID string), used as the owner of verification records
    /// and as the first segment of document paths.
    pub user_id: String,
    /// Normalized account email.
    pub email: String,
}
