// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Shared Data Models
//!
//! Types shared between the wizard, the submission gateway and the REST API.
//! Request/response types derive `ToSchema` for the OpenAPI document.
//!
//! ## Model Categories
//!
//! - **Wallet address**: reward address collected on the last wizard step
//! - **Documents**: files attached to a draft before submission
//! - **Verification kinds**: individual (KYC) or business (KYB)

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Wallet Address Type
// =============================================================================

/// Ethereum-compatible wallet address wrapper.
///
/// Format: `0x` followed by 40 hexadecimal characters (20 bytes). The wrapper
/// does not validate; see [`crate::validation::validate_evm_address`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub struct WalletAddress(pub String);

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WalletAddress {
    fn from(value: String) -> Self {
        WalletAddress(value)
    }
}

impl From<&str> for WalletAddress {
    fn from(value: &str) -> Self {
        WalletAddress(value.to_string())
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

// =============================================================================
// Verification Kinds
// =============================================================================

/// Which verification flow a wizard or record belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VerificationKind {
    /// Individual verification.
    Kyc,
    /// Business verification.
    Kyb,
}

impl VerificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationKind::Kyc => "kyc",
            VerificationKind::Kyb => "kyb",
        }
    }
}

impl fmt::Display for VerificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kyc" => Ok(VerificationKind::Kyc),
            "kyb" => Ok(VerificationKind::Kyb),
            other => Err(format!("unknown verification kind: {other}")),
        }
    }
}

/// Review state of a persisted verification record.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VerificationState {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl VerificationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationState::Pending => "pending",
            VerificationState::Approved => "approved",
            VerificationState::Rejected => "rejected",
        }
    }
}

/// Identity document presented for individual verification.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdentityDocumentType {
    #[default]
    IdCard,
    Passport,
}

impl IdentityDocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityDocumentType::IdCard => "id_card",
            IdentityDocumentType::Passport => "passport",
        }
    }
}

/// Legal form of a business.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompanyType {
    #[default]
    Llc,
    Corporation,
}

// =============================================================================
// Documents
// =============================================================================

/// A file selected by the user, held in the draft until submission.
///
/// The bytes are shared so that snapshots of a draft taken for submission do
/// not copy document contents. They are never serialized.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UploadedDocument {
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
    #[serde(skip)]
    pub content: Arc<[u8]>,
}

impl UploadedDocument {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            size: content.len() as u64,
            content: content.into(),
        }
    }
}

/// Request body for attaching a document to a wizard slot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentUploadRequest {
    /// Original file name (used in the storage path).
    pub file_name: String,
    /// MIME type reported by the browser.
    pub mime_type: String,
    /// File contents, standard base64.
    pub content_base64: String,
}

/// Request body for a single field edit.
///
/// `field` is the snake_case field name; `value` its new value (string for
/// text fields, enum tag for select fields).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FieldUpdateRequest {
    pub field: String,
    #[schema(value_type = Object)]
    pub value: serde_json::Value,
}
