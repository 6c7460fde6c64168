// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Rows exchanged with the verification backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{
    CompanyType, IdentityDocumentType, UploadedDocument, VerificationKind, VerificationState,
    WalletAddress,
};

/// Non-file fields of an individual verification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct KycFields {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub email: String,
    pub phone: String,
    pub document_type: IdentityDocumentType,
    pub document_number: String,
    pub document_expiry: String,
    pub wallet_address: WalletAddress,
}

/// Non-file fields of a business verification.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct KybFields {
    pub company_name: String,
    pub registration_number: String,
    pub vat_number: String,
    pub incorporation_date: String,
    pub company_type: CompanyType,
    pub street_address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub legal_rep_first_name: String,
    pub legal_rep_last_name: String,
    pub legal_rep_position: String,
    pub legal_rep_email: String,
    pub legal_rep_phone: String,
    pub wallet_address: WalletAddress,
}

/// Relational insert for a new verification. The tag selects the table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NewVerification {
    Kyc(KycFields),
    Kyb(KybFields),
}

impl NewVerification {
    pub fn kind(&self) -> VerificationKind {
        match self {
            NewVerification::Kyc(_) => VerificationKind::Kyc,
            NewVerification::Kyb(_) => VerificationKind::Kyb,
        }
    }
}

/// One named document slot; `None` slots are skipped on upload.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub document_type: &'static str,
    pub document: Option<UploadedDocument>,
}

/// Everything the gateway needs from a validated draft.
#[derive(Debug, Clone)]
pub struct Submission {
    pub record: NewVerification,
    pub attachments: Vec<Attachment>,
}

impl Submission {
    pub fn present_attachments(&self) -> impl Iterator<Item = (&'static str, &UploadedDocument)> {
        self.attachments
            .iter()
            .filter_map(|a| a.document.as_ref().map(|doc| (a.document_type, doc)))
    }
}

/// Persisted verification as returned by the insert.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct VerificationRecord {
    pub id: Uuid,
    pub user_id: String,
    pub kind: VerificationKind,
    pub status: VerificationState,
    pub created_at: DateTime<Utc>,
}

/// Metadata row for an uploaded document. Exactly one parent id is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentRow {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kyc_verification_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kyb_verification_id: Option<Uuid>,
    pub document_type: String,
    pub file_path: String,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

impl DocumentRow {
    pub fn new(
        record: &VerificationRecord,
        document_type: &str,
        file_path: String,
        document: &UploadedDocument,
    ) -> Self {
        let (kyc_verification_id, kyb_verification_id) = match record.kind {
            VerificationKind::Kyc => (Some(record.id), None),
            VerificationKind::Kyb => (None, Some(record.id)),
        };
        Self {
            id: Uuid::new_v4(),
            kyc_verification_id,
            kyb_verification_id,
            document_type: document_type.to_string(),
            file_path,
            file_name: document.file_name.clone(),
            file_size: document.size,
            mime_type: document.mime_type.clone(),
            created_at: Utc::now(),
        }
    }

    pub fn verification_id(&self) -> Option<Uuid> {
        self.kyc_verification_id.or(self.kyb_verification_id)
    }
}
