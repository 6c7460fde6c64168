// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Submission Gateway
//!
//! Persists a validated draft against the verification backend:
//!
//! 1. Insert the verification row (fails fast, no retry).
//! 2. Make sure the document bucket exists.
//! 3. Upload every attached document concurrently to
//!    `{user_id}/{record_id}/{document_type}/{file_name}` and insert a metadata
//!    row for each. The first failure fails the whole submission.
//!
//! There is no rollback: a failed upload leaves the `pending` row (and any
//! documents already stored) in place, and a retry inserts a new row.

pub mod records;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::{info, warn};

use crate::auth::AuthenticatedUser;
use crate::models::{UploadedDocument, VerificationKind};

pub use records::{
    Attachment, DocumentRow, KybFields, KycFields, NewVerification, Submission,
    VerificationRecord,
};

/// Default object storage bucket for verification documents.
pub const DEFAULT_BUCKET: &str = "verifications";

/// Shown when the backend gave no usable message.
pub const FALLBACK_MESSAGE: &str = "Failed to submit verification";

/// Error reported by the backend, message kept verbatim for the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Relational tables plus object storage used by the gateway and the
/// verification status query.
#[async_trait]
pub trait VerificationBackend: Send + Sync {
    /// Insert a row with status `pending` and return it with its new id.
    async fn insert_verification(
        &self,
        user_id: &str,
        record: &NewVerification,
    ) -> Result<VerificationRecord, BackendError>;

    /// Create the bucket if it does not exist yet.
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), BackendError>;

    /// Store a document and return the stored object path.
    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        document: &UploadedDocument,
    ) -> Result<String, BackendError>;

    async fn insert_document(&self, row: &DocumentRow) -> Result<(), BackendError>;

    /// Most recent verification of `kind` for the user, if any.
    async fn latest_verification(
        &self,
        user_id: &str,
        kind: VerificationKind,
    ) -> Result<Option<VerificationRecord>, BackendError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("No authenticated user")]
    Unauthenticated,

    #[error("{0}")]
    Insert(BackendError),

    #[error("{0}")]
    Storage(BackendError),

    #[error("{source}")]
    Upload {
        document_type: &'static str,
        #[source]
        source: BackendError,
    },
}

impl SubmissionError {
    /// Message for the notification channel: the backend's own text when it
    /// has one, otherwise the generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::Unauthenticated => FALLBACK_MESSAGE.to_string(),
            SubmissionError::Insert(e)
            | SubmissionError::Storage(e)
            | SubmissionError::Upload { source: e, .. } => {
                if e.message.trim().is_empty() {
                    FALLBACK_MESSAGE.to_string()
                } else {
                    e.message.clone()
                }
            }
        }
    }
}

/// Object path of a document: `{user}/{record}/{type}/{file}`.
pub fn document_path(
    user_id: &str,
    record: &VerificationRecord,
    document_type: &str,
    file_name: &str,
) -> String {
    format!("{user_id}/{}/{document_type}/{file_name}", record.id)
}

#[derive(Clone)]
pub struct SubmissionGateway {
    backend: Arc<dyn VerificationBackend>,
    bucket: String,
}

impl SubmissionGateway {
    pub fn new(backend: Arc<dyn VerificationBackend>, bucket: impl Into<String>) -> Self {
        Self {
            backend,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Submit a validated draft on behalf of `user`.
    pub async fn submit(
        &self,
        user: Option<&AuthenticatedUser>,
        submission: Submission,
    ) -> Result<VerificationRecord, SubmissionError> {
        let user = user.ok_or(SubmissionError::Unauthenticated)?;
        let kind = submission.record.kind();

        let record = self
            .backend
            .insert_verification(&user.user_id, &submission.record)
            .await
            .map_err(|e| {
                warn!(user_id = %user.user_id, %kind, error = %e, "Verification insert failed");
                SubmissionError::Insert(e)
            })?;

        info!(
            user_id = %user.user_id,
            record_id = %record.id,
            %kind,
            "Created verification record"
        );

        self.backend
            .ensure_bucket(&self.bucket)
            .await
            .map_err(SubmissionError::Storage)?;

        let uploads = submission
            .present_attachments()
            .map(|(document_type, document)| {
                self.upload_document(user, &record, document_type, document)
            });
        let uploaded = try_join_all(uploads).await?;

        info!(
            record_id = %record.id,
            documents = uploaded.len(),
            "Verification submitted"
        );
        Ok(record)
    }

    async fn upload_document(
        &self,
        user: &AuthenticatedUser,
        record: &VerificationRecord,
        document_type: &'static str,
        document: &UploadedDocument,
    ) -> Result<DocumentRow, SubmissionError> {
        let upload_error = |source: BackendError| {
            warn!(
                record_id = %record.id,
                document_type,
                error = %source,
                "Document upload failed"
            );
            SubmissionError::Upload {
                document_type,
                source,
            }
        };

        let path = document_path(&user.user_id, record, document_type, &document.file_name);
        let stored = self
            .backend
            .upload_object(&self.bucket, &path, document)
            .await
            .map_err(upload_error)?;

        let row = DocumentRow::new(record, document_type, stored, document);
        self.backend
            .insert_document(&row)
            .await
            .map_err(upload_error)?;
        Ok(row)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeBackend;
    use super::*;
    use crate::models::{IdentityDocumentType, WalletAddress};

    fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: "user-1".into(),
            email: "ada@example.com".into(),
        }
    }

    fn submission() -> Submission {
        Submission {
            record: NewVerification::Kyc(KycFields {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                date_of_birth: "1990-12-10".into(),
                email: "ada@example.com".into(),
                phone: "+33612345678".into(),
                document_type: IdentityDocumentType::IdCard,
                document_number: "X1234567".into(),
                document_expiry: "2031-05-01".into(),
                wallet_address: WalletAddress::from("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12"),
            }),
            attachments: vec![
                Attachment {
                    document_type: "id_front",
                    document: Some(UploadedDocument::new("front.png", "image/png", vec![1; 4])),
                },
                Attachment {
                    document_type: "id_back",
                    document: Some(UploadedDocument::new("back.png", "image/png", vec![2; 8])),
                },
                Attachment {
                    document_type: "passport_page",
                    document: None,
                },
            ],
        }
    }

    fn gateway(backend: &Arc<FakeBackend>) -> SubmissionGateway {
        SubmissionGateway::new(backend.clone(), DEFAULT_BUCKET)
    }

    #[tokio::test]
    async fn inserts_record_then_uploads_present_documents() {
        let backend = Arc::new(FakeBackend::default());
        let record = gateway(&backend)
            .submit(Some(&user()), submission())
            .await
            .expect("submission succeeds");

        assert_eq!(backend.record_count(), 1);
        assert_eq!(record.kind, VerificationKind::Kyc);

        let objects = backend.objects.lock().unwrap();
        assert_eq!(objects.len(), 2);
        let front = format!("verifications/user-1/{}/id_front/front.png", record.id);
        assert_eq!(objects.get(&front), Some(&4));

        let documents = backend.documents.lock().unwrap();
        assert_eq!(documents.len(), 2);
        assert!(documents
            .iter()
            .all(|d| d.kyc_verification_id == Some(record.id)));
    }

    #[tokio::test]
    async fn missing_user_blocks_before_any_backend_call() {
        let backend = Arc::new(FakeBackend::default());
        let err = gateway(&backend).submit(None, submission()).await.unwrap_err();

        assert_eq!(err, SubmissionError::Unauthenticated);
        assert_eq!(err.user_message(), FALLBACK_MESSAGE);
        assert_eq!(backend.record_count(), 0);
    }

    #[tokio::test]
    async fn insert_failure_surfaces_backend_message() {
        let backend = Arc::new(FakeBackend::default());
        *backend.fail_insert.lock().unwrap() =
            Some("duplicate key value violates unique constraint".into());

        let err = gateway(&backend)
            .submit(Some(&user()), submission())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::Insert(_)));
        assert_eq!(
            err.user_message(),
            "duplicate key value violates unique constraint"
        );
        assert!(backend.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_backend_message_uses_fallback() {
        let backend = Arc::new(FakeBackend::default());
        *backend.fail_insert.lock().unwrap() = Some(String::new());

        let err = gateway(&backend)
            .submit(Some(&user()), submission())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn upload_failure_leaves_orphan_and_retry_duplicates_record() {
        let backend = Arc::new(FakeBackend::default());
        backend.fail_uploads_of(Some("back.png"));
        let gateway = gateway(&backend);

        let err = gateway
            .submit(Some(&user()), submission())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SubmissionError::Upload {
                document_type: "id_back",
                ..
            }
        ));
        assert_eq!(err.user_message(), "The resource already exists");
        assert_eq!(backend.record_count(), 1);

        backend.fail_uploads_of(None);
        let retried = gateway
            .submit(Some(&user()), submission())
            .await
            .expect("retry succeeds");

        let records = backend.records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_ne!(records[0].0.id, retried.id);
        assert!(records
            .iter()
            .all(|(r, _)| r.status == crate::models::VerificationState::Pending));
    }

    #[test]
    fn document_path_layout() {
        let record = VerificationRecord {
            id: uuid::Uuid::nil(),
            user_id: "u".into(),
            kind: VerificationKind::Kyb,
            status: Default::default(),
            created_at: chrono::Utc::now(),
        };
        assert_eq!(
            document_path("u", &record, "articles", "statuts.pdf"),
            "u/00000000-0000-0000-0000-000000000000/articles/statuts.pdf"
        );
    }
}
