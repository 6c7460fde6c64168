// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! File-backed implementation of [`VerificationBackend`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::repository::{DocumentRepository, VerificationRepository};
use super::{FileStorage, StorageError};
use crate::gateway::{BackendError, DocumentRow, NewVerification, VerificationBackend, VerificationRecord};
use crate::models::{UploadedDocument, VerificationKind};
use crate::validation::{ACCEPTED_MIME_TYPES, MAX_DOCUMENT_SIZE};

/// Message returned when an object path is already taken.
pub const OBJECT_EXISTS_MESSAGE: &str = "The resource already exists";

/// Policy recorded when a bucket is created. Limits are informational; the
/// wizard enforces them on attach.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketPolicy {
    pub name: String,
    pub public: bool,
    pub file_size_limit: u64,
    pub allowed_mime_types: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl BucketPolicy {
    fn private(name: &str) -> Self {
        Self {
            name: name.to_string(),
            public: false,
            file_size_limit: MAX_DOCUMENT_SIZE,
            allowed_mime_types: ACCEPTED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
            created_at: Utc::now(),
        }
    }
}

impl From<StorageError> for BackendError {
    fn from(e: StorageError) -> Self {
        BackendError::new(e.to_string())
    }
}

/// Reject names that could escape their directory.
fn check_name(name: &str) -> Result<(), BackendError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(BackendError::new(format!("Invalid path component: {name:?}")));
    }
    Ok(())
}

/// Object paths are relative, `/`-separated, with no empty, `.` or `..`
/// components.
fn check_object_path(path: &str) -> Result<(), BackendError> {
    path.split('/').try_for_each(check_name)
}

#[derive(Clone)]
pub struct LocalBackend {
    storage: Arc<FileStorage>,
}

impl LocalBackend {
    pub fn new(storage: Arc<FileStorage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    pub fn bucket_policy(&self, bucket: &str) -> Result<Option<BucketPolicy>, BackendError> {
        check_name(bucket)?;
        let path = self.storage.paths().bucket_policy(bucket);
        if !self.storage.exists(&path) {
            return Ok(None);
        }
        Ok(Some(self.storage.read_json(path)?))
    }
}

#[async_trait]
impl VerificationBackend for LocalBackend {
    async fn insert_verification(
        &self,
        user_id: &str,
        record: &NewVerification,
    ) -> Result<VerificationRecord, BackendError> {
        let row = VerificationRepository::new(&self.storage).insert(user_id, record)?;
        Ok(row.record())
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<(), BackendError> {
        if self.bucket_policy(bucket)?.is_some() {
            return Ok(());
        }
        self.storage.write_json(
            self.storage.paths().bucket_policy(bucket),
            &BucketPolicy::private(bucket),
        )?;
        info!(bucket, "Created storage bucket");
        Ok(())
    }

    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        document: &UploadedDocument,
    ) -> Result<String, BackendError> {
        check_name(bucket)?;
        check_object_path(path)?;

        let target = self.storage.paths().object(bucket, path);
        if self.storage.exists(&target) {
            return Err(BackendError::new(OBJECT_EXISTS_MESSAGE));
        }
        self.storage.write_raw(&target, &document.content)?;
        debug!(bucket, path, size = document.size, "Stored object");
        Ok(path.to_string())
    }

    async fn insert_document(&self, row: &DocumentRow) -> Result<(), BackendError> {
        DocumentRepository::new(&self.storage).insert(row)?;
        Ok(())
    }

    async fn latest_verification(
        &self,
        user_id: &str,
        kind: VerificationKind,
    ) -> Result<Option<VerificationRecord>, BackendError> {
        let latest = VerificationRepository::new(&self.storage).latest_for_user(user_id, kind)?;
        Ok(latest.map(|row| row.record()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use crate::gateway::{Attachment, KybFields, Submission, SubmissionGateway};
    use crate::models::{CompanyType, WalletAddress};
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn backend() -> (LocalBackend, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(StoragePaths::new(dir.path()));
        storage.initialize().unwrap();
        (LocalBackend::new(Arc::new(storage)), dir)
    }

    fn pdf() -> UploadedDocument {
        UploadedDocument::new("kbis.pdf", "application/pdf", b"%PDF".to_vec())
    }

    #[test]
    fn object_paths_cannot_escape_bucket() {
        assert!(check_object_path("u/r/selfie/me.png").is_ok());
        for bad in ["../etc/passwd", "/abs", "u//x", "u/./x", "u/..", "a\\b", ""] {
            assert!(check_object_path(bad).is_err(), "{bad:?}");
        }
    }

    #[tokio::test]
    async fn ensure_bucket_is_idempotent() {
        let (backend, _dir) = backend();
        assert!(backend.bucket_policy("verifications").unwrap().is_none());

        backend.ensure_bucket("verifications").await.unwrap();
        let policy = backend.bucket_policy("verifications").unwrap().unwrap();
        assert!(!policy.public);
        assert_eq!(policy.file_size_limit, MAX_DOCUMENT_SIZE);
        assert_eq!(policy.allowed_mime_types.len(), 3);

        backend.ensure_bucket("verifications").await.unwrap();
        assert_eq!(
            backend.bucket_policy("verifications").unwrap().unwrap(),
            policy
        );
    }

    #[tokio::test]
    async fn upload_refuses_existing_object_and_traversal() {
        let (backend, _dir) = backend();
        backend.ensure_bucket("verifications").await.unwrap();

        let stored = backend
            .upload_object("verifications", "u/r/registration/kbis.pdf", &pdf())
            .await
            .unwrap();
        assert_eq!(stored, "u/r/registration/kbis.pdf");
        assert_eq!(
            backend
                .storage()
                .read_raw(backend.storage().paths().object("verifications", &stored))
                .unwrap(),
            b"%PDF"
        );

        let again = backend
            .upload_object("verifications", "u/r/registration/kbis.pdf", &pdf())
            .await
            .unwrap_err();
        assert_eq!(again.message, OBJECT_EXISTS_MESSAGE);

        assert!(backend
            .upload_object("verifications", "u/../../escape.pdf", &pdf())
            .await
            .is_err());
        assert!(backend
            .upload_object("../outside", "x.pdf", &pdf())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn gateway_over_local_backend_persists_everything() {
        let (backend, _dir) = backend();
        let backend = Arc::new(backend);
        let gateway = SubmissionGateway::new(backend.clone(), "verifications");
        let user = AuthenticatedUser {
            user_id: "user-1".into(),
            email: "ceo@example.com".into(),
        };

        let submission = Submission {
            record: NewVerification::Kyb(KybFields {
                company_name: "Relational SAS".into(),
                registration_number: "RCS-123456".into(),
                vat_number: String::new(),
                incorporation_date: "2020-03-01".into(),
                company_type: CompanyType::Llc,
                street_address: "10 rue de Rivoli".into(),
                city: "Paris".into(),
                postal_code: "75001".into(),
                country: "FR".into(),
                legal_rep_first_name: "Grace".into(),
                legal_rep_last_name: "Hopper".into(),
                legal_rep_position: "President".into(),
                legal_rep_email: "ceo@example.com".into(),
                legal_rep_phone: "+33123456789".into(),
                wallet_address: WalletAddress::from("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12"),
            }),
            attachments: vec![
                Attachment {
                    document_type: "registration",
                    document: Some(pdf()),
                },
                Attachment {
                    document_type: "financial",
                    document: None,
                },
            ],
        };

        let record = gateway.submit(Some(&user), submission).await.unwrap();

        let latest = backend
            .latest_verification("user-1", VerificationKind::Kyb)
            .await
            .unwrap();
        assert_eq!(latest, Some(record.clone()));

        let documents = DocumentRepository::new(backend.storage())
            .list_for_verification(&record.id)
            .unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(
            documents[0].file_path,
            format!("user-1/{}/registration/kbis.pdf", record.id)
        );
        assert!(backend.bucket_policy("verifications").unwrap().is_some());
    }
}
