// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! KYC and KYB verification rows.
//!
//! The two kinds live in separate tables (`kyc_verifications`,
//! `kyb_verifications`). A row stores the record header and the flattened
//! kind-specific fields.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::super::paths::{KYB_TABLE, KYC_TABLE};
use super::super::{FileStorage, StorageError, StorageResult};
use crate::gateway::{NewVerification, VerificationRecord};
use crate::models::{VerificationKind, VerificationState};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredVerification {
    pub id: Uuid,
    pub user_id: String,
    #[serde(default)]
    pub status: VerificationState,
    pub created_at: chrono::DateTime<Utc>,
    #[serde(flatten)]
    pub details: NewVerification,
}

impl StoredVerification {
    pub fn record(&self) -> VerificationRecord {
        VerificationRecord {
            id: self.id,
            user_id: self.user_id.clone(),
            kind: self.details.kind(),
            status: self.status,
            created_at: self.created_at,
        }
    }
}

fn table(kind: VerificationKind) -> &'static str {
    match kind {
        VerificationKind::Kyc => KYC_TABLE,
        VerificationKind::Kyb => KYB_TABLE,
    }
}

pub struct VerificationRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> VerificationRepository<'a> {
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    /// Insert a new `pending` row with a fresh id. Never deduplicates.
    pub fn insert(&self, user_id: &str, details: &NewVerification) -> StorageResult<StoredVerification> {
        let row = StoredVerification {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            status: VerificationState::Pending,
            created_at: Utc::now(),
            details: details.clone(),
        };
        self.storage.write_json(
            self.storage
                .paths()
                .row(table(details.kind()), &row.id.to_string()),
            &row,
        )?;
        Ok(row)
    }

    pub fn get(&self, kind: VerificationKind, id: &Uuid) -> StorageResult<StoredVerification> {
        let path = self.storage.paths().row(table(kind), &id.to_string());
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("{kind} verification {id}")));
        }
        self.storage.read_json(path)
    }

    pub fn list_for_user(
        &self,
        user_id: &str,
        kind: VerificationKind,
    ) -> StorageResult<Vec<StoredVerification>> {
        let ids = self
            .storage
            .list_files(self.storage.paths().table_dir(table(kind)), "json")?;

        let mut rows = Vec::new();
        for id in ids {
            let row: StoredVerification = self
                .storage
                .read_json(self.storage.paths().row(table(kind), &id))?;
            if row.user_id == user_id {
                rows.push(row);
            }
        }
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }

    /// Most recently created row of `kind` for the user.
    pub fn latest_for_user(
        &self,
        user_id: &str,
        kind: VerificationKind,
    ) -> StorageResult<Option<StoredVerification>> {
        Ok(self.list_for_user(user_id, kind)?.pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::KycFields;
    use crate::models::{IdentityDocumentType, WalletAddress};
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn kyc() -> NewVerification {
        NewVerification::Kyc(KycFields {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            date_of_birth: "1990-12-10".into(),
            email: "ada@example.com".into(),
            phone: "+33612345678".into(),
            document_type: IdentityDocumentType::Passport,
            document_number: "P998877".into(),
            document_expiry: "2030-01-01".into(),
            wallet_address: WalletAddress::from("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12"),
        })
    }

    fn storage() -> (FileStorage, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(StoragePaths::new(dir.path()));
        storage.initialize().unwrap();
        (storage, dir)
    }

    #[test]
    fn insert_writes_pending_row_in_kind_table() {
        let (storage, _dir) = storage();
        let repo = VerificationRepository::new(&storage);

        let row = repo.insert("user-1", &kyc()).unwrap();
        assert_eq!(row.status, VerificationState::Pending);
        assert!(storage
            .paths()
            .row(KYC_TABLE, &row.id.to_string())
            .is_file());

        let stored = repo.get(VerificationKind::Kyc, &row.id).unwrap();
        assert_eq!(stored, row);
        assert_eq!(stored.record().kind, VerificationKind::Kyc);
        assert!(matches!(
            repo.get(VerificationKind::Kyb, &row.id),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn latest_for_user_picks_newest_and_filters_user() {
        let (storage, _dir) = storage();
        let repo = VerificationRepository::new(&storage);

        let first = repo.insert("user-1", &kyc()).unwrap();
        let second = repo.insert("user-1", &kyc()).unwrap();
        repo.insert("user-2", &kyc()).unwrap();

        let rows = repo.list_for_user("user-1", VerificationKind::Kyc).unwrap();
        assert_eq!(rows.len(), 2);

        let latest = repo
            .latest_for_user("user-1", VerificationKind::Kyc)
            .unwrap()
            .unwrap();
        assert!(latest.created_at >= first.created_at);
        assert_eq!(latest.id, rows[1].id);
        assert!(latest.id == second.id || latest.created_at == second.created_at);

        assert!(repo
            .latest_for_user("user-1", VerificationKind::Kyb)
            .unwrap()
            .is_none());
    }

    #[test]
    fn stored_row_flattens_fields() {
        let (storage, _dir) = storage();
        let row = VerificationRepository::new(&storage)
            .insert("user-1", &kyc())
            .unwrap();
        let raw: serde_json::Value = storage
            .read_json(storage.paths().row(KYC_TABLE, &row.id.to_string()))
            .unwrap();
        assert_eq!(raw["kind"], "kyc");
        assert_eq!(raw["status"], "pending");
        assert_eq!(raw["document_type"], "passport");
    }
}
