// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account repository.
//!
//! Each account is one JSON file under `tables/accounts/`. Emails are stored
//! already normalized; lookups compare them byte for byte.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::super::paths::ACCOUNTS_TABLE;
use super::super::{FileStorage, StorageError, StorageResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredAccount {
    pub id: Uuid,
    /// NFKC, trimmed, lower-cased.
    pub email: String,
    /// Base64 salt.
    pub salt: String,
    /// Base64 Argon2id digest of the password.
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
}

pub struct AccountRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> AccountRepository<'a> {
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    pub fn get(&self, id: &Uuid) -> StorageResult<StoredAccount> {
        let path = self.storage.paths().row(ACCOUNTS_TABLE, &id.to_string());
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Account {id}")));
        }
        self.storage.read_json(path)
    }

    pub fn find_by_email(&self, email: &str) -> StorageResult<Option<StoredAccount>> {
        Ok(self.list_all()?.into_iter().find(|a| a.email == email))
    }

    /// Fails with `AlreadyExists` when the email is taken.
    pub fn create(&self, account: &StoredAccount) -> StorageResult<()> {
        if self.find_by_email(&account.email)?.is_some() {
            return Err(StorageError::AlreadyExists(format!(
                "Account {}",
                account.email
            )));
        }
        self.storage.write_json(
            self.storage.paths().row(ACCOUNTS_TABLE, &account.id.to_string()),
            account,
        )
    }

    pub fn list_all(&self) -> StorageResult<Vec<StoredAccount>> {
        let ids = self
            .storage
            .list_files(self.storage.paths().table_dir(ACCOUNTS_TABLE), "json")?;

        let mut accounts = Vec::with_capacity(ids.len());
        for id in ids {
            let path = self.storage.paths().row(ACCOUNTS_TABLE, &id);
            accounts.push(self.storage.read_json(path)?);
        }
        Ok(accounts)
    }
}
