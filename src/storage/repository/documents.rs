// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Document metadata rows (`verification_documents`).

use uuid::Uuid;

use super::super::paths::DOCUMENTS_TABLE;
use super::super::{FileStorage, StorageError, StorageResult};
use crate::gateway::DocumentRow;

pub struct DocumentRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> DocumentRepository<'a> {
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    pub fn insert(&self, row: &DocumentRow) -> StorageResult<()> {
        let path = self.storage.paths().row(DOCUMENTS_TABLE, &row.id.to_string());
        if self.storage.exists(&path) {
            return Err(StorageError::AlreadyExists(format!("Document {}", row.id)));
        }
        self.storage.write_json(path, row)
    }

    /// Documents attached to one verification, oldest first.
    pub fn list_for_verification(&self, verification_id: &Uuid) -> StorageResult<Vec<DocumentRow>> {
        let ids = self
            .storage
            .list_files(self.storage.paths().table_dir(DOCUMENTS_TABLE), "json")?;

        let mut rows = Vec::new();
        for id in ids {
            let row: DocumentRow = self
                .storage
                .read_json(self.storage.paths().row(DOCUMENTS_TABLE, &id))?;
            if row.verification_id() == Some(*verification_id) {
                rows.push(row);
            }
        }
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }
}
