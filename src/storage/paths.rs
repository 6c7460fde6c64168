// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path utilities for the on-disk storage layout.

use std::path::{Path, PathBuf};

/// Default root directory, relative to the working directory.
pub const DATA_ROOT: &str = "./data";

pub const ACCOUNTS_TABLE: &str = "accounts";
pub const KYC_TABLE: &str = "kyc_verifications";
pub const KYB_TABLE: &str = "kyb_verifications";
pub const DOCUMENTS_TABLE: &str = "verification_documents";

pub const TABLES: [&str; 4] = [ACCOUNTS_TABLE, KYC_TABLE, KYB_TABLE, DOCUMENTS_TABLE];

/// Bucket policy file kept at the root of every bucket.
pub const BUCKET_POLICY_FILE: &str = ".bucket.json";

#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Table Paths ==========

    pub fn tables_dir(&self) -> PathBuf {
        self.root.join("tables")
    }

    pub fn table_dir(&self, table: &str) -> PathBuf {
        self.tables_dir().join(table)
    }

    /// One JSON file per row.
    pub fn row(&self, table: &str, id: &str) -> PathBuf {
        self.table_dir(table).join(format!("{id}.json"))
    }

    // ========== Bucket Paths ==========

    pub fn buckets_dir(&self) -> PathBuf {
        self.root.join("buckets")
    }

    pub fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.buckets_dir().join(bucket)
    }

    pub fn bucket_policy(&self, bucket: &str) -> PathBuf {
        self.bucket_dir(bucket).join(BUCKET_POLICY_FILE)
    }

    /// Object path inside a bucket. `object` must already be sanitized.
    pub fn object(&self, bucket: &str, object: &str) -> PathBuf {
        self.bucket_dir(bucket).join(object)
    }
}
