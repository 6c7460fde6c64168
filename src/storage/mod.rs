// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Local stand-in for the hosted backend: relational tables as one JSON file
//! per row, and object storage buckets as plain directories.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   tables/
//!     accounts/{id}.json
//!     kyc_verifications/{id}.json
//!     kyb_verifications/{id}.json
//!     verification_documents/{id}.json
//!   buckets/
//!     {bucket}/.bucket.json                    # bucket policy
//!     {bucket}/{user}/{record}/{type}/{file}   # uploaded documents
//! ```
//!
//! Nothing here enforces uniqueness of verifications per user; that is the
//! route gate's job.

pub mod backend;
pub mod local_fs;
pub mod paths;
pub mod repository;

pub use backend::LocalBackend;
pub use local_fs::{FileStorage, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use repository::{
    AccountRepository, DocumentRepository, StoredAccount, StoredVerification,
    VerificationRepository,
};
