// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to file storage.
//!
//! Each repository borrows the [`FileStorage`](super::FileStorage) and owns
//! the rows of one table.

pub mod accounts;
pub mod documents;
pub mod verifications;

pub use accounts::{AccountRepository, StoredAccount};
pub use documents::DocumentRepository;
pub use verifications::{StoredVerification, VerificationRepository};
