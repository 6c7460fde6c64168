// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Email + password accounts with opaque bearer sessions.
//!
//! ## Auth Flow
//!
//! 1. `POST /v1/auth/sign-up` or `/v1/auth/sign-in` returns a session token
//! 2. Client sends `Authorization: Bearer <token>`
//! 3. The [`Auth`] extractor resolves the token against the in-memory
//!    [`SessionStore`] and yields the [`AuthenticatedUser`]
//!
//! ## Security
//!
//! - Emails are NFKC-normalized, trimmed and lower-cased before storage
//! - Passwords are stored as an Argon2id digest with a random salt, compared
//!   in constant time
//! - Sign-ups are serialized so a duplicate email is always refused
//! - Sessions live in memory only and do not survive a restart

pub mod error;
pub mod extractor;
pub mod password;
pub mod session;
pub mod user;

pub use error::AuthError;
pub use extractor::{Auth, OptionalAuth};
pub use session::{AuthService, SessionStore};
pub use user::AuthenticatedUser;
