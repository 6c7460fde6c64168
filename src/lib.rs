// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Verify - KYC/KYB Verification Service
//!
//! Guides signed-in users through an individual (KYC) or business (KYB)
//! verification wizard, validates every step, and submits the collected
//! record and documents to the verification store.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Email/password accounts and bearer sessions
//! - `gateway` - Submission of a finished wizard to the backend
//! - `i18n` - English and French message catalogs
//! - `status` - Verification status lookup and route gating
//! - `storage` - File-backed tables and document buckets
//! - `validation` - Field format rules
//! - `wizard` - KYC and KYB wizard state machines

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod i18n;
pub mod models;
pub mod state;
pub mod status;
pub mod storage;
pub mod validation;
pub mod wizard;
