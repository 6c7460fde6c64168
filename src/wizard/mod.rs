// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Verification Wizards
//!
//! One generic state machine ([`Wizard`]) drives both flows. Each flow
//! contributes a typed draft record implementing [`Draft`] and a declarative
//! [`WizardSchema`] listing its steps and field rules.
//!
//! ## Flows
//!
//! | Kind | Steps |
//! |------|-------|
//! | KYC  | personal info → identity document → selfie → wallet → submitted |
//! | KYB  | company → address → legal representative → documents → wallet → submitted |
//!
//! The last data-entry step hands a [`Submission`] to the caller instead of
//! advancing; the caller runs the submission gateway and reports the result
//! back with [`Wizard::complete_submission`].

pub mod kyb;
pub mod kyc;
pub mod machine;
pub mod progress;
pub mod schema;
pub mod session;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::gateway::Submission;
use crate::models::{UploadedDocument, VerificationKind};

pub use kyb::{KybDraft, KybSlot, KybUpdate};
pub use kyc::{KycDraft, KycSlot, KycUpdate};
pub use machine::{NextOutcome, Wizard, WizardError, WizardStep};
pub use progress::SimulatedProgress;
pub use schema::{FieldErrors, RuleContext, WizardSchema};
pub use session::{AnyWizard, WizardSnapshot};

/// Typed in-memory record collected by one wizard.
pub trait Draft: Clone + fmt::Debug + Serialize + Send + Sync + 'static {
    /// Tagged `{field, value}` edit of a single non-file field.
    type Update: DeserializeOwned;
    /// Document slot identifier.
    type Slot: DeserializeOwned + Copy;

    const KIND: VerificationKind;

    fn schema() -> &'static WizardSchema<Self>;

    /// Empty draft, pre-filled with the signed-in user's email when known.
    fn prefilled(email: Option<&str>) -> Self;

    /// Apply an edit and return the name of the field it changed.
    fn apply(&mut self, update: Self::Update) -> &'static str;

    /// Set or clear a document slot and return the slot's field name.
    fn attach(&mut self, slot: Self::Slot, document: Option<UploadedDocument>) -> &'static str;

    /// Non-file fields plus every document slot, for the submission gateway.
    fn submission(&self) -> Submission;
}
