// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Kind-erased wizard used by the HTTP session registry.
//!
//! Handlers only see field names and JSON values; [`AnyWizard`] turns them
//! into the typed edits of the underlying [`Wizard`].

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use super::machine::{NextOutcome, Wizard, WizardError, WizardStep};
use super::schema::{FieldErrors, RuleContext};
use super::Draft;
use crate::models::{FieldUpdateRequest, UploadedDocument, VerificationKind};

/// Serializable view of a wizard at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct WizardSnapshot {
    pub kind: VerificationKind,
    pub step: u8,
    pub total_steps: u8,
    pub title_key: &'static str,
    pub submitted: bool,
    pub submitting: bool,
    pub touched: BTreeSet<&'static str>,
    pub errors: FieldErrors,
    pub notice: Option<&'static str>,
    pub draft: Value,
}

pub trait AnyWizard: Send + Sync {
    fn kind(&self) -> VerificationKind;

    fn is_submitting(&self) -> bool;

    fn update_json(
        &mut self,
        request: FieldUpdateRequest,
        ctx: &RuleContext,
    ) -> Result<(), WizardError>;

    fn attach_named(
        &mut self,
        slot: &str,
        document: UploadedDocument,
        ctx: &RuleContext,
    ) -> Result<(), WizardError>;

    fn detach_named(&mut self, slot: &str, ctx: &RuleContext) -> Result<(), WizardError>;

    fn blur(&mut self, field: &str, ctx: &RuleContext) -> Result<(), WizardError>;

    fn next(&mut self, ctx: &RuleContext) -> Result<NextOutcome, WizardError>;

    fn complete_submission(&mut self, succeeded: bool) -> Result<(), WizardError>;

    fn back(&mut self) -> Result<u8, WizardError>;

    fn snapshot(&self) -> WizardSnapshot;
}

fn parse_slot<S: DeserializeOwned>(slot: &str) -> Result<S, WizardError> {
    serde_json::from_value(Value::String(slot.to_string()))
        .map_err(|_| WizardError::UnknownField(slot.to_string()))
}

impl<D: Draft> AnyWizard for Wizard<D> {
    fn kind(&self) -> VerificationKind {
        D::KIND
    }

    fn is_submitting(&self) -> bool {
        Wizard::is_submitting(self)
    }

    fn update_json(
        &mut self,
        request: FieldUpdateRequest,
        ctx: &RuleContext,
    ) -> Result<(), WizardError> {
        let field = request.field;
        let tagged = json!({ "field": field, "value": request.value });
        let update: D::Update =
            serde_json::from_value(tagged).map_err(|e| WizardError::InvalidValue {
                field: field.clone(),
                reason: e.to_string(),
            })?;
        self.update(update, ctx)
    }

    fn attach_named(
        &mut self,
        slot: &str,
        document: UploadedDocument,
        ctx: &RuleContext,
    ) -> Result<(), WizardError> {
        self.attach(parse_slot(slot)?, document, ctx)
    }

    fn detach_named(&mut self, slot: &str, ctx: &RuleContext) -> Result<(), WizardError> {
        self.detach(parse_slot(slot)?, ctx)
    }

    fn blur(&mut self, field: &str, ctx: &RuleContext) -> Result<(), WizardError> {
        Wizard::blur(self, field, ctx)
    }

    fn next(&mut self, ctx: &RuleContext) -> Result<NextOutcome, WizardError> {
        Wizard::next(self, ctx)
    }

    fn complete_submission(&mut self, succeeded: bool) -> Result<(), WizardError> {
        Wizard::complete_submission(self, succeeded)
    }

    fn back(&mut self) -> Result<u8, WizardError> {
        Wizard::back(self)
    }

    fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            kind: D::KIND,
            step: self.step_number(),
            total_steps: self.total_steps(),
            title_key: self.title_key(),
            submitted: self.step() == WizardStep::Submitted,
            submitting: self.is_submitting(),
            touched: self.touched().clone(),
            errors: self.errors().clone(),
            notice: self.notice(),
            draft: serde_json::to_value(self.draft()).unwrap_or(Value::Null),
        }
    }
}

/// New boxed wizard of `kind`, pre-filled with the user's email.
pub fn new_wizard(kind: VerificationKind, email: Option<&str>) -> Box<dyn AnyWizard> {
    match kind {
        VerificationKind::Kyc => Box::new(Wizard::<super::KycDraft>::for_user(email)),
        VerificationKind::Kyb => Box::new(Wizard::<super::KybDraft>::for_user(email)),
    }
}
