// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Step state machine shared by all verification wizards.

use std::collections::BTreeSet;

use serde::Serialize;

use super::schema::{FieldErrors, RuleContext, StepSchema, WizardSchema};
use super::Draft;
use crate::gateway::Submission;
use crate::models::UploadedDocument;
use crate::validation::{validate_document, DocumentRejection};

/// Notification shown after a failed submission.
pub const SUBMISSION_FAILED_KEY: &str = "verification.failed";

/// Position in the flow. `Submitted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "number", rename_all = "snake_case")]
pub enum WizardStep {
    Entry(u8),
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("A submission is already in progress")]
    Busy,

    #[error("Verification has already been submitted")]
    Finished,

    #[error("Already at the first step")]
    AtFirstStep,

    #[error("No submission is in progress")]
    NotSubmitting,

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("{0}")]
    DocumentRejected(#[from] DocumentRejection),
}

/// Result of a `next` action.
#[derive(Debug)]
pub enum NextOutcome {
    /// Moved to the given data-entry step.
    Advanced { step: u8 },
    /// Stayed put; every field of the step is now touched.
    Blocked {
        errors: FieldErrors,
        notice: &'static str,
    },
    /// Last data-entry step passed. The wizard is now submitting and waits
    /// for [`Wizard::complete_submission`].
    Submit(Submission),
}

/// Generic wizard over a typed draft.
#[derive(Debug, Clone)]
pub struct Wizard<D: Draft> {
    draft: D,
    step: WizardStep,
    touched: BTreeSet<&'static str>,
    errors: FieldErrors,
    notice: Option<&'static str>,
    submitting: bool,
}

impl<D: Draft> Wizard<D> {
    pub fn new(draft: D) -> Self {
        Self {
            draft,
            step: WizardStep::Entry(1),
            touched: BTreeSet::new(),
            errors: FieldErrors::new(),
            notice: None,
            submitting: false,
        }
    }

    pub fn for_user(email: Option<&str>) -> Self {
        Self::new(D::prefilled(email))
    }

    pub fn schema(&self) -> &'static WizardSchema<D> {
        D::schema()
    }

    pub fn draft(&self) -> &D {
        &self.draft
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// 1-based step number; the terminal step is `total_steps()`.
    pub fn step_number(&self) -> u8 {
        match self.step {
            WizardStep::Entry(n) => n,
            WizardStep::Submitted => self.schema().total_steps(),
        }
    }

    pub fn total_steps(&self) -> u8 {
        self.schema().total_steps()
    }

    pub fn title_key(&self) -> &'static str {
        match self.current_step() {
            Some(step) => step.title_key(),
            None => self.schema().submitted_title_key(),
        }
    }

    pub fn touched(&self) -> &BTreeSet<&'static str> {
        &self.touched
    }

    /// Errors currently visible (touched fields only).
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn notice(&self) -> Option<&'static str> {
        self.notice
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_submitted(&self) -> bool {
        self.step == WizardStep::Submitted
    }

    fn current_step(&self) -> Option<&'static StepSchema<D>> {
        match self.step {
            WizardStep::Entry(n) => self.schema().step(n),
            WizardStep::Submitted => None,
        }
    }

    fn ensure_editable(&self) -> Result<(), WizardError> {
        if self.is_submitted() {
            return Err(WizardError::Finished);
        }
        Ok(())
    }

    /// Re-run the current step's rules, keeping errors for touched fields.
    fn revalidate(&mut self, ctx: &RuleContext) {
        let Some(step) = self.current_step() else {
            self.errors.clear();
            return;
        };
        let mut errors = step.validate(&self.draft, ctx);
        errors.retain(|field, _| self.touched.contains(field));
        self.errors = errors;
    }

    fn after_edit(&mut self, field: &'static str, ctx: &RuleContext) {
        if self.touched.contains(field) {
            self.revalidate(ctx);
        }
    }

    /// Apply a field edit. Touched fields are re-validated immediately;
    /// untouched ones wait for blur or `next`.
    pub fn update(&mut self, update: D::Update, ctx: &RuleContext) -> Result<(), WizardError> {
        self.ensure_editable()?;
        let field = self.draft.apply(update);
        self.after_edit(field, ctx);
        Ok(())
    }

    /// Attach a file to a slot. Refused files never enter the draft.
    pub fn attach(
        &mut self,
        slot: D::Slot,
        document: UploadedDocument,
        ctx: &RuleContext,
    ) -> Result<(), WizardError> {
        self.ensure_editable()?;
        validate_document(&document)?;
        let field = self.draft.attach(slot, Some(document));
        self.touched.insert(field);
        self.revalidate(ctx);
        Ok(())
    }

    pub fn detach(&mut self, slot: D::Slot, ctx: &RuleContext) -> Result<(), WizardError> {
        self.ensure_editable()?;
        let field = self.draft.attach(slot, None);
        self.after_edit(field, ctx);
        Ok(())
    }

    /// Mark a field as interacted with and show its error, if any.
    pub fn blur(&mut self, field: &str, ctx: &RuleContext) -> Result<(), WizardError> {
        self.ensure_editable()?;
        let name = self
            .schema_field(field)
            .ok_or_else(|| WizardError::UnknownField(field.to_string()))?;
        self.touched.insert(name);
        self.revalidate(ctx);
        Ok(())
    }

    fn schema_field(&self, field: &str) -> Option<&'static str> {
        let schema = self.schema();
        (1..=schema.entry_steps())
            .filter_map(|n| schema.step(n))
            .flat_map(|step| step.fields())
            .find(|name| *name == field)
    }

    pub fn next(&mut self, ctx: &RuleContext) -> Result<NextOutcome, WizardError> {
        if self.submitting {
            return Err(WizardError::Busy);
        }
        let WizardStep::Entry(number) = self.step else {
            return Err(WizardError::Finished);
        };
        let Some(step) = self.current_step() else {
            return Err(WizardError::Finished);
        };

        let errors = step.validate(&self.draft, ctx);
        if let Some(notice) = step.notice(&errors) {
            self.touched.extend(step.fields());
            self.errors = errors.clone();
            self.notice = Some(notice);
            return Ok(NextOutcome::Blocked { errors, notice });
        }

        self.errors.clear();
        self.notice = None;

        if number < self.schema().entry_steps() {
            self.step = WizardStep::Entry(number + 1);
            return Ok(NextOutcome::Advanced { step: number + 1 });
        }

        self.submitting = true;
        Ok(NextOutcome::Submit(self.draft.submission()))
    }

    /// Report the gateway result for the submission started by `next`.
    /// Success moves to the terminal step; failure leaves the step as is.
    pub fn complete_submission(&mut self, succeeded: bool) -> Result<(), WizardError> {
        if !self.submitting {
            return Err(WizardError::NotSubmitting);
        }
        self.submitting = false;
        if succeeded {
            self.step = WizardStep::Submitted;
            self.touched.clear();
            self.errors.clear();
            self.notice = None;
        } else {
            self.notice = Some(SUBMISSION_FAILED_KEY);
        }
        Ok(())
    }

    /// Go back one step without validation.
    pub fn back(&mut self) -> Result<u8, WizardError> {
        if self.submitting {
            return Err(WizardError::Busy);
        }
        match self.step {
            WizardStep::Submitted => Err(WizardError::Finished),
            WizardStep::Entry(1) => Err(WizardError::AtFirstStep),
            WizardStep::Entry(n) => {
                self.step = WizardStep::Entry(n - 1);
                self.errors.clear();
                self.notice = None;
                Ok(n - 1)
            }
        }
    }
}
