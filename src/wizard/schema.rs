// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Declarative step schema shared by the KYC and KYB wizards.
//!
//! A [`WizardSchema`] is an ordered list of data-entry steps. Each step lists
//! the [`FieldRule`]s that gate leaving it. The terminal "submitted" step is
//! implicit and has no rules.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::UploadedDocument;
use crate::validation::validate_document;

/// Error key used when a required field is empty and the rule sets no other.
pub const REQUIRED_KEY: &str = "error.required";

/// Error key used when an attached document is refused.
pub const DOCUMENT_REJECTED_KEY: &str = "doc.instruction.2";

/// Aggregate notification when more than one field fails.
pub const FILL_REQUIRED_KEY: &str = "fill.required";

/// Field name → translation key of its error.
pub type FieldErrors = BTreeMap<&'static str, &'static str>;

/// Inputs to validation that do not live in the draft.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext {
    pub today: NaiveDate,
}

impl RuleContext {
    /// Context for the current UTC date.
    pub fn now() -> Self {
        Self {
            today: chrono::Utc::now().date_naive(),
        }
    }
}

pub type Check<D> = fn(&D, &RuleContext) -> Result<(), &'static str>;

/// Whether a field must be filled before leaving its step.
pub enum Requirement<D> {
    Always,
    Optional,
    /// Required only when the predicate holds for the current draft.
    When(fn(&D) -> bool),
}

enum Value<D> {
    Text(fn(&D) -> &str),
    Document(fn(&D) -> Option<&UploadedDocument>),
}

/// Validation rule for one field on one step.
pub struct FieldRule<D> {
    field: &'static str,
    value: Value<D>,
    requirement: Requirement<D>,
    missing_key: &'static str,
    checks: Vec<Check<D>>,
}

impl<D> FieldRule<D> {
    /// A required text field. Whitespace-only input counts as empty.
    pub fn text(field: &'static str, value: fn(&D) -> &str) -> Self {
        Self {
            field,
            value: Value::Text(value),
            requirement: Requirement::Always,
            missing_key: REQUIRED_KEY,
            checks: Vec::new(),
        }
    }

    /// A required document slot. Attached files always go through
    /// [`validate_document`].
    pub fn document(field: &'static str, value: fn(&D) -> Option<&UploadedDocument>) -> Self {
        Self {
            field,
            value: Value::Document(value),
            requirement: Requirement::Always,
            missing_key: REQUIRED_KEY,
            checks: Vec::new(),
        }
    }

    pub fn optional(mut self) -> Self {
        self.requirement = Requirement::Optional;
        self
    }

    pub fn required_when(mut self, predicate: fn(&D) -> bool) -> Self {
        self.requirement = Requirement::When(predicate);
        self
    }

    pub fn missing(mut self, key: &'static str) -> Self {
        self.missing_key = key;
        self
    }

    /// Format check, run only when the field has a value. Checks run in
    /// order and the first failure wins.
    pub fn check(mut self, check: Check<D>) -> Self {
        self.checks.push(check);
        self
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    fn is_present(&self, draft: &D) -> bool {
        match &self.value {
            Value::Text(get) => !get(draft).trim().is_empty(),
            Value::Document(get) => get(draft).is_some(),
        }
    }

    fn is_required(&self, draft: &D) -> bool {
        match &self.requirement {
            Requirement::Always => true,
            Requirement::Optional => false,
            Requirement::When(predicate) => predicate(draft),
        }
    }

    /// Error key for this field, or `None` when it passes.
    pub fn evaluate(&self, draft: &D, ctx: &RuleContext) -> Option<&'static str> {
        if !self.is_present(draft) {
            return self.is_required(draft).then_some(self.missing_key);
        }

        if let Value::Document(get) = &self.value {
            if let Some(document) = get(draft) {
                if validate_document(document).is_err() {
                    return Some(DOCUMENT_REJECTED_KEY);
                }
            }
        }

        self.checks.iter().find_map(|check| check(draft, ctx).err())
    }
}

/// One data-entry step.
pub struct StepSchema<D> {
    title_key: &'static str,
    rules: Vec<FieldRule<D>>,
}

impl<D> StepSchema<D> {
    pub fn new(title_key: &'static str) -> Self {
        Self {
            title_key,
            rules: Vec::new(),
        }
    }

    pub fn rule(mut self, rule: FieldRule<D>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn title_key(&self) -> &'static str {
        self.title_key
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(FieldRule::field)
    }

    /// Evaluate every rule. A field listed twice keeps its first error.
    pub fn validate(&self, draft: &D, ctx: &RuleContext) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for rule in &self.rules {
            if let Some(key) = rule.evaluate(draft, ctx) {
                errors.entry(rule.field).or_insert(key);
            }
        }
        errors
    }

    /// Single notification for a failed step: the field's own key when one
    /// field fails, the generic "fill in all required fields" otherwise.
    pub fn notice(&self, errors: &FieldErrors) -> Option<&'static str> {
        match errors.len() {
            0 => None,
            1 => errors.values().next().copied(),
            _ => Some(FILL_REQUIRED_KEY),
        }
    }
}

/// Ordered data-entry steps plus the confirmation title.
pub struct WizardSchema<D> {
    steps: Vec<StepSchema<D>>,
    submitted_title_key: &'static str,
}

impl<D> WizardSchema<D> {
    pub fn new(steps: Vec<StepSchema<D>>, submitted_title_key: &'static str) -> Self {
        Self {
            steps,
            submitted_title_key,
        }
    }

    /// Number of data-entry steps (the last one triggers submission).
    pub fn entry_steps(&self) -> u8 {
        self.steps.len() as u8
    }

    /// Total steps including the terminal confirmation step.
    pub fn total_steps(&self) -> u8 {
        self.entry_steps() + 1
    }

    /// 1-based lookup.
    pub fn step(&self, number: u8) -> Option<&StepSchema<D>> {
        number
            .checked_sub(1)
            .and_then(|index| self.steps.get(index as usize))
    }

    pub fn submitted_title_key(&self) -> &'static str {
        self.submitted_title_key
    }
}

/// Helper for checks: `Ok` when `ok`, otherwise the error key.
pub fn ensure(ok: bool, key: &'static str) -> Result<(), &'static str> {
    if ok {
        Ok(())
    } else {
        Err(key)
    }
}

/// Trimmed character-count bounds, reporting separate min/max keys.
pub fn length_between(
    value: &str,
    min: usize,
    max: usize,
    min_key: &'static str,
    max_key: &'static str,
) -> Result<(), &'static str> {
    let count = value.trim().chars().count();
    ensure(count >= min, min_key)?;
    ensure(count <= max, max_key)
}
