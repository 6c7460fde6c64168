// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Field Validation
//!
//! Pure predicates used by the verification wizards. Every function is total:
//! empty or partial input yields `false` (or a rejection) instead of an error.
//!
//! Country-indexed checks (VAT, postal code) are deliberately permissive for
//! countries without a registered format: an unlisted country passes.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::UploadedDocument;

/// Maximum accepted document size (10 MiB).
pub const MAX_DOCUMENT_SIZE: u64 = 10 * 1024 * 1024;

/// MIME types accepted for uploaded documents.
pub const ACCEPTED_MIME_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];

/// Minimum age for individual verification.
pub const MINIMUM_AGE: i32 = 18;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static EVM_ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("valid address regex"));

static REGISTRATION_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]{5,}$").expect("valid registration regex"));

static VAT_FORMATS: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    [
        ("FR", r"^FR[0-9A-Z]{2}[0-9]{9}$"),
        ("GB", r"^GB[0-9]{9}$|^GB[0-9]{12}$|^GBGD[0-9]{3}$|^GBHA[0-9]{3}$"),
        ("DE", r"^DE[0-9]{9}$"),
        ("IT", r"^IT[0-9]{11}$"),
        ("ES", r"^ES[A-Z0-9][0-9]{7}[A-Z0-9]$"),
    ]
    .into_iter()
    .map(|(country, pattern)| (country, Regex::new(pattern).expect("valid VAT regex")))
    .collect()
});

static POSTAL_CODE_FORMATS: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    [
        ("FR", r"^[0-9]{5}$"),
        ("GB", r"(?i)^[A-Z]{1,2}[0-9][A-Z0-9]? ?[0-9][A-Z]{2}$"),
        ("DE", r"^[0-9]{5}$"),
        ("IT", r"^[0-9]{5}$"),
        ("ES", r"^[0-9]{5}$"),
        ("US", r"^[0-9]{5}(-[0-9]{4})?$"),
    ]
    .into_iter()
    .map(|(country, pattern)| (country, Regex::new(pattern).expect("valid postal regex")))
    .collect()
});

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Accepts 10 to 12 digits once separators and a leading `+` are removed.
pub fn validate_phone_number(phone: &str) -> bool {
    let cleaned: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    (10..=12).contains(&digits.chars().count())
}

/// `0x` followed by exactly 40 hexadecimal characters.
pub fn validate_evm_address(address: &str) -> bool {
    EVM_ADDRESS_RE.is_match(address)
}

/// Parses a `YYYY-MM-DD` date as entered in a date input.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Whole years between `birth` and `today`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// True when the person born on `birth_date` is at least 18 on `today`.
pub fn validate_age(birth_date: &str, today: NaiveDate) -> bool {
    parse_date(birth_date)
        .map(|birth| age_on(birth, today) >= MINIMUM_AGE)
        .unwrap_or(false)
}

/// Reason a document was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DocumentRejection {
    #[error("Invalid file type. Please upload a PDF, JPG, or PNG file.")]
    UnsupportedType,

    #[error("File size exceeds 10MB limit.")]
    TooLarge,
}

impl DocumentRejection {
    pub fn code(&self) -> &'static str {
        match self {
            DocumentRejection::UnsupportedType => "unsupported_type",
            DocumentRejection::TooLarge => "too_large",
        }
    }
}

/// Type is checked before size, so an oversized executable reports the type.
pub fn validate_document(document: &UploadedDocument) -> Result<(), DocumentRejection> {
    if !ACCEPTED_MIME_TYPES.contains(&document.mime_type.as_str()) {
        return Err(DocumentRejection::UnsupportedType);
    }
    if document.size > MAX_DOCUMENT_SIZE {
        return Err(DocumentRejection::TooLarge);
    }
    Ok(())
}

pub fn validate_registration_number(number: &str) -> bool {
    REGISTRATION_NUMBER_RE.is_match(number)
}

/// The VAT number is optional: an empty value passes.
pub fn validate_vat_number(vat_number: &str, country_code: &str) -> bool {
    if vat_number.is_empty() {
        return true;
    }
    match VAT_FORMATS.get(country_code.trim().to_ascii_uppercase().as_str()) {
        Some(format) => format.is_match(vat_number),
        None => true,
    }
}

pub fn validate_postal_code(postal_code: &str, country_code: &str) -> bool {
    match POSTAL_CODE_FORMATS.get(country_code.trim().to_ascii_uppercase().as_str()) {
        Some(format) => format.is_match(postal_code),
        None => true,
    }
}
