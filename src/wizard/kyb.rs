// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Business verification (KYB) draft and step schema.
//!
//! The VAT number is entered on the company step but its format depends on
//! the country chosen on the address step, so the address step checks it
//! again once the country is known.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::schema::{ensure, length_between, FieldRule, RuleContext, StepSchema, WizardSchema};
use super::Draft;
use crate::gateway::{Attachment, KybFields, NewVerification, Submission};
use crate::models::{CompanyType, UploadedDocument, VerificationKind, WalletAddress};
use crate::validation::{
    parse_date, validate_email, validate_evm_address, validate_phone_number,
    validate_postal_code, validate_registration_number, validate_vat_number,
};

#[derive(Debug, Clone, Default, Serialize)]
pub struct KybDraft {
    pub company_name: String,
    pub registration_number: String,
    pub vat_number: String,
    pub incorporation_date: String,
    pub company_type: CompanyType,
    pub street_address: String,
    pub city: String,
    pub postal_code: String,
    /// ISO 3166-1 alpha-2 code.
    pub country: String,
    pub legal_rep_first_name: String,
    pub legal_rep_last_name: String,
    pub legal_rep_position: String,
    pub legal_rep_email: String,
    pub legal_rep_phone: String,
    pub registration_doc: Option<UploadedDocument>,
    pub articles_doc: Option<UploadedDocument>,
    pub financial_doc: Option<UploadedDocument>,
    pub ownership_doc: Option<UploadedDocument>,
    pub wallet_address: WalletAddress,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum KybUpdate {
    CompanyName(String),
    RegistrationNumber(String),
    VatNumber(String),
    IncorporationDate(String),
    CompanyType(CompanyType),
    StreetAddress(String),
    City(String),
    PostalCode(String),
    Country(String),
    LegalRepFirstName(String),
    LegalRepLastName(String),
    LegalRepPosition(String),
    LegalRepEmail(String),
    LegalRepPhone(String),
    WalletAddress(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KybSlot {
    RegistrationDoc,
    ArticlesDoc,
    FinancialDoc,
    OwnershipDoc,
}

fn check_vat(draft: &KybDraft, _: &RuleContext) -> Result<(), &'static str> {
    ensure(
        validate_vat_number(draft.vat_number.trim(), &draft.country),
        "error.vat.format",
    )
}

fn check_incorporation_date(draft: &KybDraft, ctx: &RuleContext) -> Result<(), &'static str> {
    let date = parse_date(&draft.incorporation_date).ok_or("error.date.format")?;
    ensure(date <= ctx.today, "error.date.future")
}

fn check_rep_name(value: &str) -> Result<(), &'static str> {
    length_between(value, 2, 50, "error.name.min", "error.name.max")
}

static SCHEMA: Lazy<WizardSchema<KybDraft>> = Lazy::new(|| {
    let company = StepSchema::new("company.info")
        .rule(
            FieldRule::text("company_name", |d: &KybDraft| d.company_name.as_str()).check(|d, _| {
                length_between(
                    &d.company_name,
                    2,
                    100,
                    "error.company.name.min",
                    "error.company.name.max",
                )
            }),
        )
        .rule(
            FieldRule::text("registration_number", |d: &KybDraft| {
                d.registration_number.as_str()
            })
            .check(|d, _| {
                ensure(
                    validate_registration_number(d.registration_number.trim()),
                    "error.registration.format",
                )
            }),
        )
        .rule(
            FieldRule::text("vat_number", |d: &KybDraft| d.vat_number.as_str())
                .optional()
                .check(check_vat),
        )
        .rule(
            FieldRule::text("incorporation_date", |d: &KybDraft| {
                d.incorporation_date.as_str()
            })
            .check(check_incorporation_date),
        );

    let address = StepSchema::new("company.address")
        .rule(
            FieldRule::text("street_address", |d: &KybDraft| d.street_address.as_str()).check(
                |d, _| {
                    length_between(
                        &d.street_address,
                        5,
                        100,
                        "error.address.min",
                        "error.address.max",
                    )
                },
            ),
        )
        .rule(
            FieldRule::text("city", |d: &KybDraft| d.city.as_str()).check(|d, _| {
                length_between(&d.city, 2, 50, "error.city.min", "error.city.max")
            }),
        )
        .rule(
            FieldRule::text("postal_code", |d: &KybDraft| d.postal_code.as_str()).check(|d, _| {
                ensure(
                    validate_postal_code(d.postal_code.trim(), &d.country),
                    "error.postal.format",
                )
            }),
        )
        .rule(FieldRule::text("country", |d: &KybDraft| d.country.as_str()))
        .rule(
            FieldRule::text("vat_number", |d: &KybDraft| d.vat_number.as_str())
                .optional()
                .check(check_vat),
        );

    let representative = StepSchema::new("legal.representative")
        .rule(
            FieldRule::text("legal_rep_first_name", |d: &KybDraft| {
                d.legal_rep_first_name.as_str()
            })
            .check(|d, _| check_rep_name(&d.legal_rep_first_name)),
        )
        .rule(
            FieldRule::text("legal_rep_last_name", |d: &KybDraft| {
                d.legal_rep_last_name.as_str()
            })
            .check(|d, _| check_rep_name(&d.legal_rep_last_name)),
        )
        .rule(
            FieldRule::text("legal_rep_position", |d: &KybDraft| {
                d.legal_rep_position.as_str()
            })
            .check(|d, _| {
                length_between(
                    &d.legal_rep_position,
                    2,
                    50,
                    "error.position.min",
                    "error.position.max",
                )
            }),
        )
        .rule(
            FieldRule::text("legal_rep_email", |d: &KybDraft| d.legal_rep_email.as_str())
                .check(|d, _| {
                    ensure(
                        validate_email(d.legal_rep_email.trim()),
                        "error.email.format",
                    )
                }),
        )
        .rule(
            FieldRule::text("legal_rep_phone", |d: &KybDraft| d.legal_rep_phone.as_str())
                .check(|d, _| {
                    ensure(
                        validate_phone_number(d.legal_rep_phone.trim()),
                        "error.phone.length",
                    )
                }),
        );

    let documents = StepSchema::new("documents.upload")
        .rule(FieldRule::document("registration_doc", |d: &KybDraft| {
            d.registration_doc.as_ref()
        }))
        .rule(FieldRule::document("articles_doc", |d: &KybDraft| {
            d.articles_doc.as_ref()
        }))
        .rule(
            FieldRule::document("financial_doc", |d: &KybDraft| d.financial_doc.as_ref())
                .optional(),
        )
        .rule(
            FieldRule::document("ownership_doc", |d: &KybDraft| d.ownership_doc.as_ref())
                .optional(),
        );

    let wallet = StepSchema::new("reward.address").rule(
        FieldRule::text("wallet_address", |d: &KybDraft| d.wallet_address.0.as_str())
            .missing("wallet.required")
            .check(|d, _| {
                ensure(
                    validate_evm_address(d.wallet_address.0.trim()),
                    "error.wallet.format",
                )
            }),
    );

    WizardSchema::new(
        vec![company, address, representative, documents, wallet],
        "verification.submitted",
    )
});

impl Draft for KybDraft {
    type Update = KybUpdate;
    type Slot = KybSlot;

    const KIND: VerificationKind = VerificationKind::Kyb;

    fn schema() -> &'static WizardSchema<Self> {
        &SCHEMA
    }

    /// The signed-in user's email becomes the representative's default email.
    fn prefilled(email: Option<&str>) -> Self {
        Self {
            legal_rep_email: email.unwrap_or_default().to_string(),
            ..Default::default()
        }
    }

    fn apply(&mut self, update: KybUpdate) -> &'static str {
        let (slot, value, field) = match update {
            KybUpdate::CompanyType(v) => {
                self.company_type = v;
                return "company_type";
            }
            KybUpdate::WalletAddress(v) => {
                self.wallet_address = WalletAddress(v);
                return "wallet_address";
            }
            KybUpdate::CompanyName(v) => (&mut self.company_name, v, "company_name"),
            KybUpdate::RegistrationNumber(v) => {
                (&mut self.registration_number, v, "registration_number")
            }
            KybUpdate::VatNumber(v) => (&mut self.vat_number, v, "vat_number"),
            KybUpdate::IncorporationDate(v) => {
                (&mut self.incorporation_date, v, "incorporation_date")
            }
            KybUpdate::StreetAddress(v) => (&mut self.street_address, v, "street_address"),
            KybUpdate::City(v) => (&mut self.city, v, "city"),
            KybUpdate::PostalCode(v) => (&mut self.postal_code, v, "postal_code"),
            KybUpdate::Country(v) => (&mut self.country, v, "country"),
            KybUpdate::LegalRepFirstName(v) => {
                (&mut self.legal_rep_first_name, v, "legal_rep_first_name")
            }
            KybUpdate::LegalRepLastName(v) => {
                (&mut self.legal_rep_last_name, v, "legal_rep_last_name")
            }
            KybUpdate::LegalRepPosition(v) => {
                (&mut self.legal_rep_position, v, "legal_rep_position")
            }
            KybUpdate::LegalRepEmail(v) => (&mut self.legal_rep_email, v, "legal_rep_email"),
            KybUpdate::LegalRepPhone(v) => (&mut self.legal_rep_phone, v, "legal_rep_phone"),
        };
        *slot = value;
        field
    }

    fn attach(&mut self, slot: KybSlot, document: Option<UploadedDocument>) -> &'static str {
        let (target, field) = match slot {
            KybSlot::RegistrationDoc => (&mut self.registration_doc, "registration_doc"),
            KybSlot::ArticlesDoc => (&mut self.articles_doc, "articles_doc"),
            KybSlot::FinancialDoc => (&mut self.financial_doc, "financial_doc"),
            KybSlot::OwnershipDoc => (&mut self.ownership_doc, "ownership_doc"),
        };
        *target = document;
        field
    }

    fn submission(&self) -> Submission {
        let attachment = |document_type, document: &Option<UploadedDocument>| Attachment {
            document_type,
            document: document.clone(),
        };

        Submission {
            record: NewVerification::Kyb(KybFields {
                company_name: self.company_name.trim().to_string(),
                registration_number: self.registration_number.trim().to_string(),
                vat_number: self.vat_number.trim().to_string(),
                incorporation_date: self.incorporation_date.clone(),
                company_type: self.company_type,
                street_address: self.street_address.trim().to_string(),
                city: self.city.trim().to_string(),
                postal_code: self.postal_code.trim().to_string(),
                country: self.country.trim().to_ascii_uppercase(),
                legal_rep_first_name: self.legal_rep_first_name.trim().to_string(),
                legal_rep_last_name: self.legal_rep_last_name.trim().to_string(),
                legal_rep_position: self.legal_rep_position.trim().to_string(),
                legal_rep_email: self.legal_rep_email.trim().to_string(),
                legal_rep_phone: self.legal_rep_phone.trim().to_string(),
                wallet_address: WalletAddress(self.wallet_address.0.trim().to_string()),
            }),
            attachments: vec![
                attachment("registration", &self.registration_doc),
                attachment("articles", &self.articles_doc),
                attachment("financial", &self.financial_doc),
                attachment("ownership", &self.ownership_doc),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::wizard::{FieldErrors, NextOutcome, Wizard};

    const WALLET: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12";

    fn ctx() -> RuleContext {
        RuleContext {
            today: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
        }
    }

    fn pdf(name: &str) -> UploadedDocument {
        UploadedDocument::new(name, "application/pdf", b"%PDF-1.7".to_vec())
    }

    fn company() -> KybDraft {
        KybDraft {
            company_name: "Relational SAS".into(),
            registration_number: "RCS-123456".into(),
            vat_number: "FR12345678901".into(),
            incorporation_date: "2020-03-01".into(),
            street_address: "10 rue de Rivoli".into(),
            city: "Paris".into(),
            postal_code: "75001".into(),
            country: "FR".into(),
            ..Default::default()
        }
    }

    fn errors_on(step: u8, draft: &KybDraft) -> FieldErrors {
        KybDraft::schema().step(step).unwrap().validate(draft, &ctx())
    }

    #[test]
    fn schema_has_five_entry_steps() {
        assert_eq!(KybDraft::schema().total_steps(), 6);
        assert_eq!(
            KybDraft::schema().step(3).unwrap().title_key(),
            "legal.representative"
        );
    }

    #[test]
    fn company_step_rules() {
        assert!(errors_on(1, &company()).is_empty());

        let mut draft = company();
        draft.company_name = "A".into();
        draft.registration_number = "AB".into();
        draft.incorporation_date = "2030-01-01".into();
        let errors = errors_on(1, &draft);
        assert_eq!(errors.get("company_name"), Some(&"error.company.name.min"));
        assert_eq!(
            errors.get("registration_number"),
            Some(&"error.registration.format")
        );
        assert_eq!(errors.get("incorporation_date"), Some(&"error.date.future"));

        draft.incorporation_date = "2026-10-18".into();
        assert!(!errors_on(1, &draft).contains_key("incorporation_date"));
    }

    #[test]
    fn vat_checked_again_once_country_is_known() {
        let mut draft = company();
        draft.country = String::new();
        draft.vat_number = "DE123".into();
        // No country yet: any VAT passes on the company step.
        assert!(!errors_on(1, &draft).contains_key("vat_number"));

        draft.country = "de".into();
        assert_eq!(errors_on(2, &draft).get("vat_number"), Some(&"error.vat.format"));

        draft.vat_number = "DE123456789".into();
        assert!(errors_on(2, &draft).is_empty());

        draft.vat_number = "   ".into();
        assert!(errors_on(2, &draft).is_empty());
    }

    #[test]
    fn postal_code_follows_country() {
        let mut draft = company();
        draft.postal_code = "SW1A 1AA".into();
        assert_eq!(errors_on(2, &draft).get("postal_code"), Some(&"error.postal.format"));

        draft.country = "GB".into();
        draft.vat_number = "GB123456789".into();
        assert!(errors_on(2, &draft).is_empty());
    }

    #[test]
    fn representative_bounds() {
        let mut draft = KybDraft::prefilled(Some("ceo@example.com"));
        draft.legal_rep_first_name = "J".into();
        draft.legal_rep_last_name = "x".repeat(51);
        draft.legal_rep_position = "CEO".into();
        draft.legal_rep_phone = "+33 1 23".into();

        let errors = errors_on(3, &draft);
        assert_eq!(errors.get("legal_rep_first_name"), Some(&"error.name.min"));
        assert_eq!(errors.get("legal_rep_last_name"), Some(&"error.name.max"));
        assert_eq!(errors.get("legal_rep_phone"), Some(&"error.phone.length"));
        assert!(!errors.contains_key("legal_rep_email"));
        assert!(!errors.contains_key("legal_rep_position"));
    }

    #[test]
    fn financial_and_ownership_documents_are_optional() {
        let mut draft = company();
        let errors = errors_on(4, &draft);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("registration_doc"), Some(&"error.required"));

        draft.attach(KybSlot::RegistrationDoc, Some(pdf("kbis.pdf")));
        draft.attach(KybSlot::ArticlesDoc, Some(pdf("statuts.pdf")));
        assert!(errors_on(4, &draft).is_empty());
    }

    #[test]
    fn full_flow_submits_present_documents_only() {
        let mut wizard = Wizard::<KybDraft>::for_user(Some("ceo@example.com"));
        let updates: Vec<KybUpdate> = serde_json::from_value(serde_json::json!([
            {"field": "company_name", "value": "Relational SAS"},
            {"field": "registration_number", "value": "RCS-123456"},
            {"field": "incorporation_date", "value": "2020-03-01"},
            {"field": "company_type", "value": "corporation"},
        ]))
        .unwrap();
        for update in updates {
            wizard.update(update, &ctx()).unwrap();
        }
        assert!(matches!(wizard.next(&ctx()), Ok(NextOutcome::Advanced { step: 2 })));

        for update in [
            KybUpdate::StreetAddress("10 rue de Rivoli".into()),
            KybUpdate::City("Paris".into()),
            KybUpdate::PostalCode("75001".into()),
            KybUpdate::Country("FR".into()),
        ] {
            wizard.update(update, &ctx()).unwrap();
        }
        assert!(matches!(wizard.next(&ctx()), Ok(NextOutcome::Advanced { step: 3 })));

        for update in [
            KybUpdate::LegalRepFirstName("Grace".into()),
            KybUpdate::LegalRepLastName("Hopper".into()),
            KybUpdate::LegalRepPosition("President".into()),
            KybUpdate::LegalRepPhone("+33123456789".into()),
        ] {
            wizard.update(update, &ctx()).unwrap();
        }
        assert!(matches!(wizard.next(&ctx()), Ok(NextOutcome::Advanced { step: 4 })));

        wizard
            .attach(KybSlot::RegistrationDoc, pdf("kbis.pdf"), &ctx())
            .unwrap();
        wizard
            .attach(KybSlot::ArticlesDoc, pdf("statuts.pdf"), &ctx())
            .unwrap();
        assert!(matches!(wizard.next(&ctx()), Ok(NextOutcome::Advanced { step: 5 })));

        wizard
            .update(KybUpdate::WalletAddress("not-a-wallet".into()), &ctx())
            .unwrap();
        let NextOutcome::Blocked { notice, .. } = wizard.next(&ctx()).unwrap() else {
            panic!("bad wallet must block");
        };
        assert_eq!(notice, "error.wallet.format");

        wizard
            .update(KybUpdate::WalletAddress(WALLET.into()), &ctx())
            .unwrap();
        let NextOutcome::Submit(submission) = wizard.next(&ctx()).unwrap() else {
            panic!("complete draft must submit");
        };
        let types: Vec<_> = submission.present_attachments().map(|(t, _)| t).collect();
        assert_eq!(types, vec!["registration", "articles"]);

        let NewVerification::Kyb(fields) = submission.record else {
            panic!("kyb record expected");
        };
        assert_eq!(fields.legal_rep_email, "ceo@example.com");
        assert_eq!(fields.company_type, CompanyType::Corporation);
    }
}
