// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Individual verification (KYC) draft and step schema.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::schema::{ensure, FieldRule, RuleContext, StepSchema, WizardSchema};
use super::Draft;
use crate::gateway::{Attachment, KycFields, NewVerification, Submission};
use crate::models::{IdentityDocumentType, UploadedDocument, VerificationKind, WalletAddress};
use crate::validation::{
    parse_date, validate_age, validate_email, validate_evm_address, validate_phone_number,
};

#[derive(Debug, Clone, Default, Serialize)]
pub struct KycDraft {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub email: String,
    pub phone: String,
    pub document_type: IdentityDocumentType,
    pub document_number: String,
    pub document_expiry: String,
    pub id_front: Option<UploadedDocument>,
    pub id_back: Option<UploadedDocument>,
    pub passport_page: Option<UploadedDocument>,
    pub selfie: Option<UploadedDocument>,
    pub wallet_address: WalletAddress,
}

/// Single-field edit, e.g. `{"field": "first_name", "value": "Ada"}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum KycUpdate {
    FirstName(String),
    LastName(String),
    DateOfBirth(String),
    Email(String),
    Phone(String),
    DocumentType(IdentityDocumentType),
    DocumentNumber(String),
    DocumentExpiry(String),
    WalletAddress(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycSlot {
    IdFront,
    IdBack,
    PassportPage,
    Selfie,
}

impl KycDraft {
    fn is_id_card(&self) -> bool {
        self.document_type == IdentityDocumentType::IdCard
    }

    fn is_passport(&self) -> bool {
        self.document_type == IdentityDocumentType::Passport
    }
}

fn check_birth_date(draft: &KycDraft, ctx: &RuleContext) -> Result<(), &'static str> {
    ensure(parse_date(&draft.date_of_birth).is_some(), "error.date.format")?;
    ensure(validate_age(&draft.date_of_birth, ctx.today), "age.requirement")
}

static SCHEMA: Lazy<WizardSchema<KycDraft>> = Lazy::new(|| {
    let personal = StepSchema::new("personal.info")
        .rule(FieldRule::text("first_name", |d: &KycDraft| d.first_name.as_str()))
        .rule(FieldRule::text("last_name", |d: &KycDraft| d.last_name.as_str()))
        .rule(
            FieldRule::text("date_of_birth", |d: &KycDraft| d.date_of_birth.as_str())
                .check(check_birth_date),
        )
        .rule(
            FieldRule::text("email", |d: &KycDraft| d.email.as_str())
                .check(|d, _| ensure(validate_email(d.email.trim()), "email.format")),
        )
        .rule(
            FieldRule::text("phone", |d: &KycDraft| d.phone.as_str())
                .check(|d, _| ensure(validate_phone_number(d.phone.trim()), "phone.format")),
        );

    let identity = StepSchema::new("id.verification")
        .rule(FieldRule::text("document_number", |d: &KycDraft| {
            d.document_number.as_str()
        }))
        .rule(
            FieldRule::text("document_expiry", |d: &KycDraft| d.document_expiry.as_str())
                .check(|d, _| ensure(parse_date(&d.document_expiry).is_some(), "error.date.format")),
        )
        .rule(
            FieldRule::document("id_front", |d: &KycDraft| d.id_front.as_ref())
                .required_when(KycDraft::is_id_card)
                .missing("doc.front.required"),
        )
        .rule(
            FieldRule::document("id_back", |d: &KycDraft| d.id_back.as_ref())
                .required_when(KycDraft::is_id_card)
                .missing("doc.back.required"),
        )
        .rule(
            FieldRule::document("passport_page", |d: &KycDraft| d.passport_page.as_ref())
                .required_when(KycDraft::is_passport)
                .missing("passport.page.required"),
        );

    let selfie = StepSchema::new("selfie.verification").rule(
        FieldRule::document("selfie", |d: &KycDraft| d.selfie.as_ref()).missing("selfie.required"),
    );

    let wallet = StepSchema::new("reward.address").rule(
        FieldRule::text("wallet_address", |d: &KycDraft| d.wallet_address.0.as_str())
            .missing("wallet.required")
            .check(|d, _| {
                ensure(
                    validate_evm_address(d.wallet_address.0.trim()),
                    "wallet.instruction.2",
                )
            }),
    );

    WizardSchema::new(
        vec![personal, identity, selfie, wallet],
        "verification.submitted",
    )
});

impl Draft for KycDraft {
    type Update = KycUpdate;
    type Slot = KycSlot;

    const KIND: VerificationKind = VerificationKind::Kyc;

    fn schema() -> &'static WizardSchema<Self> {
        &SCHEMA
    }

    fn prefilled(email: Option<&str>) -> Self {
        Self {
            email: email.unwrap_or_default().to_string(),
            ..Default::default()
        }
    }

    fn apply(&mut self, update: KycUpdate) -> &'static str {
        match update {
            KycUpdate::FirstName(v) => {
                self.first_name = v;
                "first_name"
            }
            KycUpdate::LastName(v) => {
                self.last_name = v;
                "last_name"
            }
            KycUpdate::DateOfBirth(v) => {
                self.date_of_birth = v;
                "date_of_birth"
            }
            KycUpdate::Email(v) => {
                self.email = v;
                "email"
            }
            KycUpdate::Phone(v) => {
                self.phone = v;
                "phone"
            }
            KycUpdate::DocumentType(v) => {
                self.document_type = v;
                "document_type"
            }
            KycUpdate::DocumentNumber(v) => {
                self.document_number = v;
                "document_number"
            }
            KycUpdate::DocumentExpiry(v) => {
                self.document_expiry = v;
                "document_expiry"
            }
            KycUpdate::WalletAddress(v) => {
                self.wallet_address = WalletAddress(v);
                "wallet_address"
            }
        }
    }

    fn attach(&mut self, slot: KycSlot, document: Option<UploadedDocument>) -> &'static str {
        match slot {
            KycSlot::IdFront => {
                self.id_front = document;
                "id_front"
            }
            KycSlot::IdBack => {
                self.id_back = document;
                "id_back"
            }
            KycSlot::PassportPage => {
                self.passport_page = document;
                "passport_page"
            }
            KycSlot::Selfie => {
                self.selfie = document;
                "selfie"
            }
        }
    }

    /// Only the slots of the selected document type are uploaded.
    fn submission(&self) -> Submission {
        let (id_front, id_back, passport_page) = match self.document_type {
            IdentityDocumentType::IdCard => (self.id_front.clone(), self.id_back.clone(), None),
            IdentityDocumentType::Passport => (None, None, self.passport_page.clone()),
        };

        Submission {
            record: NewVerification::Kyc(KycFields {
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
                date_of_birth: self.date_of_birth.clone(),
                email: self.email.trim().to_string(),
                phone: self.phone.trim().to_string(),
                document_type: self.document_type,
                document_number: self.document_number.trim().to_string(),
                document_expiry: self.document_expiry.clone(),
                wallet_address: WalletAddress(self.wallet_address.0.trim().to_string()),
            }),
            attachments: vec![
                Attachment {
                    document_type: "id_front",
                    document: id_front,
                },
                Attachment {
                    document_type: "id_back",
                    document: id_back,
                },
                Attachment {
                    document_type: "passport_page",
                    document: passport_page,
                },
                Attachment {
                    document_type: "selfie",
                    document: self.selfie.clone(),
                },
            ],
        }
    }
}
