// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Translation catalog for the two supported locales.
//!
//! The catalogs are compiled into the binary from `locales/*.json`. A key
//! missing from the selected locale resolves to the key itself.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const EN_CATALOG: &str = include_str!("../locales/en.json");
const FR_CATALOG: &str = include_str!("../locales/fr.json");

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "fr" => Ok(Locale::Fr),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid {locale} catalog: {source}")]
pub struct CatalogError {
    locale: Locale,
    #[source]
    source: serde_json::Error,
}

/// Immutable (locale, key) → text lookup. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Translator {
    catalogs: Arc<HashMap<Locale, HashMap<String, String>>>,
}

impl Translator {
    /// Load the bundled catalogs.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_sources([(Locale::En, EN_CATALOG), (Locale::Fr, FR_CATALOG)])
    }

    pub fn from_sources<'a>(
        sources: impl IntoIterator<Item = (Locale, &'a str)>,
    ) -> Result<Self, CatalogError> {
        let mut catalogs = HashMap::new();
        for (locale, raw) in sources {
            let entries: HashMap<String, String> = serde_json::from_str(raw)
                .map_err(|source| CatalogError { locale, source })?;
            catalogs.insert(locale, entries);
        }
        Ok(Self {
            catalogs: Arc::new(catalogs),
        })
    }

    pub fn translate<'a>(&'a self, locale: Locale, key: &'a str) -> &'a str {
        self.catalogs
            .get(&locale)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
            .unwrap_or(key)
    }

    pub fn contains(&self, locale: Locale, key: &str) -> bool {
        self.catalogs
            .get(&locale)
            .is_some_and(|entries| entries.contains_key(key))
    }
}
