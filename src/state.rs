// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::AuthService;
use crate::config::Config;
use crate::gateway::{SubmissionGateway, VerificationBackend};
use crate::i18n::{CatalogError, Translator};
use crate::models::VerificationKind;
use crate::storage::{FileStorage, LocalBackend};
use crate::wizard::{AnyWizard, SimulatedProgress};

/// One open wizard, owned by the user who created it.
pub struct WizardSession {
    pub owner: String,
    pub wizard: Box<dyn AnyWizard>,
    pub progress: SimulatedProgress,
}

impl WizardSession {
    pub fn new(owner: impl Into<String>, wizard: Box<dyn AnyWizard>) -> Self {
        Self {
            owner: owner.into(),
            wizard,
            progress: SimulatedProgress::new(),
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner == user_id
    }
}

pub type WizardRegistry = Arc<RwLock<HashMap<Uuid, WizardSession>>>;

/// Drop the user's idle wizards of `kind`. A wizard mid-submission is kept
/// until its submission settles. Returns how many were dropped.
pub fn close_idle_wizards(
    registry: &mut HashMap<Uuid, WizardSession>,
    user_id: &str,
    kind: VerificationKind,
) -> usize {
    let before = registry.len();
    registry.retain(|_, session| {
        !(session.is_owned_by(user_id)
            && session.wizard.kind() == kind
            && !session.wizard.is_submitting())
    });
    before - registry.len()
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Arc<FileStorage>,
    pub backend: Arc<dyn VerificationBackend>,
    pub gateway: SubmissionGateway,
    pub auth: AuthService,
    pub wizards: WizardRegistry,
    pub translator: Translator,
}

impl AppState {
    /// `storage` must already be initialized.
    pub fn new(config: Config, storage: FileStorage) -> Result<Self, CatalogError> {
        let storage = Arc::new(storage);
        let backend: Arc<dyn VerificationBackend> =
            Arc::new(LocalBackend::new(Arc::clone(&storage)));
        let gateway = SubmissionGateway::new(Arc::clone(&backend), config.bucket.clone());

        Ok(Self {
            auth: AuthService::new(Arc::clone(&storage)),
            translator: Translator::bundled()?,
            config: Arc::new(config),
            storage,
            backend,
            gateway,
            wizards: WizardRegistry::default(),
        })
    }

    /// State over a fresh temporary data directory. Keep the guard alive for
    /// the duration of the test.
    #[cfg(test)]
    pub fn for_tests() -> (Self, tempfile::TempDir) {
        use crate::storage::StoragePaths;

        let dir = tempfile::TempDir::new().expect("temp dir");
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let mut storage = FileStorage::new(StoragePaths::new(dir.path()));
        storage.initialize().expect("initialize storage");
        let state = Self::new(config, storage).expect("bundled catalogs");
        (state, dir)
    }
}
