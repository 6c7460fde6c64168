// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account sign-up / sign-in and in-memory sessions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use super::password::{hash_password, verify_password, PasswordDigest, MIN_PASSWORD_CHARS};
use super::{AuthError, AuthenticatedUser};
use crate::storage::{AccountRepository, FileStorage, StorageError, StoredAccount};
use crate::validation::validate_email;

/// NFKC, trimmed, lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.nfkc().collect::<String>().trim().to_lowercase()
}

/// Bearer token → user. Tokens are random v4 UUIDs.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, AuthenticatedUser>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, user: AuthenticatedUser) -> Uuid {
        let token = Uuid::new_v4();
        self.sessions.write().await.insert(token, user);
        token
    }

    pub async fn get(&self, token: &Uuid) -> Option<AuthenticatedUser> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Returns whether the token was live.
    pub async fn remove(&self, token: &Uuid) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }
}

/// A freshly created session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: Uuid,
    pub user: AuthenticatedUser,
}

#[derive(Clone)]
pub struct AuthService {
    storage: Arc<FileStorage>,
    sessions: SessionStore,
    /// Held across the email lookup and the account write.
    sign_up_lock: Arc<Mutex<()>>,
}

impl AuthService {
    pub fn new(storage: Arc<FileStorage>) -> Self {
        Self {
            storage,
            sessions: SessionStore::new(),
            sign_up_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create an account and sign it in.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        if !validate_email(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AuthError::WeakPassword(MIN_PASSWORD_CHARS));
        }

        let PasswordDigest { salt, digest } = hash_password(password)?;
        let account = StoredAccount {
            id: Uuid::new_v4(),
            email,
            salt,
            password_digest: digest,
            created_at: Utc::now(),
        };
        {
            let _guard = self.sign_up_lock.lock().await;
            AccountRepository::new(&self.storage)
                .create(&account)
                .map_err(|e| match e {
                    StorageError::AlreadyExists(_) => AuthError::EmailTaken,
                    other => AuthError::Internal(other.to_string()),
                })?;
        }

        info!(user_id = %account.id, "Account created");
        Ok(self.open_session(&account).await)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        let account = AccountRepository::new(&self.storage)
            .find_by_email(&email)
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        let stored = PasswordDigest {
            salt: account.salt.clone(),
            digest: account.password_digest.clone(),
        };
        if !verify_password(password, &stored) {
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %account.id, "Signed in");
        Ok(self.open_session(&account).await)
    }

    pub async fn sign_out(&self, token: &Uuid) -> Result<(), AuthError> {
        if self.sessions.remove(token).await {
            Ok(())
        } else {
            Err(AuthError::InvalidSession)
        }
    }

    pub async fn resolve(&self, token: &Uuid) -> Result<AuthenticatedUser, AuthError> {
        self.sessions
            .get(token)
            .await
            .ok_or(AuthError::InvalidSession)
    }

    async fn open_session(&self, account: &StoredAccount) -> Session {
        let user = AuthenticatedUser {
            user_id: account.id.to_string(),
            email: account.email.clone(),
        };
        let token = self.sessions.create(user.clone()).await;
        Session { token, user }
    }
}
