// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Salted password digests.
//!
//! `digest = Argon2id(password, salt)` with a random 16-byte salt. Both are
//! stored as standard base64.

use argon2::{Algorithm, Argon2, Params, Version};
use base64ct::{Base64, Encoding};
use rand::RngCore;
use subtle::ConstantTimeEq;

use super::AuthError;

pub const MIN_PASSWORD_CHARS: usize = 6;

pub const SALT_SIZE: usize = 16;
pub const HASH_SIZE: usize = 32;

/// Memory cost in KiB.
const ARGON_MEMORY_KIB: u32 = 19 * 1024;
const ARGON_ITERATIONS: u32 = 2;
const ARGON_LANES: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordDigest {
    pub salt: String,
    pub digest: String,
}

fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    rand::rng().fill_bytes(&mut salt);
    salt
}

fn argon2id_hash(password: &str, salt: &[u8]) -> Result<[u8; HASH_SIZE], argon2::Error> {
    let params = Params::new(
        ARGON_MEMORY_KIB,
        ARGON_ITERATIONS,
        ARGON_LANES,
        Some(HASH_SIZE),
    )?;
    let mut output = [0u8; HASH_SIZE];
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params).hash_password_into(
        password.as_bytes(),
        salt,
        &mut output,
    )?;
    Ok(output)
}

pub fn hash_password(password: &str) -> Result<PasswordDigest, AuthError> {
    let salt = generate_salt();
    let digest = argon2id_hash(password, &salt)
        .map_err(|e| AuthError::Internal(format!("Argon2id hashing failed: {e}")))?;
    Ok(PasswordDigest {
        salt: Base64::encode_string(&salt),
        digest: Base64::encode_string(&digest),
    })
}

/// Constant-time comparison. Undecodable stored values never match.
pub fn verify_password(password: &str, stored: &PasswordDigest) -> bool {
    let (Ok(salt), Ok(expected)) = (
        Base64::decode_vec(&stored.salt),
        Base64::decode_vec(&stored.digest),
    ) else {
        return false;
    };
    match argon2id_hash(password, &salt) {
        Ok(computed) => computed.as_slice().ct_eq(expected.as_slice()).into(),
        Err(_) => false,
    }
}
