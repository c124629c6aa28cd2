// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! bcrypt password hashing.
//!
//! Hashing is CPU-bound. Async handlers call the `*_blocking` variants, which
//! run on tokio's blocking pool.

use std::sync::OnceLock;

/// Work factor for new hashes.
pub const DEFAULT_COST: u32 = 10;

/// Password given to users created without one.
pub const DEFAULT_PASSWORD: &str = "12345678";

/// Hashed once per process and verified against when an email has no account.
const UNKNOWN_ACCOUNT_PASSWORD: &str = "unknown-account";

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("bcrypt failed: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("password task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, plain: &str) -> Result<String, bcrypt::BcryptError> {
        bcrypt::hash(plain, self.cost)
    }

    /// `false` for a wrong password and for a hash that cannot be parsed.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        match bcrypt::verify(plain, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is unreadable");
                false
            }
        }
    }

    /// Verify against a stored hash, or against a dummy hash when there is no
    /// account. Always `false` for a missing account.
    pub fn verify_account(&self, plain: &str, hash: Option<&str>) -> bool {
        match hash {
            Some(hash) => self.verify(plain, hash),
            None => {
                static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
                let dummy = DUMMY_HASH
                    .get_or_init(|| bcrypt::hash(UNKNOWN_ACCOUNT_PASSWORD, self.cost).ok());
                if let Some(dummy) = dummy {
                    let _ = bcrypt::verify(plain, dummy);
                }
                false
            }
        }
    }

    /// [`hash`](Self::hash) on the blocking pool.
    pub async fn hash_blocking(self, plain: String) -> Result<String, PasswordError> {
        Ok(tokio::task::spawn_blocking(move || self.hash(&plain)).await??)
    }

    /// [`verify_account`](Self::verify_account) on the blocking pool.
    pub async fn verify_account_blocking(
        self,
        plain: String,
        hash: Option<String>,
    ) -> Result<bool, PasswordError> {
        let matches =
            tokio::task::spawn_blocking(move || self.verify_account(&plain, hash.as_deref()))
                .await?;
        Ok(matches)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}
