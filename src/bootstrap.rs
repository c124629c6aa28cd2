// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! One-shot startup tasks run before the server accepts requests.

use crate::auth::{PasswordHasher, Role};
use crate::config::SeedAdmin;
use crate::crypto::{migrate_plaintext_ssns, FieldCipher, MigrationReport};
use crate::storage::{Database, NewUser, StorageError, UserRepository};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Create the configured admin account unless the email is already taken.
///
/// Returns `true` when an account was created.
pub fn seed_admin(
    db: &Database,
    passwords: &PasswordHasher,
    seed: &SeedAdmin,
) -> Result<bool, BootstrapError> {
    let repo = UserRepository::new(db);
    if repo.find_by_email(&seed.email)?.is_some() {
        tracing::debug!(email = %seed.email, "Seed admin already exists");
        return Ok(false);
    }

    let user = repo.create(NewUser {
        email: seed.email.clone(),
        password_hash: passwords.hash(&seed.password)?,
        role: Role::Admin,
        first_name: None,
        last_name: None,
        contact: None,
    })?;
    tracing::info!(user_id = user.id, email = %user.email, "Seed admin created");
    Ok(true)
}

/// Encrypt any SSNs still stored in plaintext.
pub fn run_ssn_migration(
    db: &Database,
    cipher: &FieldCipher,
) -> Result<MigrationReport, BootstrapError> {
    let report = migrate_plaintext_ssns(db, cipher)?;
    if report.failed > 0 {
        tracing::warn!(
            failed = report.failed,
            "Some SSNs are still stored in plaintext; rerun the migration"
        );
    }
    Ok(report)
}
