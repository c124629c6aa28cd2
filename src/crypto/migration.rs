// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! One-time encryption of SSNs stored before field encryption was enabled.
//!
//! Candidates are stored values of exactly nine ASCII digits. Ciphertext is
//! base64 of at least one 16-byte block (24 characters), so it never matches
//! and a second pass is a no-op. Each candidate is written back with a raw
//! column update so the value is encrypted exactly once.
//!
//! Must not run concurrently with another migration pass.

use super::FieldCipher;
use crate::storage::{Database, LoanApplicationRepository, StorageError, StorageResult};

/// Length of an unformatted SSN.
const PLAINTEXT_SSN_LEN: usize = 9;

/// Outcome of one migration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Rows examined
    pub scanned: usize,
    /// Rows re-encrypted in place
    pub encrypted: usize,
    /// Rows that did not look like plaintext
    pub skipped: usize,
    /// Rows whose encryption or write failed
    pub failed: usize,
}

/// `true` for a stored value that is an unencrypted SSN.
pub fn looks_like_plaintext_ssn(value: &str) -> bool {
    value.len() == PLAINTEXT_SSN_LEN && value.bytes().all(|b| b.is_ascii_digit())
}

/// Encrypt every plaintext SSN in place.
///
/// Per-row failures are logged and counted; the pass continues. Only a
/// failure to scan the table aborts.
pub fn migrate_plaintext_ssns(db: &Database, cipher: &FieldCipher) -> StorageResult<MigrationReport> {
    let repo = LoanApplicationRepository::new(db, cipher);
    let rows = repo.scan_raw_ssns()?;
    let report = migrate_rows(&repo, cipher, rows);

    tracing::info!(
        scanned = report.scanned,
        encrypted = report.encrypted,
        skipped = report.skipped,
        failed = report.failed,
        "SSN encryption migration complete"
    );

    Ok(report)
}

/// Encrypt the plaintext values among already scanned `(id, stored)` rows.
fn migrate_rows(
    repo: &LoanApplicationRepository<'_>,
    cipher: &FieldCipher,
    rows: Vec<(u64, String)>,
) -> MigrationReport {
    let mut report = MigrationReport {
        scanned: rows.len(),
        ..Default::default()
    };

    for (id, stored) in rows {
        if !looks_like_plaintext_ssn(&stored) {
            report.skipped += 1;
            continue;
        }

        let result = cipher
            .encrypt_str(&stored)
            .map_err(StorageError::from)
            .and_then(|encrypted| repo.update_raw_ssn(id, &encrypted));

        match result {
            Ok(()) => {
                report.encrypted += 1;
                tracing::debug!(application_id = id, "Encrypted plaintext SSN");
            }
            Err(e) => {
                report.failed += 1;
                tracing::error!(application_id = id, error = %e, "Failed to encrypt SSN");
            }
        }
    }

    report
}
