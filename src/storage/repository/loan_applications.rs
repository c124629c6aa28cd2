// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Loan applications with the applicant SSN encrypted at rest.
//!
//! ## Storage Layout
//!
//! Rows are stored as [`StoredLoanApplication`], whose `ssn` holds the
//! ciphertext produced by [`FieldCipher`]. The repository seals on every write
//! and opens on every read, so callers only ever see [`LoanApplication`] with
//! the plaintext SSN. A row whose SSN fails to decrypt is an error, never a
//! blank SSN.
//!
//! `scan_raw_ssns` and `update_raw_ssn` bypass the codec and exist only for
//! the plaintext migration.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::addresses::Address;
use crate::crypto::FieldCipher;
use crate::storage::{
    get_json_in, next_id, put_json, Database, Page, StorageError, StorageResult, ADDRESSES,
    LOAN_APPLICATIONS,
};

/// Review status of a loan application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    /// Status an application moves to once a decision is recorded.
    ///
    /// `"eligible"` approves, `"decline"` rejects; any other decision leaves
    /// the status unchanged (`None`). Matching is exact.
    pub fn after_decision(decision: &str) -> Option<Self> {
        match decision {
            "eligible" => Some(Self::Approved),
            "decline" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loan application with its SSN in plaintext.
#[derive(Clone, PartialEq)]
pub struct LoanApplication {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub ssn: String,
    pub email: String,
    pub phone: String,
    pub income: Option<f64>,
    pub income_type: Option<String>,
    pub requested_loan_amount: f64,
    pub status: ApplicationStatus,
    pub address_id: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for LoanApplication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoanApplication")
            .field("id", &self.id)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("ssn", &"<redacted>")
            .field("status", &self.status)
            .field("address_id", &self.address_id)
            .finish_non_exhaustive()
    }
}

/// Fields supplied when creating an application.
#[derive(Debug, Clone)]
pub struct NewLoanApplication {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub ssn: String,
    pub email: String,
    pub phone: String,
    pub income: Option<f64>,
    pub income_type: Option<String>,
    pub requested_loan_amount: f64,
    pub status: Option<ApplicationStatus>,
    pub address_id: u64,
}

/// Row format; `ssn` is ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredLoanApplication {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub ssn: String,
    pub email: String,
    pub phone: String,
    pub income: Option<f64>,
    pub income_type: Option<String>,
    pub requested_loan_amount: f64,
    pub status: ApplicationStatus,
    pub address_id: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Repository for loan applications.
pub struct LoanApplicationRepository<'a> {
    db: &'a Database,
    cipher: &'a FieldCipher,
}

impl<'a> LoanApplicationRepository<'a> {
    pub fn new(db: &'a Database, cipher: &'a FieldCipher) -> Self {
        Self { db, cipher }
    }

    /// Create an application. Status defaults to `pending`.
    ///
    /// # Returns
    /// - `Err(StorageError::NotFound)` if the referenced address does not exist
    pub fn create(&self, new: NewLoanApplication) -> StorageResult<LoanApplication> {
        let now = Utc::now();
        let txn = self.db.begin_write()?;
        ensure_address(&txn, new.address_id)?;

        let id = next_id(&txn, "loan_applications")?;
        let application = LoanApplication {
            id,
            first_name: new.first_name,
            last_name: new.last_name,
            date_of_birth: new.date_of_birth,
            ssn: new.ssn,
            email: new.email,
            phone: new.phone,
            income: new.income,
            income_type: new.income_type,
            requested_loan_amount: new.requested_loan_amount,
            status: new.status.unwrap_or_default(),
            address_id: new.address_id,
            created_at: now,
            updated_at: now,
        };
        put_json(&txn, LOAN_APPLICATIONS, id, &self.seal(&application)?)?;
        txn.commit()?;

        Ok(application)
    }

    /// Get an application by id, decrypting its SSN.
    pub fn get(&self, id: u64) -> StorageResult<LoanApplication> {
        let stored: StoredLoanApplication = self
            .db
            .get_json(LOAN_APPLICATIONS, id)?
            .ok_or_else(|| StorageError::NotFound(format!("Loan application {id}")))?;
        self.open(stored)
    }

    /// Overwrite an application. `created_at` is preserved, `updated_at` refreshed.
    pub fn update(&self, application: &LoanApplication) -> StorageResult<LoanApplication> {
        let txn = self.db.begin_write()?;
        let existing: StoredLoanApplication = get_json_in(&txn, LOAN_APPLICATIONS, application.id)?
            .ok_or_else(|| StorageError::NotFound(format!("Loan application {}", application.id)))?;
        ensure_address(&txn, application.address_id)?;

        let mut updated = application.clone();
        updated.created_at = existing.created_at;
        updated.updated_at = Utc::now();
        put_json(&txn, LOAN_APPLICATIONS, updated.id, &self.seal(&updated)?)?;
        txn.commit()?;

        Ok(updated)
    }

    /// One page of applications in id order, optionally filtered by status.
    pub fn list(
        &self,
        status: Option<ApplicationStatus>,
        page: usize,
        size: usize,
    ) -> StorageResult<Page<LoanApplication>> {
        let rows: Vec<StoredLoanApplication> = self.db.list_json(LOAN_APPLICATIONS)?;
        let filtered = rows
            .into_iter()
            .filter(|row| status.is_none_or(|s| row.status == s))
            .collect();
        // Only the requested page is decrypted.
        Page::from_items(filtered, page, size).try_map(|row| self.open(row))
    }

    pub fn count(&self) -> StorageResult<u64> {
        self.db.count(LOAN_APPLICATIONS)
    }

    pub fn count_by_status(&self, status: ApplicationStatus) -> StorageResult<u64> {
        let rows: Vec<StoredLoanApplication> = self.db.list_json(LOAN_APPLICATIONS)?;
        Ok(rows.iter().filter(|row| row.status == status).count() as u64)
    }

    /// The `limit` most recently created applications, newest first.
    pub fn recent(&self, limit: usize) -> StorageResult<Vec<LoanApplication>> {
        let mut rows: Vec<StoredLoanApplication> = self.db.list_json(LOAN_APPLICATIONS)?;
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.into_iter()
            .take(limit)
            .map(|row| self.open(row))
            .collect()
    }

    /// Raw `(id, stored ssn)` pairs, without decryption.
    pub fn scan_raw_ssns(&self) -> StorageResult<Vec<(u64, String)>> {
        let rows: Vec<StoredLoanApplication> = self.db.list_json(LOAN_APPLICATIONS)?;
        Ok(rows.into_iter().map(|row| (row.id, row.ssn)).collect())
    }

    /// Overwrite the stored SSN column verbatim, without encryption.
    pub fn update_raw_ssn(&self, id: u64, value: &str) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        let mut row: StoredLoanApplication = get_json_in(&txn, LOAN_APPLICATIONS, id)?
            .ok_or_else(|| StorageError::NotFound(format!("Loan application {id}")))?;
        row.ssn = value.to_string();
        put_json(&txn, LOAN_APPLICATIONS, id, &row)?;
        txn.commit()?;
        Ok(())
    }

    fn seal(&self, application: &LoanApplication) -> StorageResult<StoredLoanApplication> {
        Ok(StoredLoanApplication {
            id: application.id,
            first_name: application.first_name.clone(),
            last_name: application.last_name.clone(),
            date_of_birth: application.date_of_birth,
            ssn: self.cipher.encrypt_str(&application.ssn)?,
            email: application.email.clone(),
            phone: application.phone.clone(),
            income: application.income,
            income_type: application.income_type.clone(),
            requested_loan_amount: application.requested_loan_amount,
            status: application.status,
            address_id: application.address_id,
            created_at: application.created_at,
            updated_at: application.updated_at,
        })
    }

    fn open(&self, row: StoredLoanApplication) -> StorageResult<LoanApplication> {
        let ssn = self.cipher.decrypt_str(&row.ssn).inspect_err(|e| {
            tracing::error!(application_id = row.id, error = %e, "Failed to decrypt stored SSN");
        })?;
        Ok(LoanApplication {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            date_of_birth: row.date_of_birth,
            ssn,
            email: row.email,
            phone: row.phone,
            income: row.income,
            income_type: row.income_type,
            requested_loan_amount: row.requested_loan_amount,
            status: row.status,
            address_id: row.address_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn ensure_address(txn: &redb::WriteTransaction, address_id: u64) -> StorageResult<()> {
    let address: Option<Address> = get_json_in(txn, ADDRESSES, address_id)?;
    match address {
        Some(_) => Ok(()),
        None => Err(StorageError::NotFound(format!("Address {address_id}"))),
    }
}
