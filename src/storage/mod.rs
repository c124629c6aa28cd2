// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Persistent Storage
//!
//! Embedded relational store backed by redb (pure Rust, ACID). Every entity
//! lives in its own table keyed by a `u64` id, serialized as JSON.
//!
//! ## Table Layout
//!
//! - `users`: id → `UserRecord`
//! - `users_by_email`: lowercase email → user id
//! - `addresses`: id → `Address`
//! - `loan_applications`: id → stored application (SSN as ciphertext)
//! - `application_decisions`: id → stored decision (payloads as ciphertext)
//! - `sequences`: table name → last issued id
//!
//! ## Encrypted Columns
//!
//! Repositories that own an encrypted column take a [`FieldCipher`] at
//! construction and apply it on every write and read. A cipher failure aborts
//! the enclosing operation with [`StorageError::Cipher`].
//!
//! [`FieldCipher`]: crate::crypto::FieldCipher

use std::path::Path;

use redb::{
    ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition, WriteTransaction,
};
use serde::{de::DeserializeOwned, Serialize};
use utoipa::ToSchema;

use crate::crypto::CipherError;

pub mod repository;

pub use repository::{
    Address, AddressRepository, ApplicationDecision, ApplicationStatus, DecisionRepository,
    LoanApplication, LoanApplicationRepository, NewAddress, NewDecision, NewLoanApplication,
    NewUser, UserRecord, UserRepository, UserResponse,
};

// =============================================================================
// Table Definitions
// =============================================================================

/// JSON-valued entity table keyed by id.
pub(crate) type EntityTable = TableDefinition<'static, u64, &'static [u8]>;

pub(crate) const USERS: EntityTable = TableDefinition::new("users");
pub(crate) const USERS_BY_EMAIL: TableDefinition<&str, u64> = TableDefinition::new("users_by_email");
pub(crate) const ADDRESSES: EntityTable = TableDefinition::new("addresses");
pub(crate) const LOAN_APPLICATIONS: EntityTable = TableDefinition::new("loan_applications");
pub(crate) const APPLICATION_DECISIONS: EntityTable =
    TableDefinition::new("application_decisions");
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("field encryption error: {0}")]
    Cipher(#[from] CipherError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Pagination
// =============================================================================

/// One page of a listing, shaped the way the admin UI consumes it.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub content: Vec<T>,
    /// Number of items across all pages.
    pub total_elements: usize,
    /// Number of pages for the given size.
    pub total_pages: usize,
    /// Zero-based page index.
    pub number: usize,
    /// Requested page size.
    pub size: usize,
}

impl<T> Page<T> {
    /// Slice `items` into the requested zero-based page.
    pub fn from_items(items: Vec<T>, number: usize, size: usize) -> Self {
        let total_elements = items.len();
        let total_pages = if size == 0 {
            0
        } else {
            total_elements.div_ceil(size)
        };
        let content = items
            .into_iter()
            .skip(number.saturating_mul(size))
            .take(size)
            .collect();
        Self {
            content,
            total_elements,
            total_pages,
            number,
            size,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            number: self.number,
            size: self.size,
        }
    }

    /// Convert every item while keeping the page metadata.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            content: self.content.into_iter().map(f).collect::<Result<_, _>>()?,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            number: self.number,
            size: self.size,
        })
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the embedded database.
pub struct Database {
    db: redb::Database,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = redb::Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERS_BY_EMAIL)?;
            let _ = write_txn.open_table(ADDRESSES)?;
            let _ = write_txn.open_table(LOAN_APPLICATIONS)?;
            let _ = write_txn.open_table(APPLICATION_DECISIONS)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    pub(crate) fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Verify that a read transaction can be opened.
    pub fn health_check(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(USERS)?;
        Ok(())
    }

    /// Read and deserialize one row.
    pub(crate) fn get_json<T: DeserializeOwned>(
        &self,
        table: EntityTable,
        id: u64,
    ) -> StorageResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Read and deserialize every row, in id order.
    pub(crate) fn list_json<T: DeserializeOwned>(&self, table: EntityTable) -> StorageResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        let mut rows = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            rows.push(serde_json::from_slice(value.value())?);
        }
        Ok(rows)
    }

    /// Number of rows in a table.
    pub(crate) fn count(&self, table: EntityTable) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        Ok(table.len()?)
    }

    /// Look up a user id by normalized email.
    pub(crate) fn user_id_by_email(&self, email: &str) -> StorageResult<Option<u64>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS_BY_EMAIL)?;
        Ok(table.get(email)?.map(|v| v.value()))
    }
}

// =============================================================================
// Write-transaction helpers
// =============================================================================

/// Allocate the next id for `table_name` inside an open write transaction.
pub(crate) fn next_id(txn: &WriteTransaction, table_name: &str) -> StorageResult<u64> {
    let mut sequences = txn.open_table(SEQUENCES)?;
    let next = sequences.get(table_name)?.map(|v| v.value()).unwrap_or(0) + 1;
    sequences.insert(table_name, next)?;
    Ok(next)
}

/// Serialize and insert a row inside an open write transaction.
pub(crate) fn put_json<T: Serialize>(
    txn: &WriteTransaction,
    table: EntityTable,
    id: u64,
    value: &T,
) -> StorageResult<()> {
    let json = serde_json::to_vec(value)?;
    let mut table = txn.open_table(table)?;
    table.insert(id, json.as_slice())?;
    Ok(())
}

/// Read a row inside an open write transaction.
pub(crate) fn get_json_in<T: DeserializeOwned>(
    txn: &WriteTransaction,
    table: EntityTable,
    id: u64,
) -> StorageResult<Option<T>> {
    let table = txn.open_table(table)?;
    let bytes = match table.get(id)? {
        Some(value) => value.value().to_vec(),
        None => return Ok(None),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}
