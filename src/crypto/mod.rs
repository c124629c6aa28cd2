// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Field-Level Encryption
//!
//! Sensitive columns (the applicant SSN, decision request/response payloads)
//! are encrypted by the repositories before they reach redb and decrypted on
//! the way out. Handlers only ever see plaintext.
//!
//! ## Ciphertext Format
//!
//! Base64 text of AES-256-ECB with PKCS#7 padding. There is no IV and no
//! authentication tag, so identical plaintexts produce identical ciphertext.
//! The format is kept bit-compatible with rows written by the previous
//! back-office so that existing data stays readable.
//!
//! ## Modules
//!
//! - `field` - the [`FieldCipher`] codec
//! - `migration` - one-time encryption of legacy plaintext SSNs

pub mod field;
pub mod migration;

pub use field::{CipherError, FieldCipher};
pub use migration::{looks_like_plaintext_ssn, migrate_plaintext_ssns, MigrationReport};
