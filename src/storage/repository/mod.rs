// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the database.
//!
//! Each repository borrows the [`Database`](super::Database) and owns the
//! CRUD operations of one entity type. Repositories for entities with
//! encrypted columns also borrow the [`FieldCipher`](crate::crypto::FieldCipher).

pub mod addresses;
pub mod decisions;
pub mod loan_applications;
pub mod users;

pub use addresses::{Address, AddressRepository, NewAddress};
pub use decisions::{ApplicationDecision, DecisionRepository, NewDecision};
pub use loan_applications::{
    ApplicationStatus, LoanApplication, LoanApplicationRepository, NewLoanApplication,
};
pub use users::{normalize_email, NewUser, UserRecord, UserRepository, UserResponse};
