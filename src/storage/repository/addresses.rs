// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Postal addresses referenced by loan applications.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::{next_id, put_json, Database, StorageError, StorageResult, ADDRESSES};

/// A persisted postal address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: u64,
    pub street: Option<String>,
    pub unit_number: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub county: Option<String>,
}

impl Address {
    /// Single-line rendering: `street, state, county zip`.
    pub fn full_address(&self) -> String {
        format!(
            "{}, {}, {} {}",
            self.street.as_deref().unwrap_or_default(),
            self.state.as_deref().unwrap_or_default(),
            self.county.as_deref().unwrap_or_default(),
            self.zip.as_deref().unwrap_or_default(),
        )
    }
}

/// Address fields supplied on create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub unit_number: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
}

pub struct AddressRepository<'a> {
    db: &'a Database,
}

impl<'a> AddressRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create(&self, new: NewAddress) -> StorageResult<Address> {
        let txn = self.db.begin_write()?;
        let id = next_id(&txn, "addresses")?;
        let address = Address {
            id,
            street: new.street,
            unit_number: new.unit_number,
            city: new.city,
            state: new.state,
            zip: new.zip,
            county: new.county,
        };
        put_json(&txn, ADDRESSES, id, &address)?;
        txn.commit()?;
        Ok(address)
    }

    pub fn get(&self, id: u64) -> StorageResult<Address> {
        self.db
            .get_json(ADDRESSES, id)?
            .ok_or_else(|| StorageError::NotFound(format!("Address {id}")))
    }

    pub fn list(&self) -> StorageResult<Vec<Address>> {
        self.db.list_json(ADDRESSES)
    }
}
