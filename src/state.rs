// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{PasswordHasher, TokenService};
use crate::config::AppConfig;
use crate::crypto::FieldCipher;
use crate::providers::{DecisionClient, LocationClient, ProviderError};
use crate::storage::Database;

/// Shared, read-only application state.
///
/// Both keys (token signing and field encryption) are loaded once at startup
/// and never change afterwards.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub tokens: Arc<TokenService>,
    pub cipher: Arc<FieldCipher>,
    pub passwords: PasswordHasher,
    pub decisions: DecisionClient,
    pub locations: LocationClient,
}

impl AppState {
    pub fn new(
        db: Database,
        tokens: TokenService,
        cipher: FieldCipher,
        passwords: PasswordHasher,
        decisions: DecisionClient,
        locations: LocationClient,
    ) -> Self {
        Self {
            db: Arc::new(db),
            tokens: Arc::new(tokens),
            cipher: Arc::new(cipher),
            passwords,
            decisions,
            locations,
        }
    }

    /// Build the state for a loaded configuration around an opened database.
    pub fn from_config(config: &AppConfig, db: Database) -> Result<Self, ProviderError> {
        Ok(Self::new(
            db,
            TokenService::from_settings(&config.auth),
            FieldCipher::new(&config.encryption_key),
            PasswordHasher::default(),
            DecisionClient::new(&config.decision_service)?,
            LocationClient::new(&config.location_service)?,
        ))
    }
}
