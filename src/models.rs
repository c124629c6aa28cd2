// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. Entity bodies use camelCase
//! keys, matching what the admin UI sends and expects. The sign-in response
//! keeps its historical `access_token` key.
//!
//! ## Model Categories
//!
//! - **Sessions**: sign-in credentials and the issued token
//! - **Users**: account management and own-profile updates
//! - **Loan applications**: create/update bodies and the SSN-free response
//! - **Location**: address eligibility requests
//! - **Dashboard**: recent applications and status counts

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;
use crate::storage::{Address, ApplicationDecision, ApplicationStatus, LoanApplication};

// =============================================================================
// Sessions
// =============================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignInResponse {
    pub access_token: String,
}

/// Plain `{"message": ...}` body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Users
// =============================================================================

/// Body for creating or replacing a user.
///
/// `password` is optional: a new user without one gets the default password,
/// and an update without one keeps the current hash.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

/// Body for a user updating their own profile.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    /// At least 8 characters when present.
    #[serde(default)]
    pub password: Option<String>,
}

// =============================================================================
// Loan applications
// =============================================================================

/// Reference to an existing address by id.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct AddressRef {
    pub id: u64,
}

/// Body for creating or updating a loan application.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplicationRequest {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    /// Plain SSN. On update, a masked value (`X…` or `*…`) or `null` keeps the
    /// stored one.
    #[serde(default)]
    pub ssn: Option<String>,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub income: Option<f64>,
    #[serde(default)]
    pub income_type: Option<String>,
    pub requested_loan_amount: f64,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    #[serde(default)]
    pub address_id: Option<u64>,
    #[serde(default)]
    pub address: Option<AddressRef>,
}

impl LoanApplicationRequest {
    /// Referenced address, from either `addressId` or `address.id`.
    pub fn address_ref(&self) -> Option<u64> {
        self.address_id.or(self.address.map(|a| a.id))
    }

    /// Names of required text fields that are blank.
    pub fn blank_fields(&self) -> Vec<&'static str> {
        [
            ("firstName", self.first_name.as_str()),
            ("lastName", self.last_name.as_str()),
            ("email", self.email.as_str()),
            ("phone", self.phone.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// A masked SSN echoed back by the UI; never stored.
pub fn is_masked_ssn(ssn: &str) -> bool {
    ssn.starts_with('X') || ssn.starts_with('*')
}

/// Loan application as returned to clients. Never contains the SSN.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplicationResponse {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub phone: String,
    pub income: Option<f64>,
    pub income_type: Option<String>,
    pub requested_loan_amount: f64,
    pub status: ApplicationStatus,
    pub address_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_application_decision: Option<ApplicationDecision>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LoanApplication> for LoanApplicationResponse {
    fn from(app: LoanApplication) -> Self {
        Self {
            id: app.id,
            first_name: app.first_name,
            last_name: app.last_name,
            date_of_birth: app.date_of_birth,
            email: app.email,
            phone: app.phone,
            income: app.income,
            income_type: app.income_type,
            requested_loan_amount: app.requested_loan_amount,
            status: app.status,
            address_id: app.address_id,
            address: None,
            last_application_decision: None,
            created_at: app.created_at,
            updated_at: app.updated_at,
        }
    }
}

impl LoanApplicationResponse {
    pub fn with_address(mut self, address: Option<Address>) -> Self {
        self.address = address;
        self
    }

    pub fn with_last_decision(mut self, decision: Option<ApplicationDecision>) -> Self {
        self.last_application_decision = decision;
        self
    }
}

/// Query string of the application listing.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct ListApplicationsQuery {
    /// Only applications in this status
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    /// Zero-based page index
    #[serde(default)]
    pub page: Option<usize>,
    /// Page size (default 20)
    #[serde(default)]
    pub size: Option<usize>,
}

// =============================================================================
// Location
// =============================================================================

/// Body of an eligibility check; `address` is forwarded as entered.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LocationRequest {
    #[schema(value_type = Object)]
    pub address: serde_json::Value,
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DashboardStatistics {
    pub total: u64,
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub recent_applications: Vec<LoanApplicationResponse>,
    pub statistics: DashboardStatistics,
}
