// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Decision engine client.
//!
//! `POST {host}/api/v1/decisions` with the applicant in camelCase JSON. The
//! engine answers with a JSON document whose `final_decision` drives the
//! application status.

use serde::Serialize;
use serde_json::Value;

use super::{ProviderError, ProviderResponse, ServiceClient};
use crate::config::ServiceEndpoint;
use crate::storage::{Address, LoanApplication};

const DECISIONS_PATH: &str = "/api/v1/decisions";

/// Applicant payload sent to the decision engine. Contains the SSN.
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub application_id: u64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub ssn: String,
    pub email: String,
    pub phone: String,
    pub income: Option<f64>,
    pub income_type: Option<String>,
    pub requested_loan_amount: f64,
    pub address: DecisionAddress,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionAddress {
    pub street: Option<String>,
    pub unit_number: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub county: Option<String>,
}

impl DecisionRequest {
    pub fn new(application: &LoanApplication, address: &Address) -> Self {
        Self {
            application_id: application.id,
            first_name: application.first_name.clone(),
            last_name: application.last_name.clone(),
            date_of_birth: application.date_of_birth.to_string(),
            ssn: application.ssn.clone(),
            email: application.email.clone(),
            phone: application.phone.clone(),
            income: application.income,
            income_type: application.income_type.clone(),
            requested_loan_amount: application.requested_loan_amount,
            address: DecisionAddress {
                street: address.street.clone(),
                unit_number: address.unit_number.clone(),
                city: address.city.clone(),
                state: address.state.clone(),
                zip: address.zip.clone(),
                county: address.county.clone(),
            },
        }
    }
}

impl std::fmt::Debug for DecisionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionRequest")
            .field("application_id", &self.application_id)
            .field("ssn", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Extract `final_decision` from a successful engine response.
///
/// Returns `Ok(None)` when the document has no (or a null) `final_decision`.
pub fn final_decision(body: &str) -> Result<Option<String>, ProviderError> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("decision body is not JSON: {e}")))?;
    Ok(match document.get("final_decision") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Debug, Clone)]
pub struct DecisionClient {
    service: ServiceClient,
}

impl DecisionClient {
    pub fn new(endpoint: &ServiceEndpoint) -> Result<Self, ProviderError> {
        Ok(Self {
            service: ServiceClient::new(endpoint)?,
        })
    }

    /// Ask the engine for a decision. Non-2xx statuses are returned, not raised.
    pub async fn request_decision(
        &self,
        request: &DecisionRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        tracing::info!(application_id = request.application_id, "Requesting decision");
        self.service.post_json(DECISIONS_PATH, request).await
    }
}
