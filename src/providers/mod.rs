// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Clients for the external JSON services.
//!
//! Both services authenticate with an `Api-Token` header and are called with a
//! 15 second timeout. Transport failures become [`ProviderError`]; HTTP error
//! statuses are returned to the caller as a [`ProviderResponse`] so handlers
//! can decide how to surface them. There are no retries.

use std::time::Duration;

use reqwest::Client;

use crate::config::ServiceEndpoint;

pub mod decision;
pub mod location;

pub use decision::{DecisionAddress, DecisionClient, DecisionRequest};
pub use location::{EligibilityOutcome, LocationClient};

/// Header carrying the service credential.
pub const API_TOKEN_HEADER: &str = "Api-Token";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Status code and raw body of a service response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: String,
}

impl ProviderResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Shared HTTP plumbing for one external service.
#[derive(Debug, Clone)]
struct ServiceClient {
    http: Client,
    base_url: String,
    api_token: Option<String>,
}

impl ServiceClient {
    fn new(endpoint: &ServiceEndpoint) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: endpoint.host.as_str().trim_end_matches('/').to_string(),
            api_token: endpoint.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<ProviderResponse, ProviderError> {
        let mut request = self.http.post(self.url(path)).json(body);
        if let Some(token) = self.api_token.as_deref().filter(|t| !t.is_empty()) {
            request = request.header(API_TOKEN_HEADER, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("POST {path} failed: {e}")))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("POST {path} unreadable body: {e}")))?;

        tracing::debug!(path, status, "External service responded");
        Ok(ProviderResponse { status, body })
    }
}
