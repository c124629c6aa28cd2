// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Location service client (address eligibility).

use serde::Deserialize;
use serde_json::{json, Value};

use super::{ProviderError, ProviderResponse, ServiceClient};
use crate::config::ServiceEndpoint;
use crate::storage::NewAddress;

const ELIGIBILITY_PATH: &str = "/api/v1/address/eligibility_check";
const ELIGIBLE_MESSAGE: &str = "address_eligible";

/// Result of an eligibility check.
#[derive(Debug, Clone, PartialEq)]
pub enum EligibilityOutcome {
    /// Eligible; carries the normalized address to persist
    Eligible(NewAddress),
    /// Not eligible, or unknown to the service (404)
    NotEligible,
}

#[derive(Deserialize)]
struct EligibilityBody {
    message: Option<String>,
    formatted_address: Option<FormattedAddress>,
}

#[derive(Deserialize)]
struct FormattedAddress {
    street: Option<String>,
    city: Option<String>,
    zip: Option<String>,
    state: Option<String>,
    county: Option<String>,
}

/// Interpret a raw service response.
///
/// Statuses other than 2xx and 404 are errors.
pub fn classify(response: &ProviderResponse) -> Result<EligibilityOutcome, ProviderError> {
    if response.status == 404 {
        return Ok(EligibilityOutcome::NotEligible);
    }
    if !response.is_success() {
        return Err(ProviderError::Status {
            status: response.status,
            body: response.body.clone(),
        });
    }

    let body: EligibilityBody = serde_json::from_str(&response.body)
        .map_err(|e| ProviderError::InvalidResponse(format!("eligibility body: {e}")))?;
    if body.message.as_deref() != Some(ELIGIBLE_MESSAGE) {
        return Ok(EligibilityOutcome::NotEligible);
    }

    let formatted = body.formatted_address.ok_or_else(|| {
        ProviderError::InvalidResponse("eligible response without formatted_address".to_string())
    })?;
    Ok(EligibilityOutcome::Eligible(NewAddress {
        street: formatted.street,
        unit_number: None,
        city: formatted.city,
        state: formatted.state,
        zip: formatted.zip,
        county: formatted.county,
    }))
}

#[derive(Debug, Clone)]
pub struct LocationClient {
    service: ServiceClient,
}

impl LocationClient {
    pub fn new(endpoint: &ServiceEndpoint) -> Result<Self, ProviderError> {
        Ok(Self {
            service: ServiceClient::new(endpoint)?,
        })
    }

    /// Check whether `address` (free-form JSON, as entered) is serviceable.
    pub async fn check_eligibility(&self, address: &Value) -> Result<EligibilityOutcome, ProviderError> {
        let response = self
            .service
            .post_json(ELIGIBILITY_PATH, &json!({ "address": address }))
            .await?;
        classify(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use url::Url;

    fn client(server: &Server, token: Option<&str>) -> LocationClient {
        LocationClient::new(&ServiceEndpoint {
            host: Url::parse(&server.url()).unwrap(),
            api_token: token.map(str::to_string),
        })
        .unwrap()
    }

    fn response(status: u16, body: &str) -> ProviderResponse {
        ProviderResponse {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn eligible_response_yields_formatted_address() {
        let outcome = classify(&response(
            200,
            r#"{"message":"address_eligible","formatted_address":{"street":"1 Main St","city":"Springfield","zip":"62701","state":"IL","county":"Sangamon"}}"#,
        ))
        .unwrap();

        match outcome {
            EligibilityOutcome::Eligible(address) => {
                assert_eq!(address.street.as_deref(), Some("1 Main St"));
                assert_eq!(address.county.as_deref(), Some("Sangamon"));
            }
            other => panic!("expected eligible, got {other:?}"),
        }
    }

    #[test]
    fn other_messages_and_404_are_not_eligible() {
        assert_eq!(
            classify(&response(200, r#"{"message":"address_not_eligible"}"#)).unwrap(),
            EligibilityOutcome::NotEligible
        );
        assert_eq!(
            classify(&response(404, "not found")).unwrap(),
            EligibilityOutcome::NotEligible
        );
    }

    #[test]
    fn server_errors_and_garbage_fail() {
        assert!(matches!(
            classify(&response(503, "down")),
            Err(ProviderError::Status { status: 503, .. })
        ));
        assert!(matches!(
            classify(&response(200, "<html>")),
            Err(ProviderError::InvalidResponse(_))
        ));
        assert!(matches!(
            classify(&response(200, r#"{"message":"address_eligible"}"#)),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn wraps_address_and_sends_token_when_configured() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/address/eligibility_check")
            .match_header("Api-Token", "loc-token")
            .match_body(Matcher::Json(json!({"address": "1 main st springfield"})))
            .with_status(200)
            .with_body(r#"{"message":"address_eligible","formatted_address":{"street":"1 Main St"}}"#)
            .create_async()
            .await;

        let outcome = client(&server, Some("loc-token"))
            .check_eligibility(&json!("1 main st springfield"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(matches!(outcome, EligibilityOutcome::Eligible(_)));
    }

    #[tokio::test]
    async fn omits_token_when_not_configured() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/address/eligibility_check")
            .match_header("Api-Token", Matcher::Missing)
            .with_status(404)
            .create_async()
            .await;

        let outcome = client(&server, None)
            .check_eligibility(&json!({"street": "nowhere"}))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(outcome, EligibilityOutcome::NotEligible);
    }
}
