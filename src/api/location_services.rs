// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{
    auth::Auth,
    error::{ApiError, ApiJson},
    models::{LocationRequest, MessageResponse},
    providers::EligibilityOutcome,
    state::AppState,
    storage::{Address, AddressRepository},
};

/// Check an address with the location service and save it when eligible.
#[utoipa::path(
    post,
    path = "/api/v1/location_services",
    request_body = LocationRequest,
    tag = "Location",
    responses(
        (status = 200, description = "Eligible; the normalized address was saved", body = Address),
        (status = 404, description = "Address not eligible", body = MessageResponse),
        (status = 500, description = "Location service failure", body = MessageResponse)
    )
)]
pub async fn check_address(
    Auth(_user): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LocationRequest>,
) -> Result<Json<Address>, ApiError> {
    let outcome = state
        .locations
        .check_eligibility(&request.address)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Location service error");
            ApiError::internal("Location service error")
        })?;

    match outcome {
        EligibilityOutcome::Eligible(new_address) => {
            let address = AddressRepository::new(&state.db).create(new_address)?;
            tracing::info!(address_id = address.id, "Eligible address saved");
            Ok(Json(address))
        }
        EligibilityOutcome::NotEligible => Err(ApiError::not_found("Address not eligible.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_state_with_services;
    use crate::auth::{CurrentUser, Role};
    use axum::http::StatusCode;
    use mockito::Server;
    use serde_json::json;

    fn contractor() -> Auth {
        Auth(CurrentUser {
            id: 1,
            email: "a@b.com".to_string(),
            role: Role::Contractor,
        })
    }

    fn address_request() -> ApiJson<LocationRequest> {
        ApiJson(LocationRequest {
            address: json!({"street": "1 main st", "city": "springfield"}),
        })
    }

    #[tokio::test]
    async fn eligible_address_is_saved() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/v1/address/eligibility_check")
            .with_status(200)
            .with_body(
                r#"{"message":"address_eligible","formatted_address":{"street":"1 Main St","city":"Springfield","zip":"62701","state":"IL","county":"Sangamon"}}"#,
            )
            .create_async()
            .await;
        let (state, _dir) = test_state_with_services(&server.url(), &server.url());

        let Json(address) = check_address(contractor(), State(state.clone()), address_request())
            .await
            .unwrap();

        assert_eq!(address.city.as_deref(), Some("Springfield"));
        let stored = AddressRepository::new(&state.db).get(address.id).unwrap();
        assert_eq!(stored, address);
    }

    #[tokio::test]
    async fn ineligible_address_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/v1/address/eligibility_check")
            .with_status(200)
            .with_body(r#"{"message":"address_not_eligible"}"#)
            .create_async()
            .await;
        let (state, _dir) = test_state_with_services(&server.url(), &server.url());

        let error = check_address(contractor(), State(state.clone()), address_request())
            .await
            .unwrap_err();

        assert_eq!(error.status, StatusCode::NOT_FOUND);
        assert_eq!(error.message, "Address not eligible.");
        assert!(AddressRepository::new(&state.db).list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn service_failure_is_internal_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/v1/address/eligibility_check")
            .with_status(502)
            .create_async()
            .await;
        let (state, _dir) = test_state_with_services(&server.url(), &server.url());

        let error = check_address(contractor(), State(state), address_request())
            .await
            .unwrap_err();

        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.message, "Location service error");
    }
}
