// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Loan application endpoints, including the decision check.
//!
//! Applications are returned without their SSN. On update, a masked SSN
//! (`XXX-XX-1234`, `*****1234`) or a missing one keeps the stored value.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::Auth,
    error::{ApiError, ApiJson},
    models::{
        is_masked_ssn, ListApplicationsQuery, LoanApplicationRequest, LoanApplicationResponse,
        MessageResponse,
    },
    providers::{decision::final_decision, DecisionRequest},
    state::AppState,
    storage::{
        AddressRepository, ApplicationDecision, DecisionRepository, LoanApplication,
        LoanApplicationRepository, NewDecision, NewLoanApplication, Page, StorageError,
    },
};

const DEFAULT_PAGE_SIZE: usize = 20;
const APPLICATION_NOT_FOUND: &str = "Loan application not found";

fn load_application(state: &AppState, id: u64) -> Result<LoanApplication, ApiError> {
    LoanApplicationRepository::new(&state.db, &state.cipher)
        .get(id)
        .map_err(|e| match e {
            StorageError::NotFound(_) => ApiError::not_found(APPLICATION_NOT_FOUND),
            other => other.into(),
        })
}

fn validate(request: &LoanApplicationRequest) -> Result<(), ApiError> {
    let blank = request.blank_fields();
    if !blank.is_empty() {
        return Err(ApiError::bad_request(format!(
            "{} must not be blank",
            blank.join(", ")
        )));
    }
    if !request.requested_loan_amount.is_finite() || request.requested_loan_amount < 0.0 {
        return Err(ApiError::bad_request(
            "requestedLoanAmount must be a non-negative number",
        ));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/application_services",
    params(ListApplicationsQuery),
    tag = "Loan applications",
    responses(
        (status = 200, body = Page<LoanApplicationResponse>),
        (status = 401, body = MessageResponse)
    )
)]
pub async fn list_applications(
    Auth(_user): Auth,
    State(state): State<AppState>,
    Query(query): Query<ListApplicationsQuery>,
) -> Result<Json<Page<LoanApplicationResponse>>, ApiError> {
    let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE);
    if size == 0 {
        return Err(ApiError::bad_request("size must be greater than zero"));
    }

    let page = LoanApplicationRepository::new(&state.db, &state.cipher).list(
        query.status,
        query.page.unwrap_or(0),
        size,
    )?;
    Ok(Json(page.map(LoanApplicationResponse::from)))
}

#[utoipa::path(
    post,
    path = "/api/v1/application_services",
    request_body = LoanApplicationRequest,
    tag = "Loan applications",
    responses(
        (status = 201, body = LoanApplicationResponse),
        (status = 400, body = MessageResponse),
        (status = 404, description = "Referenced address does not exist", body = MessageResponse)
    )
)]
pub async fn create_application(
    Auth(user): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoanApplicationRequest>,
) -> Result<(StatusCode, Json<LoanApplicationResponse>), ApiError> {
    validate(&request)?;
    let ssn = request
        .ssn
        .clone()
        .filter(|ssn| !ssn.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("SSN is required"))?;
    let address_id = request
        .address_ref()
        .ok_or_else(|| ApiError::bad_request("Address is required"))?;

    let application = LoanApplicationRepository::new(&state.db, &state.cipher).create(
        NewLoanApplication {
            first_name: request.first_name,
            last_name: request.last_name,
            date_of_birth: request.date_of_birth,
            ssn,
            email: request.email,
            phone: request.phone,
            income: request.income,
            income_type: request.income_type,
            requested_loan_amount: request.requested_loan_amount,
            status: request.status,
            address_id,
        },
    )?;

    tracing::info!(
        application_id = application.id,
        created_by = user.id,
        "Loan application created"
    );
    Ok((StatusCode::CREATED, Json(application.into())))
}

/// One application with its address and most recent decision.
#[utoipa::path(
    get,
    path = "/api/v1/application_services/{id}",
    params(("id" = u64, Path, description = "Loan application id")),
    tag = "Loan applications",
    responses(
        (status = 200, body = LoanApplicationResponse),
        (status = 404, body = MessageResponse)
    )
)]
pub async fn get_application(
    Auth(_user): Auth,
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<LoanApplicationResponse>, ApiError> {
    let application = load_application(&state, id)?;

    let address = match AddressRepository::new(&state.db).get(application.address_id) {
        Ok(address) => Some(address),
        Err(StorageError::NotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };
    let last_decision = DecisionRepository::new(&state.db, &state.cipher)
        .list_for_application(id)?
        .pop();

    Ok(Json(
        LoanApplicationResponse::from(application)
            .with_address(address)
            .with_last_decision(last_decision),
    ))
}

/// Replace an application's fields (`PUT` and `PATCH`).
#[utoipa::path(
    put,
    path = "/api/v1/application_services/{id}",
    params(("id" = u64, Path, description = "Loan application id")),
    request_body = LoanApplicationRequest,
    tag = "Loan applications",
    responses(
        (status = 200, body = LoanApplicationResponse),
        (status = 400, body = MessageResponse),
        (status = 404, body = MessageResponse)
    )
)]
pub async fn update_application(
    Auth(user): Auth,
    Path(id): Path<u64>,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoanApplicationRequest>,
) -> Result<Json<LoanApplicationResponse>, ApiError> {
    validate(&request)?;
    let mut application = load_application(&state, id)?;

    application.first_name = request.first_name;
    application.last_name = request.last_name;
    application.date_of_birth = request.date_of_birth;
    application.email = request.email;
    application.phone = request.phone;
    application.income = request.income;
    application.income_type = request.income_type;
    application.requested_loan_amount = request.requested_loan_amount;

    if let Some(ssn) = request.ssn.filter(|s| !s.trim().is_empty() && !is_masked_ssn(s)) {
        application.ssn = ssn;
    }
    if let Some(address_id) = request.address_id.or(request.address.map(|a| a.id)) {
        application.address_id = address_id;
    }
    if let Some(status) = request.status {
        application.status = status;
    }

    let updated = LoanApplicationRepository::new(&state.db, &state.cipher).update(&application)?;
    tracing::info!(application_id = id, updated_by = user.id, "Loan application updated");
    Ok(Json(updated.into()))
}

/// Ask the decision engine about an application and record its answer.
///
/// A recorded `eligible` or `decline` moves the application to `approved` or
/// `rejected`.
#[utoipa::path(
    get,
    path = "/api/v1/application_services/{id}/decision_check",
    params(("id" = u64, Path, description = "Loan application id")),
    tag = "Loan applications",
    responses(
        (status = 200, body = ApplicationDecision),
        (status = 400, description = "SSN or address missing", body = MessageResponse),
        (status = 404, body = MessageResponse),
        (status = 500, description = "Decision service failure", body = MessageResponse)
    )
)]
pub async fn decision_check(
    Auth(_user): Auth,
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<ApplicationDecision>, ApiError> {
    tracing::info!(application_id = id, "Decision check requested");
    let application = load_application(&state, id)?;

    if application.ssn.is_empty() {
        tracing::error!(application_id = id, "SSN missing for decision check");
        return Err(ApiError::bad_request("SSN is required for decision check"));
    }
    let address = match AddressRepository::new(&state.db).get(application.address_id) {
        Ok(address) => address,
        Err(StorageError::NotFound(_)) => {
            tracing::error!(application_id = id, "Address missing for decision check");
            return Err(ApiError::bad_request("Address is required for decision check"));
        }
        Err(e) => return Err(e.into()),
    };

    let payload = DecisionRequest::new(&application, &address);
    let response = state
        .decisions
        .request_decision(&payload)
        .await
        .map_err(|e| {
            tracing::error!(application_id = id, error = %e, "Decision service call failed");
            ApiError::internal(format!("Decision service error: {e}"))
        })?;

    if !response.is_success() {
        tracing::error!(
            application_id = id,
            status = response.status,
            "Decision service returned an error status"
        );
        let status =
            StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return Err(ApiError::new(
            status,
            format!("Decision service error: {}", response.body),
        ));
    }

    let decision = final_decision(&response.body)
        .map_err(|e| {
            tracing::error!(application_id = id, error = %e, "Unreadable decision response");
            ApiError::internal(format!("Decision service error: {e}"))
        })?
        .ok_or_else(|| {
            tracing::error!(application_id = id, "Decision response without final_decision");
            ApiError::internal("Invalid response from decision service")
        })?;

    let request_json = serde_json::to_string(&payload).map_err(|e| {
        tracing::error!(error = %e, "Failed to serialize decision payload");
        ApiError::internal("Internal server error")
    })?;

    let recorded = DecisionRepository::new(&state.db, &state.cipher).record(NewDecision {
        loan_application_id: id,
        request: Some(request_json),
        response: Some(response.body),
        decision: Some(decision),
    })?;
    tracing::info!(
        application_id = id,
        decision_id = recorded.id,
        decision = recorded.decision.as_deref().unwrap_or_default(),
        "Application decision saved"
    );

    Ok(Json(recorded))
}
