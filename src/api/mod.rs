// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::authenticate,
    models::{
        AddressRef, DashboardResponse, DashboardStatistics, LoanApplicationRequest,
        LoanApplicationResponse, LocationRequest, MessageResponse, SignInRequest, SignInResponse,
        UpdateProfileRequest, UserRequest,
    },
    state::AppState,
    storage::{Address, ApplicationDecision, ApplicationStatus, UserResponse},
};

pub mod dashboard;
pub mod health;
pub mod loan_applications;
pub mod location_services;
pub mod sessions;
pub mod users;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/me", get(users::get_me).put(users::update_me))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/application_services",
            get(loan_applications::list_applications).post(loan_applications::create_application),
        )
        .route(
            "/application_services/{id}",
            get(loan_applications::get_application)
                .put(loan_applications::update_application)
                .patch(loan_applications::update_application),
        )
        .route(
            "/application_services/{id}/decision_check",
            get(loan_applications::decision_check),
        )
        .route("/location_services", post(location_services::check_address))
        .route("/dashboard", get(dashboard::dashboard));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/users/sign_in", post(sessions::sign_in))
        .route("/login", post(sessions::sign_in))
        .nest("/api/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        sessions::sign_in,
        users::list_users,
        users::get_user,
        users::get_me,
        users::update_me,
        users::create_user,
        users::update_user,
        users::delete_user,
        loan_applications::list_applications,
        loan_applications::create_application,
        loan_applications::get_application,
        loan_applications::update_application,
        loan_applications::decision_check,
        location_services::check_address,
        dashboard::dashboard
    ),
    components(
        schemas(
            SignInRequest,
            SignInResponse,
            MessageResponse,
            UserRequest,
            UpdateProfileRequest,
            UserResponse,
            AddressRef,
            Address,
            ApplicationStatus,
            ApplicationDecision,
            LoanApplicationRequest,
            LoanApplicationResponse,
            LocationRequest,
            DashboardStatistics,
            DashboardResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Sessions", description = "Sign-in and access tokens"),
        (name = "Users", description = "Back-office user accounts"),
        (name = "Loan applications", description = "Applications and decision checks"),
        (name = "Location", description = "Address eligibility"),
        (name = "Dashboard", description = "Recent activity and statistics")
    )
)]
pub struct ApiDoc;
