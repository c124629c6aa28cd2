// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-in and the authentication gate, end to end through the router.

mod common;

use axum::http::StatusCode;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use loan_admin_server::auth::Role;
use serde_json::json;
use tower::ServiceExt;

use common::{get, json_body, request, TestApp};

const SESSION_MESSAGE: &str = "session expire or invalid access token.";

async fn sign_in(app: &TestApp, email: &str, password: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/users/sign_in",
            None,
            Some(json!({"email": email, "password": password})),
        ))
        .await
        .unwrap();
    let status = response.status();
    (status, json_body(response).await)
}

#[tokio::test]
async fn signed_in_user_reaches_protected_routes() {
    let app = TestApp::new();
    app.seed_user("a@b.com", "correct-horse", Role::Contractor);

    let (status, body) = sign_in(&app, "a@b.com", "correct-horse").await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().unwrap().to_string();
    assert_eq!(app.state.tokens.verify(&token).unwrap(), "a@b.com");

    let response = app
        .router
        .clone()
        .oneshot(get("/api/v1/users/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["email"], "a@b.com");
}

#[tokio::test]
async fn wrong_password_gets_generic_error_and_no_token() {
    let app = TestApp::new();
    app.seed_user("a@b.com", "correct-horse", Role::Contractor);

    let (status, body) = sign_in(&app, "a@b.com", "battery-staple").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"message": "invalid email or password"}));

    let (status, unknown) = sign_in(&app, "nobody@b.com", "correct-horse").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, body);
}

#[tokio::test]
async fn missing_header_is_rejected_on_protected_route() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(get("/api/v1/application_services", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await, json!({"message": SESSION_MESSAGE}));
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = TestApp::new();
    app.seed_user("a@b.com", "correct-horse", Role::Contractor);
    let token = app
        .state
        .tokens
        .issue_at("a@b.com", Utc::now() - Duration::hours(5))
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(get("/api/v1/dashboard", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await, json!({"message": SESSION_MESSAGE}));
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let app = TestApp::new();
    app.seed_user("a@b.com", "correct-horse", Role::Admin);
    app.seed_user("victim@b.com", "correct-horse", Role::Admin);
    let token = app.state.tokens.issue("a@b.com").unwrap();

    // Swap the email claim while keeping the original signature.
    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    let mut claims: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(&parts[1]).unwrap()).unwrap();
    claims["email"] = json!("victim@b.com");
    parts[1] = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
    let forged = parts.join(".");

    let response = app
        .router
        .clone()
        .oneshot(get("/api/v1/users", Some(&forged)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn public_paths_ignore_a_bad_token() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(get("/health/live", Some("garbage")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn admin_manages_users_and_contractor_cannot() {
    let app = TestApp::new();
    let admin = app.seed_user("admin@b.com", "admin-password", Role::Admin);
    let contractor = app.seed_user("c@b.com", "contractor-pw", Role::Contractor);
    let admin_token = app.state.tokens.issue(&admin.email).unwrap();
    let contractor_token = app.state.tokens.issue(&contractor.email).unwrap();
    let new_user = json!({"email": "new@b.com", "firstName": "New"});

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/users",
            Some(&contractor_token),
            Some(new_user.clone()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .router
        .clone()
        .oneshot(request("POST", "/api/v1/users", Some(&admin_token), Some(new_user)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Created without a password, so the default applies.
    let (status, _) = sign_in(&app, "new@b.com", "12345678").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_sign_in_body_uses_message_shape() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/users/sign_in",
            None,
            Some(json!({"email": "a@b.com"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("password"));
}
