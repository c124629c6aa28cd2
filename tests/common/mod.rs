// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::Request,
    response::Response,
    Router,
};
use loan_admin_server::{
    api::router,
    auth::{PasswordHasher, Role, TokenService, ACCESS_TOKEN_HEADER},
    config::ServiceEndpoint,
    crypto::FieldCipher,
    providers::{DecisionClient, LocationClient},
    state::AppState,
    storage::{Database, NewUser, UserRecord, UserRepository},
};
use serde_json::Value;
use tempfile::TempDir;
use url::Url;

pub const SECRET: &[u8] = b"integration-secret-at-least-32-bytes";
pub const PASSPHRASE: &str = "integration-passphrase";

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_services("http://127.0.0.1:9", "http://127.0.0.1:9")
    }

    pub fn with_services(decision_url: &str, location_url: &str) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let db = Database::open(&dir.path().join("app.redb")).expect("open database");
        let state = AppState::new(
            db,
            TokenService::new(SECRET, Duration::from_secs(4 * 60 * 60)),
            FieldCipher::new(PASSPHRASE),
            PasswordHasher::new(4),
            DecisionClient::new(&endpoint(decision_url)).expect("decision client"),
            LocationClient::new(&endpoint(location_url)).expect("location client"),
        );
        let router = router(state.clone());
        Self {
            state,
            router,
            _dir: dir,
        }
    }

    pub fn seed_user(&self, email: &str, password: &str, role: Role) -> UserRecord {
        UserRepository::new(&self.state.db)
            .create(NewUser {
                email: email.to_string(),
                password_hash: self.state.passwords.hash(password).expect("hash"),
                role,
                first_name: None,
                last_name: None,
                contact: None,
            })
            .expect("seed user")
    }
}

fn endpoint(url: &str) -> ServiceEndpoint {
    ServiceEndpoint {
        host: Url::parse(url).expect("service url"),
        api_token: None,
    }
}

pub fn get(path: &str, token: Option<&str>) -> Request<Body> {
    request("GET", path, token, None)
}

pub fn request(method: &str, path: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(ACCESS_TOKEN_HEADER, token);
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
