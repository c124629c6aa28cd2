// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-in endpoint.
//!
//! Unknown email and wrong password produce the same 401 body and the same
//! bcrypt work.

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use chrono::Utc;

use crate::{
    error::{ApiError, ApiJson},
    models::{MessageResponse, SignInRequest, SignInResponse},
    state::AppState,
    storage::UserRepository,
};

pub const INVALID_CREDENTIALS: &str = "invalid email or password";

/// Exchange email and password for an access token.
#[utoipa::path(
    post,
    path = "/users/sign_in",
    tag = "Sessions",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 401, description = "Invalid credentials", body = MessageResponse)
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<SignInRequest>,
) -> Result<Json<SignInResponse>, ApiError> {
    let repo = UserRepository::new(&state.db);
    let found = repo.find_by_email(&request.email)?;

    // Unknown emails are checked against a dummy hash, so both paths run bcrypt.
    let matches = state
        .passwords
        .verify_account_blocking(
            request.password,
            found.as_ref().map(|user| user.password_hash.clone()),
        )
        .await?;

    let user = match found {
        Some(user) if matches => user,
        Some(user) => {
            tracing::warn!(user_id = user.id, "Sign-in with wrong password");
            return Err(ApiError::new(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
        }
        None => {
            tracing::warn!(email = %request.email, "Sign-in for unknown email");
            return Err(ApiError::new(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
        }
    };

    let access_token = state.tokens.issue(&user.email).map_err(|e| {
        tracing::error!(error = %e, "Failed to issue access token");
        ApiError::internal("Internal server error")
    })?;

    repo.record_sign_in(user.id, client_ip(&headers), Utc::now())?;
    tracing::info!(user_id = user.id, "User signed in");

    Ok(Json(SignInResponse { access_token }))
}

/// First hop of `x-forwarded-for`, falling back to `x-real-ip`.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    forwarded.or_else(real_ip).map(str::to_string)
}
