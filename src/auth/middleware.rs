// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The authentication gate.
//!
//! Runs once per request, before routing reaches a handler:
//!
//! 1. Allow-listed paths pass straight through.
//! 2. No `ACCESS-TOKEN` header: the request continues without identity.
//!    Handlers that need one reject it via the [`Auth`](super::Auth)
//!    extractor.
//! 3. Header present but the token fails verification: 401 with the fixed
//!    body, and the handler never runs.
//! 4. Valid token: the user is looked up by email and attached to the request
//!    extensions as [`CurrentUser`]. A valid token for an unknown email
//!    continues without identity.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .merge(routes)
//!     .layer(axum::middleware::from_fn_with_state(state.clone(), authenticate));
//! ```

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AuthError, CurrentUser};
use crate::state::AppState;
use crate::storage::UserRepository;

/// Header carrying the raw access token.
pub const ACCESS_TOKEN_HEADER: HeaderName = HeaderName::from_static("access-token");

/// Path prefixes the gate never inspects.
pub const PUBLIC_PATH_PREFIXES: &[&str] = &[
    "/users/sign_in",
    "/login",
    "/register",
    "/health",
    "/docs",
    "/api-doc",
];

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATH_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

/// Authentication middleware function.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_public_path(request.uri().path()) {
        return next.run(request).await;
    }

    let token = match access_token(request.headers()) {
        Ok(Some(token)) => token,
        Ok(None) => return next.run(request).await,
        Err(e) => return e.into_response(),
    };

    match resolve_user(&state, &token) {
        Ok(Some(user)) => {
            tracing::debug!(user_id = user.id, role = %user.role, "Request authenticated");
            request.extensions_mut().insert(user);
        }
        Ok(None) => {
            tracing::debug!("Valid token for an unknown user, continuing unauthenticated");
        }
        Err(e) => return e.into_response(),
    }

    next.run(request).await
}

/// The token from the credential header, if one was sent.
///
/// A leading `Bearer ` is tolerated. An empty header counts as absent.
fn access_token(headers: &HeaderMap) -> Result<Option<String>, AuthError> {
    let Some(value) = headers.get(&ACCESS_TOKEN_HEADER) else {
        return Ok(None);
    };
    let raw = value.to_str().map_err(|_| AuthError::MalformedToken)?.trim();
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        return Ok(None);
    }
    Ok(Some(token.to_string()))
}

fn resolve_user(state: &AppState, token: &str) -> Result<Option<CurrentUser>, AuthError> {
    let email = state.tokens.verify(token)?;
    let user = UserRepository::new(&state.db)
        .find_by_email(&email)
        .map_err(|e| AuthError::InternalError(e.to_string()))?;
    Ok(user.as_ref().map(CurrentUser::from))
}
