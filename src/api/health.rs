// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

const OK: &str = "ok";
const UNAVAILABLE: &str = "unavailable";

/// Liveness response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Readiness response with the state of each backing component.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// "ok" when every component is usable, otherwise "degraded".
    pub status: &'static str,
    pub database: &'static str,
    /// Seconds left on a token issued now. Zero means sign-in is unusable.
    pub token_ttl_secs: u64,
}

impl ReadyResponse {
    fn probe(state: &AppState) -> Self {
        let database = match state.db.health_check() {
            Ok(()) => OK,
            Err(e) => {
                tracing::warn!(error = %e, "Database readiness check failed");
                UNAVAILABLE
            }
        };
        let token_ttl_secs = state.tokens.ttl().as_secs();
        let ready = database == OK && token_ttl_secs > 0;

        Self {
            status: if ready { OK } else { "degraded" },
            database,
            token_ttl_secs,
        }
    }

    fn status_code(&self) -> StatusCode {
        if self.status == OK {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Combined health check. Same body as readiness.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "A backing component is unavailable", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let response = ReadyResponse::probe(&state);
    (response.status_code(), Json(response))
}

/// Liveness probe. Never touches storage.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Process is running", body = HealthResponse))
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: OK,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness probe for load balancers.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready to serve traffic", body = ReadyResponse),
        (status = 503, description = "Not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(state: State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    health(state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_state;

    #[tokio::test]
    async fn ready_when_database_is_open() {
        let (state, _dir) = test_state();

        let (status, Json(body)) = readiness(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.database, "ok");
        assert!(body.token_ttl_secs > 0);
    }

    #[tokio::test]
    async fn liveness_reports_crate_version() {
        let Json(body) = liveness().await;
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }
}
