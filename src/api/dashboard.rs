// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{DashboardResponse, DashboardStatistics, LoanApplicationResponse, MessageResponse},
    state::AppState,
    storage::{ApplicationStatus, LoanApplicationRepository},
};

const RECENT_APPLICATIONS: usize = 10;

/// Newest applications and per-status counts.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, body = DashboardResponse),
        (status = 401, body = MessageResponse)
    )
)]
pub async fn dashboard(
    Auth(_user): Auth,
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let repo = LoanApplicationRepository::new(&state.db, &state.cipher);

    let recent_applications = repo
        .recent(RECENT_APPLICATIONS)?
        .into_iter()
        .map(LoanApplicationResponse::from)
        .collect();
    let statistics = DashboardStatistics {
        total: repo.count()?,
        pending: repo.count_by_status(ApplicationStatus::Pending)?,
        approved: repo.count_by_status(ApplicationStatus::Approved)?,
        rejected: repo.count_by_status(ApplicationStatus::Rejected)?,
    };

    Ok(Json(DashboardResponse {
        recent_applications,
        statistics,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_state;
    use crate::auth::{CurrentUser, Role};
    use crate::storage::repository::loan_applications::test_fixtures::{
        new_application, seed_address,
    };

    #[tokio::test]
    async fn dashboard_counts_and_limits_recent() {
        let (state, _dir) = test_state();
        let address_id = seed_address(&state.db);
        let repo = LoanApplicationRepository::new(&state.db, &state.cipher);
        for i in 0..12 {
            let mut new = new_application(address_id, "123456789");
            new.status = Some(match i % 3 {
                0 => ApplicationStatus::Pending,
                1 => ApplicationStatus::Approved,
                _ => ApplicationStatus::Rejected,
            });
            repo.create(new).unwrap();
        }

        let user = Auth(CurrentUser {
            id: 1,
            email: "a@b.com".to_string(),
            role: Role::Contractor,
        });
        let Json(body) = dashboard(user, State(state)).await.unwrap();

        assert_eq!(body.recent_applications.len(), RECENT_APPLICATIONS);
        assert_eq!(body.recent_applications[0].id, 12);
        assert_eq!(
            body.statistics,
            DashboardStatistics {
                total: 12,
                pending: 4,
                approved: 4,
                rejected: 4,
            }
        );
    }
}
