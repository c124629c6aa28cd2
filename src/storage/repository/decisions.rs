// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Decisions returned by the decision engine for a loan application.
//!
//! The request and response payloads are encrypted at rest with the same
//! [`FieldCipher`] as the applicant SSN (the request payload carries the SSN).
//! Recording a decision also applies [`ApplicationStatus::after_decision`] to
//! the owning application, in the same write transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::loan_applications::{ApplicationStatus, StoredLoanApplication};
use crate::crypto::FieldCipher;
use crate::storage::{
    get_json_in, next_id, put_json, Database, StorageError, StorageResult, APPLICATION_DECISIONS,
    LOAN_APPLICATIONS,
};

/// A recorded decision, payloads in plaintext.
#[derive(Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDecision {
    pub id: u64,
    pub loan_application_id: u64,
    /// Payload sent to the decision engine; contains the SSN, never serialized.
    #[serde(skip_serializing, default)]
    pub request: Option<String>,
    /// Raw body returned by the decision engine.
    pub response: Option<String>,
    /// The engine's `final_decision`.
    pub decision: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for ApplicationDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationDecision")
            .field("id", &self.id)
            .field("loan_application_id", &self.loan_application_id)
            .field("decision", &self.decision)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct NewDecision {
    pub loan_application_id: u64,
    pub request: Option<String>,
    pub response: Option<String>,
    pub decision: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDecision {
    id: u64,
    loan_application_id: u64,
    request: Option<String>,
    response: Option<String>,
    decision: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub struct DecisionRepository<'a> {
    db: &'a Database,
    cipher: &'a FieldCipher,
}

impl<'a> DecisionRepository<'a> {
    pub fn new(db: &'a Database, cipher: &'a FieldCipher) -> Self {
        Self { db, cipher }
    }

    /// Persist a decision and transition the owning application's status.
    ///
    /// # Returns
    /// - `Err(StorageError::NotFound)` if the application does not exist;
    ///   nothing is written in that case
    pub fn record(&self, new: NewDecision) -> StorageResult<ApplicationDecision> {
        let now = Utc::now();
        let txn = self.db.begin_write()?;

        let mut application: StoredLoanApplication =
            get_json_in(&txn, LOAN_APPLICATIONS, new.loan_application_id)?.ok_or_else(|| {
                StorageError::NotFound(format!("Loan application {}", new.loan_application_id))
            })?;

        let id = next_id(&txn, "application_decisions")?;
        let stored = StoredDecision {
            id,
            loan_application_id: new.loan_application_id,
            request: self.cipher.encrypt(new.request.as_deref())?,
            response: self.cipher.encrypt(new.response.as_deref())?,
            decision: new.decision.clone(),
            created_at: now,
            updated_at: now,
        };
        put_json(&txn, APPLICATION_DECISIONS, id, &stored)?;

        if let Some(status) = new
            .decision
            .as_deref()
            .and_then(ApplicationStatus::after_decision)
        {
            application.status = status;
            application.updated_at = now;
            put_json(&txn, LOAN_APPLICATIONS, application.id, &application)?;
            tracing::info!(
                application_id = application.id,
                status = %status,
                "Application status updated from decision"
            );
        }
        txn.commit()?;

        Ok(ApplicationDecision {
            id,
            loan_application_id: new.loan_application_id,
            request: new.request,
            response: new.response,
            decision: new.decision,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get(&self, id: u64) -> StorageResult<ApplicationDecision> {
        let stored: StoredDecision = self
            .db
            .get_json(APPLICATION_DECISIONS, id)?
            .ok_or_else(|| StorageError::NotFound(format!("Decision {id}")))?;
        self.open(stored)
    }

    /// Decisions for one application, oldest first.
    pub fn list_for_application(&self, application_id: u64) -> StorageResult<Vec<ApplicationDecision>> {
        let rows: Vec<StoredDecision> = self.db.list_json(APPLICATION_DECISIONS)?;
        rows.into_iter()
            .filter(|row| row.loan_application_id == application_id)
            .map(|row| self.open(row))
            .collect()
    }

    fn open(&self, row: StoredDecision) -> StorageResult<ApplicationDecision> {
        Ok(ApplicationDecision {
            id: row.id,
            loan_application_id: row.loan_application_id,
            request: self.cipher.decrypt(row.request.as_deref())?,
            response: self.cipher.decrypt(row.response.as_deref())?,
            decision: row.decision,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::repository::loan_applications::test_fixtures::{
        new_application, seed_address,
    };
    use crate::storage::test_support::temp_database;
    use crate::storage::LoanApplicationRepository;

    fn decision(application_id: u64, value: &str) -> NewDecision {
        NewDecision {
            loan_application_id: application_id,
            request: Some(r#"{"ssn":"123456789"}"#.to_string()),
            response: Some(format!(r#"{{"final_decision":"{value}"}}"#)),
            decision: Some(value.to_string()),
        }
    }

    fn setup(db: &Database, cipher: &FieldCipher) -> u64 {
        let address_id = seed_address(db);
        LoanApplicationRepository::new(db, cipher)
            .create(new_application(address_id, "123456789"))
            .unwrap()
            .id
    }

    #[test]
    fn eligible_approves_and_decline_rejects() {
        let (db, _dir) = temp_database();
        let cipher = FieldCipher::new("test-passphrase");
        let app_id = setup(&db, &cipher);
        let decisions = DecisionRepository::new(&db, &cipher);
        let applications = LoanApplicationRepository::new(&db, &cipher);

        decisions.record(decision(app_id, "eligible")).unwrap();
        assert_eq!(
            applications.get(app_id).unwrap().status,
            ApplicationStatus::Approved
        );

        decisions.record(decision(app_id, "decline")).unwrap();
        assert_eq!(
            applications.get(app_id).unwrap().status,
            ApplicationStatus::Rejected
        );
    }

    #[test]
    fn other_decisions_leave_status_unchanged() {
        let (db, _dir) = temp_database();
        let cipher = FieldCipher::new("test-passphrase");
        let app_id = setup(&db, &cipher);
        let decisions = DecisionRepository::new(&db, &cipher);

        decisions.record(decision(app_id, "manual_review")).unwrap();
        assert_eq!(
            LoanApplicationRepository::new(&db, &cipher)
                .get(app_id)
                .unwrap()
                .status,
            ApplicationStatus::Pending
        );
    }

    #[test]
    fn payloads_round_trip_through_the_codec() {
        let (db, _dir) = temp_database();
        let cipher = FieldCipher::new("test-passphrase");
        let app_id = setup(&db, &cipher);
        let decisions = DecisionRepository::new(&db, &cipher);

        let recorded = decisions.record(decision(app_id, "eligible")).unwrap();
        let fetched = decisions.get(recorded.id).unwrap();
        assert_eq!(fetched, recorded);
        assert_eq!(decisions.list_for_application(app_id).unwrap().len(), 1);
        assert!(decisions.list_for_application(app_id + 1).unwrap().is_empty());

        // Wrong key cannot read the payloads back.
        let other = FieldCipher::new("another-passphrase");
        assert!(DecisionRepository::new(&db, &other).get(recorded.id).is_err());
    }

    #[test]
    fn unknown_application_writes_nothing() {
        let (db, _dir) = temp_database();
        let cipher = FieldCipher::new("test-passphrase");
        let decisions = DecisionRepository::new(&db, &cipher);

        assert!(matches!(
            decisions.record(decision(7, "eligible")),
            Err(StorageError::NotFound(_))
        ));
        assert!(decisions.list_for_application(7).unwrap().is_empty());
    }

    #[test]
    fn serialized_decision_omits_request_payload() {
        let (db, _dir) = temp_database();
        let cipher = FieldCipher::new("test-passphrase");
        let app_id = setup(&db, &cipher);
        let recorded = DecisionRepository::new(&db, &cipher)
            .record(decision(app_id, "eligible"))
            .unwrap();

        let json = serde_json::to_value(&recorded).unwrap();
        assert!(json.get("request").is_none());
        assert_eq!(json["decision"], "eligible");
        assert_eq!(json["loanApplicationId"], app_id);
    }
}
