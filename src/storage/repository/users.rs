// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Back-office user accounts.
//!
//! Users are indexed by lowercase email in `users_by_email`; the index and the
//! row are always written in the same transaction. Password hashes are stored
//! here but never leave the repository through [`UserResponse`].

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;
use crate::storage::{
    get_json_in, next_id, put_json, Database, StorageError, StorageResult, USERS, USERS_BY_EMAIL,
};

/// User row as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub id: u64,
    pub email: String,
    /// bcrypt hash
    pub password_hash: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub contact: Option<String>,
    pub sign_in_count: u32,
    pub current_sign_in_at: Option<DateTime<Utc>>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
    pub current_sign_in_ip: Option<String>,
    pub last_sign_in_ip: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub contact: Option<String>,
}

/// User as returned to API clients (never includes the password hash).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: u64,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    pub sign_in_count: u32,
    pub current_sign_in_at: Option<DateTime<Utc>>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            first_name: user.first_name,
            last_name: user.last_name,
            contact: user.contact,
            sign_in_count: user.sign_in_count,
            current_sign_in_at: user.current_sign_in_at,
            last_sign_in_at: user.last_sign_in_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Case-insensitive key for the email index.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Repository for user accounts.
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a user.
    ///
    /// # Returns
    /// - `Err(StorageError::AlreadyExists)` if the email is taken (case-insensitive)
    pub fn create(&self, new: NewUser) -> StorageResult<UserRecord> {
        let key = normalize_email(&new.email);
        let now = Utc::now();

        let txn = self.db.begin_write()?;
        {
            let index = txn.open_table(USERS_BY_EMAIL)?;
            if index.get(key.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!("User {}", new.email)));
            }
        }

        let id = next_id(&txn, "users")?;
        let record = UserRecord {
            id,
            email: new.email.trim().to_string(),
            password_hash: new.password_hash,
            role: new.role,
            first_name: new.first_name,
            last_name: new.last_name,
            contact: new.contact,
            sign_in_count: 0,
            current_sign_in_at: None,
            last_sign_in_at: None,
            current_sign_in_ip: None,
            last_sign_in_ip: None,
            created_at: now,
            updated_at: now,
        };
        put_json(&txn, USERS, id, &record)?;
        {
            let mut index = txn.open_table(USERS_BY_EMAIL)?;
            index.insert(key.as_str(), id)?;
        }
        txn.commit()?;

        Ok(record)
    }

    /// Get a user by id.
    pub fn get(&self, id: u64) -> StorageResult<UserRecord> {
        self.db
            .get_json(USERS, id)?
            .ok_or_else(|| StorageError::NotFound(format!("User {id}")))
    }

    /// Look a user up by email (case-insensitive).
    pub fn find_by_email(&self, email: &str) -> StorageResult<Option<UserRecord>> {
        match self.db.user_id_by_email(&normalize_email(email))? {
            Some(id) => self.db.get_json(USERS, id),
            None => Ok(None),
        }
    }

    /// All users, in creation order.
    pub fn list(&self) -> StorageResult<Vec<UserRecord>> {
        self.db.list_json(USERS)
    }

    /// Overwrite a user row, moving the email index entry if the email changed.
    ///
    /// `created_at` is preserved and `updated_at` refreshed.
    pub fn update(&self, user: &UserRecord) -> StorageResult<UserRecord> {
        let txn = self.db.begin_write()?;
        let existing: UserRecord = get_json_in(&txn, USERS, user.id)?
            .ok_or_else(|| StorageError::NotFound(format!("User {}", user.id)))?;

        let old_key = normalize_email(&existing.email);
        let new_key = normalize_email(&user.email);
        if old_key != new_key {
            let mut index = txn.open_table(USERS_BY_EMAIL)?;
            if index.get(new_key.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!("User {}", user.email)));
            }
            index.remove(old_key.as_str())?;
            index.insert(new_key.as_str(), user.id)?;
        }

        let mut updated = user.clone();
        updated.email = user.email.trim().to_string();
        updated.created_at = existing.created_at;
        updated.updated_at = Utc::now();
        put_json(&txn, USERS, user.id, &updated)?;
        txn.commit()?;

        Ok(updated)
    }

    /// Delete a user and its email index entry.
    pub fn delete(&self, id: u64) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        let existing: UserRecord = get_json_in(&txn, USERS, id)?
            .ok_or_else(|| StorageError::NotFound(format!("User {id}")))?;
        {
            let mut users = txn.open_table(USERS)?;
            users.remove(id)?;
            let mut index = txn.open_table(USERS_BY_EMAIL)?;
            index.remove(normalize_email(&existing.email).as_str())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Rotate the sign-in bookkeeping after a successful sign-in.
    pub fn record_sign_in(
        &self,
        id: u64,
        ip: Option<String>,
        now: DateTime<Utc>,
    ) -> StorageResult<UserRecord> {
        let txn = self.db.begin_write()?;
        let mut user: UserRecord = get_json_in(&txn, USERS, id)?
            .ok_or_else(|| StorageError::NotFound(format!("User {id}")))?;

        user.sign_in_count = user.sign_in_count.saturating_add(1);
        user.last_sign_in_at = user.current_sign_in_at.take();
        user.current_sign_in_at = Some(now);
        user.last_sign_in_ip = user.current_sign_in_ip.take();
        user.current_sign_in_ip = ip;
        user.updated_at = now;

        put_json(&txn, USERS, id, &user)?;
        txn.commit()?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::temp_database;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "$2b$10$hash".to_string(),
            role: Role::Contractor,
            first_name: Some("Ada".to_string()),
            last_name: None,
            contact: None,
        }
    }

    #[test]
    fn create_and_find_by_email_ignores_case() {
        let (db, _dir) = temp_database();
        let repo = UserRepository::new(&db);

        let created = repo.create(new_user("Ops@Example.com")).unwrap();
        assert_eq!(created.id, 1);

        let found = repo.find_by_email("ops@example.COM").unwrap().unwrap();
        assert_eq!(found, created);
        assert!(repo.find_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let (db, _dir) = temp_database();
        let repo = UserRepository::new(&db);

        repo.create(new_user("a@b.com")).unwrap();
        let result = repo.create(new_user("A@B.com"));
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
        assert_eq!(repo.list().unwrap().len(), 1);
    }

    #[test]
    fn update_moves_email_index() {
        let (db, _dir) = temp_database();
        let repo = UserRepository::new(&db);

        let mut user = repo.create(new_user("old@b.com")).unwrap();
        user.email = "new@b.com".to_string();
        user.role = Role::Admin;
        let updated = repo.update(&user).unwrap();

        assert_eq!(updated.role, Role::Admin);
        assert!(repo.find_by_email("old@b.com").unwrap().is_none());
        assert_eq!(repo.find_by_email("new@b.com").unwrap().unwrap().id, user.id);
    }

    #[test]
    fn update_to_taken_email_fails() {
        let (db, _dir) = temp_database();
        let repo = UserRepository::new(&db);

        repo.create(new_user("taken@b.com")).unwrap();
        let mut other = repo.create(new_user("other@b.com")).unwrap();
        other.email = "taken@b.com".to_string();

        assert!(matches!(
            repo.update(&other),
            Err(StorageError::AlreadyExists(_))
        ));
        assert!(repo.find_by_email("other@b.com").unwrap().is_some());
    }

    #[test]
    fn delete_removes_row_and_index() {
        let (db, _dir) = temp_database();
        let repo = UserRepository::new(&db);

        let user = repo.create(new_user("gone@b.com")).unwrap();
        repo.delete(user.id).unwrap();

        assert!(matches!(repo.get(user.id), Err(StorageError::NotFound(_))));
        assert!(repo.find_by_email("gone@b.com").unwrap().is_none());
        assert!(matches!(repo.delete(user.id), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn record_sign_in_rotates_timestamps() {
        let (db, _dir) = temp_database();
        let repo = UserRepository::new(&db);
        let user = repo.create(new_user("a@b.com")).unwrap();

        let first = Utc::now();
        let after_first = repo
            .record_sign_in(user.id, Some("10.0.0.1".to_string()), first)
            .unwrap();
        assert_eq!(after_first.sign_in_count, 1);
        assert_eq!(after_first.current_sign_in_at, Some(first));
        assert_eq!(after_first.last_sign_in_at, None);

        let second = first + chrono::Duration::minutes(5);
        let after_second = repo
            .record_sign_in(user.id, Some("10.0.0.2".to_string()), second)
            .unwrap();
        assert_eq!(after_second.sign_in_count, 2);
        assert_eq!(after_second.current_sign_in_at, Some(second));
        assert_eq!(after_second.last_sign_in_at, Some(first));
        assert_eq!(after_second.last_sign_in_ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(after_second.current_sign_in_ip.as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn response_never_contains_password_hash() {
        let (db, _dir) = temp_database();
        let user = UserRepository::new(&db).create(new_user("a@b.com")).unwrap();
        let json = serde_json::to_string(&UserResponse::from(user)).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("$2b$"));
    }
}
