// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User management.
//!
//! Any signed-in user can read accounts and edit their own profile; creating,
//! replacing and deleting accounts is reserved to admins.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::{AdminOnly, Auth, DEFAULT_PASSWORD},
    error::{ApiError, ApiJson},
    models::{MessageResponse, UpdateProfileRequest, UserRequest},
    state::AppState,
    storage::{NewUser, StorageError, UserRecord, UserRepository, UserResponse},
};

const USER_NOT_FOUND: &str = "User not found";
const MIN_PASSWORD_LEN: usize = 8;

fn load_user(repo: &UserRepository<'_>, id: u64) -> Result<UserRecord, ApiError> {
    repo.get(id).map_err(|e| match e {
        StorageError::NotFound(_) => ApiError::not_found(USER_NOT_FOUND),
        other => other.into(),
    })
}

async fn hash_password(state: &AppState, plain: &str) -> Result<String, ApiError> {
    Ok(state.passwords.hash_blocking(plain.to_string()).await?)
}

fn require_email(email: &str) -> Result<(), ApiError> {
    if email.trim().is_empty() {
        return Err(ApiError::bad_request("email must not be blank"));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    responses(
        (status = 200, body = [UserResponse]),
        (status = 401, body = MessageResponse)
    )
)]
pub async fn list_users(
    Auth(_user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = UserRepository::new(&state.db).list()?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    tag = "Users",
    responses(
        (status = 200, body = UserResponse),
        (status = 404, body = MessageResponse)
    )
)]
pub async fn get_user(
    Auth(_user): Auth,
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = load_user(&UserRepository::new(&state.db), id)?;
    Ok(Json(user.into()))
}

/// The signed-in user's own account.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "Users",
    responses(
        (status = 200, body = UserResponse),
        (status = 401, body = MessageResponse)
    )
)]
pub async fn get_me(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let record = load_user(&UserRepository::new(&state.db), user.id)?;
    Ok(Json(record.into()))
}

/// Update the signed-in user's profile. Email and role are not editable here.
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    request_body = UpdateProfileRequest,
    tag = "Users",
    responses(
        (status = 200, body = UserResponse),
        (status = 400, body = MessageResponse)
    )
)]
pub async fn update_me(
    Auth(user): Auth,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let repo = UserRepository::new(&state.db);
    let mut record = load_user(&repo, user.id)?;

    if let Some(password) = request.password.as_deref() {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::bad_request(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        record.password_hash = hash_password(&state, password).await?;
    }
    if request.first_name.is_some() {
        record.first_name = request.first_name;
    }
    if request.last_name.is_some() {
        record.last_name = request.last_name;
    }
    if request.contact.is_some() {
        record.contact = request.contact;
    }

    let updated = repo.update(&record)?;
    tracing::info!(user_id = updated.id, "Profile updated");
    Ok(Json(updated.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = UserRequest,
    tag = "Users",
    responses(
        (status = 201, body = UserResponse),
        (status = 403, body = MessageResponse),
        (status = 422, body = MessageResponse)
    )
)]
pub async fn create_user(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    require_email(&request.email)?;
    let password = request.password.as_deref().unwrap_or(DEFAULT_PASSWORD);
    let password_hash = hash_password(&state, password).await?;

    let user = UserRepository::new(&state.db).create(NewUser {
        email: request.email,
        password_hash,
        role: request.role.unwrap_or_default(),
        first_name: request.first_name,
        last_name: request.last_name,
        contact: request.contact,
    })?;

    tracing::info!(user_id = user.id, role = %user.role, created_by = admin.id, "User created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    request_body = UserRequest,
    tag = "Users",
    responses(
        (status = 200, body = UserResponse),
        (status = 403, body = MessageResponse),
        (status = 404, body = MessageResponse)
    )
)]
pub async fn update_user(
    AdminOnly(admin): AdminOnly,
    Path(id): Path<u64>,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    require_email(&request.email)?;
    let repo = UserRepository::new(&state.db);
    let mut record = load_user(&repo, id)?;

    record.email = request.email;
    if let Some(password) = request.password.as_deref() {
        record.password_hash = hash_password(&state, password).await?;
    }
    if let Some(role) = request.role {
        record.role = role;
    }
    record.first_name = request.first_name;
    record.last_name = request.last_name;
    record.contact = request.contact;

    let updated = repo.update(&record)?;
    tracing::info!(user_id = id, updated_by = admin.id, "User updated");
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    tag = "Users",
    responses(
        (status = 200, body = MessageResponse),
        (status = 403, body = MessageResponse),
        (status = 404, body = MessageResponse)
    )
)]
pub async fn delete_user(
    AdminOnly(admin): AdminOnly,
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    UserRepository::new(&state.db)
        .delete(id)
        .map_err(|e| match e {
            StorageError::NotFound(_) => ApiError::not_found(USER_NOT_FOUND),
            other => other.into(),
        })?;

    tracing::info!(user_id = id, deleted_by = admin.id, "User deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
