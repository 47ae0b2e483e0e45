// ABOUTME: Central-scope user management actions against the central store
// ABOUTME: Enforces self-delete and last-central-admin guards before mutation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

use crate::auth::AuthService;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::User;
use crate::permissions::{role_values, CentralRole, Scope};
use crate::validation::{Validator, MAX_STRING_LEN, MIN_PASSWORD_LEN};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

/// Input for creating a central user
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    /// Given name
    pub firstname: Option<String>,
    /// Family name
    pub lastname: Option<String>,
    /// Email, unique within the central store
    pub email: Option<String>,
    /// Plaintext password, hashed before storage
    pub password: Option<String>,
    /// Central role discriminant, defaults to `central_user`
    pub role: Option<String>,
}

/// Input for updating a central user; absent fields are left unchanged
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    /// New given name
    pub firstname: Option<String>,
    /// New family name
    pub lastname: Option<String>,
    /// New email, unique within the central store
    pub email: Option<String>,
    /// New plaintext password
    pub password: Option<String>,
    /// New central role discriminant
    pub role: Option<String>,
}

/// All central users, newest first
pub async fn list(db: &Database) -> AppResult<Vec<User>> {
    db.list_users().await
}

/// A single central user, or 404
pub async fn get(db: &Database, user_id: Uuid) -> AppResult<User> {
    db.get_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", format!("No user with id {user_id}")))
}

/// Create a central user
pub async fn create(
    db: &Database,
    auth: &AuthService,
    request: CreateUserRequest,
) -> AppResult<User> {
    let mut v = Validator::new();
    let firstname = v.required("firstname", request.firstname.as_deref());
    if let Some(firstname) = firstname {
        v.max_len("firstname", firstname, MAX_STRING_LEN);
    }
    let lastname = v.required("lastname", request.lastname.as_deref());
    if let Some(lastname) = lastname {
        v.max_len("lastname", lastname, MAX_STRING_LEN);
    }
    let email = v.required("email", request.email.as_deref());
    if let Some(email) = email {
        v.email("email", email);
        if db.get_user_by_email(email).await?.is_some() {
            v.add("email", "This email is already used");
        }
    }
    let password = v.required("password", request.password.as_deref());
    if let Some(password) = password {
        v.min_len("password", password, MIN_PASSWORD_LEN);
    }
    if let Some(role) = request.role.as_deref() {
        v.one_of("role", role, &role_values(Scope::Central));
    }
    v.finish()?;

    let email = request.email.unwrap_or_default();
    info!(email = %email, "Creating central user");

    let user = User::new(
        request.firstname.unwrap_or_default(),
        request.lastname.unwrap_or_default(),
        email,
        auth.hash_password(&request.password.unwrap_or_default())?,
        request
            .role
            .unwrap_or_else(|| CentralRole::CentralUser.as_str().to_owned()),
    );
    db.create_user(&user).await?;

    info!(user_id = %user.id, email = %user.email, "Central user created");
    Ok(user)
}

/// Update a central user; a new password is re-hashed before storage
pub async fn update(
    db: &Database,
    auth: &AuthService,
    user_id: Uuid,
    request: UpdateUserRequest,
) -> AppResult<User> {
    let mut user = get(db, user_id).await?;

    let mut v = Validator::new();
    if let Some(firstname) = request.firstname.as_deref() {
        v.max_len("firstname", firstname, MAX_STRING_LEN);
    }
    if let Some(lastname) = request.lastname.as_deref() {
        v.max_len("lastname", lastname, MAX_STRING_LEN);
    }
    if let Some(email) = request.email.as_deref() {
        v.email("email", email);
        // Unique within the central store, ignoring this user's own row
        if let Some(existing) = db.get_user_by_email(email).await? {
            if existing.id != user.id {
                v.add("email", "This email is already used");
            }
        }
    }
    if let Some(password) = request.password.as_deref() {
        v.min_len("password", password, MIN_PASSWORD_LEN);
    }
    if let Some(role) = request.role.as_deref() {
        v.one_of("role", role, &role_values(Scope::Central));
    }
    v.finish()?;

    let changed: Vec<&str> = [
        request.firstname.as_ref().map(|_| "firstname"),
        request.lastname.as_ref().map(|_| "lastname"),
        request.email.as_ref().map(|_| "email"),
        request.password.as_ref().map(|_| "password"),
        request.role.as_ref().map(|_| "role"),
    ]
    .into_iter()
    .flatten()
    .collect();
    info!(user_id = %user.id, changes = ?changed, "Updating central user");

    if let Some(firstname) = request.firstname {
        user.firstname = firstname;
    }
    if let Some(lastname) = request.lastname {
        user.lastname = lastname;
    }
    if let Some(email) = request.email {
        user.email = email;
    }
    if let Some(password) = request.password {
        user.password_hash = auth.hash_password(&password)?;
    }
    if let Some(role) = request.role {
        user.role = role;
    }
    user.updated_at = chrono::Utc::now();
    db.update_user(&user).await?;

    info!(user_id = %user.id, "Central user updated");
    Ok(user)
}

/// Delete a central user.
///
/// Preconditions, checked in order: the acting principal may not delete
/// itself, and the last remaining `central_admin` may not be deleted.
/// Tokens are revoked before the row is removed.
pub async fn delete(db: &Database, acting_user_id: Uuid, user_id: Uuid) -> AppResult<()> {
    let user = get(db, user_id).await?;

    if user.id == acting_user_id {
        return Err(AppError::domain_rule("You cannot delete your own account"));
    }

    if user.role == CentralRole::CentralAdmin.as_str() {
        let admins = db
            .count_users_with_role(CentralRole::CentralAdmin.as_str())
            .await?;
        if admins <= 1 {
            return Err(AppError::domain_rule("Cannot delete the last central admin"));
        }
    }

    info!(user_id = %user.id, email = %user.email, "Deleting central user");

    let revoked = db.delete_tokens_for_user(user.id).await?;
    db.delete_user(user.id).await?;

    info!(user_id = %user.id, revoked_tokens = revoked, "Central user deleted");
    Ok(())
}
