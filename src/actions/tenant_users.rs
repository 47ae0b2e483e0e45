// ABOUTME: Tenant-scope user management actions against a tenant's isolated store
// ABOUTME: Enforces self-delete and last-tenant-admin guards before mutation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

use crate::auth::AuthService;
use crate::errors::{AppError, AppResult};
use crate::models::User;
use crate::permissions::{role_values, Scope, TenantRole};
use crate::tenancy::context::TenantContext;
use crate::validation::{Validator, MAX_STRING_LEN, MIN_PASSWORD_LEN};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

/// Input for creating a tenant user
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    /// Given name (may be omitted)
    pub firstname: Option<String>,
    /// Family name (may be omitted)
    pub lastname: Option<String>,
    /// Email, unique within this tenant's store
    pub email: Option<String>,
    /// Plaintext password, hashed before storage
    pub password: Option<String>,
    /// Tenant role discriminant, defaults to `tenant_user`
    pub role: Option<String>,
}

/// Input for updating a tenant user; absent fields are left unchanged
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    /// New given name
    pub firstname: Option<String>,
    /// New family name
    pub lastname: Option<String>,
    /// New email, unique within this tenant's store
    pub email: Option<String>,
    /// New plaintext password
    pub password: Option<String>,
    /// New tenant role discriminant
    pub role: Option<String>,
}

/// All users in the tenant's store, newest first
pub async fn list(ctx: &TenantContext) -> AppResult<Vec<User>> {
    ctx.db.list_users().await
}

/// A single tenant user, or 404
pub async fn get(ctx: &TenantContext, user_id: Uuid) -> AppResult<User> {
    ctx.db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", format!("No user with id {user_id}")))
}

/// Create a user inside the tenant's store
pub async fn create(
    ctx: &TenantContext,
    auth: &AuthService,
    request: CreateUserRequest,
) -> AppResult<User> {
    let mut v = Validator::new();
    let email = v.required("email", request.email.as_deref());
    if let Some(email) = email {
        v.email("email", email);
        // Scoped to this tenant's store; the same address may exist
        // centrally or in another tenant without conflict
        if ctx.db.get_user_by_email(email).await?.is_some() {
            v.add("email", "The email already exists in this tenant");
        }
    }
    let password = v.required("password", request.password.as_deref());
    if let Some(password) = password {
        v.min_len("password", password, MIN_PASSWORD_LEN);
    }
    if let Some(firstname) = request.firstname.as_deref() {
        v.max_len("firstname", firstname, MAX_STRING_LEN);
    }
    if let Some(lastname) = request.lastname.as_deref() {
        v.max_len("lastname", lastname, MAX_STRING_LEN);
    }
    if let Some(role) = request.role.as_deref() {
        v.one_of("role", role, &role_values(Scope::Tenant));
    }
    v.finish()?;

    let email = request.email.unwrap_or_default();
    info!(tenant_id = %ctx.tenant.id, email = %email, "Creating user in tenant");

    let user = User::new(
        request.firstname.unwrap_or_default(),
        request.lastname.unwrap_or_default(),
        email,
        auth.hash_password(&request.password.unwrap_or_default())?,
        request
            .role
            .unwrap_or_else(|| TenantRole::TenantUser.as_str().to_owned()),
    );
    ctx.db.create_user(&user).await?;

    info!(tenant_id = %ctx.tenant.id, user_id = %user.id, "User created in tenant");
    Ok(user)
}

/// Update a tenant user; a new password is re-hashed before storage
pub async fn update(
    ctx: &TenantContext,
    auth: &AuthService,
    user_id: Uuid,
    request: UpdateUserRequest,
) -> AppResult<User> {
    let mut user = get(ctx, user_id).await?;

    let mut v = Validator::new();
    if let Some(firstname) = request.firstname.as_deref() {
        v.max_len("firstname", firstname, MAX_STRING_LEN);
    }
    if let Some(lastname) = request.lastname.as_deref() {
        v.max_len("lastname", lastname, MAX_STRING_LEN);
    }
    if let Some(email) = request.email.as_deref() {
        v.email("email", email);
        if let Some(existing) = ctx.db.get_user_by_email(email).await? {
            if existing.id != user.id {
                v.add("email", "The email already exists in this tenant");
            }
        }
    }
    if let Some(password) = request.password.as_deref() {
        v.min_len("password", password, MIN_PASSWORD_LEN);
    }
    if let Some(role) = request.role.as_deref() {
        v.one_of("role", role, &role_values(Scope::Tenant));
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
    info!(tenant_id = %ctx.tenant.id, user_id = %user.id, changes = ?changed, "Updating tenant user");

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
    ctx.db.update_user(&user).await?;

    info!(tenant_id = %ctx.tenant.id, user_id = %user.id, "Tenant user updated");
    Ok(user)
}

/// Delete a tenant user.
///
/// Preconditions, checked in order: the acting principal may not delete
/// itself, and the last remaining `tenant_admin` may not be deleted.
/// Tokens in this tenant's store are revoked before the row is removed.
pub async fn delete(ctx: &TenantContext, acting_user_id: Uuid, user_id: Uuid) -> AppResult<()> {
    let user = get(ctx, user_id).await?;

    if user.id == acting_user_id {
        return Err(AppError::domain_rule("You cannot delete your own account"));
    }

    if user.role == TenantRole::TenantAdmin.as_str() {
        let admins = ctx
            .db
            .count_users_with_role(TenantRole::TenantAdmin.as_str())
            .await?;
        if admins <= 1 {
            return Err(AppError::domain_rule("Cannot delete the last tenant admin"));
        }
    }

    info!(tenant_id = %ctx.tenant.id, user_id = %user.id, email = %user.email, "Deleting tenant user");

    let revoked = ctx.db.delete_tokens_for_user(user.id).await?;
    ctx.db.delete_user(user.id).await?;

    info!(
        tenant_id = %ctx.tenant.id,
        user_id = %user.id,
        revoked_tokens = revoked,
        "Tenant user deleted"
    );
    Ok(())
}
