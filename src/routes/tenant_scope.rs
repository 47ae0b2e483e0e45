// ABOUTME: Tenant-scope routes: auth and user management inside one tenant's store
// ABOUTME: Every handler receives a resolved TenantContext from the middleware
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

use crate::actions::tenant_users::{self, CreateUserRequest, UpdateUserRequest};
use crate::errors::AppError;
use crate::permissions::{role_permissions, Scope};
use crate::routes::{contextualize, require_permission};
use crate::server::ServerResources;
use crate::tenancy::context::TenantContext;
use crate::validation::Validator;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Tenant login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Account email within the tenant's store
    pub email: Option<String>,
    /// Plaintext password
    pub password: Option<String>,
}

/// Tenant-scope routes; the tenant context middleware is layered by the caller
pub fn routes(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .route("/auth/login", post(handle_login))
        .route("/auth/logout", post(handle_logout))
        .route("/auth/me", get(handle_me))
        .route("/users", get(handle_list))
        .route("/users", post(handle_create))
        .route("/users/:id", get(handle_get))
        .route("/users/:id", put(handle_update))
        .route("/users/:id", delete(handle_delete))
        .with_state(resources)
}

async fn handle_login(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<TenantContext>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let mut v = Validator::new();
    if let Some(email) = v.required("email", request.email.as_deref()) {
        v.email("email", email);
    }
    v.required("password", request.password.as_deref());
    v.finish()?;

    let (user, token) = resources
        .auth
        .login(
            &ctx.db,
            &request.email.unwrap_or_default(),
            &request.password.unwrap_or_default(),
        )
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Login successful",
            "tenant_id": ctx.tenant.id,
            "user": user.public(),
            "token": token,
            "token_type": "Bearer",
        })),
    )
        .into_response())
}

async fn handle_logout(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<TenantContext>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let principal = resources.auth.authenticate(&ctx.db, &headers).await?;
    resources.auth.logout(&ctx.db, &principal).await?;

    Ok((StatusCode::OK, Json(json!({ "message": "Logout successful" }))).into_response())
}

async fn handle_me(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<TenantContext>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let principal = resources.auth.authenticate(&ctx.db, &headers).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "tenant_id": ctx.tenant.id,
            "user": principal.user.public(),
        })),
    )
        .into_response())
}

async fn handle_list(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<TenantContext>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let principal = resources.auth.authenticate(&ctx.db, &headers).await?;
    require_permission(Scope::Tenant, &principal.user, "tenant.users.view")?;

    let users = tenant_users::list(&ctx)
        .await
        .map_err(|e| contextualize(e, "Error listing users"))?;
    let users: Vec<_> = users.iter().map(crate::models::User::public).collect();

    Ok((
        StatusCode::OK,
        Json(json!({
            "tenant_id": ctx.tenant.id,
            "users": users,
            "total": users.len(),
        })),
    )
        .into_response())
}

async fn handle_create(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<TenantContext>,
    headers: HeaderMap,
    Json(request): Json<CreateUserRequest>,
) -> Result<Response, AppError> {
    let principal = resources.auth.authenticate(&ctx.db, &headers).await?;
    require_permission(Scope::Tenant, &principal.user, "tenant.users.create")?;

    let user = tenant_users::create(&ctx, &resources.auth, request)
        .await
        .map_err(|e| contextualize(e, "Error creating user"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully in tenant",
            "tenant_id": ctx.tenant.id,
            "user": user.public(),
        })),
    )
        .into_response())
}

async fn handle_get(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<TenantContext>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let principal = resources.auth.authenticate(&ctx.db, &headers).await?;
    require_permission(Scope::Tenant, &principal.user, "tenant.users.view")?;

    let user = tenant_users::get(&ctx, user_id).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "tenant_id": ctx.tenant.id,
            "user": user.public(),
            "permissions": role_permissions(Scope::Tenant, &user.role),
        })),
    )
        .into_response())
}

async fn handle_update(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<TenantContext>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Response, AppError> {
    let principal = resources.auth.authenticate(&ctx.db, &headers).await?;
    require_permission(Scope::Tenant, &principal.user, "tenant.users.update")?;

    let user = tenant_users::update(&ctx, &resources.auth, user_id, request)
        .await
        .map_err(|e| contextualize(e, "Error updating user"))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "User updated successfully in tenant",
            "tenant_id": ctx.tenant.id,
            "user": user.public(),
        })),
    )
        .into_response())
}

async fn handle_delete(
    State(resources): State<Arc<ServerResources>>,
    Extension(ctx): Extension<TenantContext>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let principal = resources.auth.authenticate(&ctx.db, &headers).await?;
    require_permission(Scope::Tenant, &principal.user, "tenant.users.delete")?;

    tenant_users::delete(&ctx, principal.user.id, user_id)
        .await
        .map_err(|e| contextualize(e, "Error deleting user"))?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "User deleted successfully from tenant" })),
    )
        .into_response())
}
