// ABOUTME: Central user management routes gated by central.users.* permissions
// ABOUTME: Thin HTTP layer over the central_users actions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

use crate::actions::central_users::{self, CreateUserRequest, UpdateUserRequest};
use crate::errors::AppError;
use crate::permissions::{role_permissions, Scope};
use crate::routes::{contextualize, require_permission};
use crate::server::ServerResources;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Central user CRUD routes
pub fn routes(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .route("/users", get(handle_list))
        .route("/users", post(handle_create))
        .route("/users/:id", get(handle_get))
        .route("/users/:id", put(handle_update))
        .route("/users/:id", delete(handle_delete))
        .with_state(resources)
}

async fn handle_list(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let principal = resources
        .auth
        .authenticate(&resources.central_db, &headers)
        .await?;
    require_permission(Scope::Central, &principal.user, "central.users.view")?;

    let users = central_users::list(&resources.central_db)
        .await
        .map_err(|e| contextualize(e, "Error listing users"))?;
    let users: Vec<_> = users.iter().map(crate::models::User::public).collect();

    Ok((
        StatusCode::OK,
        Json(json!({ "users": users, "total": users.len() })),
    )
        .into_response())
}

async fn handle_create(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Json(request): Json<CreateUserRequest>,
) -> Result<Response, AppError> {
    let principal = resources
        .auth
        .authenticate(&resources.central_db, &headers)
        .await?;
    require_permission(Scope::Central, &principal.user, "central.users.create")?;

    let user = central_users::create(&resources.central_db, &resources.auth, request)
        .await
        .map_err(|e| contextualize(e, "Error creating user"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user": user.public(),
        })),
    )
        .into_response())
}

async fn handle_get(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let principal = resources
        .auth
        .authenticate(&resources.central_db, &headers)
        .await?;
    require_permission(Scope::Central, &principal.user, "central.users.view")?;

    let user = central_users::get(&resources.central_db, user_id).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "user": user.public(),
            "permissions": role_permissions(Scope::Central, &user.role),
        })),
    )
        .into_response())
}

async fn handle_update(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Response, AppError> {
    let principal = resources
        .auth
        .authenticate(&resources.central_db, &headers)
        .await?;
    require_permission(Scope::Central, &principal.user, "central.users.update")?;

    let user = central_users::update(&resources.central_db, &resources.auth, user_id, request)
        .await
        .map_err(|e| contextualize(e, "Error updating user"))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "User updated successfully",
            "user": user.public(),
        })),
    )
        .into_response())
}

async fn handle_delete(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let principal = resources
        .auth
        .authenticate(&resources.central_db, &headers)
        .await?;
    require_permission(Scope::Central, &principal.user, "central.users.delete")?;

    central_users::delete(&resources.central_db, principal.user.id, user_id)
        .await
        .map_err(|e| contextualize(e, "Error deleting user"))?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "User deleted successfully" })),
    )
        .into_response())
}
