// ABOUTME: Central authentication route handlers: login, logout, refresh, me, tenants
// ABOUTME: Issues and revokes bearer tokens against the central store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

use crate::errors::AppError;
use crate::server::ServerResources;
use crate::validation::Validator;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Central login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Account email in the central store
    pub email: Option<String>,
    /// Plaintext password
    pub password: Option<String>,
    /// Optional tenant the client intends to work against; verified to exist
    pub tenant_id: Option<String>,
}

/// Central auth routes
pub fn routes(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .route("/auth/login", post(handle_login))
        .route("/auth/logout", post(handle_logout))
        .route("/auth/refresh", post(handle_refresh))
        .route("/auth/me", get(handle_me))
        .route("/auth/tenants", get(handle_tenants))
        .with_state(resources)
}

async fn handle_login(
    State(resources): State<Arc<ServerResources>>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let mut v = Validator::new();
    let email = v.required("email", request.email.as_deref());
    if let Some(email) = email {
        v.email("email", email);
    }
    v.required("password", request.password.as_deref());
    v.finish()?;

    // Central login may name a tenant; it must exist (404 otherwise)
    if let Some(tenant_id) = request.tenant_id.as_deref() {
        let tenant_id = Uuid::parse_str(tenant_id)
            .map_err(|e| AppError::not_found("Tenant", format!("Invalid tenant id: {e}")))?;
        if resources.central_db.get_tenant(tenant_id).await?.is_none() {
            return Err(AppError::not_found(
                "Tenant",
                format!("No tenant with id {tenant_id}"),
            ));
        }
    }

    let (user, token) = resources
        .auth
        .login(
            &resources.central_db,
            &request.email.unwrap_or_default(),
            &request.password.unwrap_or_default(),
        )
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Login successful",
            "user": user.public(),
            "token": token,
            "token_type": "Bearer",
        })),
    )
        .into_response())
}

async fn handle_logout(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let principal = resources
        .auth
        .authenticate(&resources.central_db, &headers)
        .await?;
    resources
        .auth
        .logout(&resources.central_db, &principal)
        .await?;

    Ok((StatusCode::OK, Json(json!({ "message": "Logout successful" }))).into_response())
}

async fn handle_refresh(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let principal = resources
        .auth
        .authenticate(&resources.central_db, &headers)
        .await?;
    let token = resources
        .auth
        .refresh(&resources.central_db, &principal)
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "token": token, "token_type": "Bearer" })),
    )
        .into_response())
}

async fn handle_me(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let principal = resources
        .auth
        .authenticate(&resources.central_db, &headers)
        .await?;

    Ok((StatusCode::OK, Json(json!({ "user": principal.user.public() }))).into_response())
}

async fn handle_tenants(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    resources
        .auth
        .authenticate(&resources.central_db, &headers)
        .await?;

    let tenants = resources.central_db.list_tenants().await?;
    Ok((StatusCode::OK, Json(json!({ "tenants": tenants }))).into_response())
}
