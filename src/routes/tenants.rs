// ABOUTME: Tenant registry routes gated by central.tenants.* permissions
// ABOUTME: Creation runs the full provisioning pipeline before responding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

use crate::actions::tenants::{self, CreateTenantRequest, UpdateTenantRequest};
use crate::errors::AppError;
use crate::permissions::Scope;
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

/// Tenant registry CRUD routes
pub fn routes(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .route("/tenants", get(handle_list))
        .route("/tenants", post(handle_create))
        .route("/tenants/:id", get(handle_get))
        .route("/tenants/:id", put(handle_update))
        .route("/tenants/:id", delete(handle_delete))
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
    require_permission(Scope::Central, &principal.user, "central.tenants.view")?;

    let tenants = tenants::list(&resources.central_db)
        .await
        .map_err(|e| contextualize(e, "Error listing tenants"))?;

    Ok((StatusCode::OK, Json(json!({ "tenants": tenants }))).into_response())
}

async fn handle_create(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Json(request): Json<CreateTenantRequest>,
) -> Result<Response, AppError> {
    let principal = resources
        .auth
        .authenticate(&resources.central_db, &headers)
        .await?;
    require_permission(Scope::Central, &principal.user, "central.tenants.create")?;

    let tenant = tenants::create(
        &resources.central_db,
        &resources.tenant_stores,
        &resources.auth,
        request,
    )
    .await
    .map_err(|e| contextualize(e, "Error creating tenant"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Tenant created successfully",
            "tenant": tenant,
        })),
    )
        .into_response())
}

async fn handle_get(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Path(tenant_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let principal = resources
        .auth
        .authenticate(&resources.central_db, &headers)
        .await?;
    require_permission(Scope::Central, &principal.user, "central.tenants.view")?;

    let tenant = tenants::get(&resources.central_db, tenant_id).await?;

    Ok((StatusCode::OK, Json(json!({ "tenant": tenant }))).into_response())
}

async fn handle_update(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Path(tenant_id): Path<Uuid>,
    Json(request): Json<UpdateTenantRequest>,
) -> Result<Response, AppError> {
    let principal = resources
        .auth
        .authenticate(&resources.central_db, &headers)
        .await?;
    require_permission(Scope::Central, &principal.user, "central.tenants.update")?;

    let tenant = tenants::update(&resources.central_db, tenant_id, request)
        .await
        .map_err(|e| contextualize(e, "Error updating tenant"))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Tenant updated successfully",
            "tenant": tenant,
        })),
    )
        .into_response())
}

async fn handle_delete(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    Path(tenant_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let principal = resources
        .auth
        .authenticate(&resources.central_db, &headers)
        .await?;
    require_permission(Scope::Central, &principal.user, "central.tenants.delete")?;

    tenants::delete(&resources.central_db, &resources.tenant_stores, tenant_id)
        .await
        .map_err(|e| contextualize(e, "Error deleting tenant"))?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Tenant deleted successfully" })),
    )
        .into_response())
}
