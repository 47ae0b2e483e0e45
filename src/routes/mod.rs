// ABOUTME: HTTP route assembly for the central and tenant route families
// ABOUTME: Shared permission gate and error contextualization helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

//! # HTTP Surface
//!
//! Two route families share one axum `Router`:
//!
//! - central, under `/api` — platform auth, central users, tenant registry;
//! - tenant, under `/api/tenant` — tenant auth and tenant users, with the
//!   tenant context middleware resolving `X-Tenant-Id` before any handler.
//!
//! Handlers authenticate explicitly from headers (no ambient principal)
//! and pass the permission gate before invoking their action.

pub mod auth;
pub mod tenant_scope;
pub mod tenants;
pub mod users;

use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::User;
use crate::permissions::{self, role_permissions, Scope};
use crate::server::ServerResources;
use crate::tenancy::context::tenant_context_middleware;
use axum::middleware;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Assemble the full application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    let central = Router::new()
        .merge(auth::routes(resources.clone()))
        .merge(users::routes(resources.clone()))
        .merge(tenants::routes(resources.clone()));

    let tenant = tenant_scope::routes(resources.clone()).layer(middleware::from_fn_with_state(
        resources,
        tenant_context_middleware,
    ));

    Router::new()
        .nest("/api/tenant", tenant)
        .nest("/api", central)
        .layer(TraceLayer::new_for_http())
}

/// Permission gate: reject with the full 403 envelope unless the
/// principal's role holds `permission` in `scope`. Pure check over the
/// static tables; never panics past the boundary.
pub(crate) fn require_permission(scope: Scope, user: &User, permission: &str) -> AppResult<()> {
    if permissions::check(scope, &user.role, permission) {
        return Ok(());
    }
    Err(AppError::permission_denied(
        permission,
        user.role.clone(),
        role_permissions(scope, &user.role)
            .iter()
            .map(|p| (*p).to_owned())
            .collect(),
    ))
}

/// Replace the outer message of infrastructure failures with an
/// endpoint-specific one ("Error creating tenant", ...) while leaving
/// validation, auth, domain, and not-found envelopes untouched.
pub(crate) fn contextualize(err: AppError, message: &str) -> AppError {
    match err.code {
        ErrorCode::Database | ErrorCode::Provisioning | ErrorCode::Internal => {
            err.with_message(message)
        }
        _ => err,
    }
}
