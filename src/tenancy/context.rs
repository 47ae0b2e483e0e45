// ABOUTME: Request-local tenant context resolved before any tenant handler runs
// ABOUTME: Axum middleware binding the X-Tenant-Id header to a tenant store handle
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

//! # Tenant Context
//!
//! The `/api/tenant` route family requires a tenant-resolution input: the
//! `X-Tenant-Id` header. The middleware resolves it once per request —
//! tenant row lookup, then store handle — and injects a [`TenantContext`]
//! extension. Handlers thread the context's store handle through every
//! data access explicitly; there is no global binding to restore
//! afterwards, so a failed handler cannot leak tenant scope into a later
//! central-scope query.

use crate::database::Database;
use crate::errors::AppError;
use crate::models::Tenant;
use crate::server::ServerResources;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Everything a tenant-scope handler needs: the resolved tenant row and a
/// handle on its isolated store. Built per request, never shared across
/// requests.
#[derive(Clone)]
pub struct TenantContext {
    /// The resolved tenant registry row
    pub tenant: Tenant,
    /// Handle on the tenant's isolated store
    pub db: Database,
}

/// Resolve the request's tenant before any handler runs.
///
/// Fails with the 404 `TenantNotFound` envelope when the header is absent,
/// malformed, or names no registered tenant, and with 404 when the
/// registry row exists but its storage unit is gone (torn down or never
/// provisioned).
pub async fn tenant_context_middleware(
    State(resources): State<Arc<ServerResources>>,
    mut req: Request,
    next: Next,
) -> Response {
    let resolved = resolve(&resources, req.headers()).await;
    match resolved {
        Ok(context) => {
            tracing::Span::current().record("tenant_id", context.tenant.id.to_string());
            req.extensions_mut().insert(context);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}

async fn resolve(
    resources: &Arc<ServerResources>,
    headers: &axum::http::HeaderMap,
) -> Result<TenantContext, AppError> {
    let header = headers
        .get("x-tenant-id")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::not_found("Tenant", "Missing X-Tenant-Id header"))?;

    let tenant_id = Uuid::parse_str(header).map_err(|e| {
        debug!(header = %header, "Malformed tenant id in request");
        AppError::not_found("Tenant", format!("Invalid tenant id: {e}"))
    })?;

    let tenant = resources
        .central_db
        .get_tenant(tenant_id)
        .await?
        .ok_or_else(|| {
            AppError::not_found("Tenant", format!("No tenant with id {tenant_id}"))
        })?;

    let db = resources.tenant_stores.open(tenant_id).await?;

    Ok(TenantContext { tenant, db })
}
