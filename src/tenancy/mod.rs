// ABOUTME: Tenant storage registry, naming scheme, and provisioning pipeline
// ABOUTME: Allocates, migrates, opens, and destroys per-tenant SQLite databases
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

//! # Tenant Storage
//!
//! Each tenant owns one SQLite file named
//! `{prefix}{tenant_id}{suffix}.db` under the tenant data directory.
//! [`TenantStores`] keeps the live pools in a concurrent map so repeat
//! requests for the same tenant reuse a pool, while the per-request
//! [`TenantContext`](context::TenantContext) stays strictly request-local.
//!
//! Provisioning is an explicit two-step pipeline invoked synchronously by
//! the tenant-creation action — allocate the file, then run the tenant
//! migration set. There is no compensating rollback: if either step fails
//! the error propagates and the tenant row is left inconsistent, which is
//! logged loudly rather than hidden. Teardown failures are logged and
//! swallowed; an orphaned storage file is preferred over a half-deleted
//! tenant row.

pub mod context;

use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use dashmap::DashMap;
use std::path::PathBuf;
use tracing::{error, info};
use uuid::Uuid;

/// Registry of per-tenant storage units and their live pools
pub struct TenantStores {
    data_dir: PathBuf,
    prefix: String,
    suffix: String,
    pools: DashMap<Uuid, Database>,
}

impl TenantStores {
    /// Registry rooted at `data_dir` with the given naming scheme
    #[must_use]
    pub fn new(data_dir: PathBuf, prefix: String, suffix: String) -> Self {
        Self {
            data_dir,
            prefix,
            suffix,
            pools: DashMap::new(),
        }
    }

    /// Registry configured from the server config
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.tenant_data_dir.clone(),
            config.tenant_db_prefix.clone(),
            config.tenant_db_suffix.clone(),
        )
    }

    /// Deterministic storage unit name for a tenant
    #[must_use]
    pub fn storage_name(&self, tenant_id: Uuid) -> String {
        format!("{}{tenant_id}{}", self.prefix, self.suffix)
    }

    /// Path of the tenant's database file
    #[must_use]
    pub fn storage_path(&self, tenant_id: Uuid) -> PathBuf {
        self.data_dir
            .join(format!("{}.db", self.storage_name(tenant_id)))
    }

    /// Whether the tenant's storage unit exists on disk
    #[must_use]
    pub fn storage_exists(&self, tenant_id: Uuid) -> bool {
        self.storage_path(tenant_id).exists()
    }

    /// Open (or reuse) the pool for an already-provisioned tenant store.
    /// Fails if the storage unit does not exist — opening never allocates.
    pub async fn open(&self, tenant_id: Uuid) -> AppResult<Database> {
        if let Some(db) = self.pools.get(&tenant_id) {
            return Ok(db.clone());
        }

        let path = self.storage_path(tenant_id);
        if !path.exists() {
            return Err(AppError::not_found(
                "Tenant storage",
                format!("No storage unit for tenant {tenant_id}"),
            ));
        }

        let db = Database::connect(&format!("sqlite:{}", path.display())).await?;
        self.pools.insert(tenant_id, db.clone());
        Ok(db)
    }

    /// Drop the live pool for a tenant, if any, closing its connections
    pub async fn evict(&self, tenant_id: Uuid) {
        if let Some((_, db)) = self.pools.remove(&tenant_id) {
            db.close().await;
        }
    }
}

/// Step 1 and step 2 of the provisioning pipeline: allocate the storage
/// unit, then run the full tenant migration set against it. Both steps are
/// synchronous relative to the calling request; failures propagate to the
/// caller, leaving the tenant row inconsistent (no rollback).
pub async fn provision_tenant_storage(
    stores: &TenantStores,
    tenant_id: Uuid,
) -> AppResult<Database> {
    let name = stores.storage_name(tenant_id);
    info!(tenant_id = %tenant_id, storage = %name, "Allocating tenant storage");

    tokio::fs::create_dir_all(&stores.data_dir)
        .await
        .map_err(|e| {
            error!(tenant_id = %tenant_id, error = %e, "Failed to create tenant data directory");
            AppError::provisioning(format!("Failed to create tenant data directory: {e}"))
        })?;

    let path = stores.storage_path(tenant_id);
    let db = Database::connect(&format!("sqlite:{}", path.display()))
        .await
        .map_err(|e| {
            error!(tenant_id = %tenant_id, error = %e, "Tenant storage allocation failed");
            AppError::provisioning(format!("Failed to allocate storage for tenant {tenant_id}: {e}"))
        })?;

    info!(tenant_id = %tenant_id, "Running tenant migrations");
    db.migrate_tenant().await.map_err(|e| {
        // Storage may now be partially migrated; surfaced, not rolled back
        error!(tenant_id = %tenant_id, error = %e, "Tenant migration failed");
        AppError::provisioning(format!("Failed to migrate storage for tenant {tenant_id}: {e}"))
    })?;

    stores.pools.insert(tenant_id, db.clone());
    info!(tenant_id = %tenant_id, storage = %name, "Tenant storage provisioned");
    Ok(db)
}

/// Destroy a tenant's storage unit. Invoked after the registry row is
/// already gone; failure is logged with full context and swallowed so the
/// completed row deletion is not re-failed.
pub async fn teardown_tenant_storage(stores: &TenantStores, tenant_id: Uuid) {
    info!(tenant_id = %tenant_id, "Destroying tenant storage");
    stores.evict(tenant_id).await;

    let path = stores.storage_path(tenant_id);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        error!(
            tenant_id = %tenant_id,
            path = %path.display(),
            error = %e,
            "Failed to destroy tenant storage; orphaned unit left behind"
        );
        return;
    }

    // SQLite sidecar files are best-effort cleanup
    for ext in ["-wal", "-shm"] {
        let mut sidecar = path.clone().into_os_string();
        sidecar.push(ext);
        let _ = tokio::fs::remove_file(PathBuf::from(sidecar)).await;
    }

    info!(tenant_id = %tenant_id, "Tenant storage destroyed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_naming_scheme() {
        let id = Uuid::new_v4();
        let stores = TenantStores::new(
            PathBuf::from("/tmp/tenants"),
            "tenant_".to_owned(),
            String::new(),
        );
        assert_eq!(stores.storage_name(id), format!("tenant_{id}"));
        assert_eq!(
            stores.storage_path(id),
            PathBuf::from(format!("/tmp/tenants/tenant_{id}.db"))
        );
    }

    #[test]
    fn test_storage_naming_with_suffix() {
        let id = Uuid::new_v4();
        let stores = TenantStores::new(PathBuf::from("."), "t_".to_owned(), "_prod".to_owned());
        assert_eq!(stores.storage_name(id), format!("t_{id}_prod"));
    }
}
