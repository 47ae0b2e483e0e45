// ABOUTME: Server bootstrap: shared resources, central store setup, initial admin seed
// ABOUTME: Binds the HTTP listener and serves the assembled router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

use crate::auth::AuthService;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::User;
use crate::permissions::CentralRole;
use crate::routes;
use crate::tenancy::TenantStores;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared state handed to every route family
pub struct ServerResources {
    /// Central store: tenants registry, central users, central tokens
    pub central_db: Database,
    /// Per-tenant storage registry and pool cache
    pub tenant_stores: TenantStores,
    /// Password hashing and bearer-token service
    pub auth: AuthService,
}

impl ServerResources {
    /// Bundle the shared services
    pub fn new(central_db: Database, tenant_stores: TenantStores, auth: AuthService) -> Self {
        Self {
            central_db,
            tenant_stores,
            auth,
        }
    }
}

/// Connect the central store, run migrations, and seed the initial admin
/// if the store holds no users and credentials were configured.
pub async fn bootstrap(config: &ServerConfig) -> AppResult<Arc<ServerResources>> {
    if let Some(parent) = sqlite_file_parent(&config.database_url) {
        std::fs::create_dir_all(&parent).map_err(|e| {
            AppError::config(format!(
                "Cannot create database directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let central_db = Database::connect(&config.database_url).await?;
    central_db.migrate_central().await?;
    info!(database_url = %config.database_url, "Central store ready");

    let auth = AuthService::new();
    seed_initial_admin(&central_db, &auth, config).await?;

    let tenant_stores = TenantStores::from_config(config);
    Ok(Arc::new(ServerResources::new(
        central_db,
        tenant_stores,
        auth,
    )))
}

/// Serve the router on the configured port until the process is stopped
pub async fn run(config: &ServerConfig, resources: Arc<ServerResources>) -> AppResult<()> {
    let app = routes::router(resources);
    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::config(format!("Cannot bind {addr}: {e}")))?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))
}

/// First-run seed: only fires against an empty users table, so a restart
/// with the same environment never creates a second admin.
async fn seed_initial_admin(
    db: &Database,
    auth: &AuthService,
    config: &ServerConfig,
) -> AppResult<()> {
    let Some(admin) = &config.initial_admin else {
        return Ok(());
    };

    if db.count_users().await? > 0 {
        return Ok(());
    }

    let user = User::new(
        "Admin".to_owned(),
        String::new(),
        admin.email.clone(),
        auth.hash_password(&admin.password)?,
        CentralRole::CentralAdmin.as_str().to_owned(),
    );
    db.create_user(&user).await?;
    warn!(email = %user.email, "Seeded initial central admin; rotate this password");
    Ok(())
}

/// Directory holding a `sqlite:` URL's database file, if the URL is
/// file-backed and has a parent component.
fn sqlite_file_parent(database_url: &str) -> Option<std::path::PathBuf> {
    let path = database_url.strip_prefix("sqlite:")?;
    let path = path.strip_prefix("//").unwrap_or(path);
    if path.starts_with(':') {
        return None; // :memory:
    }
    let path = path.split('?').next().unwrap_or(path);
    std::path::Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(std::path::Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_parent_extracted_from_url() {
        assert_eq!(
            sqlite_file_parent("sqlite:data/central.db"),
            Some(std::path::PathBuf::from("data"))
        );
    }

    #[test]
    fn memory_url_has_no_parent() {
        assert_eq!(sqlite_file_parent("sqlite::memory:"), None);
    }

    #[test]
    fn non_sqlite_url_has_no_parent() {
        assert_eq!(sqlite_file_parent("postgres://localhost/app"), None);
    }
}
