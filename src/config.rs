// ABOUTME: Environment-based server configuration
// ABOUTME: Loads ports, store locations, tenant naming, and initial admin credentials
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

//! # Server Configuration
//!
//! Environment-only configuration, loaded once at startup. A `.env` file is
//! honored if present. Tenant storage units are named
//! `{tenant_db_prefix}{tenant_id}{tenant_db_suffix}` under `tenant_data_dir`.

use crate::errors::{AppError, AppResult};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Top-level server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Central store connection URL (`sqlite:...`)
    pub database_url: String,
    /// Directory holding per-tenant database files
    pub tenant_data_dir: PathBuf,
    /// Prefix of each tenant storage unit name
    pub tenant_db_prefix: String,
    /// Suffix of each tenant storage unit name
    pub tenant_db_suffix: String,
    /// Credentials for seeding the first central admin, if configured
    pub initial_admin: Option<InitialAdmin>,
}

/// Credentials for the startup central-admin seeder
#[derive(Debug, Clone)]
pub struct InitialAdmin {
    /// Admin email
    pub email: String,
    /// Admin plaintext password (hashed before storage, never logged)
    pub password: String,
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");

        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {}", e);
        }

        let http_port: u16 = env_var_or("HTTP_PORT", "8080")
            .parse()
            .map_err(|e| AppError::config(format!("Invalid HTTP_PORT: {e}")))?;

        let initial_admin = match (
            env::var("INITIAL_ADMIN_EMAIL").ok(),
            env::var("INITIAL_ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) => Some(InitialAdmin { email, password }),
            (Some(_), None) | (None, Some(_)) => {
                return Err(AppError::config(
                    "INITIAL_ADMIN_EMAIL and INITIAL_ADMIN_PASSWORD must be set together",
                ));
            }
            (None, None) => None,
        };

        Ok(Self {
            http_port,
            database_url: env_var_or("DATABASE_URL", "sqlite:data/central.db"),
            tenant_data_dir: PathBuf::from(env_var_or("TENANT_DATA_DIR", "data/tenants")),
            tenant_db_prefix: env_var_or("TENANT_DB_PREFIX", "tenant_"),
            tenant_db_suffix: env_var_or("TENANT_DB_SUFFIX", ""),
            initial_admin,
        })
    }
}
