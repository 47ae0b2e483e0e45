// ABOUTME: Server binary: loads environment config, bootstraps stores, serves HTTP
// ABOUTME: The only process entry point for the administration backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

//! # Castellan Server Binary
//!
//! Starts the multi-tenant administration backend: central store setup,
//! optional initial admin seed, and the HTTP API.

use anyhow::Result;
use castellan::config::ServerConfig;
use castellan::server;
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(name = "castellan-server")]
#[command(about = "Castellan - multi-tenant SaaS administration backend")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override central database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }

    info!(
        http_port = config.http_port,
        tenant_data_dir = %config.tenant_data_dir.display(),
        "Starting Castellan server"
    );

    let resources = server::bootstrap(&config).await?;
    server::run(&config, resources).await?;
    Ok(())
}
