// ABOUTME: SQLite-backed store handle shared by the central and tenant databases
// ABOUTME: Owns the connection pool and the hand-written schema migrations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

//! # Database Management
//!
//! One [`Database`] value wraps one SQLite pool. The same type serves the
//! central store and every tenant store; which tables exist in a given
//! store is decided by which migration set ran against it. Handlers receive
//! the store handle explicitly — there is no process-wide "current
//! connection" to switch.

mod tenants;
mod tokens;
mod users;

use crate::errors::{AppError, AppResult};
use sqlx::{Pool, Sqlite, SqlitePool};

/// Store handle over a SQLite connection pool
#[derive(Clone, Debug)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if absent) the database at `database_url`.
    ///
    /// No migrations run here; callers pick [`Database::migrate_central`]
    /// or [`Database::migrate_tenant`] for the store they are opening.
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        // SQLite must create the file on first open
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options)
            .await
            .map_err(|e| AppError::database(format!("Failed to open {database_url}: {e}")))?;

        Ok(Self { pool })
    }

    /// Reference to the underlying pool for advanced operations
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the pool, releasing the file handle
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Full migration set for the central store: tenant registry, central
    /// users, and their access tokens.
    pub async fn migrate_central(&self) -> AppResult<()> {
        self.migrate_tenants_table().await?;
        self.migrate_users_table().await?;
        self.migrate_access_tokens_table().await?;
        Ok(())
    }

    /// Full migration set for a tenant store: tenant users and their
    /// access tokens.
    pub async fn migrate_tenant(&self) -> AppResult<()> {
        self.migrate_users_table().await?;
        self.migrate_access_tokens_table().await?;
        Ok(())
    }

    async fn migrate_users_table(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                firstname TEXT NOT NULL,
                lastname TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                email_verified_at DATETIME,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn migrate_access_tokens_table(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS access_tokens (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id),
                name TEXT NOT NULL,
                token_hash TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                last_used_at DATETIME
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_access_tokens_user_id ON access_tokens(user_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn migrate_tenants_table(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS tenants (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                data TEXT NOT NULL DEFAULT '{}',
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Whether a sqlx error is the UNIQUE violation on `users.email`. The
/// constraint is the deterministic backstop for concurrent creates that
/// pass the application-level uniqueness pre-check simultaneously.
pub(crate) fn is_unique_email_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.message().contains("UNIQUE constraint failed: users.email"))
}
