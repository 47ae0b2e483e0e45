// ABOUTME: Tenant registry operations against the central store
// ABOUTME: CRUD over the tenants table with the JSON config blob
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::Tenant;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

fn row_to_tenant(row: &SqliteRow) -> AppResult<Tenant> {
    let id: String = row.get("id");
    let data: String = row.get("data");
    Ok(Tenant {
        id: Uuid::parse_str(&id)
            .map_err(|e| AppError::database(format!("Invalid tenant id in store: {e}")))?,
        name: row.get("name"),
        data: serde_json::from_str(&data)
            .map_err(|e| AppError::database(format!("Invalid tenant data blob: {e}")))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

impl Database {
    /// Insert a tenant row into the registry
    pub async fn create_tenant(&self, tenant: &Tenant) -> AppResult<()> {
        let data = serde_json::to_string(&tenant.data)
            .map_err(|e| AppError::internal(format!("Failed to serialize tenant data: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO tenants (id, name, data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(tenant.id.to_string())
        .bind(&tenant.name)
        .bind(data)
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Fetch a tenant by id
    pub async fn get_tenant(&self, id: Uuid) -> AppResult<Option<Tenant>> {
        let row = sqlx::query("SELECT * FROM tenants WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(self.pool())
            .await?;

        row.as_ref().map(row_to_tenant).transpose()
    }

    /// All tenants in the registry, newest first
    pub async fn list_tenants(&self) -> AppResult<Vec<Tenant>> {
        let rows = sqlx::query("SELECT * FROM tenants ORDER BY created_at DESC")
            .fetch_all(self.pool())
            .await?;

        rows.iter().map(row_to_tenant).collect()
    }

    /// Persist name and data changes, bumping `updated_at`
    pub async fn update_tenant(&self, tenant: &mut Tenant) -> AppResult<()> {
        tenant.updated_at = Utc::now();
        let data = serde_json::to_string(&tenant.data)
            .map_err(|e| AppError::internal(format!("Failed to serialize tenant data: {e}")))?;

        sqlx::query(
            r"
            UPDATE tenants SET name = $2, data = $3, updated_at = $4 WHERE id = $1
            ",
        )
        .bind(tenant.id.to_string())
        .bind(&tenant.name)
        .bind(data)
        .bind(tenant.updated_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Remove a tenant row from the registry
    pub async fn delete_tenant(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(id.to_string())
            .execute(self.pool())
            .await?;

        Ok(())
    }
}
