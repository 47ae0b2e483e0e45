// ABOUTME: Access token storage shared by the central and tenant stores
// ABOUTME: Digest-only persistence with per-token and per-user revocation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::AccessToken;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

fn row_to_token(row: &SqliteRow) -> AppResult<AccessToken> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    Ok(AccessToken {
        id: Uuid::parse_str(&id)
            .map_err(|e| AppError::database(format!("Invalid token id in store: {e}")))?,
        user_id: Uuid::parse_str(&user_id)
            .map_err(|e| AppError::database(format!("Invalid token user id in store: {e}")))?,
        name: row.get("name"),
        token_hash: row.get("token_hash"),
        created_at: row.get("created_at"),
        last_used_at: row.get("last_used_at"),
    })
}

impl Database {
    /// Persist a freshly issued token (digest only, never the secret)
    pub async fn insert_access_token(&self, token: &AccessToken) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO access_tokens (id, user_id, name, token_hash, created_at, last_used_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(token.id.to_string())
        .bind(token.user_id.to_string())
        .bind(&token.name)
        .bind(&token.token_hash)
        .bind(token.created_at)
        .bind(token.last_used_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Fetch a token by its public id half
    pub async fn get_access_token(&self, id: Uuid) -> AppResult<Option<AccessToken>> {
        let row = sqlx::query("SELECT * FROM access_tokens WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(self.pool())
            .await?;

        row.as_ref().map(row_to_token).transpose()
    }

    /// Record that the token just authenticated a request
    pub async fn touch_access_token(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE access_tokens SET last_used_at = CURRENT_TIMESTAMP WHERE id = $1")
            .bind(id.to_string())
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Revoke a single token
    pub async fn delete_access_token(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM access_tokens WHERE id = $1")
            .bind(id.to_string())
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Revoke every token belonging to a user. Runs before the user row is
    /// removed so an in-flight request holding one of these tokens cannot
    /// act on a half-deleted account.
    pub async fn delete_tokens_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE user_id = $1")
            .bind(user_id.to_string())
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}
