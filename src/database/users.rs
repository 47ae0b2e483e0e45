// ABOUTME: User table operations shared by the central and tenant stores
// ABOUTME: Handles create, lookup, update, delete, and role counting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

use super::{is_unique_email_violation, Database};
use crate::errors::{AppError, AppResult, FieldErrors};
use crate::models::User;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let id: String = row.get("id");
    Ok(User {
        id: Uuid::parse_str(&id)
            .map_err(|e| AppError::database(format!("Invalid user id in store: {e}")))?,
        firstname: row.get("firstname"),
        lastname: row.get("lastname"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: row.get("role"),
        email_verified_at: row.get("email_verified_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn email_taken_error(err: sqlx::Error) -> AppError {
    if is_unique_email_violation(&err) {
        let mut errors = FieldErrors::new();
        errors.insert(
            "email".to_owned(),
            vec!["This email is already used".to_owned()],
        );
        AppError::validation(errors)
    } else {
        AppError::from(err)
    }
}

impl Database {
    /// Insert a new user row. A concurrent duplicate email loses
    /// deterministically to the UNIQUE constraint and surfaces as a 422.
    pub async fn create_user(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO users (id, firstname, lastname, email, password_hash, role,
                               email_verified_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.email_verified_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(self.pool())
        .await
        .map_err(email_taken_error)?;

        Ok(())
    }

    /// Fetch a user by id
    pub async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(self.pool())
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// Fetch a user by email within this store
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(self.pool())
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// All users in this store, newest first
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(self.pool())
            .await?;

        rows.iter().map(row_to_user).collect()
    }

    /// Persist the mutable fields of a user row
    pub async fn update_user(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE users SET
                firstname = $2,
                lastname = $3,
                email = $4,
                password_hash = $5,
                role = $6,
                updated_at = $7
            WHERE id = $1
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.updated_at)
        .execute(self.pool())
        .await
        .map_err(email_taken_error)?;

        Ok(())
    }

    /// Remove a user row. Token revocation must happen first; see
    /// the delete actions for the required ordering.
    pub async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.to_string())
            .execute(self.pool())
            .await?;

        Ok(())
    }

    /// Number of users in this store
    pub async fn count_users(&self) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users")
            .fetch_one(self.pool())
            .await?;

        Ok(row.get("n"))
    }

    /// Number of users holding a given role in this store
    pub async fn count_users_with_role(&self, role: &str) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE role = $1")
            .bind(role)
            .fetch_one(self.pool())
            .await?;

        Ok(row.get("n"))
    }
}
