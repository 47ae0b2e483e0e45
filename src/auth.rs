// ABOUTME: Credential verification and opaque bearer token lifecycle
// ABOUTME: Handles login, logout, refresh, and principal resolution from headers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

//! # Authentication Service
//!
//! Passwords are bcrypt hashes; bearer tokens are opaque `{id}|{secret}`
//! pairs of which only the SHA-256 digest of the secret half is stored, in
//! the same store as the user the token belongs to. The service is
//! scope-agnostic: every operation takes the store handle the surrounding
//! request already resolved (central or tenant), so a central login and a
//! tenant login run the same code against different stores.
//!
//! Token values and passwords never appear in logs.

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{AccessToken, User};
use axum::http::HeaderMap;
use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Label stored with every token issued by the login flow
pub const TOKEN_NAME: &str = "auth-token";

/// The authenticated identity attached to the current request
#[derive(Debug, Clone)]
pub struct Principal {
    /// The user the presented token belongs to
    pub user: User,
    /// The presenting token's id; logout and refresh revoke exactly this one
    pub token_id: Uuid,
}

/// Authentication service over a given store
#[derive(Debug, Clone)]
pub struct AuthService {
    bcrypt_cost: u32,
}

impl Default for AuthService {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthService {
    /// Service with the production bcrypt cost
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Service with a custom bcrypt cost. Tests use the minimum cost to
    /// keep hashing fast.
    #[must_use]
    pub const fn with_cost(bcrypt_cost: u32) -> Self {
        Self { bcrypt_cost }
    }

    /// Hash a plaintext password for storage
    pub fn hash_password(&self, plain: &str) -> AppResult<String> {
        bcrypt::hash(plain, self.bcrypt_cost)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
    }

    /// Verify a plaintext password against a stored hash
    #[must_use]
    pub fn verify_password(&self, plain: &str, hash: &str) -> bool {
        bcrypt::verify(plain, hash).unwrap_or(false)
    }

    /// Verify credentials against `db` and issue a bearer token.
    ///
    /// An unknown email and a wrong password are indistinguishable to the
    /// caller: both return the uniform [`AppError::invalid_credentials`]
    /// envelope, and the unknown-email path still burns a bcrypt round so
    /// the two cases stay timing-comparable.
    pub async fn login(&self, db: &Database, email: &str, password: &str) -> AppResult<(User, String)> {
        let Some(user) = db.get_user_by_email(email).await? else {
            let _ = self.hash_password(password);
            warn!("Login failed: unknown or mismatched credentials");
            return Err(AppError::invalid_credentials());
        };

        if !self.verify_password(password, &user.password_hash) {
            warn!(user_id = %user.id, "Login failed: unknown or mismatched credentials");
            return Err(AppError::invalid_credentials());
        }

        let token = self.issue_token(db, user.id).await?;
        info!(user_id = %user.id, "Login successful");
        Ok((user, token))
    }

    /// Issue a fresh token for a user, returning the plaintext
    /// `{id}|{secret}` form. Multiple live tokens per user are allowed.
    pub async fn issue_token(&self, db: &Database, user_id: Uuid) -> AppResult<String> {
        let mut secret_bytes = [0_u8; 20];
        rand::thread_rng().fill_bytes(&mut secret_bytes);
        let secret = hex::encode(secret_bytes);

        let token = AccessToken {
            id: Uuid::new_v4(),
            user_id,
            name: TOKEN_NAME.to_owned(),
            token_hash: hash_token_secret(&secret),
            created_at: Utc::now(),
            last_used_at: None,
        };
        db.insert_access_token(&token).await?;

        Ok(format!("{}|{secret}", token.id))
    }

    /// Resolve the principal presented by the `Authorization` header
    /// against `db`. Every failure mode collapses to the same 401.
    pub async fn authenticate(&self, db: &Database, headers: &HeaderMap) -> AppResult<Principal> {
        let bearer = headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(AppError::auth_required)?;

        let (token_id, secret) = parse_bearer(bearer).ok_or_else(|| {
            debug!("Malformed bearer token");
            AppError::auth_required()
        })?;

        let Some(stored) = db.get_access_token(token_id).await? else {
            debug!(token_id = %token_id, "Unknown or revoked token");
            return Err(AppError::auth_required());
        };

        let presented = hash_token_secret(secret);
        if !bool::from(presented.as_bytes().ct_eq(stored.token_hash.as_bytes())) {
            warn!(token_id = %token_id, "Token digest mismatch");
            return Err(AppError::auth_required());
        }

        let Some(user) = db.get_user(stored.user_id).await? else {
            // Token row outlived its user; treat as revoked
            warn!(token_id = %token_id, "Token refers to a missing user");
            return Err(AppError::auth_required());
        };

        db.touch_access_token(token_id).await?;

        Ok(Principal {
            user,
            token_id,
        })
    }

    /// Revoke only the token used for the current request
    pub async fn logout(&self, db: &Database, principal: &Principal) -> AppResult<()> {
        db.delete_access_token(principal.token_id).await?;
        info!(user_id = %principal.user.id, "Logout successful");
        Ok(())
    }

    /// Revoke the presenting token and issue a replacement. The old token
    /// is deleted before the new one is inserted so the two are never valid
    /// simultaneously.
    pub async fn refresh(&self, db: &Database, principal: &Principal) -> AppResult<String> {
        db.delete_access_token(principal.token_id).await?;
        let token = self.issue_token(db, principal.user.id).await?;
        info!(user_id = %principal.user.id, "Token refreshed");
        Ok(token)
    }
}

/// SHA-256 hex digest of a token secret
#[must_use]
pub fn hash_token_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

fn parse_bearer(bearer: &str) -> Option<(Uuid, &str)> {
    let (id, secret) = bearer.split_once('|')?;
    if secret.is_empty() {
        return None;
    }
    Some((Uuid::parse_str(id).ok()?, secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer_shapes() {
        let id = Uuid::new_v4();
        let token = format!("{id}|deadbeef");
        let parsed = parse_bearer(&token);
        assert_eq!(parsed, Some((id, "deadbeef")));

        assert!(parse_bearer("not-a-uuid|secret").is_none());
        assert!(parse_bearer("no-separator").is_none());
        assert!(parse_bearer(&format!("{id}|")).is_none());
    }

    #[test]
    fn test_password_round_trip() {
        let auth = AuthService::with_cost(4);
        let hash = auth.hash_password("pass1234").unwrap();
        assert!(auth.verify_password("pass1234", &hash));
        assert!(!auth.verify_password("pass1235", &hash));
    }

    #[test]
    fn test_token_digest_is_stable() {
        assert_eq!(hash_token_secret("abc"), hash_token_secret("abc"));
        assert_ne!(hash_token_secret("abc"), hash_token_secret("abd"));
        // hex-encoded SHA-256
        assert_eq!(hash_token_secret("abc").len(), 64);
    }
}
