// ABOUTME: Core entity types for tenants, users, and bearer tokens
// ABOUTME: Defines storage records and the public user projection without secrets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

//! # Data Models
//!
//! Entities shared by the central store and the per-tenant stores. A `User`
//! row lives in exactly one store; which permission table its `role` string
//! is interpreted against follows from the store it lives in. Password
//! hashes never leave the crate: every response uses [`PublicUser`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant of the platform, stored in the central registry.
///
/// Owns exactly one isolated storage unit named from its id. The row and
/// the storage unit are created together and deleted together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// Immutable primary key
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Opaque tenant-specific configuration blob
    pub data: serde_json::Value,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Create a new tenant record with a fresh id and timestamps
    #[must_use]
    pub fn new(name: String, data: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            data,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A user account, central or tenant scoped depending on the store it
/// lives in.
#[derive(Debug, Clone)]
pub struct User {
    /// Primary key
    pub id: Uuid,
    /// Given name
    pub firstname: String,
    /// Family name
    pub lastname: String,
    /// Unique within the owning store
    pub email: String,
    /// bcrypt hash, never serialized
    pub password_hash: String,
    /// Role discriminant, interpreted against the owning store's table
    pub role: String,
    /// Email verification timestamp, if verified
    pub email_verified_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user record with a fresh id and timestamps
    #[must_use]
    pub fn new(
        firstname: String,
        lastname: String,
        email: String,
        password_hash: String,
        role: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            firstname,
            lastname,
            email,
            password_hash,
            role,
            email_verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Public projection, safe to serialize into responses
    #[must_use]
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            firstname: self.firstname.clone(),
            lastname: self.lastname.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            email_verified_at: self.email_verified_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// User fields exposed over the API. Excludes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    /// Primary key
    pub id: Uuid,
    /// Given name
    pub firstname: String,
    /// Family name
    pub lastname: String,
    /// Email address
    pub email: String,
    /// Role discriminant
    pub role: String,
    /// Email verification timestamp, if verified
    pub email_verified_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// A revocable bearer credential bound to one user, stored in the same
/// store as the user. Only the SHA-256 digest of the secret half is
/// persisted; the plaintext `{id}|{secret}` form exists only in the login
/// response.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Primary key, also the public half of the plaintext token
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Client-supplied label ("auth-token")
    pub name: String,
    /// SHA-256 hex digest of the secret half
    pub token_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last time the token authenticated a request
    pub last_used_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_projection_has_no_hash() {
        let user = User::new(
            "Ada".to_owned(),
            "Lovelace".to_owned(),
            "ada@example.com".to_owned(),
            "$2b$12$abcdefghijklmnopqrstuv".to_owned(),
            "central_admin".to_owned(),
        );
        let json = serde_json::to_value(user.public()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["firstname"], "Ada");
    }

    #[test]
    fn test_new_tenant_defaults() {
        let tenant = Tenant::new("Acme".to_owned(), serde_json::json!({}));
        assert_eq!(tenant.created_at, tenant.updated_at);
        assert_eq!(tenant.data, serde_json::json!({}));
    }
}
