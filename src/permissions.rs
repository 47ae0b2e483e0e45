// ABOUTME: Static role-to-permission tables for central and tenant scopes
// ABOUTME: Closed role enums with explicitly authored permission lists, no inheritance
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

//! # Roles and Permissions
//!
//! Two closed role enumerations, one per scope. Each role maps to a fixed,
//! fully written-out permission list. An admin role passes a check only
//! because its list happens to be a superset of the user role's list; the
//! tables are data, not computed inheritance, and must stay that way.

use serde::{Deserialize, Serialize};

/// Which store a request's data access is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// The shared central database (tenant registry + platform users)
    Central,
    /// A specific tenant's isolated database
    Tenant,
}

/// Roles available to users in the central store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CentralRole {
    /// Full platform administration
    CentralAdmin,
    /// Read-only platform access
    CentralUser,
}

impl CentralRole {
    /// All central roles, in declaration order
    pub const ALL: [Self; 2] = [Self::CentralAdmin, Self::CentralUser];

    /// Role discriminant as stored in the `role` column
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CentralAdmin => "central_admin",
            Self::CentralUser => "central_user",
        }
    }

    /// Parse a stored role discriminant
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "central_admin" => Some(Self::CentralAdmin),
            "central_user" => Some(Self::CentralUser),
            _ => None,
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CentralAdmin => "Central Administrator",
            Self::CentralUser => "Central User",
        }
    }

    /// The full permission list for this role
    #[must_use]
    pub const fn permissions(self) -> &'static [&'static str] {
        match self {
            Self::CentralAdmin => &[
                // Tenant management
                "central.tenants.create",
                "central.tenants.view",
                "central.tenants.update",
                "central.tenants.delete",
                // Central user management
                "central.users.create",
                "central.users.view",
                "central.users.update",
                "central.users.delete",
                // Can create the first user in tenants
                "tenant.users.create",
            ],
            Self::CentralUser => &[
                // Read-only access
                "central.tenants.view",
                "central.users.view",
            ],
        }
    }

    /// Pure membership test against this role's permission list
    #[must_use]
    pub fn can(self, permission: &str) -> bool {
        self.permissions().contains(&permission)
    }
}

/// Roles available to users in a tenant store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TenantRole {
    /// Full tenant administration
    TenantAdmin,
    /// Regular tenant member
    TenantUser,
}

impl TenantRole {
    /// All tenant roles, in declaration order
    pub const ALL: [Self; 2] = [Self::TenantAdmin, Self::TenantUser];

    /// Role discriminant as stored in the `role` column
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TenantAdmin => "tenant_admin",
            Self::TenantUser => "tenant_user",
        }
    }

    /// Parse a stored role discriminant
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "tenant_admin" => Some(Self::TenantAdmin),
            "tenant_user" => Some(Self::TenantUser),
            _ => None,
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TenantAdmin => "Tenant Administrator",
            Self::TenantUser => "Tenant User",
        }
    }

    /// The full permission list for this role
    #[must_use]
    pub const fn permissions(self) -> &'static [&'static str] {
        match self {
            Self::TenantAdmin => &[
                // User management
                "tenant.users.create",
                "tenant.users.view",
                "tenant.users.update",
                "tenant.users.delete",
                // Tenant settings
                "tenant.settings.view",
                "tenant.settings.update",
                // Own profile
                "profile.view",
                "profile.update",
            ],
            Self::TenantUser => &[
                // View only
                "tenant.users.view",
                // Own profile
                "profile.view",
                "profile.update",
            ],
        }
    }

    /// Pure membership test against this role's permission list
    #[must_use]
    pub fn can(self, permission: &str) -> bool {
        self.permissions().contains(&permission)
    }
}

/// Permission list for a stored role discriminant, interpreted against the
/// table matching `scope`. Unknown roles have no permissions.
#[must_use]
pub fn role_permissions(scope: Scope, role: &str) -> &'static [&'static str] {
    match scope {
        Scope::Central => CentralRole::parse(role).map_or(&[], CentralRole::permissions),
        Scope::Tenant => TenantRole::parse(role).map_or(&[], TenantRole::permissions),
    }
}

/// Pure predicate behind the permission gate: does `role` hold `permission`
/// in `scope`? Idempotent by construction — a function of the static tables.
#[must_use]
pub fn check(scope: Scope, role: &str, permission: &str) -> bool {
    role_permissions(scope, role).contains(&permission)
}

/// Valid role discriminants for a scope, used by validation rules
#[must_use]
pub fn role_values(scope: Scope) -> Vec<&'static str> {
    match scope {
        Scope::Central => CentralRole::ALL.iter().map(|r| r.as_str()).collect(),
        Scope::Tenant => TenantRole::ALL.iter().map(|r| r.as_str()).collect(),
    }
}
