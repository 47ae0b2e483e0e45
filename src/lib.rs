// ABOUTME: Multi-tenant administration backend: central registry plus isolated per-tenant stores
// ABOUTME: Library root wiring auth, tenancy, actions, and the HTTP surface together
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

//! # Castellan
//!
//! A multi-tenant SaaS administration backend. One central SQLite store
//! holds the tenant registry and the platform's own users; every tenant
//! gets a fully isolated store of its own, provisioned and migrated when
//! the tenant is created and torn down when it is deleted.
//!
//! Authentication is opaque bearer tokens (id and secret joined by `|`,
//! only a digest of the secret stored). Authorization is static role
//! tables: two central roles and two tenant roles, each mapped to a fixed
//! set of permission strings checked per request.
//!
//! Request handling never switches a global tenant; the resolved
//! [`tenancy::context::TenantContext`] travels explicitly from the
//! middleware into handlers and actions.

pub mod actions;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod models;
pub mod permissions;
pub mod routes;
pub mod server;
pub mod tenancy;
pub mod validation;
