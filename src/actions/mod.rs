// ABOUTME: Action layer: validate-then-execute mutations with structured logging
// ABOUTME: Central tenant management, central user management, and tenant user management
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

//! # Actions
//!
//! Each action validates its input against a declarative rule list, then
//! performs the entity mutation against the store handle it was given,
//! logging before and after with entity identifiers (never passwords or
//! token values). Domain preconditions — last-admin, self-delete, the
//! duplicate-seed guard — are explicit checks ahead of the mutation.

pub mod central_users;
pub mod tenant_users;
pub mod tenants;
