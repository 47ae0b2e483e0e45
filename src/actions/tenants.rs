// ABOUTME: Tenant lifecycle actions: create with provisioning, update, delete with teardown
// ABOUTME: Includes first-admin seeding guarded against double-provisioning
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

//! Tenant actions against the central registry.
//!
//! Creation drives the provisioning pipeline inline: insert the registry
//! row, allocate + migrate the storage unit, then optionally seed the first
//! admin. The steps and their failure semantics are visible right here in
//! the control flow — no event listeners. Creation is not atomic across
//! the registry and the storage unit; a provisioning failure leaves the
//! row behind and surfaces as a 500.

use crate::auth::AuthService;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{Tenant, User};
use crate::permissions::TenantRole;
use crate::tenancy::{provision_tenant_storage, teardown_tenant_storage, TenantStores};
use crate::validation::{Validator, MAX_STRING_LEN, MIN_PASSWORD_LEN};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

/// Input for tenant creation, optionally carrying first-admin credentials
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTenantRequest {
    /// Display name
    pub name: Option<String>,
    /// Opaque tenant config blob, defaults to `{}`
    pub data: Option<serde_json::Value>,
    /// Email of the first admin to seed inside the new store
    pub admin_email: Option<String>,
    /// Password of the first admin
    pub admin_password: Option<String>,
    /// Given name of the first admin
    pub admin_firstname: Option<String>,
    /// Family name of the first admin
    pub admin_lastname: Option<String>,
}

/// Input for tenant updates; absent fields are left unchanged
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTenantRequest {
    /// New display name
    pub name: Option<String>,
    /// Replacement config blob
    pub data: Option<serde_json::Value>,
}

fn validate_create(request: &CreateTenantRequest) -> AppResult<String> {
    let mut v = Validator::new();

    let name = v.required("name", request.name.as_deref());
    if let Some(name) = name {
        v.max_len("name", name, MAX_STRING_LEN);
    }

    if let Some(data) = &request.data {
        if !data.is_object() {
            v.add("data", "data must be an object");
        }
    }

    // admin_email and admin_password are each required with the other
    match (request.admin_email.as_deref(), request.admin_password.as_deref()) {
        (Some(email), Some(password)) => {
            v.email("admin_email", email);
            v.min_len("admin_password", password, MIN_PASSWORD_LEN);
        }
        (Some(_), None) => v.add("admin_password", "admin_password is required with admin_email"),
        (None, Some(_)) => v.add("admin_email", "admin_email is required with admin_password"),
        (None, None) => {}
    }

    let name = name.map(ToOwned::to_owned);
    v.finish()?;
    // Safe after finish: required() recorded an error when name was absent
    name.ok_or_else(|| AppError::internal("name validated but missing"))
}

/// All tenants in the registry
pub async fn list(central: &Database) -> AppResult<Vec<Tenant>> {
    central.list_tenants().await
}

/// A single tenant, or 404
pub async fn get(central: &Database, tenant_id: Uuid) -> AppResult<Tenant> {
    central
        .get_tenant(tenant_id)
        .await?
        .ok_or_else(|| AppError::not_found("Tenant", format!("No tenant with id {tenant_id}")))
}

/// Create a tenant: registry row, storage unit, migrations, optional
/// first-admin seed — in that order, synchronously.
pub async fn create(
    central: &Database,
    stores: &TenantStores,
    auth: &AuthService,
    request: CreateTenantRequest,
) -> AppResult<Tenant> {
    let name = validate_create(&request)?;

    info!(name = %name, "Creating tenant");
    let tenant = Tenant::new(name, request.data.unwrap_or_else(|| serde_json::json!({})));
    central.create_tenant(&tenant).await?;
    info!(tenant_id = %tenant.id, name = %tenant.name, "Tenant created");

    // Provisioning failures propagate; the registry row stays behind
    provision_tenant_storage(stores, tenant.id).await?;

    if let (Some(email), Some(password)) = (request.admin_email, request.admin_password) {
        create_first_user(
            stores,
            auth,
            &tenant,
            FirstUserInput {
                firstname: request.admin_firstname.unwrap_or_default(),
                lastname: request.admin_lastname.unwrap_or_default(),
                email,
                password,
            },
        )
        .await?;
    }

    Ok(tenant)
}

/// Credentials and names for the first user seeded into a fresh tenant
#[derive(Debug, Clone)]
pub struct FirstUserInput {
    /// Given name (may be empty)
    pub firstname: String,
    /// Family name (may be empty)
    pub lastname: String,
    /// Admin email
    pub email: String,
    /// Admin plaintext password
    pub password: String,
}

/// Seed exactly one `tenant_admin` into a tenant's store. Guarded by the
/// zero-users precondition so retrying a creation cannot double-seed.
pub async fn create_first_user(
    stores: &TenantStores,
    auth: &AuthService,
    tenant: &Tenant,
    input: FirstUserInput,
) -> AppResult<User> {
    let mut v = Validator::new();
    if let Some(email) = v.required("email", Some(&input.email)) {
        v.email("email", email);
    }
    if let Some(password) = v.required("password", Some(&input.password)) {
        v.min_len("password", password, MIN_PASSWORD_LEN);
    }
    v.max_len("firstname", &input.firstname, MAX_STRING_LEN);
    v.max_len("lastname", &input.lastname, MAX_STRING_LEN);
    v.finish()?;

    let db = stores.open(tenant.id).await?;

    let existing = db.count_users().await?;
    if existing > 0 {
        return Err(AppError::domain_rule(format!(
            "The tenant {} already has {existing} user(s)",
            tenant.id
        )));
    }

    let user = User::new(
        input.firstname,
        input.lastname,
        input.email,
        auth.hash_password(&input.password)?,
        TenantRole::TenantAdmin.as_str().to_owned(),
    );
    db.create_user(&user).await?;

    info!(
        tenant_id = %tenant.id,
        user_id = %user.id,
        user_email = %user.email,
        "First user created in tenant"
    );

    Ok(user)
}

/// Update a tenant's name and/or data blob
pub async fn update(
    central: &Database,
    tenant_id: Uuid,
    request: UpdateTenantRequest,
) -> AppResult<Tenant> {
    let mut v = Validator::new();
    if let Some(name) = request.name.as_deref() {
        if name.trim().is_empty() {
            v.add("name", "name is required");
        }
        v.max_len("name", name, MAX_STRING_LEN);
    }
    if let Some(data) = &request.data {
        if !data.is_object() {
            v.add("data", "data must be an object");
        }
    }
    v.finish()?;

    let mut tenant = get(central, tenant_id).await?;

    info!(tenant_id = %tenant.id, "Updating tenant");
    if let Some(name) = request.name {
        tenant.name = name;
    }
    if let Some(data) = request.data {
        tenant.data = data;
    }
    central.update_tenant(&mut tenant).await?;
    info!(tenant_id = %tenant.id, "Tenant updated");

    Ok(tenant)
}

/// Delete a tenant: remove the registry row, then destroy the storage
/// unit. Teardown failure is logged and swallowed (see the tenancy
/// module); the row deletion stands either way.
pub async fn delete(central: &Database, stores: &TenantStores, tenant_id: Uuid) -> AppResult<()> {
    let tenant = get(central, tenant_id).await?;

    info!(tenant_id = %tenant.id, "Deleting tenant");
    central.delete_tenant(tenant.id).await?;
    teardown_tenant_storage(stores, tenant.id).await;
    info!(tenant_id = %tenant.id, "Tenant deleted");

    Ok(())
}
