// ABOUTME: Shared test utilities: temp stores, seeded users, router and request helpers
// ABOUTME: Reduces duplication across the integration test suites
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use castellan::auth::AuthService;
use castellan::database::Database;
use castellan::models::User;
use castellan::routes;
use castellan::server::ServerResources;
use castellan::tenancy::TenantStores;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

/// Minimum bcrypt cost keeps hashing fast in tests
pub const TEST_BCRYPT_COST: u32 = 4;

/// A full server environment backed by a temp directory
pub struct TestEnv {
    /// Keeps the temp directory alive for the test's duration
    pub dir: TempDir,
    pub central_db: Database,
    pub resources: Arc<ServerResources>,
}

impl TestEnv {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let central_url = format!("sqlite:{}/central.db", dir.path().display());
        let central_db = Database::connect(&central_url).await.expect("central db");
        central_db.migrate_central().await.expect("migrations");

        let tenant_stores = TenantStores::new(
            dir.path().join("tenants"),
            "tenant_".to_owned(),
            String::new(),
        );
        let auth = AuthService::with_cost(TEST_BCRYPT_COST);
        let resources = Arc::new(ServerResources::new(
            central_db.clone(),
            tenant_stores,
            auth,
        ));

        Self {
            dir,
            central_db,
            resources,
        }
    }

    pub fn router(&self) -> Router {
        routes::router(self.resources.clone())
    }

    /// Seed a user directly into a store with the given role
    pub async fn seed_user(&self, db: &Database, email: &str, password: &str, role: &str) -> User {
        let hash = self
            .resources
            .auth
            .hash_password(password)
            .expect("hash password");
        let user = User::new(
            "Test".to_owned(),
            "User".to_owned(),
            email.to_owned(),
            hash,
            role.to_owned(),
        );
        db.create_user(&user).await.expect("create user");
        user
    }

    pub async fn seed_central_admin(&self, email: &str, password: &str) -> User {
        self.seed_user(&self.central_db, email, password, "central_admin")
            .await
    }

    pub async fn seed_central_user(&self, email: &str, password: &str) -> User {
        self.seed_user(&self.central_db, email, password, "central_user")
            .await
    }

    /// Log in through the HTTP surface and return the bearer token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .router()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                None,
                None,
                Some(json!({ "email": email, "password": password })),
            ))
            .await
            .expect("login request");
        assert_eq!(response.status(), StatusCode::OK, "login should succeed");
        let body = body_json(response).await;
        body["token"].as_str().expect("token in body").to_owned()
    }
}

/// Build a JSON request with optional bearer token and tenant header
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    tenant_id: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    if let Some(tenant_id) = tenant_id {
        builder = builder.header("x-tenant-id", tenant_id);
    }
    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

/// Collect and parse a JSON response body
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}
