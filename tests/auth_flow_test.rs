// ABOUTME: Integration tests for central login, logout, refresh, and me endpoints
// ABOUTME: Covers enumeration resistance and token revocation semantics
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use axum::http::StatusCode;
use common::{body_json, json_request, TestEnv};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn login_returns_token_and_public_user() {
    let env = TestEnv::new().await;
    env.seed_central_admin("admin@example.com", "password123")
        .await;

    let response = env
        .router()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            None,
            Some(json!({ "email": "admin@example.com", "password": "password123" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["token"].as_str().unwrap().contains('|'));
    assert_eq!(body["user"]["email"], "admin@example.com");
    assert_eq!(body["user"]["role"], "central_admin");
    assert!(
        body["user"].get("password_hash").is_none(),
        "password hash must never be serialized"
    );
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_indistinguishable() {
    let env = TestEnv::new().await;
    env.seed_central_admin("admin@example.com", "password123")
        .await;

    let wrong_password = env
        .router()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            None,
            Some(json!({ "email": "admin@example.com", "password": "not-the-password" })),
        ))
        .await
        .unwrap();
    let unknown_email = env
        .router()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            None,
            Some(json!({ "email": "nobody@example.com", "password": "password123" })),
        ))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(unknown_email.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let a = body_json(wrong_password).await;
    let b = body_json(unknown_email).await;
    assert_eq!(a, b, "failure envelopes must match byte for byte");
    assert_eq!(a["errors"]["email"][0], "The credentials are incorrect.");
}

#[tokio::test]
async fn login_rejects_missing_fields() {
    let env = TestEnv::new().await;

    let response = env
        .router()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            None,
            Some(json!({ "email": "admin@example.com" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body["errors"]["password"].is_array());
}

#[tokio::test]
async fn login_with_unknown_tenant_id_is_not_found() {
    let env = TestEnv::new().await;
    env.seed_central_admin("admin@example.com", "password123")
        .await;

    let response = env
        .router()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            None,
            Some(json!({
                "email": "admin@example.com",
                "password": "password123",
                "tenant_id": "00000000-0000-0000-0000-000000000000",
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn me_requires_a_valid_token() {
    let env = TestEnv::new().await;
    env.seed_central_admin("admin@example.com", "password123")
        .await;
    let token = env.login("admin@example.com", "password123").await;

    let me = env
        .router()
        .oneshot(json_request("GET", "/api/auth/me", Some(&token), None, None))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    let body = body_json(me).await;
    assert_eq!(body["user"]["email"], "admin@example.com");

    let missing = env
        .router()
        .oneshot(json_request("GET", "/api/auth/me", None, None, None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let garbage = env
        .router()
        .oneshot(json_request(
            "GET",
            "/api/auth/me",
            Some("not-a-real-token"),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_invalidates_the_old_token() {
    let env = TestEnv::new().await;
    env.seed_central_admin("admin@example.com", "password123")
        .await;
    let old = env.login("admin@example.com", "password123").await;

    let refreshed = env
        .router()
        .oneshot(json_request(
            "POST",
            "/api/auth/refresh",
            Some(&old),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(refreshed.status(), StatusCode::OK);
    let new = body_json(refreshed).await["token"]
        .as_str()
        .unwrap()
        .to_owned();
    assert_ne!(old, new);

    let with_old = env
        .router()
        .oneshot(json_request("GET", "/api/auth/me", Some(&old), None, None))
        .await
        .unwrap();
    assert_eq!(with_old.status(), StatusCode::UNAUTHORIZED);

    let with_new = env
        .router()
        .oneshot(json_request("GET", "/api/auth/me", Some(&new), None, None))
        .await
        .unwrap();
    assert_eq!(with_new.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_revokes_only_the_presenting_token() {
    let env = TestEnv::new().await;
    env.seed_central_admin("admin@example.com", "password123")
        .await;
    let first = env.login("admin@example.com", "password123").await;
    let second = env.login("admin@example.com", "password123").await;

    let logout = env
        .router()
        .oneshot(json_request(
            "POST",
            "/api/auth/logout",
            Some(&first),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(logout.status(), StatusCode::OK);
    assert_eq!(body_json(logout).await["message"], "Logout successful");

    let with_first = env
        .router()
        .oneshot(json_request("GET", "/api/auth/me", Some(&first), None, None))
        .await
        .unwrap();
    assert_eq!(with_first.status(), StatusCode::UNAUTHORIZED);

    let with_second = env
        .router()
        .oneshot(json_request("GET", "/api/auth/me", Some(&second), None, None))
        .await
        .unwrap();
    assert_eq!(with_second.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_tenants_lists_the_registry() {
    let env = TestEnv::new().await;
    env.seed_central_admin("admin@example.com", "password123")
        .await;
    let token = env.login("admin@example.com", "password123").await;

    let create = env
        .router()
        .oneshot(json_request(
            "POST",
            "/api/tenants",
            Some(&token),
            None,
            Some(json!({ "name": "Acme" })),
        ))
        .await
        .unwrap();
    assert_eq!(create.status(), StatusCode::CREATED);

    let listed = env
        .router()
        .oneshot(json_request(
            "GET",
            "/api/auth/tenants",
            Some(&token),
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(listed.status(), StatusCode::OK);
    let body = body_json(listed).await;
    assert_eq!(body["tenants"].as_array().unwrap().len(), 1);
    assert_eq!(body["tenants"][0]["name"], "Acme");
}
