// ABOUTME: Unified error handling with error codes and HTTP response envelopes
// ABOUTME: Maps domain, validation, auth, and infrastructure failures to JSON responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

//! # Unified Error Handling
//!
//! Every fallible operation in the crate returns [`AppResult`]. The single
//! [`AppError`] type carries an [`ErrorCode`] that determines the HTTP status
//! and the shape of the JSON envelope emitted at the axum boundary:
//!
//! - validation failures → `422 {message, errors}`
//! - bad credentials → `422 {message, errors}` (indistinguishable from a
//!   nonexistent account, to resist user enumeration)
//! - missing/invalid token → `401 {message}`
//! - insufficient permission → `403 {message, required_permission, your_role,
//!   your_permissions}`
//! - business-rule violations → `403 {message}`
//! - absent entities → `404 {message, error}`
//! - infrastructure failures → `500 {message, error}`

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Input failed declarative validation rules
    Validation,
    /// Wrong password or unknown account (the two are indistinguishable)
    InvalidCredentials,
    /// Missing or invalid bearer token
    AuthRequired,
    /// Authenticated principal lacks the required permission
    PermissionDenied,
    /// Business-rule precondition failed (last admin, self delete, seed guard)
    DomainRule,
    /// Referenced entity does not exist
    NotFound,
    /// Database operation failed
    Database,
    /// Tenant storage provisioning or teardown failed
    Provisioning,
    /// Configuration is missing or invalid
    Config,
    /// Unclassified internal failure
    Internal,
}

impl ErrorCode {
    /// HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::Validation | Self::InvalidCredentials => StatusCode::UNPROCESSABLE_ENTITY,
            Self::AuthRequired => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied | Self::DomainRule => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Database | Self::Provisioning | Self::Config | Self::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Field-level validation messages, keyed by field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Context attached to a failed permission check, echoed in the 403 envelope
#[derive(Debug, Clone, Serialize)]
pub struct PermissionFailure {
    /// The dotted permission string the gate required
    pub required_permission: String,
    /// The principal's role discriminant
    pub your_role: String,
    /// The full permission list for that role in the active scope
    pub your_permissions: Vec<String>,
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code, determines status and envelope shape
    pub code: ErrorCode,
    /// Outer `message` field of the envelope
    pub message: String,
    /// Field errors for the 422 envelope
    pub errors: Option<FieldErrors>,
    /// Permission context for the 403 envelope
    pub permission: Option<PermissionFailure>,
    /// Detail line for the `error` field of 404/500 envelopes
    pub error: Option<String>,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(detail) => write!(f, "{}: {detail}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            errors: None,
            permission: None,
            error: None,
        }
    }

    /// Validation failure carrying a field→messages map
    #[must_use]
    pub fn validation(errors: FieldErrors) -> Self {
        Self {
            errors: Some(errors),
            ..Self::new(ErrorCode::Validation, "Validation error")
        }
    }

    /// Uniform bad-credentials failure. Wrong password and unknown account
    /// must produce byte-identical envelopes.
    #[must_use]
    pub fn invalid_credentials() -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(
            "email".to_owned(),
            vec!["The credentials are incorrect.".to_owned()],
        );
        Self {
            errors: Some(errors),
            ..Self::new(
                ErrorCode::InvalidCredentials,
                "The credentials are incorrect.",
            )
        }
    }

    /// Missing or invalid bearer token
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Unauthenticated")
    }

    /// Permission gate failure with the full 403 context
    #[must_use]
    pub fn permission_denied(
        required_permission: impl Into<String>,
        your_role: impl Into<String>,
        your_permissions: Vec<String>,
    ) -> Self {
        Self {
            permission: Some(PermissionFailure {
                required_permission: required_permission.into(),
                your_role: your_role.into(),
                your_permissions,
            }),
            ..Self::new(
                ErrorCode::PermissionDenied,
                "Forbidden. You do not have permission to perform this action.",
            )
        }
    }

    /// Business-rule violation (last admin, self delete, duplicate seed)
    pub fn domain_rule(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DomainRule, message)
    }

    /// Referenced entity absent
    pub fn not_found(entity: &str, detail: impl Into<String>) -> Self {
        Self {
            error: Some(detail.into()),
            ..Self::new(ErrorCode::NotFound, format!("{entity} not found"))
        }
    }

    /// Database operation failure
    pub fn database(detail: impl Into<String>) -> Self {
        Self {
            error: Some(detail.into()),
            ..Self::new(ErrorCode::Database, "Database error")
        }
    }

    /// Tenant storage provisioning failure
    pub fn provisioning(detail: impl Into<String>) -> Self {
        Self {
            error: Some(detail.into()),
            ..Self::new(ErrorCode::Provisioning, "Tenant storage provisioning failed")
        }
    }

    /// Configuration failure
    pub fn config(detail: impl Into<String>) -> Self {
        Self {
            error: Some(detail.into()),
            ..Self::new(ErrorCode::Config, "Configuration error")
        }
    }

    /// Unclassified internal failure
    pub fn internal(detail: impl Into<String>) -> Self {
        Self {
            error: Some(detail.into()),
            ..Self::new(ErrorCode::Internal, "Internal server error")
        }
    }

    /// Replace the outer `message` while keeping code and details.
    /// Route handlers use this to contextualize 500s ("Error creating
    /// tenant", ...) the way the API envelope requires.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// HTTP status code for this error
    #[must_use]
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("Resource", err.to_string()),
            other => Self::database(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        let body = match self.code {
            ErrorCode::Validation | ErrorCode::InvalidCredentials => json!({
                "message": self.message,
                "errors": self.errors.unwrap_or_default(),
            }),
            ErrorCode::AuthRequired | ErrorCode::DomainRule => json!({
                "message": self.message,
            }),
            ErrorCode::PermissionDenied => match self.permission {
                Some(perm) => json!({
                    "message": self.message,
                    "required_permission": perm.required_permission,
                    "your_role": perm.your_role,
                    "your_permissions": perm.your_permissions,
                }),
                None => json!({ "message": self.message }),
            },
            ErrorCode::NotFound
            | ErrorCode::Database
            | ErrorCode::Provisioning
            | ErrorCode::Config
            | ErrorCode::Internal => json!({
                "message": self.message,
                "error": self.error.unwrap_or_default(),
            }),
        };
        (status, Json(body)).into_response()
    }
}
