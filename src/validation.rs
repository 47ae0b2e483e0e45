// ABOUTME: Declarative per-field request validation collecting a field-to-messages map
// ABOUTME: Rule helpers for required, length, email format, and closed-set membership
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Castellan Contributors

//! # Request Validation
//!
//! Each action states its rules as a flat list of checks against a
//! [`Validator`], which accumulates every failure into the field→messages
//! map that backs the `422 {message, errors}` envelope. Uniqueness checks
//! run against the active store and are added by the action itself via
//! [`Validator::add`]; the store's UNIQUE constraint remains the
//! deterministic backstop under concurrency.

use crate::errors::{AppError, AppResult, FieldErrors};

/// Maximum length for name-like string fields
pub const MAX_STRING_LEN: usize = 255;
/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Accumulates per-field validation failures
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    /// Fresh validator with no failures
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure message for a field
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// `required`: the field must be present and non-empty. Returns the
    /// value on success so subsequent rules can chain on it.
    pub fn required<'a>(&mut self, field: &str, value: Option<&'a str>) -> Option<&'a str> {
        match value {
            Some(v) if !v.trim().is_empty() => Some(v),
            _ => {
                self.add(field, format!("{field} is required"));
                None
            }
        }
    }

    /// `max:255`-style length cap
    pub fn max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.add(field, format!("{field} must not exceed {max} characters"));
        }
    }

    /// `min:8`-style length floor, used for passwords
    pub fn min_len(&mut self, field: &str, value: &str, min: usize) {
        if value.chars().count() < min {
            self.add(
                field,
                format!("The {field} must contain at least {min} characters"),
            );
        }
    }

    /// `email`: structural address check (local part, single `@`, dotted
    /// domain). Deliverability is not this layer's concern.
    pub fn email(&mut self, field: &str, value: &str) {
        let valid = value.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !value.contains(char::is_whitespace)
        });
        if !valid {
            self.add(field, format!("{field} must be a valid email"));
        }
    }

    /// Closed-set membership, used for role discriminants
    pub fn one_of(&mut self, field: &str, value: &str, allowed: &[&str]) {
        if !allowed.contains(&value) {
            self.add(
                field,
                format!("{field} must be one of: {}", allowed.join(", ")),
            );
        }
    }

    /// Whether any rule failed so far
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Finish validation: `Err(422)` if any rule failed
    pub fn finish(self) -> AppResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(self.errors))
        }
    }
}
