// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::remote::RemoteError;
use crate::services::validator::Conflict;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

// ─── Domain Errors ───────────────────────────────────────────

/// Failures reported by a user store adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint on an identity field rejected the write.
    #[error("user already exists with that {field}: {value}")]
    Conflict { field: &'static str, value: String },

    #[error("user store unavailable: {0}")]
    Unavailable(String),
}

/// Why a signup attempt did not complete.
#[derive(Debug, thiserror::Error)]
pub enum SignupError {
    /// A required field was blank.
    #[error("{0}")]
    Invalid(String),

    /// A conflict rule rejected the request.
    #[error("{0}")]
    Conflict(Conflict),

    #[error("{0}")]
    Persistence(#[from] StoreError),

    #[error("Authentication api call failed with error: {0}")]
    Authentication(RemoteError),

    #[error("Account api call failed with error: {}", .0.detail())]
    Account(RemoteError),
}

/// Why delete-my-account was refused.
#[derive(Debug, thiserror::Error)]
pub enum DeletionError {
    #[error("no user found for authenticationId: {0}")]
    NotFound(String),

    #[error("user is active, cannot delete")]
    UserActive,

    #[error("{0}")]
    Persistence(#[from] StoreError),
}

/// Activation failures.
#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    #[error("no user found for authenticationId: {0}")]
    NotFound(String),

    #[error("{0}")]
    Persistence(#[from] StoreError),
}

/// Failures of the profile operations.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("no user found for {0}")]
    NotFound(String),

    #[error("email: email already used")]
    EmailInUse,

    #[error("{0}")]
    Persistence(#[from] StoreError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => AppError::Conflict(err.to_string()),
            StoreError::Unavailable(msg) => AppError::Database(msg),
        }
    }
}

impl From<SignupError> for AppError {
    fn from(err: SignupError) -> Self {
        match err {
            // A lost race on the identity constraint reads like any other rejection.
            SignupError::Persistence(StoreError::Conflict { .. }) => {
                AppError::BadRequest(err.to_string())
            }
            SignupError::Persistence(store) => store.into(),
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl From<DeletionError> for AppError {
    fn from(err: DeletionError) -> Self {
        match err {
            DeletionError::NotFound(_) => AppError::NotFound(err.to_string()),
            DeletionError::UserActive => AppError::BadRequest(err.to_string()),
            DeletionError::Persistence(store) => store.into(),
        }
    }
}

impl From<ActivationError> for AppError {
    fn from(err: ActivationError) -> Self {
        match err {
            ActivationError::NotFound(_) => AppError::NotFound(err.to_string()),
            ActivationError::Persistence(store) => store.into(),
        }
    }
}

impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound(_) => AppError::NotFound(err.to_string()),
            ProfileError::EmailInUse => AppError::BadRequest(err.to_string()),
            ProfileError::Persistence(store) => store.into(),
        }
    }
}
