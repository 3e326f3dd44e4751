// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;

/// Which user store adapter to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Firestore,
}

impl std::str::FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "firestore" => Ok(StoreKind::Firestore),
            other => Err(ConfigError::Invalid("USER_STORE", other.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Key used to verify caller JWTs (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    pub user_store: StoreKind,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,

    // --- Downstream resources ---
    pub authentication_service_url: String,
    pub account_service_url: String,
    pub organization_service_url: String,
    pub role_service_url: String,
    /// Per-request timeout for downstream calls
    pub remote_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: required("JWT_SIGNING_KEY")?.into_bytes(),
            user_store: env::var("USER_STORE")
                .unwrap_or_else(|_| "memory".to_string())
                .parse()?,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            authentication_service_url: required("AUTHENTICATION_SERVICE_URL")?,
            account_service_url: required("ACCOUNT_SERVICE_URL")?,
            organization_service_url: required("ORGANIZATION_SERVICE_URL")?,
            role_service_url: required("ROLE_SERVICE_URL")?,
            remote_timeout_secs: env::var("REMOTE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
        })
    }

    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            user_store: StoreKind::Memory,
            gcp_project_id: "test-project".to_string(),
            authentication_service_url: "http://localhost:9001/authentications".to_string(),
            account_service_url: "http://localhost:9002/accounts".to_string(),
            organization_service_url: "http://localhost:9003/organizations".to_string(),
            role_service_url: "http://localhost:9004/roles".to_string(),
            remote_timeout_secs: 10,
        }
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
