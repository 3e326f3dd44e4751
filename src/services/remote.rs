// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared plumbing for the downstream resource services.
//!
//! Each resource (authentication, account, organization, role) is a plain
//! HTTP endpoint identified by a base URL. Clients make exactly one attempt
//! per call; a non-2xx status or a transport failure becomes a
//! [`RemoteError`] carrying whatever the upstream returned.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::models::Ack;
use crate::services::account::{AccountApi, AccountClient};
use crate::services::authentication::{AuthenticationApi, AuthenticationClient};
use crate::services::organization::OrganizationClient;
use crate::services::role::RoleClient;

/// Failure of a single downstream call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP {status} from {resource}: {body}")]
    Status {
        resource: &'static str,
        status: u16,
        body: String,
    },

    #[error("{resource} request failed: {message}")]
    Transport {
        resource: &'static str,
        message: String,
    },

    #[error("{resource} returned an unreadable response: {message}")]
    Decode {
        resource: &'static str,
        message: String,
    },
}

impl RemoteError {
    /// Upstream HTTP status, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The upstream body when there is one, otherwise the error itself.
    pub fn detail(&self) -> String {
        match self {
            RemoteError::Status { body, .. } if !body.trim().is_empty() => body.clone(),
            other => other.to_string(),
        }
    }
}

/// Remote resource that can drop everything it holds for the caller.
#[async_trait]
pub trait ResourceCleanup: Send + Sync {
    /// Short resource name used in logs and errors.
    fn resource(&self) -> &'static str;

    /// `DELETE` the caller's data, authorized by the caller's own token.
    async fn delete_mine(&self, access_token: &str) -> Result<Ack, RemoteError>;
}

/// Base URL + HTTP client for one resource.
#[derive(Clone)]
pub struct ResourceEndpoint {
    http: reqwest::Client,
    base_url: String,
    resource: &'static str,
}

impl ResourceEndpoint {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, resource: &'static str) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            resource,
        }
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL followed by URL-encoded path segments.
    pub fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    /// Send a request whose success body must be a `{message}` envelope.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, RemoteError> {
        let response = self.send(request).await?;
        response.json().await.map_err(|e| RemoteError::Decode {
            resource: self.resource,
            message: e.to_string(),
        })
    }

    /// Send a request whose success body is `{message}` JSON or plain text.
    pub async fn send_lenient(&self, request: reqwest::RequestBuilder) -> Result<Ack, RemoteError> {
        let response = self.send(request).await?;
        let body = response.text().await.map_err(|e| RemoteError::Decode {
            resource: self.resource,
            message: e.to_string(),
        })?;

        Ok(serde_json::from_str::<Ack>(&body).unwrap_or_else(|_| Ack::new(body)))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        let response = request.send().await.map_err(|e| RemoteError::Transport {
            resource: self.resource,
            message: e.to_string(),
        })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(resource = self.resource, status, body = %body, "Remote call rejected");

        Err(RemoteError::Status {
            resource: self.resource,
            status,
            body,
        })
    }
}

/// Build the shared HTTP client used for every downstream call.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, RemoteError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RemoteError::Transport {
            resource: "http-client",
            message: e.to_string(),
        })
}

/// Run a call whose failure must not affect the enclosing operation.
///
/// Failures are logged at `warn` and turned into `None`.
pub async fn best_effort<T, E, F>(action: &'static str, call: F) -> Option<T>
where
    E: Display,
    F: Future<Output = Result<T, E>>,
{
    match call.await {
        Ok(value) => {
            tracing::debug!(action, "Best-effort call succeeded");
            Some(value)
        }
        Err(e) => {
            tracing::warn!(action, error = %e, "Best-effort call failed (ignored)");
            None
        }
    }
}

/// The four downstream clients, built once at startup.
#[derive(Clone)]
pub struct RemoteClients {
    pub authentication: Arc<dyn AuthenticationApi>,
    pub account: Arc<dyn AccountApi>,
    pub organization: Arc<dyn ResourceCleanup>,
    pub role: Arc<dyn ResourceCleanup>,
}

impl RemoteClients {
    /// Build HTTP clients for every configured resource.
    pub fn from_config(config: &Config) -> Result<Self, RemoteError> {
        let http = http_client(Duration::from_secs(config.remote_timeout_secs))?;

        Ok(Self {
            authentication: Arc::new(AuthenticationClient::new(
                http.clone(),
                &config.authentication_service_url,
            )),
            account: Arc::new(AccountClient::new(http.clone(), &config.account_service_url)),
            organization: Arc::new(OrganizationClient::new(
                http.clone(),
                &config.organization_service_url,
            )),
            role: Arc::new(RoleClient::new(http, &config.role_service_url)),
        })
    }
}
