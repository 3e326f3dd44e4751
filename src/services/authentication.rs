// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the remote authentication resource.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::models::Ack;
use crate::services::remote::{RemoteError, ResourceCleanup, ResourceEndpoint};

/// Body of the authentication create call.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuthentication {
    pub authentication_id: String,
    pub password: String,
    pub user_id: Uuid,
}

impl std::fmt::Debug for CreateAuthentication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateAuthentication")
            .field("authentication_id", &self.authentication_id)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// Operations the sagas need from the authentication resource.
#[async_trait]
pub trait AuthenticationApi: ResourceCleanup {
    /// Create the authentication record for a freshly saved user.
    async fn create(&self, request: &CreateAuthentication) -> Result<Ack, RemoteError>;
}

/// HTTP client for the authentication resource.
#[derive(Clone)]
pub struct AuthenticationClient {
    endpoint: ResourceEndpoint,
}

impl AuthenticationClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            endpoint: ResourceEndpoint::new(http, base_url, "authentication"),
        }
    }
}

#[async_trait]
impl AuthenticationApi for AuthenticationClient {
    async fn create(&self, request: &CreateAuthentication) -> Result<Ack, RemoteError> {
        tracing::info!(
            endpoint = self.endpoint.base_url(),
            authentication_id = %request.authentication_id,
            "Creating authentication record"
        );

        let ack: Ack = self
            .endpoint
            .send_json(self.endpoint.http().post(self.endpoint.base_url()).json(request))
            .await?;

        tracing::info!(message = %ack.message, "Authentication record created");
        Ok(ack)
    }
}

#[async_trait]
impl ResourceCleanup for AuthenticationClient {
    fn resource(&self) -> &'static str {
        self.endpoint.resource()
    }

    async fn delete_mine(&self, access_token: &str) -> Result<Ack, RemoteError> {
        tracing::info!(endpoint = self.endpoint.base_url(), "Deleting my authentication");
        let request = self
            .endpoint
            .http()
            .delete(self.endpoint.base_url())
            .bearer_auth(access_token);
        self.endpoint.send_lenient(request).await
    }
}
