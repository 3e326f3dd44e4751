// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the remote account resource.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::Ack;
use crate::services::remote::{RemoteError, ResourceCleanup, ResourceEndpoint};

/// Key of an account create call; sent as path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccount {
    pub user_id: Uuid,
    pub authentication_id: String,
    pub email: String,
}

/// Operations the sagas need from the account resource.
#[async_trait]
pub trait AccountApi: ResourceCleanup {
    /// Create the account for a user whose authentication already exists.
    async fn create(&self, request: &CreateAccount) -> Result<Ack, RemoteError>;

    /// Remove a leftover account keyed by email.
    async fn delete_by_email(&self, email: &str) -> Result<Ack, RemoteError>;
}

/// HTTP client for the account resource.
#[derive(Clone)]
pub struct AccountClient {
    endpoint: ResourceEndpoint,
}

impl AccountClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            endpoint: ResourceEndpoint::new(http, base_url, "account"),
        }
    }
}

#[async_trait]
impl AccountApi for AccountClient {
    async fn create(&self, request: &CreateAccount) -> Result<Ack, RemoteError> {
        let user_id = request.user_id.to_string();
        let url = self.endpoint.url(&[
            &user_id,
            &request.authentication_id,
            &request.email,
        ]);
        tracing::info!(endpoint = %url, "Creating account record");

        let ack: Ack = self
            .endpoint
            .send_json(self.endpoint.http().post(&url))
            .await?;

        tracing::info!(message = %ack.message, "Account created");
        Ok(ack)
    }

    async fn delete_by_email(&self, email: &str) -> Result<Ack, RemoteError> {
        let url = self.endpoint.url(&["email", email]);
        tracing::info!(endpoint = %url, "Deleting account by email");
        self.endpoint
            .send_lenient(self.endpoint.http().delete(&url))
            .await
    }
}

#[async_trait]
impl ResourceCleanup for AccountClient {
    fn resource(&self) -> &'static str {
        self.endpoint.resource()
    }

    async fn delete_mine(&self, access_token: &str) -> Result<Ack, RemoteError> {
        tracing::info!(endpoint = self.endpoint.base_url(), "Deleting my account");
        let request = self
            .endpoint
            .http()
            .delete(self.endpoint.base_url())
            .bearer_auth(access_token);
        self.endpoint.send_lenient(request).await
    }
}
