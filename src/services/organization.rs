// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the remote organization resource.

use async_trait::async_trait;

use crate::models::Ack;
use crate::services::remote::{RemoteError, ResourceCleanup, ResourceEndpoint};

/// HTTP client for the organization resource. Only deletion is consumed.
#[derive(Clone)]
pub struct OrganizationClient {
    endpoint: ResourceEndpoint,
}

impl OrganizationClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            endpoint: ResourceEndpoint::new(http, base_url, "organization"),
        }
    }
}

#[async_trait]
impl ResourceCleanup for OrganizationClient {
    fn resource(&self) -> &'static str {
        self.endpoint.resource()
    }

    async fn delete_mine(&self, access_token: &str) -> Result<Ack, RemoteError> {
        tracing::info!(endpoint = self.endpoint.base_url(), "Deleting my organizations");
        let request = self
            .endpoint
            .http()
            .delete(self.endpoint.base_url())
            .bearer_auth(access_token);
        self.endpoint.send_lenient(request).await
    }
}
