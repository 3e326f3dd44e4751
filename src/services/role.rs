// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the remote role resource.

use async_trait::async_trait;

use crate::models::Ack;
use crate::services::remote::{RemoteError, ResourceCleanup, ResourceEndpoint};

#[derive(Clone)]
pub struct RoleClient {
    endpoint: ResourceEndpoint,
}

impl RoleClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            endpoint: ResourceEndpoint::new(http, base_url, "role"),
        }
    }
}

#[async_trait]
impl ResourceCleanup for RoleClient {
    fn resource(&self) -> &'static str {
        self.endpoint.resource()
    }

    async fn delete_mine(&self, access_token: &str) -> Result<Ack, RemoteError> {
        tracing::info!(endpoint = self.endpoint.base_url(), "Deleting my roles");
        let request = self
            .endpoint
            .http()
            .delete(self.endpoint.base_url())
            .bearer_auth(access_token);
        self.endpoint.send_lenient(request).await
    }
}
