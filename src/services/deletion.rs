// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Delete-my-account saga.
//!
//! The local row goes first so the user disappears immediately. The remote
//! resources are then asked to drop the caller's data in a fixed order:
//! account, authentication, organization, role. Remote failures are logged
//! and never undo the local delete.

use std::sync::Arc;

use uuid::Uuid;

use crate::db::UserStore;
use crate::error::DeletionError;
use crate::models::Ack;
use crate::services::remote::{best_effort, RemoteClients, ResourceCleanup};

/// Success message for a deleted account.
pub fn deletion_message(user_id: Uuid) -> String {
    format!("delete my account success for user id: {}", user_id)
}

/// Outcome of each remote cleanup call, in the order issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub results: Vec<(&'static str, bool)>,
}

impl CleanupReport {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|(_, ok)| *ok)
    }
}

#[derive(Clone)]
pub struct DeletionSaga {
    store: Arc<dyn UserStore>,
    clients: RemoteClients,
}

impl DeletionSaga {
    pub fn new(store: Arc<dyn UserStore>, clients: RemoteClients) -> Self {
        Self { store, clients }
    }

    /// Delete the caller's account.
    ///
    /// `access_token` is the caller's own bearer token; each remote resource
    /// authorizes the delete with it.
    pub async fn delete_my_account(
        &self,
        authentication_id: &str,
        access_token: &str,
    ) -> Result<Ack, DeletionError> {
        let user = self
            .store
            .find_by_authentication_id(authentication_id)
            .await?
            .ok_or_else(|| DeletionError::NotFound(authentication_id.to_string()))?;

        if user.active {
            tracing::info!(
                authentication_id = %authentication_id,
                "Refusing to delete active user"
            );
            return Err(DeletionError::UserActive);
        }

        self.store.delete_by_id(user.id).await.map_err(|e| {
            tracing::error!(user_id = %user.id, error = %e, "Failed to delete local user");
            DeletionError::Persistence(e)
        })?;
        tracing::info!(user_id = %user.id, "Local user deleted");

        let report = self.cleanup_remote(access_token).await;
        if !report.all_succeeded() {
            tracing::warn!(
                user_id = %user.id,
                results = ?report.results,
                "Remote cleanup incomplete"
            );
        }

        Ok(Ack::new(deletion_message(user.id)))
    }

    /// Ask every remote resource to drop the caller's data.
    ///
    /// Calls run one after another; a failure does not stop the rest.
    pub async fn cleanup_remote(&self, access_token: &str) -> CleanupReport {
        let results = vec![
            delete_mine(self.clients.account.as_ref(), access_token).await,
            delete_mine(self.clients.authentication.as_ref(), access_token).await,
            delete_mine(self.clients.organization.as_ref(), access_token).await,
            delete_mine(self.clients.role.as_ref(), access_token).await,
        ];
        CleanupReport { results }
    }
}

async fn delete_mine<R>(resource: &R, access_token: &str) -> (&'static str, bool)
where
    R: ResourceCleanup + ?Sized,
{
    let name = resource.resource();
    let ok = best_effort("delete my resource", resource.delete_mine(access_token))
        .await
        .is_some();
    if !ok {
        tracing::warn!(resource = name, "Remote delete failed");
    }
    (name, ok)
}
