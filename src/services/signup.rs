// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signup saga.
//!
//! Steps run strictly in order, each gated on the previous one:
//!
//! 1. Validate: field checks and conflict rules ([`ConflictValidator`])
//! 2. SaveLocal: insert the pending user row
//! 3. CreateRemoteAuth: create the authentication record
//! 4. CreateRemoteAccount: create the account record
//! 5. MarkComplete: set `user_auth_account_created`
//!
//! A failure in step 3 or 4 deletes the local row and reports the remote
//! error. The authentication record created in step 3 is left in place when
//! step 4 fails; the next signup for the same identity clears the way again.
//! The completion flag is the only durable progress marker.

use std::fmt;
use std::sync::Arc;

use crate::db::UserStore;
use crate::error::SignupError;
use crate::models::{Ack, SignupRequest, User};
use crate::services::account::{AccountApi, CreateAccount};
use crate::services::authentication::{AuthenticationApi, CreateAuthentication};
use crate::services::remote::best_effort;
use crate::services::validator::ConflictValidator;

pub const SIGNUP_SUCCESS: &str = "user signup succcessful";

/// Saga step names, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupStep {
    Validate,
    SaveLocal,
    CreateRemoteAuth,
    CreateRemoteAccount,
    MarkComplete,
}

impl fmt::Display for SignupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignupStep::Validate => "validate",
            SignupStep::SaveLocal => "save_local",
            SignupStep::CreateRemoteAuth => "create_remote_auth",
            SignupStep::CreateRemoteAccount => "create_remote_account",
            SignupStep::MarkComplete => "mark_complete",
        };
        f.write_str(name)
    }
}

/// Orchestrates one signup per call. Cheap to clone.
#[derive(Clone)]
pub struct SignupSaga {
    store: Arc<dyn UserStore>,
    validator: ConflictValidator,
    authentication: Arc<dyn AuthenticationApi>,
    account: Arc<dyn AccountApi>,
}

impl SignupSaga {
    pub fn new(
        store: Arc<dyn UserStore>,
        authentication: Arc<dyn AuthenticationApi>,
        account: Arc<dyn AccountApi>,
    ) -> Self {
        Self {
            validator: ConflictValidator::new(store.clone(), account.clone()),
            store,
            authentication,
            account,
        }
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<Ack, SignupError> {
        let request = request.trimmed();
        let authentication_id = request.authentication_id.clone();
        tracing::info!(authentication_id = %authentication_id, "Signup started");

        tracing::debug!(step = %SignupStep::Validate, "Signup step");
        self.validator.admit_signup(&request).await?;

        tracing::debug!(step = %SignupStep::SaveLocal, "Signup step");
        let user = User::pending(
            request.first_name.as_str(),
            request.last_name.as_str(),
            request.email.as_str(),
            request.authentication_id.as_str(),
        );
        let user = self.store.save(user).await.map_err(|e| {
            tracing::warn!(
                authentication_id = %authentication_id,
                error = %e,
                "Failed to save pending user"
            );
            SignupError::Persistence(e)
        })?;

        tracing::debug!(step = %SignupStep::CreateRemoteAuth, user_id = %user.id, "Signup step");
        let create_auth = CreateAuthentication {
            authentication_id: user.authentication_id.clone(),
            password: request.password.clone(),
            user_id: user.id,
        };
        if let Err(e) = self.authentication.create(&create_auth).await {
            tracing::error!(
                authentication_id = %authentication_id,
                error = %e,
                "Authentication create failed"
            );
            self.compensate(&user, SignupStep::CreateRemoteAuth).await;
            return Err(SignupError::Authentication(e));
        }

        tracing::debug!(step = %SignupStep::CreateRemoteAccount, user_id = %user.id, "Signup step");
        let create_account = CreateAccount {
            user_id: user.id,
            authentication_id: user.authentication_id.clone(),
            email: user.email.clone(),
        };
        if let Err(e) = self.account.create(&create_account).await {
            tracing::error!(
                authentication_id = %authentication_id,
                error = %e,
                "Account create failed"
            );
            self.compensate(&user, SignupStep::CreateRemoteAccount).await;
            return Err(SignupError::Account(e));
        }

        // Both remote records exist; the caller sees success even if the
        // marker write fails.
        tracing::debug!(step = %SignupStep::MarkComplete, user_id = %user.id, "Signup step");
        best_effort(
            "mark signup complete",
            self.store.set_completed(&user.authentication_id),
        )
        .await;

        tracing::info!(
            authentication_id = %authentication_id,
            user_id = %user.id,
            "Signup complete"
        );
        Ok(Ack::new(SIGNUP_SUCCESS))
    }

    /// Undo `SaveLocal` after a remote step failed.
    ///
    /// Only the local row is removed. A failure here is logged and the
    /// original remote error is still what the caller gets.
    async fn compensate(&self, user: &User, failed_step: SignupStep) {
        tracing::warn!(
            user_id = %user.id,
            failed_step = %failed_step,
            "Rolling back pending user"
        );
        best_effort("delete pending user", self.store.delete_by_id(user.id)).await;
    }
}
