// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conflict validator: decides whether a signup or profile update is legal.
//!
//! Signup rules are evaluated in a fixed order and short-circuit on the
//! first match. The authentication id is the stronger identity key, so its
//! rules run before the email rules. Cleanup of leftovers from earlier
//! attempts only runs once the request is known to be legal.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::db::{IdentityField, UserStore};
use crate::error::{ProfileError, SignupError};
use crate::models::SignupRequest;
use crate::services::account::AccountApi;
use crate::services::remote::best_effort;

/// A signup rejected because the identity is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// An active user holds the authentication id.
    ActiveAuthenticationId,
    /// A completed signup holds the authentication id.
    CompletedAuthenticationId,
    /// An active user holds the email.
    ActiveEmail,
    /// A completed signup holds the email.
    CompletedEmail,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Conflict::ActiveAuthenticationId => {
                "User is already active with that username (authenticationId)"
            }
            Conflict::CompletedAuthenticationId => {
                "User account has already been created for that username, check to activate it by email"
            }
            Conflict::ActiveEmail => "User account is active for that email",
            Conflict::CompletedEmail => {
                "User account has already been created for that email, check to activate it by email"
            }
        };
        f.write_str(msg)
    }
}

#[derive(Clone)]
pub struct ConflictValidator {
    store: Arc<dyn UserStore>,
    account: Arc<dyn AccountApi>,
}

impl ConflictValidator {
    pub fn new(store: Arc<dyn UserStore>, account: Arc<dyn AccountApi>) -> Self {
        Self { store, account }
    }

    /// Admit a signup request or say why not.
    ///
    /// On success, any remote account left under the email and any
    /// abandoned local rows for either identity have been cleared away.
    pub async fn admit_signup(&self, request: &SignupRequest) -> Result<(), SignupError> {
        request.check_required().map_err(SignupError::Invalid)?;
        request.check_reserved().map_err(SignupError::Invalid)?;

        if let Some(conflict) = self.find_conflict(request).await? {
            tracing::info!(
                authentication_id = %request.authentication_id,
                reason = %conflict,
                "Signup rejected"
            );
            return Err(SignupError::Conflict(conflict));
        }

        self.clear_leftovers(request).await?;
        Ok(())
    }

    /// First matching conflict rule, if any.
    pub async fn find_conflict(
        &self,
        request: &SignupRequest,
    ) -> Result<Option<Conflict>, SignupError> {
        let auth_id = IdentityField::AuthenticationId(&request.authentication_id);
        let email = IdentityField::Email(&request.email);

        if self.store.exists_active(auth_id).await? {
            return Ok(Some(Conflict::ActiveAuthenticationId));
        }
        if self.store.exists_completed(auth_id).await? {
            return Ok(Some(Conflict::CompletedAuthenticationId));
        }
        if self.store.exists_active(email).await? {
            return Ok(Some(Conflict::ActiveEmail));
        }
        if self.store.exists_completed(email).await? {
            return Ok(Some(Conflict::CompletedEmail));
        }
        Ok(None)
    }

    async fn clear_leftovers(&self, request: &SignupRequest) -> Result<(), SignupError> {
        // An orphaned account from an earlier attempt would block the create.
        best_effort(
            "delete leftover account by email",
            self.account.delete_by_email(&request.email),
        )
        .await;

        let by_auth_id = self
            .store
            .delete_abandoned(IdentityField::AuthenticationId(&request.authentication_id))
            .await?;
        let by_email = self
            .store
            .delete_abandoned(IdentityField::Email(&request.email))
            .await?;

        if by_auth_id + by_email > 0 {
            tracing::info!(
                authentication_id = %request.authentication_id,
                removed = by_auth_id + by_email,
                "Removed abandoned signup rows"
            );
        }
        Ok(())
    }

    /// A profile update may not take an email used by another user.
    pub async fn admit_profile_email(&self, user_id: Uuid, email: &str) -> Result<(), ProfileError> {
        if self.store.exists_email_for_other(email, user_id).await? {
            return Err(ProfileError::EmailInUse);
        }
        Ok(())
    }
}
