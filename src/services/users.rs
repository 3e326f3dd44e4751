// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activation and profile operations on a single user row.

use std::sync::Arc;

use uuid::Uuid;

use crate::db::UserStore;
use crate::error::{ActivationError, ProfileError, StoreError};
use crate::models::{Ack, ProfileUpdate, User, UserProfile, UserSummary};
use crate::services::validator::ConflictValidator;

pub const PROFILE_UPDATED: &str = "user firstname, lastname and email updated";
pub const PHOTO_UPDATED: &str = "photo updated";

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    validator: ConflictValidator,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, validator: ConflictValidator) -> Self {
        Self { store, validator }
    }

    /// Flip a pending user to active.
    ///
    /// Activating an already active user succeeds again.
    pub async fn activate(&self, authentication_id: &str) -> Result<Ack, ActivationError> {
        let matched = self.store.set_active(authentication_id).await?;
        if matched == 0 {
            return Err(ActivationError::NotFound(authentication_id.to_string()));
        }

        tracing::info!(authentication_id = %authentication_id, "User activated");
        Ok(Ack::new(format!("activated: {}", authentication_id)))
    }

    /// Replace the caller's names, email and search visibility.
    pub async fn update_profile(
        &self,
        authentication_id: &str,
        update: ProfileUpdate,
    ) -> Result<Ack, ProfileError> {
        let update = ProfileUpdate {
            first_name: update.first_name.trim().to_string(),
            last_name: update.last_name.trim().to_string(),
            email: update.email.trim().to_string(),
            searchable: update.searchable,
        };

        let user = self.require_user(authentication_id).await?;
        self.validator
            .admit_profile_email(user.id, &update.email)
            .await?;

        match self.store.update_profile(authentication_id, &update).await {
            Ok(0) => Err(ProfileError::NotFound(authentication_id.to_string())),
            Ok(_) => {
                tracing::info!(user_id = %user.id, "Profile updated");
                Ok(Ack::new(PROFILE_UPDATED))
            }
            // Another user took the email after the check above.
            Err(StoreError::Conflict { field: "email", .. }) => Err(ProfileError::EmailInUse),
            Err(e) => Err(e.into()),
        }
    }

    /// Store the raw profile-photo JSON for the caller.
    pub async fn update_profile_photo(
        &self,
        authentication_id: &str,
        profile_photo: &str,
    ) -> Result<Ack, ProfileError> {
        let matched = self
            .store
            .update_profile_photo(authentication_id, profile_photo)
            .await?;
        if matched == 0 {
            return Err(ProfileError::NotFound(authentication_id.to_string()));
        }
        Ok(Ack::new(PHOTO_UPDATED))
    }

    pub async fn get_profile(&self, authentication_id: &str) -> Result<UserProfile, ProfileError> {
        let user = self.require_user(authentication_id).await?;
        Ok(UserProfile::from(&user))
    }

    /// Searchable users whose first and last names contain the fragments.
    pub async fn find_matching_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Vec<UserSummary>, ProfileError> {
        let users = self.store.find_by_name(first_name, last_name).await?;
        tracing::debug!(count = users.len(), "Name search");
        Ok(users.iter().map(UserSummary::from).collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<UserSummary, ProfileError> {
        self.store
            .find_by_id(id)
            .await?
            .map(|user| UserSummary::from(&user))
            .ok_or_else(|| ProfileError::NotFound(format!("id: {}", id)))
    }

    /// Users for a list of ids; unknown ids are skipped.
    pub async fn get_batch(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>, ProfileError> {
        let users = self.store.find_by_ids(ids).await?;
        Ok(users.iter().map(UserSummary::from).collect())
    }

    async fn require_user(&self, authentication_id: &str) -> Result<User, ProfileError> {
        self.store
            .find_by_authentication_id(authentication_id)
            .await?
            .ok_or_else(|| ProfileError::NotFound(format!("authenticationId: {}", authentication_id)))
    }
}
