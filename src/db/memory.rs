// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process user store.
//!
//! Used for local development and tests. A single lock guards the whole
//! table so the identity uniqueness check and the write happen atomically.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::{name_matches, IdentityField, UserStore};
use crate::error::StoreError;
use crate::models::{ProfileUpdate, User};

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    async fn update_where<F>(&self, authentication_id: &str, mut apply: F) -> u64
    where
        F: FnMut(&mut User),
    {
        let mut users = self.users.write().await;
        let mut matched = 0;
        for user in users
            .values_mut()
            .filter(|u| u.authentication_id == authentication_id)
        {
            apply(user);
            matched += 1;
        }
        matched
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn exists_active(&self, key: IdentityField<'_>) -> Result<bool, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| u.active && key.matches(u)))
    }

    async fn exists_completed(&self, key: IdentityField<'_>) -> Result<bool, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .any(|u| u.user_auth_account_created && key.matches(u)))
    }

    async fn exists_email_for_other(&self, email: &str, id: Uuid) -> Result<bool, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| u.email == email && u.id != id))
    }

    async fn find_by_authentication_id(
        &self,
        authentication_id: &str,
    ) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.authentication_id == authentication_id)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn find_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        let mut found: Vec<User> = users
            .values()
            .filter(|u| name_matches(u, first_name, last_name))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            (&a.last_name, &a.first_name, a.id).cmp(&(&b.last_name, &b.first_name, b.id))
        });
        Ok(found)
    }

    async fn save(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        for other in users.values().filter(|u| u.id != user.id) {
            if other.authentication_id == user.authentication_id {
                return Err(StoreError::Conflict {
                    field: "authentication_id",
                    value: user.authentication_id.clone(),
                });
            }
            if other.email == user.email {
                return Err(StoreError::Conflict {
                    field: "email",
                    value: user.email.clone(),
                });
            }
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError> {
        self.users.write().await.remove(&id);
        Ok(())
    }

    async fn delete_by_authentication_id(
        &self,
        authentication_id: &str,
    ) -> Result<(), StoreError> {
        self.users
            .write()
            .await
            .retain(|_, u| u.authentication_id != authentication_id);
        Ok(())
    }

    async fn delete_abandoned(&self, key: IdentityField<'_>) -> Result<u64, StoreError> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|_, u| !(u.is_abandoned() && key.matches(u)));
        Ok((before - users.len()) as u64)
    }

    async fn set_completed(&self, authentication_id: &str) -> Result<u64, StoreError> {
        Ok(self
            .update_where(authentication_id, |u| u.user_auth_account_created = true)
            .await)
    }

    async fn set_active(&self, authentication_id: &str) -> Result<u64, StoreError> {
        Ok(self
            .update_where(authentication_id, |u| u.active = true)
            .await)
    }

    async fn update_profile(
        &self,
        authentication_id: &str,
        update: &ProfileUpdate,
    ) -> Result<u64, StoreError> {
        let mut users = self.users.write().await;

        if users
            .values()
            .any(|u| u.email == update.email && u.authentication_id != authentication_id)
        {
            return Err(StoreError::Conflict {
                field: "email",
                value: update.email.clone(),
            });
        }

        let mut matched = 0;
        for user in users
            .values_mut()
            .filter(|u| u.authentication_id == authentication_id)
        {
            user.first_name = update.first_name.clone();
            user.last_name = update.last_name.clone();
            user.email = update.email.clone();
            user.searchable = Some(update.searchable);
            matched += 1;
        }
        Ok(matched)
    }

    async fn update_profile_photo(
        &self,
        authentication_id: &str,
        profile_photo: &str,
    ) -> Result<u64, StoreError> {
        Ok(self
            .update_where(authentication_id, |u| {
                u.profile_photo = Some(profile_photo.to_string())
            })
            .await)
    }
}
