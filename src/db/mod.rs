// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User store: the repository operations the sagas consume, plus adapters.

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreUserStore;
pub use self::memory::InMemoryUserStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{ProfileUpdate, User};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}

/// One of the two identity fields a user is looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField<'a> {
    AuthenticationId(&'a str),
    Email(&'a str),
}

impl IdentityField<'_> {
    /// Stored field name.
    pub fn field_name(&self) -> &'static str {
        match self {
            IdentityField::AuthenticationId(_) => "authentication_id",
            IdentityField::Email(_) => "email",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            IdentityField::AuthenticationId(v) | IdentityField::Email(v) => v,
        }
    }

    pub fn matches(&self, user: &User) -> bool {
        match self {
            IdentityField::AuthenticationId(v) => user.authentication_id == *v,
            IdentityField::Email(v) => user.email == *v,
        }
    }
}

/// Persistence operations on user rows.
///
/// Counts returned by updates are rows *matched*, so re-applying an update
/// that changes nothing still reports the row. Deleting a row that does not
/// exist is a no-op.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Whether an active user holds this identity.
    async fn exists_active(&self, key: IdentityField<'_>) -> Result<bool, StoreError>;

    /// Whether a user with a completed signup holds this identity.
    async fn exists_completed(&self, key: IdentityField<'_>) -> Result<bool, StoreError>;

    /// Whether a user other than `id` uses this email.
    async fn exists_email_for_other(&self, email: &str, id: Uuid) -> Result<bool, StoreError>;

    async fn find_by_authentication_id(
        &self,
        authentication_id: &str,
    ) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError>;

    /// Searchable users whose names contain both fragments, ignoring case.
    async fn find_by_name(&self, first_name: &str, last_name: &str)
        -> Result<Vec<User>, StoreError>;

    /// Insert, or update when a row with the same id exists.
    ///
    /// Fails with [`StoreError::Conflict`] when another row already holds the
    /// authentication id or email.
    async fn save(&self, user: User) -> Result<User, StoreError>;

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError>;

    async fn delete_by_authentication_id(&self, authentication_id: &str)
        -> Result<(), StoreError>;

    /// Remove abandoned rows (neither active nor completed) holding this identity.
    async fn delete_abandoned(&self, key: IdentityField<'_>) -> Result<u64, StoreError>;

    /// Set the saga-completion marker.
    async fn set_completed(&self, authentication_id: &str) -> Result<u64, StoreError>;

    async fn set_active(&self, authentication_id: &str) -> Result<u64, StoreError>;

    async fn update_profile(
        &self,
        authentication_id: &str,
        update: &ProfileUpdate,
    ) -> Result<u64, StoreError>;

    async fn update_profile_photo(
        &self,
        authentication_id: &str,
        profile_photo: &str,
    ) -> Result<u64, StoreError>;
}

/// Case-insensitive name match shared by the adapters.
pub(crate) fn name_matches(user: &User, first_name: &str, last_name: &str) -> bool {
    user.is_searchable()
        && user
            .first_name
            .to_lowercase()
            .contains(&first_name.to_lowercase())
        && user
            .last_name
            .to_lowercase()
            .contains(&last_name.to_lowercase())
}
