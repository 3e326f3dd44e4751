// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// User row as persisted in the user store.
///
/// A freshly signed-up user is *pending*: `active` and
/// `user_auth_account_created` are both false. The signup saga flips
/// `user_auth_account_created` once the remote authentication and account
/// resources exist; activation flips `active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Generated at signup, never changes.
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Handle correlating this row with the remote authentication resource.
    pub authentication_id: String,
    #[serde(default)]
    pub active: bool,
    /// Saga-completion marker: both remote creates succeeded.
    #[serde(default)]
    pub user_auth_account_created: bool,
    #[serde(default)]
    pub searchable: Option<bool>,
    /// Raw profile-photo JSON as uploaded by the client.
    #[serde(default)]
    pub profile_photo: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub gender_id: Option<Uuid>,
}

impl User {
    /// Build a new pending user with a fresh id.
    pub fn pending(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        authentication_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            authentication_id: authentication_id.into(),
            active: false,
            user_auth_account_created: false,
            searchable: None,
            profile_photo: None,
            birth_date: None,
            gender_id: None,
        }
    }

    /// A row left behind by a signup that never completed nor was activated.
    pub fn is_abandoned(&self) -> bool {
        !self.active && !self.user_auth_account_created
    }

    /// Users opt out of name search explicitly; unset means searchable.
    pub fn is_searchable(&self) -> bool {
        self.searchable.unwrap_or(true)
    }
}

/// Authentication ids that collide with static segments under `/users/`
/// and so could never be looked up or activated by path.
pub const RESERVED_AUTHENTICATION_IDS: [&str; 4] = ["me", "batch", "id", "names"];

/// Signup request body.
///
/// Missing fields deserialize as empty so they are reported by
/// [`SignupRequest::check_required`] rather than by the JSON decoder.
#[derive(Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupRequest {
    #[validate(custom(function = "not_blank"))]
    pub first_name: String,
    #[validate(custom(function = "not_blank"))]
    pub last_name: String,
    #[validate(custom(function = "not_blank"))]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub authentication_id: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("authentication_id", &self.authentication_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl SignupRequest {
    /// Wire names of the required fields, in the order they are reported.
    const REQUIRED_FIELDS: [(&'static str, &'static str); 5] = [
        ("first_name", "firstName"),
        ("last_name", "lastName"),
        ("email", "email"),
        ("authentication_id", "authenticationId"),
        ("password", "password"),
    ];

    /// Same request with surrounding whitespace removed from the identity
    /// and name fields. The password is taken verbatim.
    pub fn trimmed(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            authentication_id: self.authentication_id.trim().to_string(),
            password: self.password,
        }
    }

    /// Check that no required field is blank.
    ///
    /// Returns the message for the first blank field so the caller always
    /// sees the same error for the same request.
    pub fn check_required(&self) -> Result<(), String> {
        let result = self.validate();
        for (field, wire_name) in Self::REQUIRED_FIELDS {
            if validator::ValidationErrors::has_error(&result, field) {
                return Err(format!("{} is required", wire_name));
            }
        }
        Ok(())
    }

    /// Reject authentication ids that the `/users/...` routes shadow.
    pub fn check_reserved(&self) -> Result<(), String> {
        let id = self.authentication_id.as_str();
        if RESERVED_AUTHENTICATION_IDS.contains(&id) {
            return Err(format!("authenticationId '{}' is reserved", id));
        }
        Ok(())
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Profile fields a signed-in user may change.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default = "default_searchable")]
    pub searchable: bool,
}

fn default_searchable() -> bool {
    true
}

/// Profile view returned for a single user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Thumbnail URL extracted from the stored photo JSON.
    pub profile_photo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            profile_photo: super::profile_photo::thumbnail_url(user.profile_photo.as_deref()),
            date_of_birth: user
                .birth_date
                .map(|date| date.format("%Y/%m/%d").to_string()),
        }
    }
}

/// Compact user representation for lookups and search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub authentication_id: String,
    pub active: bool,
    pub user_auth_account_created: bool,
    pub profile_photo: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            authentication_id: user.authentication_id.clone(),
            active: user.active,
            user_auth_account_created: user.user_auth_account_created,
            profile_photo: super::profile_photo::thumbnail_url(user.profile_photo.as_deref()),
        }
    }
}
