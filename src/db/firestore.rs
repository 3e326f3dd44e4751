// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed user store.
//!
//! Users live in the `users` collection keyed by authentication id, so the
//! create-only insert used by [`UserStore::save`] is what rejects the loser
//! of two concurrent signups for the same identity. Email uniqueness is
//! checked before the write but is not transactional. Flag and profile
//! updates run as read-write transactions.

use async_trait::async_trait;
use firestore::errors::{BackoffError, FirestoreError};
use futures_util::{stream, FutureExt, StreamExt};
use uuid::Uuid;

use crate::db::{collections, name_matches, IdentityField, UserStore};
use crate::error::StoreError;
use crate::models::{ProfileUpdate, User};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Flag fields a row can be filtered on.
#[derive(Clone, Copy)]
enum Flag {
    Active,
    Completed,
}

impl Flag {
    fn field_name(self) -> &'static str {
        match self {
            Flag::Active => "active",
            Flag::Completed => "user_auth_account_created",
        }
    }
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreUserStore {
    client: firestore::FirestoreDb,
}

fn db_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

impl FirestoreUserStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, StoreError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| db_error(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");
        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| db_error(format!("Failed to connect to Firestore Emulator: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore (Emulator)");
        Ok(Self { client })
    }

    /// Rows holding an identity, optionally restricted to a flag being true.
    async fn query_identity(
        &self,
        key: IdentityField<'_>,
        flag: Option<Flag>,
    ) -> Result<Vec<User>, StoreError> {
        let field = key.field_name();
        let value = key.value().to_string();
        let query = self.client.fluent().select().from(collections::USERS);

        let query = match flag {
            Some(flag) => query.filter(move |q| {
                q.for_all([
                    q.field(field).eq(value.clone()),
                    q.field(flag.field_name()).eq(true),
                ])
            }),
            None => query.filter(move |q| q.for_all([q.field(field).eq(value.clone())])),
        };

        query.obj().query().await.map_err(db_error)
    }

    async fn get_by_authentication_id(
        &self,
        authentication_id: &str,
    ) -> Result<Option<User>, StoreError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(authentication_id)
            .await
            .map_err(db_error)
    }

    async fn write(&self, user: &User) -> Result<(), StoreError> {
        let _: User = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.authentication_id)
            .object(user)
            .execute()
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn delete_document(&self, authentication_id: &str) -> Result<(), StoreError> {
        self.client
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(authentication_id)
            .execute()
            .await
            .map_err(db_error)
    }

    /// Read-modify-write for the row keyed by `authentication_id`, inside a
    /// read-write transaction so concurrent updates to other fields of the
    /// same row are not lost. Contended commits are retried by the client.
    async fn modify<F>(&self, authentication_id: &str, apply: F) -> Result<u64, StoreError>
    where
        F: Fn(&mut User) + Clone + Send + Sync + 'static,
    {
        let authentication_id = authentication_id.to_string();

        self.client
            .run_transaction(move |db, transaction| {
                let authentication_id = authentication_id.clone();
                let apply = apply.clone();
                async move {
                    let found: Option<User> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::USERS)
                        .obj()
                        .one(&authentication_id)
                        .await?;

                    let Some(mut user) = found else {
                        return Ok(0);
                    };
                    apply(&mut user);

                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .document_id(&authentication_id)
                        .object(&user)
                        .add_to_transaction(transaction)?;
                    Ok::<u64, BackoffError<FirestoreError>>(1)
                }
                .boxed()
            })
            .await
            .map_err(db_error)
    }
}

#[async_trait]
impl UserStore for FirestoreUserStore {
    async fn exists_active(&self, key: IdentityField<'_>) -> Result<bool, StoreError> {
        Ok(!self.query_identity(key, Some(Flag::Active)).await?.is_empty())
    }

    async fn exists_completed(&self, key: IdentityField<'_>) -> Result<bool, StoreError> {
        Ok(!self
            .query_identity(key, Some(Flag::Completed))
            .await?
            .is_empty())
    }

    async fn exists_email_for_other(&self, email: &str, id: Uuid) -> Result<bool, StoreError> {
        let users = self.query_identity(IdentityField::Email(email), None).await?;
        Ok(users.iter().any(|u| u.id != id))
    }

    async fn find_by_authentication_id(
        &self,
        authentication_id: &str,
    ) -> Result<Option<User>, StoreError> {
        self.get_by_authentication_id(authentication_id).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let id = id.to_string();
        let users: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("id").eq(id.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(db_error)?;
        Ok(users.into_iter().next())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let found = stream::iter(ids.to_vec())
            .map(|id| async move { self.find_by_id(id).await })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<User>, StoreError>>>()
            .await;

        let mut users = Vec::with_capacity(found.len());
        for user in found {
            if let Some(user) = user? {
                users.push(user);
            }
        }
        Ok(users)
    }

    async fn find_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Vec<User>, StoreError> {
        // Firestore has no case-insensitive substring operator.
        let users: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .obj()
            .query()
            .await
            .map_err(db_error)?;

        Ok(users
            .into_iter()
            .filter(|u| name_matches(u, first_name, last_name))
            .collect())
    }

    async fn save(&self, user: User) -> Result<User, StoreError> {
        if self.exists_email_for_other(&user.email, user.id).await? {
            return Err(StoreError::Conflict {
                field: "email",
                value: user.email.clone(),
            });
        }

        match self.get_by_authentication_id(&user.authentication_id).await? {
            Some(existing) if existing.id == user.id => {
                self.write(&user).await?;
                return Ok(user);
            }
            Some(_) => {
                return Err(StoreError::Conflict {
                    field: "authentication_id",
                    value: user.authentication_id.clone(),
                });
            }
            None => {}
        }

        let inserted: Result<User, _> = self
            .client
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.authentication_id)
            .object(&user)
            .execute()
            .await;

        match inserted {
            Ok(_) => Ok(user),
            Err(FirestoreError::DataConflictError(_)) => {
                tracing::warn!(
                    authentication_id = %user.authentication_id,
                    "Concurrent insert lost the identity race"
                );
                Err(StoreError::Conflict {
                    field: "authentication_id",
                    value: user.authentication_id.clone(),
                })
            }
            Err(e) => Err(db_error(e)),
        }
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError> {
        if let Some(user) = self.find_by_id(id).await? {
            self.delete_document(&user.authentication_id).await?;
        }
        Ok(())
    }

    async fn delete_by_authentication_id(
        &self,
        authentication_id: &str,
    ) -> Result<(), StoreError> {
        self.delete_document(authentication_id).await
    }

    async fn delete_abandoned(&self, key: IdentityField<'_>) -> Result<u64, StoreError> {
        let abandoned: Vec<User> = self
            .query_identity(key, None)
            .await?
            .into_iter()
            .filter(User::is_abandoned)
            .collect();
        let count = abandoned.len() as u64;

        stream::iter(abandoned)
            .map(|user| async move { self.delete_document(&user.authentication_id).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), StoreError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, StoreError>>()?;

        tracing::debug!(field = key.field_name(), count, "Deleted abandoned users");
        Ok(count)
    }

    async fn set_completed(&self, authentication_id: &str) -> Result<u64, StoreError> {
        self.modify(authentication_id, |u| u.user_auth_account_created = true)
            .await
    }

    async fn set_active(&self, authentication_id: &str) -> Result<u64, StoreError> {
        self.modify(authentication_id, |u| u.active = true).await
    }

    async fn update_profile(
        &self,
        authentication_id: &str,
        update: &ProfileUpdate,
    ) -> Result<u64, StoreError> {
        let update = update.clone();
        self.modify(authentication_id, move |u| {
            u.first_name = update.first_name.clone();
            u.last_name = update.last_name.clone();
            u.email = update.email.clone();
            u.searchable = Some(update.searchable);
        })
        .await
    }

    async fn update_profile_photo(
        &self,
        authentication_id: &str,
        profile_photo: &str,
    ) -> Result<u64, StoreError> {
        let profile_photo = profile_photo.to_string();
        self.modify(authentication_id, move |u| {
            u.profile_photo = Some(profile_photo.clone())
        })
            .await
    }
}
