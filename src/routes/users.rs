// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! `/users` routes: signup, account deletion, activation and profiles.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Ack, ProfileUpdate, SignupRequest, UserProfile, UserSummary};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

/// Routes open to anonymous callers.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/users", post(signup))
}

/// Routes that need a verified JWT.
/// The auth middleware is applied in routes/mod.rs for these routes.
///
/// Static segments here must stay listed in
/// [`RESERVED_AUTHENTICATION_IDS`](crate::models::user::RESERVED_AUTHENTICATION_IDS).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/users/me",
            get(get_my_profile)
                .put(update_profile)
                .delete(delete_my_account),
        )
        .route("/users/me/profile-photo", put(update_profile_photo))
        .route("/users/{authentication_id}", get(get_profile))
        .route("/users/{authentication_id}/active", put(activate))
        .route("/users/names/{first_name}/{last_name}", get(find_by_name))
        .route("/users/id/{id}", get(get_by_id))
        .route("/users/batch", post(get_batch))
}

// ─── Sagas ───────────────────────────────────────────────────

// Sagas run on their own task so a dropped request does not abandon a
// remote call halfway.

fn join_error(e: tokio::task::JoinError) -> AppError {
    AppError::Internal(anyhow::anyhow!("saga task failed: {}", e))
}

async fn signup(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Ack>)> {
    let saga = state.signup.clone();
    let ack = tokio::spawn(async move { saga.signup(request).await })
        .await
        .map_err(join_error)??;

    Ok((StatusCode::CREATED, Json(ack)))
}

async fn delete_my_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Ack>> {
    tracing::info!(authentication_id = %user.authentication_id, "Account deletion requested");

    let saga = state.deletion.clone();
    let ack = tokio::spawn(async move {
        saga.delete_my_account(&user.authentication_id, &user.access_token)
            .await
    })
    .await
    .map_err(join_error)??;

    Ok(Json(ack))
}

// ─── Activation ──────────────────────────────────────────────

async fn activate(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(authentication_id): Path<String>,
) -> Result<Json<Ack>> {
    tracing::debug!(
        caller = %caller.authentication_id,
        authentication_id = %authentication_id,
        "Activation requested"
    );
    Ok(Json(state.users.activate(&authentication_id).await?))
}

// ─── Profile ─────────────────────────────────────────────────

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Ack>> {
    if update.email.trim().is_empty() {
        return Err(AppError::BadRequest("email is required".to_string()));
    }
    Ok(Json(
        state
            .users
            .update_profile(&user.authentication_id, update)
            .await?,
    ))
}

/// The body is the profile-photo JSON, stored as sent.
async fn update_profile_photo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: String,
) -> Result<Json<Ack>> {
    if body.trim().is_empty() {
        return Err(AppError::BadRequest(
            "profile photo is required".to_string(),
        ));
    }
    Ok(Json(
        state
            .users
            .update_profile_photo(&user.authentication_id, &body)
            .await?,
    ))
}

async fn get_my_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    Ok(Json(state.users.get_profile(&user.authentication_id).await?))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(authentication_id): Path<String>,
) -> Result<Json<UserProfile>> {
    Ok(Json(state.users.get_profile(&authentication_id).await?))
}

// ─── Lookups ─────────────────────────────────────────────────

async fn find_by_name(
    State(state): State<Arc<AppState>>,
    Path((first_name, last_name)): Path<(String, String)>,
) -> Result<Json<Vec<UserSummary>>> {
    Ok(Json(
        state
            .users
            .find_matching_name(&first_name, &last_name)
            .await?,
    ))
}

async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserSummary>> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| AppError::BadRequest(format!("invalid user id: {}", id)))?;
    Ok(Json(state.users.get_by_id(id).await?))
}

async fn get_batch(
    State(state): State<Arc<AppState>>,
    Json(ids): Json<Vec<Uuid>>,
) -> Result<Json<Vec<UserSummary>>> {
    Ok(Json(state.users.get_batch(&ids).await?))
}
