// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User service: signup and account deletion across the authentication,
//! account, organization and role services.
//!
//! There is no distributed transaction. Signup and deletion are sagas:
//! ordered steps, one durable completion flag on the user row, and
//! compensating deletes when a remote step fails.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use config::Config;
use db::UserStore;
use services::{ConflictValidator, DeletionSaga, RemoteClients, SignupSaga, UserService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn UserStore>,
    pub signup: SignupSaga,
    pub deletion: DeletionSaga,
    pub users: UserService,
}

impl AppState {
    /// Wire the sagas and services over one store and one set of clients.
    pub fn new(config: Config, store: Arc<dyn UserStore>, clients: RemoteClients) -> Self {
        let validator = ConflictValidator::new(store.clone(), clients.account.clone());
        Self {
            signup: SignupSaga::new(
                store.clone(),
                clients.authentication.clone(),
                clients.account.clone(),
            ),
            deletion: DeletionSaga::new(store.clone(), clients),
            users: UserService::new(store.clone(), validator),
            config,
            store,
        }
    }
}
