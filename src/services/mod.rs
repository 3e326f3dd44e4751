// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod account;
pub mod authentication;
pub mod deletion;
pub mod organization;
pub mod remote;
pub mod role;
pub mod signup;
pub mod users;
pub mod validator;

pub use account::{AccountApi, AccountClient};
pub use authentication::{AuthenticationApi, AuthenticationClient};
pub use deletion::DeletionSaga;
pub use organization::OrganizationClient;
pub use remote::{best_effort, RemoteClients, RemoteError, ResourceCleanup};
pub use role::RoleClient;
pub use signup::SignupSaga;
pub use users::UserService;
pub use validator::ConflictValidator;
