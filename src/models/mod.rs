// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod profile_photo;
pub mod user;

pub use user::{ProfileUpdate, SignupRequest, User, UserProfile, UserSummary};

use serde::{Deserialize, Serialize};

/// `{message}` envelope used for successful responses, both ours and the
/// downstream services'.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
