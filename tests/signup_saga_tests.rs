// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signup saga tests.
//!
//! Every test runs the saga against the in-memory store and fake remote
//! clients, then checks both the outcome and the remote calls made.

use std::sync::Arc;

use user_service::db::{IdentityField, UserStore};
use user_service::error::{SignupError, StoreError};
use user_service::models::User;
use user_service::services::signup::SIGNUP_SUCCESS;
use user_service::services::validator::Conflict;
use user_service::services::SignupSaga;

mod common;
use common::{signup_request, FakeRemotes, FlakyStore};

fn saga(store: &Arc<FlakyStore>, remotes: &FakeRemotes) -> SignupSaga {
    SignupSaga::new(
        store.clone(),
        remotes.authentication.clone(),
        remotes.account.clone(),
    )
}

#[tokio::test]
async fn test_full_success_marks_row_completed() {
    let store = Arc::new(FlakyStore::default());
    let remotes = FakeRemotes::new();

    let ack = saga(&store, &remotes)
        .signup(signup_request("u1"))
        .await
        .unwrap();
    assert_eq!(ack.message, SIGNUP_SUCCESS);

    let user = store.find_by_authentication_id("u1").await.unwrap().unwrap();
    assert!(user.user_auth_account_created);
    assert!(!user.active);
    assert_eq!(user.email, "u1@x.com");

    assert_eq!(
        remotes.log.calls(),
        vec![
            "account.delete_by_email:u1@x.com",
            "authentication.create:u1",
            "account.create:u1",
        ]
    );
}

#[tokio::test]
async fn test_active_identity_rejected_without_remote_calls() {
    let store = Arc::new(FlakyStore::default());
    let remotes = FakeRemotes::new();
    let saga = saga(&store, &remotes);

    saga.signup(signup_request("u1")).await.unwrap();
    store.set_active("u1").await.unwrap();
    let calls_before = remotes.log.calls().len();

    for _ in 0..2 {
        let err = saga.signup(signup_request("u1")).await.unwrap_err();
        assert!(matches!(
            err,
            SignupError::Conflict(Conflict::ActiveAuthenticationId)
        ));
        assert_eq!(
            err.to_string(),
            "User is already active with that username (authenticationId)"
        );
    }
    assert_eq!(remotes.log.calls().len(), calls_before);
}

#[tokio::test]
async fn test_completed_identity_asks_for_activation() {
    let store = Arc::new(FlakyStore::default());
    let remotes = FakeRemotes::new();
    let saga = saga(&store, &remotes);

    saga.signup(signup_request("u1")).await.unwrap();

    let err = saga.signup(signup_request("u1")).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "User account has already been created for that username, check to activate it by email"
    );
}

#[tokio::test]
async fn test_email_rules_apply_to_new_authentication_id() {
    let store = Arc::new(FlakyStore::default());
    let remotes = FakeRemotes::new();
    let saga = saga(&store, &remotes);

    saga.signup(signup_request("u1")).await.unwrap();

    let mut request = signup_request("u2");
    request.email = "u1@x.com".to_string();
    let err = saga.signup(request.clone()).await.unwrap_err();
    assert!(matches!(err, SignupError::Conflict(Conflict::CompletedEmail)));

    store.set_active("u1").await.unwrap();
    let err = saga.signup(request).await.unwrap_err();
    assert_eq!(err.to_string(), "User account is active for that email");
}

#[tokio::test]
async fn test_blank_field_rejected_before_store_access() {
    let store = Arc::new(FlakyStore::default());
    store.fail_reads();
    let remotes = FakeRemotes::new();

    let mut request = signup_request("u1");
    request.last_name = "   ".to_string();
    let err = saga(&store, &remotes).signup(request).await.unwrap_err();

    assert!(matches!(err, SignupError::Invalid(_)));
    assert_eq!(err.to_string(), "lastName is required");
    assert!(remotes.log.is_empty());
}

#[tokio::test]
async fn test_route_word_rejected_as_authentication_id() {
    let store = Arc::new(FlakyStore::default());
    let remotes = FakeRemotes::new();

    let mut request = signup_request("u1");
    request.authentication_id = " me ".to_string();
    let err = saga(&store, &remotes).signup(request).await.unwrap_err();

    assert!(matches!(err, SignupError::Invalid(_)));
    assert_eq!(err.to_string(), "authenticationId 'me' is reserved");
    assert!(remotes.log.is_empty());
    assert!(store.inner.is_empty().await);
}

#[tokio::test]
async fn test_authentication_failure_compensates() {
    let store = Arc::new(FlakyStore::default());
    let remotes = FakeRemotes::new();
    remotes.authentication.fail_create();

    let err = saga(&store, &remotes)
        .signup(signup_request("u1"))
        .await
        .unwrap_err();

    assert!(matches!(err, SignupError::Authentication(_)));
    assert!(err
        .to_string()
        .starts_with("Authentication api call failed with error: "));
    assert!(store.find_by_authentication_id("u1").await.unwrap().is_none());
    assert_eq!(remotes.log.count("account.create"), 0);
}

#[tokio::test]
async fn test_account_failure_compensates_and_keeps_flag_unset() {
    let store = Arc::new(FlakyStore::default());
    let remotes = FakeRemotes::new();
    remotes.account.fail_create();

    let err = saga(&store, &remotes)
        .signup(signup_request("u1"))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Account api call failed with error: account rejected the request"
    );
    assert!(store.inner.is_empty().await);
    assert!(!store
        .exists_completed(IdentityField::AuthenticationId("u1"))
        .await
        .unwrap());
    // The authentication record is not rolled back here.
    assert_eq!(remotes.log.count("authentication.create"), 1);
    assert_eq!(remotes.log.count("authentication.delete"), 0);
}

#[tokio::test]
async fn test_failed_compensation_still_reports_remote_error() {
    let store = Arc::new(FlakyStore::default());
    store.fail_delete();
    let remotes = FakeRemotes::new();
    remotes.authentication.fail_create();

    let err = saga(&store, &remotes)
        .signup(signup_request("u1"))
        .await
        .unwrap_err();

    assert!(matches!(err, SignupError::Authentication(_)));
    // The pending row survives but does not block the next attempt.
    let left = store.find_by_authentication_id("u1").await.unwrap().unwrap();
    assert!(left.is_abandoned());
}

#[tokio::test]
async fn test_abandoned_row_does_not_block_signup() {
    let store = Arc::new(FlakyStore::default());
    let remotes = FakeRemotes::new();
    let stale = store
        .save(User::pending("Old", "Attempt", "u1@x.com", "someone-else"))
        .await
        .unwrap();

    saga(&store, &remotes)
        .signup(signup_request("u1"))
        .await
        .unwrap();

    assert!(store.find_by_id(stale.id).await.unwrap().is_none());
    let user = store.find_by_authentication_id("u1").await.unwrap().unwrap();
    assert!(user.user_auth_account_created);
}

#[tokio::test]
async fn test_retry_after_account_failure_succeeds() {
    let store = Arc::new(FlakyStore::default());
    let remotes = FakeRemotes::new();
    remotes.account.fail_create();
    let saga = saga(&store, &remotes);

    saga.signup(signup_request("u1")).await.unwrap_err();

    let remotes_ok = FakeRemotes::new();
    let retry = SignupSaga::new(
        store.clone(),
        remotes_ok.authentication.clone(),
        remotes_ok.account.clone(),
    );
    let ack = retry.signup(signup_request("u1")).await.unwrap();
    assert_eq!(ack.message, SIGNUP_SUCCESS);
    assert_eq!(remotes_ok.log.count("account.delete_by_email"), 1);
}

#[tokio::test]
async fn test_leftover_account_cleanup_failure_is_ignored() {
    let store = Arc::new(FlakyStore::default());
    let remotes = FakeRemotes::new();
    remotes.account.fail_delete();

    let ack = saga(&store, &remotes)
        .signup(signup_request("u1"))
        .await
        .unwrap();
    assert_eq!(ack.message, SIGNUP_SUCCESS);
}

#[tokio::test]
async fn test_mark_complete_failure_still_succeeds() {
    let store = Arc::new(FlakyStore::default());
    store.fail_set_completed();
    let remotes = FakeRemotes::new();

    let ack = saga(&store, &remotes)
        .signup(signup_request("u1"))
        .await
        .unwrap();
    assert_eq!(ack.message, SIGNUP_SUCCESS);

    let user = store.find_by_authentication_id("u1").await.unwrap().unwrap();
    assert!(!user.user_auth_account_created);
}

#[tokio::test]
async fn test_store_outage_is_persistence_error() {
    let store = Arc::new(FlakyStore::default());
    store.fail_reads();
    let remotes = FakeRemotes::new();

    let err = saga(&store, &remotes)
        .signup(signup_request("u1"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SignupError::Persistence(StoreError::Unavailable(_))
    ));
    assert!(remotes.log.is_empty());
}

#[tokio::test]
async fn test_save_conflict_stops_before_remote_create() {
    let store = Arc::new(FlakyStore::default());
    store.conflict_on_save();
    let remotes = FakeRemotes::new();

    let err = saga(&store, &remotes)
        .signup(signup_request("u1"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SignupError::Persistence(StoreError::Conflict {
            field: "authentication_id",
            ref value,
        }) if value == "u1"
    ));
    assert_eq!(remotes.log.count("authentication.create"), 0);
    assert_eq!(remotes.log.count("account.create"), 0);
    assert!(store.inner.is_empty().await);
}

#[tokio::test]
async fn test_concurrent_signups_admit_one() {
    let store = Arc::new(FlakyStore::default());
    // Both attempts pass validation before either row exists.
    store.line_up_saves(2);
    let remotes = FakeRemotes::new();
    let saga = saga(&store, &remotes);

    let (a, b) = tokio::join!(
        saga.signup(signup_request("u1")),
        saga.signup(signup_request("u1"))
    );

    let (won, lost) = match (a, b) {
        (Ok(won), Err(lost)) | (Err(lost), Ok(won)) => (won, lost),
        other => panic!("expected exactly one signup to win, got {:?}", other),
    };
    assert_eq!(won.message, SIGNUP_SUCCESS);
    assert!(matches!(
        lost,
        SignupError::Persistence(StoreError::Conflict {
            field: "authentication_id",
            ..
        })
    ));

    assert_eq!(store.inner.len().await, 1);
    assert_eq!(remotes.log.count("authentication.create"), 1);
    assert_eq!(remotes.log.count("account.create"), 1);
}
