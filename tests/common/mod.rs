// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Barrier, Notify};
use user_service::config::Config;
use user_service::db::{FirestoreUserStore, IdentityField, InMemoryUserStore, UserStore};
use user_service::error::StoreError;
use user_service::middleware::auth::create_jwt;
use user_service::models::{Ack, ProfileUpdate, SignupRequest, User};
use user_service::routes::create_router;
use user_service::services::account::{AccountApi, CreateAccount};
use user_service::services::authentication::{AuthenticationApi, CreateAuthentication};
use user_service::services::{RemoteClients, RemoteError, ResourceCleanup};
use user_service::AppState;
use uuid::Uuid;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a Firestore store against the emulator.
#[allow(dead_code)]
pub async fn test_firestore() -> FirestoreUserStore {
    FirestoreUserStore::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// A signup request for `authentication_id` with a matching email.
#[allow(dead_code)]
pub fn signup_request(authentication_id: &str) -> SignupRequest {
    SignupRequest {
        first_name: "Dommy".to_string(),
        last_name: "Thecat".to_string(),
        email: format!("{}@x.com", authentication_id),
        authentication_id: authentication_id.to_string(),
        password: "pass".to_string(),
    }
}

// ─── Remote fakes ────────────────────────────────────────────

/// Ordered record of every remote call made through the fakes.
#[derive(Default)]
pub struct CallLog {
    calls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl CallLog {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().unwrap().is_empty()
    }
}

/// In-process stand-in for one remote resource.
pub struct FakeResource {
    name: &'static str,
    log: Arc<CallLog>,
    fail_create: AtomicBool,
    fail_delete: AtomicBool,
    create_gate: Mutex<Option<Arc<Notify>>>,
}

#[allow(dead_code)]
impl FakeResource {
    fn new(name: &'static str, log: Arc<CallLog>) -> Self {
        Self {
            name,
            log,
            fail_create: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            create_gate: Mutex::new(None),
        }
    }

    pub fn fail_create(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    pub fn fail_delete(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }

    /// Hold the next `create` until the returned handle is notified.
    pub fn hold_create(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.create_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    async fn wait_for_gate(&self) {
        let gate = self.create_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn rejected(&self) -> RemoteError {
        RemoteError::Status {
            resource: self.name,
            status: 400,
            body: format!("{} rejected the request", self.name),
        }
    }

    fn create_result(&self, call: String) -> Result<Ack, RemoteError> {
        self.log.record(call);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(self.rejected());
        }
        Ok(Ack::new(format!("{} created", self.name)))
    }

    fn delete_result(&self, call: String) -> Result<Ack, RemoteError> {
        self.log.record(call);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport {
                resource: self.name,
                message: "connection refused".to_string(),
            });
        }
        Ok(Ack::new(format!("{} deleted", self.name)))
    }
}

#[async_trait]
impl ResourceCleanup for FakeResource {
    fn resource(&self) -> &'static str {
        self.name
    }

    async fn delete_mine(&self, access_token: &str) -> Result<Ack, RemoteError> {
        assert!(!access_token.is_empty(), "caller token must be forwarded");
        self.delete_result(format!("{}.delete_mine", self.name))
    }
}

#[async_trait]
impl AuthenticationApi for FakeResource {
    async fn create(&self, request: &CreateAuthentication) -> Result<Ack, RemoteError> {
        self.wait_for_gate().await;
        self.create_result(format!(
            "{}.create:{}",
            self.name, request.authentication_id
        ))
    }
}

#[async_trait]
impl AccountApi for FakeResource {
    async fn create(&self, request: &CreateAccount) -> Result<Ack, RemoteError> {
        self.wait_for_gate().await;
        self.create_result(format!(
            "{}.create:{}",
            self.name, request.authentication_id
        ))
    }

    async fn delete_by_email(&self, email: &str) -> Result<Ack, RemoteError> {
        self.delete_result(format!("{}.delete_by_email:{}", self.name, email))
    }
}

/// The four remote fakes sharing one call log.
pub struct FakeRemotes {
    pub log: Arc<CallLog>,
    pub authentication: Arc<FakeResource>,
    pub account: Arc<FakeResource>,
    pub organization: Arc<FakeResource>,
    pub role: Arc<FakeResource>,
}

impl FakeRemotes {
    pub fn new() -> Self {
        let log = Arc::new(CallLog::default());
        Self {
            authentication: Arc::new(FakeResource::new("authentication", log.clone())),
            account: Arc::new(FakeResource::new("account", log.clone())),
            organization: Arc::new(FakeResource::new("organization", log.clone())),
            role: Arc::new(FakeResource::new("role", log.clone())),
            log,
        }
    }

    pub fn clients(&self) -> RemoteClients {
        RemoteClients {
            authentication: self.authentication.clone(),
            account: self.account.clone(),
            organization: self.organization.clone(),
            role: self.role.clone(),
        }
    }
}

// ─── Store wrapper ───────────────────────────────────────────

/// In-memory store whose writes can be made to fail on demand.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryUserStore,
    fail_delete: AtomicBool,
    fail_set_completed: AtomicBool,
    fail_reads: AtomicBool,
    conflict_on_save: AtomicBool,
    save_barrier: Mutex<Option<Arc<Barrier>>>,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn fail_delete(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }

    pub fn fail_set_completed(&self) {
        self.fail_set_completed.store(true, Ordering::SeqCst);
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Reject every `save` as a lost race on the authentication id.
    pub fn conflict_on_save(&self) {
        self.conflict_on_save.store(true, Ordering::SeqCst);
    }

    /// Make `parties` concurrent saves wait for each other before writing.
    pub fn line_up_saves(&self, parties: usize) {
        *self.save_barrier.lock().unwrap() = Some(Arc::new(Barrier::new(parties)));
    }

    fn check(&self, flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for FlakyStore {
    async fn exists_active(&self, key: IdentityField<'_>) -> Result<bool, StoreError> {
        self.check(&self.fail_reads)?;
        self.inner.exists_active(key).await
    }

    async fn exists_completed(&self, key: IdentityField<'_>) -> Result<bool, StoreError> {
        self.check(&self.fail_reads)?;
        self.inner.exists_completed(key).await
    }

    async fn exists_email_for_other(&self, email: &str, id: Uuid) -> Result<bool, StoreError> {
        self.check(&self.fail_reads)?;
        self.inner.exists_email_for_other(email, id).await
    }

    async fn find_by_authentication_id(
        &self,
        authentication_id: &str,
    ) -> Result<Option<User>, StoreError> {
        self.check(&self.fail_reads)?;
        self.inner.find_by_authentication_id(authentication_id).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.check(&self.fail_reads)?;
        self.inner.find_by_id(id).await
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        self.check(&self.fail_reads)?;
        self.inner.find_by_ids(ids).await
    }

    async fn find_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Vec<User>, StoreError> {
        self.check(&self.fail_reads)?;
        self.inner.find_by_name(first_name, last_name).await
    }

    async fn save(&self, user: User) -> Result<User, StoreError> {
        if self.conflict_on_save.load(Ordering::SeqCst) {
            return Err(StoreError::Conflict {
                field: "authentication_id",
                value: user.authentication_id,
            });
        }
        let barrier = self.save_barrier.lock().unwrap().clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
        self.inner.save(user).await
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), StoreError> {
        self.check(&self.fail_delete)?;
        self.inner.delete_by_id(id).await
    }

    async fn delete_by_authentication_id(
        &self,
        authentication_id: &str,
    ) -> Result<(), StoreError> {
        self.check(&self.fail_delete)?;
        self.inner.delete_by_authentication_id(authentication_id).await
    }

    async fn delete_abandoned(&self, key: IdentityField<'_>) -> Result<u64, StoreError> {
        self.inner.delete_abandoned(key).await
    }

    async fn set_completed(&self, authentication_id: &str) -> Result<u64, StoreError> {
        self.check(&self.fail_set_completed)?;
        self.inner.set_completed(authentication_id).await
    }

    async fn set_active(&self, authentication_id: &str) -> Result<u64, StoreError> {
        self.inner.set_active(authentication_id).await
    }

    async fn update_profile(
        &self,
        authentication_id: &str,
        update: &ProfileUpdate,
    ) -> Result<u64, StoreError> {
        self.inner.update_profile(authentication_id, update).await
    }

    async fn update_profile_photo(
        &self,
        authentication_id: &str,
        profile_photo: &str,
    ) -> Result<u64, StoreError> {
        self.inner
            .update_profile_photo(authentication_id, profile_photo)
            .await
    }
}

// ─── App ─────────────────────────────────────────────────────

/// Router plus handles on everything behind it.
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: Arc<FlakyStore>,
    pub remotes: FakeRemotes,
}

/// Build the full router over an in-memory store and fake remotes.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let store = Arc::new(FlakyStore::default());
    let remotes = FakeRemotes::new();
    let state = Arc::new(AppState::new(
        Config::test_default(),
        store.clone(),
        remotes.clients(),
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        remotes,
    }
}

/// Bearer token for `authentication_id`, signed with the test key.
#[allow(dead_code)]
pub fn create_test_jwt(authentication_id: &str) -> String {
    create_jwt(
        authentication_id,
        None,
        &Config::test_default().jwt_signing_key,
    )
    .expect("Failed to create JWT")
}
