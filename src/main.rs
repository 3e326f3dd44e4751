// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User Service API Server
//!
//! Runs user signup and account deletion against the downstream
//! authentication, account, organization and role services.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use user_service::{
    config::{Config, StoreKind},
    db::{FirestoreUserStore, InMemoryUserStore, UserStore},
    services::RemoteClients,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    let config = Config::from_env()?;
    tracing::info!(port = config.port, store = ?config.user_store, "Starting User Service");

    let store: Arc<dyn UserStore> = match config.user_store {
        StoreKind::Memory => {
            tracing::warn!("Using in-memory user store; data is lost on restart");
            Arc::new(InMemoryUserStore::new())
        }
        StoreKind::Firestore => Arc::new(FirestoreUserStore::new(&config.gcp_project_id).await?),
    };

    let clients = RemoteClients::from_config(&config)?;
    tracing::info!(
        authentication = %config.authentication_service_url,
        account = %config.account_service_url,
        organization = %config.organization_service_url,
        role = %config.role_service_url,
        "Remote clients initialized"
    );

    let state = Arc::new(AppState::new(config.clone(), store, clients));
    let app = user_service::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("user_service=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
