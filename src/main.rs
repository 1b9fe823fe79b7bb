// SPDX-License-Identifier: MIT

//! Just Hangin API Server
//!
//! Backend for dropping time-bounded hangout pins on a map, sharing them
//! with friends, checking in, and commenting.

use hangin_api::{
    config::Config,
    db::FirestoreDb,
    services::{
        AvatarCache, FirebaseTokenVerifier, NotificationDispatcher, RefreshPolicy, SessionManager,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Just Hangin API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    let verifier = Arc::new(
        FirebaseTokenVerifier::new(&config.gcp_project_id)
            .expect("Failed to initialize Firebase token verifier"),
    );

    let notifier = NotificationDispatcher::new(config.push_api_url.clone());
    let avatars = AvatarCache::new();

    let sessions = SessionManager::new(Arc::new(db.clone()), RefreshPolicy::default());
    tracing::info!("Map session manager initialized");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        verifier,
        notifier,
        avatars,
        sessions,
    });

    // Build router
    let app = hangin_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hangin_api=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
