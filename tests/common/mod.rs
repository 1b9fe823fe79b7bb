// SPDX-License-Identifier: MIT

use hangin_api::config::Config;
use hangin_api::db::FirestoreDb;
use hangin_api::routes::create_router;
use hangin_api::services::{
    AvatarCache, FirebaseTokenVerifier, NotificationDispatcher, RefreshPolicy, SessionManager,
};
use hangin_api::AppState;
use std::sync::Arc;

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

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();

    let verifier = Arc::new(
        FirebaseTokenVerifier::new(&config.gcp_project_id)
            .expect("Failed to build token verifier"),
    );
    let notifier = NotificationDispatcher::new(config.push_api_url.clone());
    let avatars = AvatarCache::new();
    let sessions = SessionManager::new(Arc::new(db.clone()), RefreshPolicy::default());

    let state = Arc::new(AppState {
        config,
        db,
        verifier,
        notifier,
        avatars,
        sessions,
    });

    (create_router(state.clone()), state)
}
