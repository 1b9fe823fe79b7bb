// SPDX-License-Identifier: MIT

//! Profile routes for the signed-in user.

use axum::{
    extract::State,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Preferences, PrivacyPatch, PrivacySettings, ProfilePatch, UserProfile};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).put(update_me))
        .route("/api/me/privacy", put(update_privacy))
        .route("/api/me/active", post(mark_active))
        .route("/api/account", delete(delete_account))
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    let profile = state
        .db
        .get_user_profile(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(profile))
}

#[derive(Deserialize, Validate, Default)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50))]
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
    pub push_token: Option<String>,
    pub preferences: Option<Preferences>,
    pub privacy_settings: Option<PrivacySettings>,
}

/// Merge profile changes; only the provided fields are touched.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let photo_changed = payload.photo_url.is_some();

    let patch = ProfilePatch {
        display_name: payload.display_name,
        photo_url: payload.photo_url,
        location: payload.location,
        push_token: payload.push_token,
        preferences: payload.preferences,
        privacy_settings: payload.privacy_settings,
    };

    let profile = state.db.update_user_profile(&user.user_id, &patch).await?;

    if photo_changed {
        state.avatars.invalidate(&user.user_id);
    }

    Ok(Json(profile))
}

/// Merge privacy toggles; omitted toggles keep their stored value.
async fn update_privacy(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(patch): Json<PrivacyPatch>,
) -> Result<Json<UserProfile>> {
    let profile = state
        .db
        .update_privacy_settings(&user.user_id, &patch)
        .await?;
    Ok(Json(profile))
}

#[derive(Serialize)]
pub struct ActiveResponse {
    pub success: bool,
}

/// Stamp `last_active`; called when the app comes to the foreground.
async fn mark_active(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ActiveResponse>> {
    state.db.update_last_active(&user.user_id).await?;
    Ok(Json(ActiveResponse { success: true }))
}

#[derive(Serialize)]
pub struct DeleteAccountResponse {
    pub success: bool,
}

/// Delete the caller's profile and tear down their map session.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DeleteAccountResponse>> {
    tracing::info!(user_id = %user.user_id, "User-initiated account deletion");

    state.db.delete_user_profile(&user.user_id).await?;
    state.sessions.end_session(&user.user_id);
    state.avatars.invalidate(&user.user_id);

    Ok(Json(DeleteAccountResponse { success: true }))
}
