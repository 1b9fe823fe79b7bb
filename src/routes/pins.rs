// SPDX-License-Identifier: MIT

//! Pin routes: create, read, update, delete, check-in.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Coordinates, Pin, PinDraft, PinPatch};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/pins", post(create_pin).get(get_active_pins))
        .route("/api/pins/mine", get(get_my_pins))
        .route("/api/pins/friend/{friend_id}", get(get_friend_pins))
        .route(
            "/api/pins/{id}",
            get(get_pin).put(update_pin).delete(delete_pin),
        )
        .route("/api/pins/{id}/checkin", post(check_in))
        .route("/api/pins/{id}/checkout", post(check_out))
}

#[derive(Deserialize, Validate)]
pub struct CreatePinRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub note: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
    pub hangout_time: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Friends explicitly invited. Empty means "share with all my friends".
    #[serde(default)]
    pub selected_friends: Vec<String>,
}

/// Create a pin. Visibility defaults to the creator's full friend list when
/// no friends were explicitly selected.
async fn create_pin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreatePinRequest>,
) -> Result<Json<Pin>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if payload.expires_at <= payload.hangout_time {
        return Err(AppError::BadRequest(
            "expires_at must be after hangout_time".to_string(),
        ));
    }

    let visible_to = if payload.selected_friends.is_empty() {
        state.db.friend_ids(&user.user_id).await?
    } else {
        payload.selected_friends.clone()
    };

    let draft = PinDraft {
        title: payload.title,
        note: payload.note,
        location: Coordinates {
            latitude: payload.latitude,
            longitude: payload.longitude,
        },
        address: payload.address,
        hangout_time: payload.hangout_time,
        expires_at: payload.expires_at,
        visible_to,
        selected_friends: payload.selected_friends,
    };

    let selected_friends = draft.selected_friends.clone();
    let pin = state.db.create_pin(&user.user_id, draft).await?;

    let owner_name = state
        .db
        .get_user_profile(&user.user_id)
        .await
        .ok()
        .flatten()
        .map(|p| p.display_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "A friend".to_string());

    // Fan out pushes off the request path; delivery is best-effort.
    let notifier = state.notifier.clone();
    let db = state.db.clone();
    let pin_for_push = pin.clone();
    tokio::spawn(async move {
        notifier
            .notify_pin_created(&db, &pin_for_push, &selected_friends, &owner_name)
            .await;
    });

    state.sessions.pins_changed(&user.user_id);

    Ok(Json(pin))
}

/// Pins currently active for the caller.
async fn get_active_pins(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Pin>>> {
    let pins = state.db.active_pins(&user.user_id).await?;
    Ok(Json(pins))
}

/// The caller's own pins, newest first, including expired ones.
async fn get_my_pins(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Pin>>> {
    let pins = state.db.pins_by_user(&user.user_id).await?;
    Ok(Json(pins))
}

/// A friend's pins that are shared with the caller.
async fn get_friend_pins(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(friend_id): Path<String>,
) -> Result<Json<Vec<Pin>>> {
    let pins = state.db.friend_pins(&user.user_id, &friend_id).await?;
    Ok(Json(pins))
}

async fn get_pin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Pin>> {
    let pin = state
        .db
        .get_pin(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pin {} does not exist", id)))?;

    if !pin.is_visible_to(&user.user_id) {
        return Err(AppError::PermissionDenied(
            "You cannot see this pin".to_string(),
        ));
    }

    Ok(Json(pin))
}

#[derive(Deserialize, Validate, Default)]
pub struct UpdatePinRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub hangout_time: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub visible_to: Option<Vec<String>>,
}

/// Update a pin. Owner-only; only the provided fields are merged.
async fn update_pin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePinRequest>,
) -> Result<Json<Pin>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let existing = state
        .db
        .get_pin(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pin {} does not exist", id)))?;

    if existing.created_by != user.user_id {
        return Err(AppError::PermissionDenied(
            "Only the pin owner can update it".to_string(),
        ));
    }

    let location = match (payload.latitude, payload.longitude) {
        (Some(latitude), Some(longitude)) => Some(Coordinates {
            latitude,
            longitude,
        }),
        (None, None) => None,
        _ => {
            return Err(AppError::BadRequest(
                "latitude and longitude must be provided together".to_string(),
            ))
        }
    };

    let patch = PinPatch {
        title: payload.title,
        note: payload.note,
        location,
        address: payload.address,
        hangout_time: payload.hangout_time,
        expires_at: payload.expires_at,
        visible_to: payload.visible_to,
    };

    let pin = state.db.update_pin(&id, &patch).await?;
    state.sessions.pins_changed(&user.user_id);

    Ok(Json(pin))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

async fn delete_pin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.db.delete_pin(&id, &user.user_id).await?;
    state.sessions.pins_changed(&user.user_id);
    Ok(Json(DeleteResponse { success: true }))
}

async fn check_in(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Pin>> {
    let pin = state.db.check_in(&id, &user.user_id).await?;
    state.sessions.pins_changed(&user.user_id);
    Ok(Json(pin))
}

async fn check_out(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Pin>> {
    let pin = state.db.check_out(&id, &user.user_id).await?;
    state.sessions.pins_changed(&user.user_id);
    Ok(Json(pin))
}
