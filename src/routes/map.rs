// SPDX-License-Identifier: MIT

//! Map session routes: snapshot, refresh scheduling, pin selection.

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::services::SessionSnapshot;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/map/session", get(get_session))
        .route("/api/map/refresh", post(request_refresh))
        .route("/api/map/select", post(select_pin))
}

/// Current session snapshot. A session that has never refreshed runs one
/// synchronous refresh first so the map never starts from an empty state.
async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SessionSnapshot>> {
    let session = state.sessions.session_for(&user.user_id);

    if session.snapshot().await.last_refreshed.is_none() {
        session.run_refresh().await?;
    }

    Ok(Json(session.snapshot().await))
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub queued: bool,
}

/// Schedule a debounced refresh and return immediately.
async fn request_refresh(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<RefreshResponse> {
    let session = state.sessions.session_for(&user.user_id);
    session.request_refresh();
    Json(RefreshResponse { queued: true })
}

#[derive(Deserialize)]
pub struct SelectRequest {
    /// Pin to select; omit to clear the selection
    pub pin_id: Option<String>,
}

#[derive(Serialize)]
pub struct SelectResponse {
    pub selected: Option<crate::models::Pin>,
}

/// Select (or clear) the session's pin. Selection always re-fetches the pin
/// document so the detail view reflects its latest state.
async fn select_pin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<SelectRequest>,
) -> Result<Json<SelectResponse>> {
    let session = state.sessions.session_for(&user.user_id);

    let selected = match payload.pin_id {
        Some(pin_id) => {
            if pin_id.is_empty() {
                return Err(AppError::BadRequest("pin_id must not be empty".to_string()));
            }
            session.select_pin(&pin_id).await?
        }
        None => {
            session.clear_selection().await;
            None
        }
    };

    Ok(Json(SelectResponse { selected }))
}
