// SPDX-License-Identifier: MIT

//! Friendship routes: requests, responses, the friend list, user search.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{FriendRequestView, Friendship, FriendshipStatus, UserSummary};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/friends", get(get_friends))
        .route("/api/friends/requests", get(get_requests).post(send_request))
        .route("/api/friends/requests/{id}/accept", post(accept_request))
        .route("/api/friends/requests/{id}/reject", post(reject_request))
        .route("/api/friends/{friend_id}", delete(remove_friend))
        .route("/api/friends/status/{other_id}", get(get_status))
        .route("/api/users/search", get(search_users))
}

/// The caller's accepted friends with their display info.
async fn get_friends(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<UserSummary>>> {
    let ids = state.db.friend_ids(&user.user_id).await?;

    let mut friends = Vec::with_capacity(ids.len());
    for id in ids {
        // A friend whose profile is gone is skipped rather than failing the
        // whole list.
        match state.db.get_user_profile(&id).await {
            Ok(Some(profile)) => friends.push(UserSummary {
                id: profile.id,
                display_name: profile.display_name,
                photo_url: profile.photo_url,
            }),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(friend_id = %id, error = %e, "Skipping friend, profile fetch failed");
            }
        }
    }

    Ok(Json(friends))
}

#[derive(Deserialize, Validate)]
pub struct SendRequestPayload {
    #[validate(length(min = 1))]
    pub receiver_id: String,
}

async fn send_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<SendRequestPayload>,
) -> Result<Json<Friendship>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let friendship = state
        .db
        .send_friend_request(&user.user_id, &payload.receiver_id)
        .await?;

    Ok(Json(friendship))
}

async fn get_requests(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<FriendRequestView>>> {
    let requests = state.db.friend_requests(&user.user_id).await?;
    Ok(Json(requests))
}

async fn accept_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Friendship>> {
    let friendship = state
        .db
        .respond_to_friend_request(&id, &user.user_id, true)
        .await?;
    Ok(Json(friendship))
}

async fn reject_request(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Friendship>> {
    let friendship = state
        .db
        .respond_to_friend_request(&id, &user.user_id, false)
        .await?;
    Ok(Json(friendship))
}

#[derive(Serialize)]
pub struct RemoveResponse {
    pub success: bool,
}

async fn remove_friend(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(friend_id): Path<String>,
) -> Result<Json<RemoveResponse>> {
    state.db.remove_friend(&user.user_id, &friend_id).await?;
    Ok(Json(RemoveResponse { success: true }))
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: Option<FriendshipStatus>,
}

/// Friendship status between the caller and another user, `null` when no
/// friendship document exists.
async fn get_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(other_id): Path<String>,
) -> Result<Json<StatusResponse>> {
    let status = state
        .db
        .friendship_status(&user.user_id, &other_id)
        .await?;
    Ok(Json(StatusResponse { status }))
}

#[derive(Deserialize, Validate)]
pub struct SearchParams {
    #[validate(length(min = 1, max = 100))]
    pub q: String,
}

async fn search_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<UserSummary>>> {
    params
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let results = state.db.search_users(&params.q, &user.user_id).await?;
    Ok(Json(results))
}
