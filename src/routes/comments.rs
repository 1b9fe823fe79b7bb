// SPDX-License-Identifier: MIT

//! Comment routes, scoped under the pin they belong to.

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Comment, Pin};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/pins/{id}/comments",
            get(get_comments).post(add_comment),
        )
        .route(
            "/api/comments/{id}",
            put(update_comment).delete(delete_comment),
        )
}

/// A comment plus the author's avatar URL for the thread view.
#[derive(Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author_avatar: String,
}

async fn visible_pin(state: &AppState, pin_id: &str, user_id: &str) -> Result<Pin> {
    let pin = state
        .db
        .get_pin(pin_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pin {} does not exist", pin_id)))?;

    if !pin.is_visible_to(user_id) {
        return Err(AppError::PermissionDenied(
            "You cannot see this pin".to_string(),
        ));
    }

    Ok(pin)
}

#[derive(Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 500))]
    pub text: String,
}

async fn add_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(pin_id): Path<String>,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<Comment>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    visible_pin(&state, &pin_id, &user.user_id).await?;

    let comment = state
        .db
        .add_comment(&pin_id, &user.user_id, payload.text)
        .await?;

    Ok(Json(comment))
}

/// Comments on a pin, newest first, each with its author's avatar.
async fn get_comments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(pin_id): Path<String>,
) -> Result<Json<Vec<CommentView>>> {
    visible_pin(&state, &pin_id, &user.user_id).await?;

    let comments = state.db.comments_for_pin(&pin_id).await?;

    let mut views = Vec::with_capacity(comments.len());
    for comment in comments {
        // A failed avatar lookup degrades to no avatar, not a failed thread.
        let author_avatar = state
            .avatars
            .resolve(&state.db, &comment.user_id)
            .await
            .unwrap_or_default();
        views.push(CommentView {
            comment,
            author_avatar,
        });
    }

    Ok(Json(views))
}

async fn update_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<Comment>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let comment = state
        .db
        .update_comment(&id, &user.user_id, payload.text)
        .await?;

    Ok(Json(comment))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.db.delete_comment(&id, &user.user_id).await?;
    Ok(Json(DeleteResponse { success: true }))
}
