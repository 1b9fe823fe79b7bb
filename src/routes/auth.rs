// SPDX-License-Identifier: MIT

//! Session establishment: Firebase ID token in, session cookie out.

use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE};
use crate::services::IdentityError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/session", post(create_session))
        .route("/auth/logout", post(logout))
}

#[derive(Deserialize, Validate)]
pub struct SessionRequest {
    /// Firebase ID token from the mobile app's sign-in flow
    #[validate(length(min = 1))]
    pub id_token: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub display_name: String,
    pub photo_url: String,
    /// True when this sign-in created the profile document
    pub new_user: bool,
}

/// Exchange a Firebase ID token for a session cookie, creating the user's
/// profile document on first sign-in.
async fn create_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<SessionRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let identity = state
        .verifier
        .verify_id_token(&payload.id_token)
        .await
        .map_err(|e| match e {
            IdentityError::Invalid(msg) => {
                tracing::warn!(error = %msg, "Rejected Firebase ID token");
                AppError::InvalidToken
            }
            IdentityError::Transient(msg) => {
                AppError::Internal(anyhow::anyhow!("token verification unavailable: {msg}"))
            }
        })?;

    let (profile, new_user) = match state.db.get_user_profile(&identity.user_id).await? {
        Some(profile) => (profile, false),
        None => {
            let profile = state
                .db
                .create_user_profile(
                    &identity.user_id,
                    identity.display_name.unwrap_or_default(),
                    identity.email.unwrap_or_default(),
                    identity.photo_url.unwrap_or_default(),
                )
                .await?;
            (profile, true)
        }
    };

    if let Err(e) = state.db.update_last_active(&identity.user_id).await {
        tracing::warn!(user_id = %identity.user_id, error = %e, "Failed to stamp last_active");
    }

    let jwt = create_jwt(&identity.user_id, &state.config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, jwt))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    tracing::info!(user_id = %identity.user_id, new_user, "Session established");

    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            user_id: profile.id,
            display_name: profile.display_name,
            photo_url: profile.photo_url,
            new_user,
        }),
    ))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Clear the session cookie and tear down any live map session.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<LogoutResponse>) {
    // Best-effort: if the cookie still decodes, drop the map session too.
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

        if let Ok(token_data) = decode::<crate::middleware::auth::Claims>(
            cookie.value(),
            &DecodingKey::from_secret(&state.config.jwt_signing_key),
            &Validation::new(Algorithm::HS256),
        ) {
            state.sessions.end_session(&token_data.claims.sub);
        }
    }

    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (jar.remove(removal), Json(LogoutResponse { success: true }))
}
