// SPDX-License-Identifier: MIT

//! Shared avatar URL cache.
//!
//! Avatar URLs are read on hot paths (pin lists, friend lists) far more often
//! than they change, so they are cached process-wide and invalidated on
//! profile updates.

use crate::db::FirestoreDb;
use crate::error::AppError;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

const MAX_FETCH_ATTEMPTS: u32 = 3;
const FETCH_BACKOFF: Duration = Duration::from_millis(200);

#[derive(Clone, Default)]
pub struct AvatarCache {
    inner: Arc<DashMap<String, String>>,
}

impl AvatarCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached avatar URL for a user, if present.
    pub fn get(&self, user_id: &str) -> Option<String> {
        self.inner.get(user_id).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, user_id: &str, photo_url: String) {
        self.inner.insert(user_id.to_string(), photo_url);
    }

    /// Drop a user's cached URL. Called when their profile changes.
    pub fn invalidate(&self, user_id: &str) {
        self.inner.remove(user_id);
    }

    /// Avatar URL for a user, fetching and caching on a miss.
    ///
    /// The profile fetch is retried a few times with increasing backoff; a
    /// user with no profile caches an empty URL so repeated misses do not
    /// keep hitting the database.
    pub async fn resolve(&self, db: &FirestoreDb, user_id: &str) -> Result<String, AppError> {
        if let Some(url) = self.get(user_id) {
            return Ok(url);
        }

        let mut last_err = None;
        for attempt in 1..=MAX_FETCH_ATTEMPTS {
            match db.get_user_profile(user_id).await {
                Ok(profile) => {
                    let url = profile.map(|p| p.photo_url).unwrap_or_default();
                    self.insert(user_id, url.clone());
                    return Ok(url);
                }
                Err(e) => {
                    tracing::warn!(user_id, attempt, error = %e, "Avatar fetch failed");
                    last_err = Some(e);
                    if attempt < MAX_FETCH_ATTEMPTS {
                        tokio::time::sleep(FETCH_BACKOFF * attempt).await;
                    }
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| AppError::Database("avatar fetch failed".to_string())))
    }
}
