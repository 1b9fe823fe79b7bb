// SPDX-License-Identifier: MIT

//! Per-user map session: holds the pin snapshot backing the map screen and
//! schedules its refreshes.
//!
//! Refresh requests are debounced so a burst of triggers (viewport changes,
//! mutations, reconnects) costs one query. A refresh that fails is retried a
//! bounded number of times with increasing backoff; when every attempt fails
//! the previous snapshot is kept rather than blanking the map.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::Pin;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Where a session's pins come from. Implemented by the Firestore layer;
/// tests substitute an in-memory source.
pub trait PinSource: Send + Sync + 'static {
    fn active_pins_for(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<Pin>, AppError>> + Send;

    fn pin_by_id(
        &self,
        pin_id: &str,
    ) -> impl Future<Output = Result<Option<Pin>, AppError>> + Send;
}

impl PinSource for FirestoreDb {
    async fn active_pins_for(&self, user_id: &str) -> Result<Vec<Pin>, AppError> {
        self.active_pins(user_id).await
    }

    async fn pin_by_id(&self, pin_id: &str) -> Result<Option<Pin>, AppError> {
        self.get_pin(pin_id).await
    }
}

/// Timing knobs for session refresh. Injectable so tests can shrink them.
#[derive(Debug, Clone, Copy)]
pub struct RefreshPolicy {
    /// Quiet period between a refresh request and the query it triggers
    pub debounce: Duration,
    /// Total query attempts per refresh, including the first
    pub max_attempts: u32,
    /// Base retry delay; attempt N waits N times this
    pub retry_backoff: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(1),
            max_attempts: 3,
            retry_backoff: Duration::from_secs(1),
        }
    }
}

#[derive(Default)]
struct SessionState {
    pins: Vec<Pin>,
    selected: Option<Pin>,
    last_refreshed: Option<DateTime<Utc>>,
    consecutive_failures: u32,
}

/// Point-in-time view of a session, returned to the map screen.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub pins: Vec<Pin>,
    pub selected: Option<Pin>,
    pub last_refreshed: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

/// One user's live map session.
pub struct MapSession<S> {
    user_id: String,
    source: Arc<S>,
    policy: RefreshPolicy,
    auth_ready: AtomicBool,
    refresh_queued: AtomicBool,
    refresh_lock: Mutex<()>,
    state: RwLock<SessionState>,
}

impl<S: PinSource> MapSession<S> {
    /// Create a session that ignores refresh requests until
    /// [`mark_auth_ready`](Self::mark_auth_ready) is called.
    pub fn new(user_id: impl Into<String>, source: Arc<S>, policy: RefreshPolicy) -> Arc<Self> {
        Arc::new(Self {
            user_id: user_id.into(),
            source,
            policy,
            auth_ready: AtomicBool::new(false),
            refresh_queued: AtomicBool::new(false),
            refresh_lock: Mutex::new(()),
            state: RwLock::new(SessionState::default()),
        })
    }

    /// Open the refresh gate. Requests arriving before this are dropped so a
    /// half-established session never queries with a stale identity.
    pub fn mark_auth_ready(&self) {
        self.auth_ready.store(true, Ordering::SeqCst);
    }

    /// Ask for a refresh soon. Returns immediately; requests landing within
    /// the debounce window coalesce into a single query.
    pub fn request_refresh(self: &Arc<Self>) {
        if !self.auth_ready.load(Ordering::SeqCst) {
            tracing::debug!(user_id = %self.user_id, "Refresh request dropped, session not ready");
            return;
        }

        if self.refresh_queued.swap(true, Ordering::SeqCst) {
            return;
        }

        let session = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(session.policy.debounce).await;
            session.refresh_queued.store(false, Ordering::SeqCst);
            if let Err(e) = session.run_refresh().await {
                tracing::warn!(user_id = %session.user_id, error = %e, "Debounced refresh failed");
            }
        });
    }

    /// Refresh now, retrying per the policy. On success the snapshot is
    /// replaced and the failure counter resets; once every attempt fails the
    /// previous snapshot stays and the last error is returned.
    pub async fn run_refresh(&self) -> Result<(), AppError> {
        if !self.auth_ready.load(Ordering::SeqCst) {
            return Ok(());
        }

        let _guard = self.refresh_lock.lock().await;

        let mut last_err = None;
        for attempt in 1..=self.policy.max_attempts {
            match self.source.active_pins_for(&self.user_id).await {
                Ok(pins) => {
                    self.apply_refresh(pins).await?;
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = %self.user_id,
                        attempt,
                        error = %e,
                        "Pin refresh attempt failed"
                    );
                    self.state.write().await.consecutive_failures += 1;
                    last_err = Some(e);
                    if attempt < self.policy.max_attempts {
                        tokio::time::sleep(self.policy.retry_backoff * attempt).await;
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| AppError::Database("refresh failed".to_string())))
    }

    async fn apply_refresh(&self, pins: Vec<Pin>) -> Result<(), AppError> {
        // The selection is re-fetched wholesale rather than patched from the
        // list, so a selection that no longer exists or is no longer visible
        // clears itself.
        let selected_id = self.state.read().await.selected.as_ref().map(|p| p.id.clone());
        let selected = match selected_id {
            Some(id) => self
                .source
                .pin_by_id(&id)
                .await?
                .filter(|pin| pin.is_visible_to(&self.user_id)),
            None => None,
        };

        let mut state = self.state.write().await;
        state.pins = pins;
        state.selected = selected;
        state.last_refreshed = Some(Utc::now());
        state.consecutive_failures = 0;
        Ok(())
    }

    /// Select a pin, fetching its current document. Returns `None` (and
    /// clears any previous selection) if the pin is gone or not visible.
    pub async fn select_pin(&self, pin_id: &str) -> Result<Option<Pin>, AppError> {
        let pin = self
            .source
            .pin_by_id(pin_id)
            .await?
            .filter(|pin| pin.is_visible_to(&self.user_id));

        let mut state = self.state.write().await;
        state.selected = pin.clone();
        Ok(pin)
    }

    pub async fn clear_selection(&self) {
        self.state.write().await.selected = None;
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            pins: state.pins.clone(),
            selected: state.selected.clone(),
            last_refreshed: state.last_refreshed,
            consecutive_failures: state.consecutive_failures,
        }
    }
}

/// Process-wide registry of map sessions, one per authenticated user.
pub struct SessionManager<S> {
    source: Arc<S>,
    policy: RefreshPolicy,
    sessions: DashMap<String, Arc<MapSession<S>>>,
}

impl<S: PinSource> SessionManager<S> {
    pub fn new(source: Arc<S>, policy: RefreshPolicy) -> Self {
        Self {
            source,
            policy,
            sessions: DashMap::new(),
        }
    }

    /// The user's session, created on first use. Sessions only exist behind
    /// authentication, so a fresh session is immediately marked ready.
    pub fn session_for(&self, user_id: &str) -> Arc<MapSession<S>> {
        self.sessions
            .entry(user_id.to_string())
            .or_insert_with(|| {
                let session = MapSession::new(user_id, Arc::clone(&self.source), self.policy);
                session.mark_auth_ready();
                session
            })
            .clone()
    }

    /// Drop the user's session on sign-out.
    pub fn end_session(&self, user_id: &str) {
        self.sessions.remove(user_id);
    }

    /// A mutation touched the user's pins; schedule a refresh if they have a
    /// live session.
    pub fn pins_changed(&self, user_id: &str) {
        if let Some(session) = self.sessions.get(user_id) {
            session.request_refresh();
        }
    }
}
