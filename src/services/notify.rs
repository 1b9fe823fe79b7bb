// SPDX-License-Identifier: MIT

//! Push notification dispatch for new hangout pins.
//!
//! Delivery is strictly best-effort: a push failure is logged and never fails
//! the pin write that triggered it.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{NotificationPreferences, Pin};
use futures_util::{stream, StreamExt};
use serde::Serialize;

const PROFILE_FETCH_CONCURRENCY: usize = 8;

/// Message shape accepted by the Expo push endpoint.
#[derive(Debug, Serialize)]
struct PushMessage {
    to: String,
    title: String,
    body: String,
    data: PushData,
}

#[derive(Debug, Serialize)]
struct PushData {
    pin_id: String,
}

/// Decide whether a recipient should be notified about a new pin.
///
/// The master switch gates everything; below it, explicitly-invited
/// recipients and default-visibility recipients have separate toggles.
pub fn should_notify(prefs: &NotificationPreferences, is_personal_invite: bool) -> bool {
    if !prefs.enabled {
        return false;
    }
    if is_personal_invite {
        prefs.personal_invites
    } else {
        prefs.friend_hangouts
    }
}

/// Dispatches pushes to the recipients of a newly created pin.
#[derive(Clone)]
pub struct NotificationDispatcher {
    http_client: reqwest::Client,
    push_api_url: String,
}

impl NotificationDispatcher {
    pub fn new(push_api_url: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            push_api_url,
        }
    }

    /// Fan out a new-pin notification to every visible-to recipient whose
    /// preferences allow it. Recipients in `selected_friends` were explicitly
    /// invited; the rest got the pin through the creator's default set.
    pub async fn notify_pin_created(
        &self,
        db: &FirestoreDb,
        pin: &Pin,
        selected_friends: &[String],
        owner_name: &str,
    ) {
        // Owned recipient IDs so the stream's futures are self-contained and
        // the whole fan-out can run on a spawned task.
        let recipients: Vec<String> = pin
            .visible_to
            .iter()
            .filter(|recipient| *recipient != &pin.created_by)
            .cloned()
            .collect();

        let messages: Vec<PushMessage> = stream::iter(recipients)
            .map(|recipient| async move {
                let profile = match db.get_user_profile(&recipient).await {
                    Ok(Some(profile)) => profile,
                    Ok(None) => return None,
                    Err(e) => {
                        tracing::warn!(recipient = %recipient, error = %e, "Skipping push recipient, profile fetch failed");
                        return None;
                    }
                };

                let is_personal = selected_friends.iter().any(|id| id == &recipient);
                if !should_notify(&profile.preferences.notifications, is_personal) {
                    return None;
                }

                let push_token = profile.push_token?;

                let title = if is_personal {
                    format!("{} invited you to hang out", owner_name)
                } else {
                    format!("{} is hanging out", owner_name)
                };

                Some(PushMessage {
                    to: push_token,
                    title,
                    body: pin.title.clone(),
                    data: PushData {
                        pin_id: pin.id.clone(),
                    },
                })
            })
            .buffer_unordered(PROFILE_FETCH_CONCURRENCY)
            .filter_map(|message| async move { message })
            .collect()
            .await;

        if messages.is_empty() {
            return;
        }

        let count = messages.len();
        if let Err(e) = self.send_batch(&messages).await {
            tracing::warn!(pin_id = %pin.id, error = %e, "Push delivery failed");
        } else {
            tracing::info!(pin_id = %pin.id, recipients = count, "Pushes dispatched");
        }
    }

    async fn send_batch(&self, messages: &[PushMessage]) -> Result<(), AppError> {
        let response = self
            .http_client
            .post(&self.push_api_url)
            .json(messages)
            .send()
            .await
            .map_err(|e| AppError::Push(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::Push(format!(
                "push endpoint returned status {}",
                response.status()
            )));
        }

        Ok(())
    }
}
