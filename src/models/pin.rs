// SPDX-License-Identifier: MIT

//! Location pin model and the visibility/lifecycle predicates.
//!
//! Every query site goes through [`Pin::is_visible_to`] and
//! [`Pin::is_active_for`] so the owner-always-visible rule cannot drift
//! between call sites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::time_utils::flexible_time;

/// Latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A time-bounded hangout pin stored in `location_pins`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    /// Document ID (also stored in the document body)
    pub id: String,
    /// User ID of the owner; immutable after creation
    pub created_by: String,
    pub location: Coordinates,
    pub title: String,
    pub note: String,
    /// Human-readable address, resolved asynchronously from coordinates
    #[serde(default)]
    pub address: Option<String>,
    /// When the hangout is meant to start
    #[serde(with = "flexible_time")]
    pub hangout_time: DateTime<Utc>,
    /// After this instant the pin is inactive for everyone but the owner
    #[serde(with = "flexible_time")]
    pub expires_at: DateTime<Utc>,
    /// User IDs permitted to see the pin besides the owner
    pub visible_to: Vec<String>,
    /// User IDs who have checked in; absent on documents written before
    /// check-in shipped
    #[serde(default)]
    pub checked_in_users: Vec<String>,
    #[serde(with = "flexible_time")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_time")]
    pub updated_at: DateTime<Utc>,
}

impl Pin {
    /// A pin is always visible to its creator, regardless of `visible_to`.
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.created_by == user_id || self.visible_to.iter().any(|id| id == user_id)
    }

    /// Whether the expiry instant has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Derived state: started but not yet expired.
    pub fn is_started(&self, now: DateTime<Utc>) -> bool {
        self.hangout_time <= now && now < self.expires_at
    }

    /// Whether the pin counts as active from `user_id`'s point of view.
    ///
    /// Owners keep seeing their own pins after expiry; everyone else only
    /// sees pins whose expiry is still in the future.
    pub fn is_active_for(&self, user_id: &str, now: DateTime<Utc>) -> bool {
        self.created_by == user_id || !self.is_expired(now)
    }

    pub fn is_checked_in(&self, user_id: &str) -> bool {
        self.checked_in_users.iter().any(|id| id == user_id)
    }
}

/// Data supplied when creating a pin.
#[derive(Debug, Clone)]
pub struct PinDraft {
    pub title: String,
    pub note: String,
    pub location: Coordinates,
    pub address: Option<String>,
    pub hangout_time: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub visible_to: Vec<String>,
    /// Recipients the creator explicitly picked (personal invites)
    pub selected_friends: Vec<String>,
}

/// Partial update; only the provided fields are merged into the document.
#[derive(Debug, Clone, Default)]
pub struct PinPatch {
    pub title: Option<String>,
    pub note: Option<String>,
    pub location: Option<Coordinates>,
    pub address: Option<String>,
    pub hangout_time: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub visible_to: Option<Vec<String>>,
}

impl PinPatch {
    /// Field paths set by this patch, for a field-masked document merge.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.note.is_some() {
            fields.push("note");
        }
        if self.location.is_some() {
            fields.push("location");
        }
        if self.address.is_some() {
            fields.push("address");
        }
        if self.hangout_time.is_some() {
            fields.push("hangout_time");
        }
        if self.expires_at.is_some() {
            fields.push("expires_at");
        }
        if self.visible_to.is_some() {
            fields.push("visible_to");
        }
        fields
    }

    /// Apply the patch to an existing pin, stamping `updated_at`.
    pub fn apply(&self, pin: &mut Pin, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            pin.title = title.clone();
        }
        if let Some(note) = &self.note {
            pin.note = note.clone();
        }
        if let Some(location) = self.location {
            pin.location = location;
        }
        if let Some(address) = &self.address {
            pin.address = Some(address.clone());
        }
        if let Some(hangout_time) = self.hangout_time {
            pin.hangout_time = hangout_time;
        }
        if let Some(expires_at) = self.expires_at {
            pin.expires_at = expires_at;
        }
        if let Some(visible_to) = &self.visible_to {
            pin.visible_to = visible_to.clone();
        }
        pin.updated_at = now;
    }
}

/// Merge the results of the visible-to and created-by queries, keeping each
/// pin exactly once no matter which query branch matched it.
pub fn merge_by_id(primary: Vec<Pin>, secondary: Vec<Pin>) -> Vec<Pin> {
    let mut merged: HashMap<String, Pin> = HashMap::new();
    for pin in primary.into_iter().chain(secondary) {
        merged.entry(pin.id.clone()).or_insert(pin);
    }
    merged.into_values().collect()
}

/// Filter a visible set down to the pins active for `user_id` at `now`.
pub fn filter_active(pins: Vec<Pin>, user_id: &str, now: DateTime<Utc>) -> Vec<Pin> {
    pins.into_iter()
        .filter(|pin| pin.is_active_for(user_id, now))
        .collect()
}

/// Sort newest-first by creation time, tie-broken by id so the in-memory
/// fallback path orders identically to the indexed query.
pub fn sort_newest_first(pins: &mut [Pin]) {
    pins.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}
