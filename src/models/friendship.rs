// SPDX-License-Identifier: MIT

//! Friendship model keyed by the unordered user pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::flexible_time;

/// Deterministic document ID for an unordered user pair.
///
/// The sorted, underscore-joined concatenation guarantees at most one
/// friendship document per pair: `friendship_id(a, b) == friendship_id(b, a)`.
pub fn friendship_id(a: &str, b: &str) -> String {
    let mut pair = [a, b];
    pair.sort();
    pair.join("_")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Friendship document stored in `friendships/{a_b}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Friendship {
    pub id: String,
    /// The unordered pair, as written (sender first)
    pub users: Vec<String>,
    pub sender_id: String,
    pub receiver_id: String,
    pub status: FriendshipStatus,
    #[serde(with = "flexible_time")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_time")]
    pub updated_at: DateTime<Utc>,
}

impl Friendship {
    /// The member of the pair that is not `user_id`, if any.
    pub fn other_user(&self, user_id: &str) -> Option<&str> {
        self.users
            .iter()
            .map(String::as_str)
            .find(|id| *id != user_id)
    }
}

/// A pending request enriched with the sender's display info for the
/// requests screen.
#[derive(Debug, Clone, Serialize)]
pub struct FriendRequestView {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub status: FriendshipStatus,
    pub display_name: String,
    pub photo_url: String,
    pub created_at: String,
}
