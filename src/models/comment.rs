// SPDX-License-Identifier: MIT

//! Comments attached to a pin.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::flexible_time;

/// Comment document stored in `comments/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub pin_id: String,
    /// Author; the only user allowed to edit or delete the comment
    pub user_id: String,
    pub text: String,
    #[serde(with = "flexible_time")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_time")]
    pub updated_at: DateTime<Utc>,
}

/// Sort newest-first by creation time, tie-broken by id.
///
/// Used by the missing-index fallback path; must order identically to the
/// server-side `created_at` descending query.
pub fn sort_newest_first(comments: &mut [Comment]) {
    comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}
