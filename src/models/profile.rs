// SPDX-License-Identifier: MIT

//! User profile model with preferences and privacy settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::flexible_time;

/// Per-category push notification toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPreferences {
    /// Master switch; when false nothing is delivered
    pub enabled: bool,
    /// Hangouts the user was explicitly invited to
    pub personal_invites: bool,
    /// Hangouts a friend shared with their default visibility set
    pub friend_hangouts: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            personal_invites: true,
            friend_hangouts: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default)]
    pub notifications: NotificationPreferences,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_mode: false,
            notifications: NotificationPreferences::default(),
        }
    }
}

/// Three independent privacy toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivacySettings {
    pub share_location_with_friends: bool,
    pub allow_friend_requests: bool,
    pub show_active_status: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            share_location_with_friends: true,
            allow_friend_requests: true,
            show_active_status: true,
        }
    }
}

/// User profile stored in `users/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub photo_url: String,
    /// Free-text home location
    #[serde(default)]
    pub location: String,
    /// Expo push token registered by the mobile app, if any
    #[serde(default)]
    pub push_token: Option<String>,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub privacy_settings: PrivacySettings,
    #[serde(with = "flexible_time")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_time")]
    pub updated_at: DateTime<Utc>,
    #[serde(with = "flexible_time")]
    pub last_active: DateTime<Utc>,
}

/// Partial profile update; only provided fields are merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub location: Option<String>,
    pub push_token: Option<String>,
    pub preferences: Option<Preferences>,
    pub privacy_settings: Option<PrivacySettings>,
}

impl ProfilePatch {
    pub fn apply(&self, profile: &mut UserProfile, now: DateTime<Utc>) {
        if let Some(display_name) = &self.display_name {
            profile.display_name = display_name.clone();
        }
        if let Some(photo_url) = &self.photo_url {
            profile.photo_url = photo_url.clone();
        }
        if let Some(location) = &self.location {
            profile.location = location.clone();
        }
        if let Some(push_token) = &self.push_token {
            profile.push_token = Some(push_token.clone());
        }
        if let Some(preferences) = &self.preferences {
            profile.preferences = preferences.clone();
        }
        if let Some(privacy_settings) = &self.privacy_settings {
            profile.privacy_settings = privacy_settings.clone();
        }
        profile.updated_at = now;
    }
}

/// Partial privacy update; unset toggles keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrivacyPatch {
    pub share_location_with_friends: Option<bool>,
    pub allow_friend_requests: Option<bool>,
    pub show_active_status: Option<bool>,
}

impl PrivacyPatch {
    pub fn apply(&self, settings: &mut PrivacySettings) {
        if let Some(share) = self.share_location_with_friends {
            settings.share_location_with_friends = share;
        }
        if let Some(allow) = self.allow_friend_requests {
            settings.allow_friend_requests = allow;
        }
        if let Some(show) = self.show_active_status {
            settings.show_active_status = show;
        }
    }
}

/// Narrow view returned by user search.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: String,
    pub display_name: String,
    pub photo_url: String,
}

/// Relevance order for search results: exact match, then prefix match, then
/// remaining substring matches lexicographically.
pub fn rank_search_results(results: &mut [UserSummary], query: &str) {
    let needle = query.to_lowercase();
    results.sort_by(|a, b| {
        let a_name = a.display_name.to_lowercase();
        let b_name = b.display_name.to_lowercase();
        let rank = |name: &str| {
            if name == needle {
                0
            } else if name.starts_with(&needle) {
                1
            } else {
                2
            }
        };
        rank(&a_name).cmp(&rank(&b_name)).then(a_name.cmp(&b_name))
    });
}
