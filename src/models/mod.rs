// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod comment;
pub mod friendship;
pub mod pin;
pub mod profile;

pub use comment::Comment;
pub use friendship::{friendship_id, FriendRequestView, Friendship, FriendshipStatus};
pub use pin::{Coordinates, Pin, PinDraft, PinPatch};
pub use profile::{
    NotificationPreferences, Preferences, PrivacyPatch, PrivacySettings, ProfilePatch, UserProfile,
    UserSummary,
};
