//! Database layer (Firestore).

pub mod comments;
pub mod firestore;
pub mod friends;
pub mod pins;
pub mod profiles;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const FRIENDSHIPS: &str = "friendships";
    pub const LOCATION_PINS: &str = "location_pins";
    pub const COMMENTS: &str = "comments";
}
