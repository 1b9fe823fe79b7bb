// SPDX-License-Identifier: MIT

//! Business logic services.

pub mod avatars;
pub mod identity;
pub mod notify;
pub mod session;

pub use avatars::AvatarCache;
pub use identity::{FirebaseTokenVerifier, IdentityError, VerifiedIdentity};
pub use notify::NotificationDispatcher;
pub use session::{MapSession, PinSource, RefreshPolicy, SessionManager, SessionSnapshot};
