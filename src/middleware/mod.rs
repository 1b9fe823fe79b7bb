// SPDX-License-Identifier: MIT

//! Middleware modules.

pub mod auth;
pub mod security;

pub use auth::require_auth;
