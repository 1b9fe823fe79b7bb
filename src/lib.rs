// SPDX-License-Identifier: MIT

//! Just Hangin: backend API for time-bounded hangout pins.
//!
//! This crate provides the backend for dropping location pins with a start and
//! expiry time, sharing them with a visible-to set of friends, checking in,
//! commenting, and managing friendships.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{AvatarCache, FirebaseTokenVerifier, NotificationDispatcher, SessionManager};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub verifier: Arc<FirebaseTokenVerifier>,
    pub notifier: NotificationDispatcher,
    pub avatars: AvatarCache,
    pub sessions: SessionManager<FirestoreDb>,
}
