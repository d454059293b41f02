// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Fitness Tracker: log workouts, meals and activities
//!
//! This crate provides a small server-rendered web application with
//! session-cookie authentication on top of a SQLite store.

pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod views;

use config::Config;
use db::Db;
use error::AppError;
use services::{AuthService, SessionStore};
use views::Templates;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub sessions: SessionStore,
    pub auth: AuthService,
    pub templates: Templates,
}

impl AppState {
    /// Wire the services around an opened database.
    pub fn new(config: Config, db: Db) -> Result<Self, AppError> {
        let sessions = SessionStore::new(chrono::Duration::hours(config.session_ttl_hours));
        let auth = AuthService::new(db.clone(), config.password_hash_iterations);
        let templates = Templates::new()?;

        Ok(Self {
            config,
            db,
            sessions,
            auth,
            templates,
        })
    }
}
