// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (sessions, authentication, security headers).

pub mod auth;
pub mod security;
pub mod session;

pub use auth::require_auth;
pub use session::load_session;
