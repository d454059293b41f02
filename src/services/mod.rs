// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod password;
pub mod session;

pub use auth::{AuthError, AuthService};
pub use session::{Flash, FlashLevel, SessionStore};
