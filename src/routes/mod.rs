// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod auth;
pub mod pages;
pub mod records;

use crate::error::AppError;
use crate::forms::{FormErrors, CSRF_FIELD};
use crate::middleware::{load_session, require_auth, session::CurrentSession};
use crate::models::{Activity, Meal, Workout};
use crate::AppState;
use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .merge(pages::routes())
        .merge(auth::routes());

    // Protected routes (login required)
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(records::routes::<Workout>())
        .merge(records::routes::<Meal>())
        .merge(records::routes::<Activity>())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), load_session))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::security::add_security_headers,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound("no such route".to_string())
}

/// CSRF check for a form submission, as a form-level error.
pub(crate) fn check_csrf(session: &CurrentSession, submitted: &str) -> Result<(), FormErrors> {
    session.verify_csrf(submitted).map_err(|message| {
        tracing::warn!(reason = message, "Rejected form with bad CSRF token");
        FormErrors::single(CSRF_FIELD, message)
    })
}
