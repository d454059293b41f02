// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login-required middleware.

use crate::error::AppError;
use crate::middleware::session::CurrentSession;
use crate::models::UserIdentity;
use crate::services::FlashLevel;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

pub const LOGIN_PATH: &str = "/login";

/// Authenticated user, available to protected handlers as an extension.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserIdentity);

/// Middleware that requires a logged-in session.
///
/// Anonymous requests are redirected to the login page before the handler
/// runs. Sessions whose user was removed from the database count as
/// anonymous.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(session) = request.extensions().get::<CurrentSession>().cloned() else {
        tracing::error!("require_auth used without the session layer");
        return Redirect::to(LOGIN_PATH).into_response();
    };

    let user = match session.user() {
        Some(identity) => match state.auth.resolve(identity.id).await {
            Ok(user) => user,
            Err(e) => return e.into_response(),
        },
        None => None,
    };

    match user {
        Some(user) => {
            request.extensions_mut().insert(AuthUser(user));
            next.run(request).await
        }
        None => {
            tracing::debug!(path = %request.uri().path(), "Anonymous request to protected route");
            if let Err(e) =
                session.push_flash(FlashLevel::Info, "Please log in to access this page.")
            {
                return AppError::Internal(e).into_response();
            }
            Redirect::to(LOGIN_PATH).into_response()
        }
    }
}
