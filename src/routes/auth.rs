// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login, registration and logout.

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Extension, Form, Router,
};
use std::sync::Arc;

use crate::error::Result;
use crate::forms::{self, FormErrors, Submission, CSRF_FIELD};
use crate::middleware::auth::{AuthUser, LOGIN_PATH};
use crate::middleware::session::{CurrentSession, SessionRenewed};
use crate::models::{LoginForm, RegistrationForm};
use crate::routes::check_csrf;
use crate::services::{AuthError, FlashLevel};
use crate::views::{self, FieldView};
use crate::AppState;

/// Where a successful login lands.
const HOME_AFTER_LOGIN: &str = "/workouts";
const REGISTER_PATH: &str = "/register";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(LOGIN_PATH, get(login_page).post(login))
        .route(REGISTER_PATH, get(register_page).post(register))
}

/// Routes that need a logged-in user.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/logout", get(logout))
}

/// Render the login or registration page.
///
/// The username is shown back; the password never is.
fn render_credentials(
    state: &AppState,
    session: &CurrentSession,
    template: &str,
    username: &str,
    errors: &FormErrors,
) -> Result<Html<String>> {
    let fields = [
        FieldView {
            name: "username",
            label: "Username",
            input_type: "text",
            input_mode: "text",
            value: username.to_string(),
            errors: errors.for_field("username"),
        },
        FieldView {
            name: "password",
            label: "Password",
            input_type: "password",
            input_mode: "text",
            value: String::new(),
            errors: errors.for_field("password"),
        },
    ];

    let mut context = views::form_page_context(session)?;
    context.insert("fields", &fields);
    context.insert("form_errors", errors.for_field(CSRF_FIELD));
    state.templates.render(template, &context)
}

// ─── Login ───────────────────────────────────────────────────

async fn login_page(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Html<String>> {
    render_credentials(&state, &session, "login.html", "", &FormErrors::default())
}

async fn login(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
    Form(submission): Form<Submission<LoginForm>>,
) -> Result<Response> {
    let form = submission.fields;

    if let Err(errors) =
        check_csrf(&session, &submission.csrf_token).and_then(|()| forms::check(&form))
    {
        return Ok(
            render_credentials(&state, &session, "login.html", &form.username, &errors)?
                .into_response(),
        );
    }

    match state.auth.authenticate(&form.username, &form.password).await {
        Ok(user) => {
            let sid = session.login(user)?;
            state
                .sessions
                .push_flash(&sid, FlashLevel::Success, "Login successful!");
            Ok((Extension(SessionRenewed(sid)), Redirect::to(HOME_AFTER_LOGIN)).into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            session.push_flash(
                FlashLevel::Danger,
                "Login failed. Check your username and/or password.",
            )?;
            Ok(render_credentials(
                &state,
                &session,
                "login.html",
                &form.username,
                &FormErrors::default(),
            )?
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// ─── Registration ────────────────────────────────────────────

async fn register_page(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Html<String>> {
    render_credentials(&state, &session, "register.html", "", &FormErrors::default())
}

async fn register(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<CurrentSession>,
    Form(submission): Form<Submission<RegistrationForm>>,
) -> Result<Response> {
    let form = submission.fields;

    if let Err(errors) =
        check_csrf(&session, &submission.csrf_token).and_then(|()| forms::check(&form))
    {
        return Ok(
            render_credentials(&state, &session, "register.html", &form.username, &errors)?
                .into_response(),
        );
    }

    match state.auth.register(&form.username, &form.password).await {
        Ok(_) => {
            session.push_flash(
                FlashLevel::Success,
                "Registration successful! You can now log in.",
            )?;
            Ok(Redirect::to(LOGIN_PATH).into_response())
        }
        Err(AuthError::DuplicateUsername) => {
            session.push_flash(
                FlashLevel::Danger,
                "Username already exists. Please choose a different one.",
            )?;
            Ok(Redirect::to(REGISTER_PATH).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// ─── Logout ──────────────────────────────────────────────────

async fn logout(
    Extension(session): Extension<CurrentSession>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Redirect> {
    session.logout();
    tracing::info!(user_id = user.id, "User logged out");

    session.push_flash(FlashLevel::Success, "You have been logged out.")?;
    Ok(Redirect::to(LOGIN_PATH))
}
