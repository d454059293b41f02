// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie middleware.
//!
//! The cookie holds an HS256 JWT whose `sid` claim names a session in the
//! [`SessionStore`](crate::services::SessionStore). Requests without a usable
//! cookie get a fresh anonymous session.

use crate::forms::{CSRF_INVALID, CSRF_MISSING};
use crate::models::UserIdentity;
use crate::services::{Flash, FlashLevel, SessionStore};
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

pub const SESSION_COOKIE: &str = "fitness_session";

/// Session token claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Session id
    pub sid: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Session the current request belongs to.
///
/// Requests without a live session start out anonymous and stay that way
/// unless the handler needs server-side state (a CSRF token to embed or a
/// flash to queue); only then is a session created and its cookie sent.
#[derive(Clone)]
pub struct CurrentSession {
    store: SessionStore,
    id: Arc<OnceLock<String>>,
}

impl CurrentSession {
    pub fn new(store: SessionStore, existing: Option<String>) -> Self {
        let id = match existing {
            Some(sid) => OnceLock::from(sid),
            None => OnceLock::new(),
        };
        Self {
            store,
            id: Arc::new(id),
        }
    }

    /// Session id, if the request has (or has since created) a session.
    pub fn id(&self) -> Option<&str> {
        self.id.get().map(String::as_str)
    }

    /// Session id, creating the session on first use.
    pub fn ensure(&self) -> anyhow::Result<&str> {
        if let Some(id) = self.id.get() {
            return Ok(id.as_str());
        }
        let created = self.store.create()?;
        tracing::debug!("Started new session");
        Ok(self.id.get_or_init(|| created).as_str())
    }

    pub fn user(&self) -> Option<UserIdentity> {
        self.id().and_then(|id| self.store.user(id))
    }

    /// Queued flashes, drained. Empty without a session.
    pub fn take_flashes(&self) -> Vec<Flash> {
        self.id()
            .map(|id| self.store.take_flashes(id))
            .unwrap_or_default()
    }

    pub fn push_flash(&self, level: FlashLevel, message: impl Into<String>) -> anyhow::Result<()> {
        let id = self.ensure()?;
        self.store.push_flash(id, level, message);
        Ok(())
    }

    /// CSRF token to embed in a form, creating the session if needed.
    pub fn csrf_token(&self) -> anyhow::Result<String> {
        let id = self.ensure()?;
        Ok(self.store.csrf_token(id).unwrap_or_default())
    }

    /// Check a submitted CSRF token. Without a session no token is valid.
    pub fn verify_csrf(&self, submitted: &str) -> Result<(), &'static str> {
        match self.id() {
            Some(id) => self.store.verify_csrf(id, submitted),
            None if submitted.is_empty() => Err(CSRF_MISSING),
            None => Err(CSRF_INVALID),
        }
    }

    /// Bind `user` to a fresh session; see [`SessionStore::login`].
    pub fn login(&self, user: UserIdentity) -> anyhow::Result<String> {
        self.store.login(self.id(), user)
    }

    pub fn logout(&self) {
        if let Some(id) = self.id() {
            self.store.logout(id);
        }
    }
}

/// Response marker: the handler replaced the session, send its cookie.
#[derive(Debug, Clone)]
pub struct SessionRenewed(pub String);

/// Create a signed token naming session `sid`.
pub fn create_session_token(
    sid: &str,
    signing_key: &[u8],
    ttl: chrono::Duration,
) -> anyhow::Result<String> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = SessionClaims {
        sid: sid.to_string(),
        iat: now,
        exp: now + ttl.num_seconds().max(0) as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Session id from a token, if the signature and expiry check out.
pub fn decode_session_token(token: &str, signing_key: &[u8]) -> Option<String> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims.sid)
        .ok()
}

/// Build the session cookie for `sid`.
fn session_cookie(state: &AppState, sid: &str) -> anyhow::Result<Cookie<'static>> {
    let ttl = state.sessions.ttl();
    let token = create_session_token(sid, &state.config.session_signing_key, ttl)?;

    Ok(Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build())
}

/// Middleware that attaches a [`CurrentSession`] to every request.
///
/// The cookie is sent when the handler created a session or replaced it
/// with [`SessionRenewed`].
pub async fn load_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| decode_session_token(cookie.value(), &state.config.session_signing_key))
        .filter(|sid| state.sessions.is_active(sid));
    let had_session = existing.is_some();

    let session = CurrentSession::new(state.sessions.clone(), existing);
    request.extensions_mut().insert(session.clone());

    let response = next.run(request).await;

    let cookie_sid = match response.extensions().get::<SessionRenewed>() {
        Some(SessionRenewed(renewed)) => Some(renewed.clone()),
        None if !had_session => session.id().map(str::to_string),
        None => None,
    };

    match cookie_sid {
        Some(sid) => match session_cookie(&state, &sid) {
            Ok(cookie) => (jar.add(cookie), response).into_response(),
            Err(e) => crate::error::AppError::Internal(e).into_response(),
        },
        None => response,
    }
}
