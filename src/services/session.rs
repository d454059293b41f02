// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side session store.
//!
//! A session holds the logged-in user (if any), the CSRF token embedded in
//! rendered forms, and a queue of one-shot flash messages that the next
//! rendered page drains. The browser only ever sees a signed reference to
//! the session id (see `middleware::session`).

use crate::forms::{CSRF_INVALID, CSRF_MISSING};
use crate::models::UserIdentity;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use serde::Serialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;

const TOKEN_BYTES: usize = 32;

/// Severity of a flash message, used as a CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Danger,
    Info,
}

/// A one-shot notification shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

#[derive(Debug)]
struct SessionData {
    user: Option<UserIdentity>,
    csrf_token: String,
    flashes: Vec<Flash>,
    expires_at: DateTime<Utc>,
}

/// Concurrent in-memory session registry shared by all requests.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, SessionData>>,
    rng: SystemRandom,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            rng: SystemRandom::new(),
            ttl,
        }
    }

    /// Lifetime of a session from its creation.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start an anonymous session and return its id.
    pub fn create(&self) -> anyhow::Result<String> {
        self.insert(None, Vec::new())
    }

    fn insert(&self, user: Option<UserIdentity>, flashes: Vec<Flash>) -> anyhow::Result<String> {
        self.prune_expired();

        let id = self.random_token()?;
        let data = SessionData {
            user,
            csrf_token: self.random_token()?,
            flashes,
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions.insert(id.clone(), data);
        tracing::debug!(sessions = self.len(), "Session stored");
        Ok(id)
    }

    fn random_token(&self) -> anyhow::Result<String> {
        let mut bytes = [0u8; TOKEN_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| anyhow::anyhow!("System random generator failed"))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Run `f` on a live session; expired sessions are dropped on the way.
    fn with_session<T>(&self, id: &str, f: impl FnOnce(&mut SessionData) -> T) -> Option<T> {
        let mut entry = self.sessions.get_mut(id)?;
        if entry.expires_at <= Utc::now() {
            drop(entry);
            self.sessions.remove(id);
            return None;
        }
        Some(f(entry.value_mut()))
    }

    fn prune_expired(&self) {
        let now = Utc::now();
        self.sessions.retain(|_, data| data.expires_at > now);
    }

    /// Whether `id` names a live session.
    pub fn is_active(&self, id: &str) -> bool {
        self.with_session(id, |_| ()).is_some()
    }

    /// User bound to the session, if logged in.
    pub fn user(&self, id: &str) -> Option<UserIdentity> {
        self.with_session(id, |data| data.user.clone()).flatten()
    }

    pub fn csrf_token(&self, id: &str) -> Option<String> {
        self.with_session(id, |data| data.csrf_token.clone())
    }

    /// Compare a submitted CSRF token with the session's, in constant time.
    ///
    /// The error is the message to show next to the form.
    pub fn verify_csrf(&self, id: &str, submitted: &str) -> Result<(), &'static str> {
        if submitted.is_empty() {
            return Err(CSRF_MISSING);
        }
        let expected = self.csrf_token(id).ok_or(CSRF_INVALID)?;
        if bool::from(expected.as_bytes().ct_eq(submitted.as_bytes())) {
            Ok(())
        } else {
            Err(CSRF_INVALID)
        }
    }

    /// Queue a flash message for the next rendered page.
    pub fn push_flash(&self, id: &str, level: FlashLevel, message: impl Into<String>) {
        let message = message.into();
        if self
            .with_session(id, |data| {
                data.flashes.push(Flash {
                    level,
                    message: message.clone(),
                })
            })
            .is_none()
        {
            tracing::debug!(message = %message, "Dropping flash for unknown session");
        }
    }

    /// Remove and return all queued flash messages.
    pub fn take_flashes(&self, id: &str) -> Vec<Flash> {
        self.with_session(id, |data| std::mem::take(&mut data.flashes))
            .unwrap_or_default()
    }

    /// Bind `user` to a fresh session replacing `previous`, if any.
    ///
    /// Returns the new session id. Pending flash messages move along; the old
    /// id and its CSRF token stop working.
    pub fn login(&self, previous: Option<&str>, user: UserIdentity) -> anyhow::Result<String> {
        let flashes = previous
            .and_then(|id| self.sessions.remove(id))
            .map(|(_, data)| data.flashes)
            .unwrap_or_default();
        self.insert(Some(user), flashes)
    }

    /// Forget the user bound to the session, keeping the session itself.
    pub fn logout(&self, id: &str) {
        self.with_session(id, |data| data.user = None);
    }

    /// Number of stored sessions, live or not yet pruned.
    ///
    /// Logged when a session starts; tests use it to watch the store size.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
