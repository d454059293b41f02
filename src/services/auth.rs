// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration and credential checks.

use crate::db::Db;
use crate::error::AppError;
use crate::models::UserIdentity;
use crate::services::password;

/// Why a login or registration was refused.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown username or wrong password; deliberately indistinguishable.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username already exists")]
    DuplicateUsername,

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::App(inner) => inner,
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

/// Service for creating users and checking their credentials.
#[derive(Clone)]
pub struct AuthService {
    db: Db,
    hash_iterations: u32,
}

impl AuthService {
    pub fn new(db: Db, hash_iterations: u32) -> Self {
        Self {
            db,
            hash_iterations,
        }
    }

    /// Create a user with a freshly hashed password.
    ///
    /// Taken usernames are refused before any hashing work; the unique index
    /// still decides between concurrent registrations.
    pub async fn register(&self, username: &str, password: &str) -> Result<UserIdentity, AuthError> {
        if self.db.find_user_by_username(username).await?.is_some() {
            tracing::info!(username, "Registration rejected: username taken");
            return Err(AuthError::DuplicateUsername);
        }

        let encoded = hash_blocking(password.to_string(), self.hash_iterations).await?;

        match self.db.create_user(username, &encoded).await? {
            Some(user) => {
                tracing::info!(user_id = user.id, username, "User registered");
                Ok(UserIdentity::from(&user))
            }
            None => {
                tracing::info!(username, "Registration rejected: username taken");
                Err(AuthError::DuplicateUsername)
            }
        }
    }

    /// Check a username/password pair.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserIdentity, AuthError> {
        let Some(user) = self.db.find_user_by_username(username).await? else {
            // Spend the same hashing work as a real check so response time
            // does not reveal which usernames exist.
            hash_blocking(password.to_string(), self.hash_iterations).await?;
            tracing::info!("Login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let supplied = password.to_string();
        let stored = user.password_hash.clone();
        let verified =
            tokio::task::spawn_blocking(move || password::verify_password(&supplied, &stored))
                .await
                .map_err(|e| AppError::Internal(anyhow::anyhow!("Password check panicked: {e}")))?;

        if verified {
            tracing::info!(user_id = user.id, "Login succeeded");
            Ok(UserIdentity::from(&user))
        } else {
            tracing::info!("Login rejected");
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Current identity for a user id, `None` if the user no longer exists.
    pub async fn resolve(&self, user_id: i64) -> Result<Option<UserIdentity>, AppError> {
        Ok(self
            .db
            .get_user(user_id)
            .await?
            .map(|user| UserIdentity::from(&user)))
    }
}

/// PBKDF2 is CPU bound; keep it off the async workers.
async fn hash_blocking(password: String, iterations: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || password::hash_password(&password, iterations))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing panicked: {e}")))?
        .map_err(AppError::Internal)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> AuthService {
        AuthService::new(Db::in_memory().await.unwrap(), 1_000)
    }

    #[tokio::test]
    async fn test_register_then_authenticate() {
        let auth = service().await;

        let registered = auth.register("alice", "s3cret").await.unwrap();
        let logged_in = auth.authenticate("alice", "s3cret").await.unwrap();

        assert_eq!(registered, logged_in);
        assert_eq!(logged_in.username, "alice");
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let auth = service().await;
        auth.register("alice", "one").await.unwrap();

        let err = auth.register("alice", "two").await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUsername));

        // The original password still works, the second one never stored.
        assert!(auth.authenticate("alice", "one").await.is_ok());
        assert!(auth.authenticate("alice", "two").await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_registration_skips_hashing() {
        let db = Db::in_memory().await.unwrap();
        AuthService::new(db.clone(), 1_000)
            .register("alice", "one")
            .await
            .unwrap();

        // Zero iterations cannot hash, so only the early check can answer.
        let unhashable = AuthService::new(db, 0);
        let err = unhashable.register("alice", "two").await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUsername));

        let err = unhashable.register("bob", "two").await.unwrap_err();
        assert!(matches!(err, AuthError::App(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_the_same() {
        let auth = service().await;
        auth.register("alice", "s3cret").await.unwrap();

        let wrong = auth.authenticate("alice", "nope").await.unwrap_err();
        let unknown = auth.authenticate("bob", "s3cret").await.unwrap_err();

        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_username_match_is_exact() {
        let auth = service().await;
        auth.register("alice", "s3cret").await.unwrap();

        assert!(auth.authenticate("Alice", "s3cret").await.is_err());
    }

    #[tokio::test]
    async fn test_resolve() {
        let auth = service().await;
        let user = auth.register("alice", "s3cret").await.unwrap();

        assert_eq!(auth.resolve(user.id).await.unwrap(), Some(user));
        assert_eq!(auth.resolve(999).await.unwrap(), None);
    }
}
