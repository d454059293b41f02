// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User model and the login/registration forms.

use crate::forms;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    /// Unique login name
    pub username: String,
    /// Encoded PBKDF2 hash, see `services::password`
    pub password_hash: String,
    /// Registration time (RFC 3339)
    pub created_at: String,
}

/// The part of a user a session is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserIdentity {
    pub id: i64,
    pub username: String,
}

impl From<&User> for UserIdentity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// Login form as submitted. Passwords are taken verbatim.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default, deserialize_with = "forms::trimmed")]
    #[validate(
        custom(function = "forms::validate_required"),
        length(max = 100, message = "Field cannot be longer than 100 characters.")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(
        custom(function = "forms::validate_required"),
        length(max = 100, message = "Field cannot be longer than 100 characters.")
    )]
    pub password: String,
}

/// Registration form as submitted.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegistrationForm {
    #[serde(default, deserialize_with = "forms::trimmed")]
    #[validate(
        custom(function = "forms::validate_required"),
        length(max = 100, message = "Field cannot be longer than 100 characters.")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(
        custom(function = "forms::validate_required"),
        length(max = 100, message = "Field cannot be longer than 100 characters.")
    )]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::{check, REQUIRED};

    #[test]
    fn test_registration_requires_both_fields() {
        let errors = check(&RegistrationForm::default()).unwrap_err();

        assert_eq!(errors.for_field("username"), [REQUIRED.to_string()]);
        assert_eq!(errors.for_field("password"), [REQUIRED.to_string()]);
    }

    #[test]
    fn test_login_password_keeps_whitespace() {
        let form = LoginForm {
            username: "alice".to_string(),
            password: "  ".to_string(),
        };

        assert!(check(&form).is_ok());
    }
}
