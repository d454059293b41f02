// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Form submission plumbing shared by every HTML form.
//!
//! Validation itself is pure: a form struct derives [`validator::Validate`]
//! and [`check`] turns the outcome into [`FormErrors`], keyed by field name,
//! so a rejected form can be rendered again with its messages.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationError, ValidationErrors};

pub const REQUIRED: &str = "This field is required.";
pub const TOO_LONG: &str = "Field cannot be longer than 100 characters.";
pub const NOT_AN_INTEGER: &str = "Not a valid integer value.";
pub const CSRF_MISSING: &str = "The CSRF token is missing.";
pub const CSRF_INVALID: &str = "The CSRF token is invalid.";

/// Field name the CSRF token is submitted under.
pub const CSRF_FIELD: &str = "csrf_token";

/// Validation errors collected per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    /// Errors carrying a single message for one field.
    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    /// Messages recorded for `field` (empty when the field is valid).
    pub fn for_field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names of the fields that failed.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FormErrors::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                out.add(&field, &message);
            }
        }
        out
    }
}

/// Run the derived validation rules of `form`.
pub fn check<F: Validate>(form: &F) -> Result<(), FormErrors> {
    form.validate().map_err(FormErrors::from)
}

/// Parse an integer field that already passed [`validate_integer`].
pub fn parse_integer(field: &str, raw: &str) -> Result<i64, FormErrors> {
    raw.parse()
        .map_err(|_| FormErrors::single(field, NOT_AN_INTEGER))
}

/// `validator` hook: the value must not be empty.
pub fn validate_required(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        Err(ValidationError::new("required").with_message(REQUIRED.into()))
    } else {
        Ok(())
    }
}

/// `validator` hook: the value is required and must parse as an integer.
pub fn validate_integer(value: &str) -> Result<(), ValidationError> {
    validate_required(value)?;
    value
        .parse::<i64>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("integer").with_message(NOT_AN_INTEGER.into()))
}

/// Deserialize a form value with surrounding whitespace removed.
pub fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().to_string())
}

/// A submitted form: the CSRF token plus the form's own fields.
#[derive(Debug, Deserialize)]
pub struct Submission<T> {
    #[serde(default)]
    pub csrf_token: String,
    #[serde(flatten)]
    pub fields: T,
}

/// Body of a form that carries nothing but the CSRF token.
#[derive(Debug, Default, Deserialize)]
pub struct CsrfOnly {
    #[serde(default)]
    pub csrf_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize, Validate)]
    struct SampleForm {
        #[serde(default, deserialize_with = "trimmed")]
        #[validate(
            custom(function = "validate_required"),
            length(max = 100, message = "Field cannot be longer than 100 characters.")
        )]
        name: String,
        #[serde(default, deserialize_with = "trimmed")]
        #[validate(custom(function = "validate_integer"))]
        count: String,
    }

    #[test]
    fn test_validate_integer() {
        assert!(validate_integer("30").is_ok());
        assert!(validate_integer("-5").is_ok());
        assert!(validate_integer("").is_err());
        assert!(validate_integer("3.5").is_err());
        assert!(validate_integer("thirty").is_err());
    }

    #[test]
    fn test_check_collects_errors_per_field() {
        let form = SampleForm {
            name: String::new(),
            count: "abc".to_string(),
        };

        let errors = check(&form).unwrap_err();
        assert_eq!(errors.for_field("name"), [REQUIRED.to_string()]);
        assert_eq!(errors.for_field("count"), [NOT_AN_INTEGER.to_string()]);
        assert_eq!(errors.fields().count(), 2);
    }

    #[test]
    fn test_empty_integer_reports_required_only() {
        let form = SampleForm {
            name: "ok".to_string(),
            count: String::new(),
        };

        let errors = check(&form).unwrap_err();
        assert_eq!(errors.for_field("count"), [REQUIRED.to_string()]);
        assert!(errors.for_field("name").is_empty());
    }

    #[test]
    fn test_text_length_limit_counts_characters() {
        let form = SampleForm {
            name: "é".repeat(100),
            count: "1".to_string(),
        };
        assert!(check(&form).is_ok());

        let form = SampleForm {
            name: "a".repeat(101),
            count: "1".to_string(),
        };
        let errors = check(&form).unwrap_err();
        assert_eq!(errors.for_field("name"), [TOO_LONG.to_string()]);
    }

    #[tokio::test]
    async fn test_submission_splits_csrf_from_fields() {
        let submission: Submission<SampleForm> =
            parse_form("csrf_token=tok&name=+Run+&count=30").await;

        assert_eq!(submission.csrf_token, "tok");
        assert_eq!(submission.fields.name, "Run");
        assert_eq!(submission.fields.count, "30");
    }

    #[tokio::test]
    async fn test_submission_missing_fields_default_to_empty() {
        let submission: Submission<SampleForm> = parse_form("name=Run").await;

        assert!(submission.csrf_token.is_empty());
        assert!(submission.fields.count.is_empty());
    }

    async fn parse_form<T: serde::de::DeserializeOwned>(body: &str) -> T {
        use axum::extract::FromRequest;

        let request = axum::http::Request::builder()
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap();

        axum::Form::<T>::from_request(request, &())
            .await
            .unwrap()
            .0
    }
}
