// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent HTML error pages.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<tera::Error> for AppError {
    fn from(err: tera::Error) -> Self {
        // Tera hides the interesting part in the source chain.
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        AppError::Template(message)
    }
}

impl AppError {
    /// Status code and user-facing title for this error.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad Request"),
            AppError::Database(_) | AppError::Template(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::NotFound(msg) => tracing::debug!(detail = %msg, "Not found"),
            AppError::BadRequest(msg) => tracing::warn!(detail = %msg, "Bad request"),
            AppError::Database(msg) => tracing::error!(error = %msg, "Database error"),
            AppError::Template(msg) => tracing::error!(error = %msg, "Template error"),
            AppError::Internal(err) => tracing::error!(error = %err, "Internal server error"),
        }

        let (status, title) = self.status();

        // Details stay in the logs; the page only names the status.
        let body = format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
             <body><h1>{code} {title}</h1><p><a href=\"/\">Back to the home page</a></p></body>\n</html>\n",
            code = status.as_u16(),
        );

        (status, Html(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
