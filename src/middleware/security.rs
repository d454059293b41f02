// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Security headers for the HTML pages.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Pages use inline styles only and post forms back to this origin.
pub const CONTENT_SECURITY_POLICY: &str =
    "default-src 'none'; style-src 'self' 'unsafe-inline'; form-action 'self'; frame-ancestors 'none'";

const PERMISSIONS_POLICY: &str = "camera=(), geolocation=(), microphone=(), payment=()";

/// Header names are lowercase, as `HeaderName::from_static` requires.
const PAGE_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("content-security-policy", CONTENT_SECURITY_POLICY),
    ("referrer-policy", "no-referrer"),
    ("permissions-policy", PERMISSIONS_POLICY),
];

/// Only sent when cookies are `Secure`, i.e. the site is served over HTTPS.
const STRICT_TRANSPORT_SECURITY: &str = "max-age=31536000; includeSubDomains";

/// Add security headers to all responses.
pub async fn add_security_headers(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    for &(name, value) in PAGE_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    if state.config.cookie_secure {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(STRICT_TRANSPORT_SECURITY),
        );
    }

    // Pages embed per-session CSRF tokens and user data.
    headers
        .entry(header::CACHE_CONTROL)
        .or_insert(HeaderValue::from_static("no-store"));

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::Db;
    use axum::body::Body;
    use axum::{routing::get, Router};
    use tower::ServiceExt; // for oneshot

    async fn app(cookie_secure: bool) -> Router {
        let config = Config {
            cookie_secure,
            ..Config::test_default()
        };
        let db = Db::in_memory().await.unwrap();
        let state = Arc::new(AppState::new(config, db).unwrap());

        Router::new()
            .route("/", get(|| async { "<h1>Fitness</h1>" }))
            .route(
                "/cached",
                get(|| async { ([(header::CACHE_CONTROL, "max-age=60")], "ok") }),
            )
            .layer(axum::middleware::from_fn_with_state(
                state,
                add_security_headers,
            ))
    }

    async fn get_headers(app: Router, uri: &str) -> axum::http::HeaderMap {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .headers()
            .clone()
    }

    #[tokio::test]
    async fn test_security_headers_on_html_pages() {
        let headers = get_headers(app(false).await, "/").await;

        assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
        assert_eq!(headers.get("X-Frame-Options").unwrap(), "DENY");
        assert_eq!(
            headers.get("Content-Security-Policy").unwrap(),
            CONTENT_SECURITY_POLICY
        );
        assert_eq!(headers.get("Referrer-Policy").unwrap(), "no-referrer");
        assert_eq!(
            headers.get("Permissions-Policy").unwrap(),
            PERMISSIONS_POLICY
        );
        assert_eq!(headers.get("Cache-Control").unwrap(), "no-store");
        assert!(headers.get("Strict-Transport-Security").is_none());
    }

    #[tokio::test]
    async fn test_hsts_only_with_secure_cookies() {
        let headers = get_headers(app(true).await, "/").await;

        assert_eq!(
            headers.get("Strict-Transport-Security").unwrap(),
            STRICT_TRANSPORT_SECURITY
        );
    }

    #[tokio::test]
    async fn test_handler_cache_control_kept() {
        let headers = get_headers(app(false).await, "/cached").await;

        assert_eq!(headers.get("Cache-Control").unwrap(), "max-age=60");
    }
}
