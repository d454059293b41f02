// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use fitness_tracker::config::Config;
use fitness_tracker::db::Db;
use fitness_tracker::middleware::session::SESSION_COOKIE;
use fitness_tracker::routes::create_router;
use fitness_tracker::AppState;
use std::sync::Arc;
use tower::ServiceExt;

/// Create a test app backed by a private in-memory database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = Db::in_memory()
        .await
        .expect("Failed to open in-memory database");
    let state = Arc::new(AppState::new(config, db).expect("Failed to build app state"));

    (create_router(state.clone()), state)
}

/// What a test needs from a response.
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub location: Option<String>,
    pub set_cookies: Vec<String>,
    pub body: String,
}

#[allow(dead_code)]
impl TestResponse {
    /// Full `Set-Cookie` value for the session cookie, if any.
    pub fn session_set_cookie(&self) -> Option<&String> {
        self.set_cookies
            .iter()
            .find(|c| c.starts_with(&format!("{SESSION_COOKIE}=")))
    }

    /// `name=value` of the session cookie set by this response, if any.
    pub fn session_cookie(&self) -> Option<String> {
        self.session_set_cookie()
            .map(|c| c.split(';').next().unwrap().to_string())
    }
}

/// Send one request through the router.
#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let location = headers
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let set_cookies = headers
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    TestResponse {
        status,
        headers,
        location,
        set_cookies,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

/// URL-encode form fields.
#[allow(dead_code)]
pub fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Value of the first `csrf_token` hidden input in a page.
#[allow(dead_code)]
pub fn extract_csrf(body: &str) -> String {
    let marker = "name=\"csrf_token\" value=\"";
    let start = body
        .find(marker)
        .unwrap_or_else(|| panic!("no csrf_token field in page: {body}"))
        + marker.len();
    let end = body[start..].find('"').unwrap() + start;
    body[start..end].to_string()
}

/// A browser stand-in that keeps the session cookie between requests.
#[allow(dead_code)]
pub struct Client {
    app: Router,
    cookie: Option<String>,
}

#[allow(dead_code)]
impl Client {
    pub fn new(app: Router) -> Self {
        Self { app, cookie: None }
    }

    /// Session cookie currently held, as `name=value`.
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    async fn send(&mut self, builder: axum::http::request::Builder, body: Body) -> TestResponse {
        let builder = match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        };
        let response = send(&self.app, builder.body(body).unwrap()).await;
        if let Some(cookie) = response.session_cookie() {
            self.cookie = Some(cookie);
        }
        response
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Request::builder().method("GET").uri(uri), Body::empty())
            .await
    }

    /// POST form fields as given, without adding a CSRF token.
    pub async fn post_raw(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded"),
            Body::from(form_body(fields)),
        )
        .await
    }

    /// CSRF token of the current session, read from the page at `form_page`.
    pub async fn csrf(&mut self, form_page: &str) -> String {
        let page = self.get(form_page).await;
        assert_eq!(page.status, StatusCode::OK, "form page {form_page}");
        extract_csrf(&page.body)
    }

    /// POST form fields with the CSRF token of the page at `form_page`.
    pub async fn submit(
        &mut self,
        form_page: &str,
        uri: &str,
        fields: &[(&str, &str)],
    ) -> TestResponse {
        let csrf = self.csrf(form_page).await;

        let mut all = vec![("csrf_token", csrf.as_str())];
        all.extend_from_slice(fields);
        self.post_raw(uri, &all).await
    }

    pub async fn register(&mut self, username: &str, password: &str) -> TestResponse {
        self.submit(
            "/register",
            "/register",
            &[("username", username), ("password", password)],
        )
        .await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        self.submit(
            "/login",
            "/login",
            &[("username", username), ("password", password)],
        )
        .await
    }

    /// Register `username` and log in as that user.
    pub async fn signed_in(app: Router, username: &str) -> Self {
        let mut client = Self::new(app);
        let registered = client.register(username, "correct horse").await;
        assert_eq!(registered.location.as_deref(), Some("/login"));
        let logged_in = client.login(username, "correct horse").await;
        assert_eq!(logged_in.location.as_deref(), Some("/workouts"));
        client
    }
}
