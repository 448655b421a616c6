//! Shared setup for the HTTP tests.
//!
//! Builds the full router over in-memory stores, a mock session store and
//! a fixed clock, and drives it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)] // Each test binary uses a different subset
#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use rifa_auth::mocks::MockSessionStore;
use rifa_auth::{AuthConfig, Session, SessionToken};
use rifa_core::environment::Clock;
use rifa_core::store::UserStore;
use rifa_core::{Role, User};
use rifa_server::{AppState, build_router};
use rifa_testing::{Harness, fixtures};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

/// A response with its body parsed as JSON (`Null` when empty).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// The router plus handles on everything behind it.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub harness: Harness,
    pub sessions: MockSessionStore,
}

impl TestApp {
    pub fn new() -> Self {
        let harness = Harness::new();
        let sessions = MockSessionStore::new();
        let state = AppState::new(
            &harness.stores,
            Arc::new(sessions.clone()),
            harness.clock.clone(),
            AuthConfig::default(),
        );
        let router = build_router(state.clone(), Path::new("does-not-exist/uploads"), &[]);
        Self {
            router,
            state,
            harness,
            sessions,
        }
    }

    /// Seed an account and a live session for it, skipping password hashing.
    pub async fn user_with_token(&self, username: &str, role: Role) -> (User, String) {
        let user = self
            .harness
            .stores
            .users
            .insert(fixtures::user(username, role))
            .await
            .expect("seed user");
        let token = SessionToken::generate();
        let session = Session::starting(user.id, self.harness.clock.now(), chrono::Duration::days(1));
        self.sessions.insert_raw(&token, session).expect("seed session");
        (user, token.as_str().to_string())
    }

    pub async fn token(&self, role: Role) -> String {
        let username = format!("{role}_account");
        self.user_with_token(&username, role).await.1
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse { status, headers, body }
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Create a raffle as an admin and initialize its pool; returns its ID.
    pub async fn initialized_raffle(&self, admin_token: &str, name: &str, total: u32) -> String {
        let created = self
            .post(
                "/api/raffles",
                Some(admin_token),
                serde_json::json!({ "name": name, "total_tickets": total, "ticket_price": 500 }),
            )
            .await;
        assert_eq!(created.status, StatusCode::CREATED, "create raffle: {:?}", created.body);
        let id = created.body["id"].as_str().expect("raffle id").to_string();

        let initialized = self
            .post(&format!("/api/raffles/{id}/tickets/initialize"), Some(admin_token), Value::Null)
            .await;
        assert_eq!(initialized.status, StatusCode::OK, "initialize: {:?}", initialized.body);
        id
    }
}
