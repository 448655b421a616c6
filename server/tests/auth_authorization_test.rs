//! Authentication and capability enforcement tests.
//!
//! These tests verify that every protected endpoint rejects anonymous
//! callers with `401`, rejects roles lacking the endpoint's capability with
//! `403`, and lets the right roles through.
//!
//! Run with: `cargo test -p rifa-server --test auth_authorization_test`

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use common::TestApp;
use rifa_auth::{NewAccount, SessionToken};
use rifa_core::Role;
use rifa_core::store::UserStore;
use serde_json::{Value, json};

/// Protected endpoints, each with the body it needs to get past extraction.
fn admin_only_endpoints(raffle_id: &str, user_id: &str) -> Vec<(Method, String, Option<Value>)> {
    vec![
        (
            Method::POST,
            "/api/raffles".to_string(),
            Some(json!({ "name": "Blocked", "total_tickets": 10, "ticket_price": 100 })),
        ),
        (Method::PUT, format!("/api/raffles/{raffle_id}"), Some(json!({ "active": true }))),
        (Method::DELETE, format!("/api/raffles/{raffle_id}"), None),
        (
            Method::POST,
            format!("/api/raffles/{raffle_id}/promotions"),
            Some(json!({ "quantity": 2, "price": 900 })),
        ),
        (Method::POST, format!("/api/raffles/{raffle_id}/tickets/initialize"), None),
        (
            Method::PUT,
            format!("/api/raffles/{raffle_id}/tickets/status"),
            Some(json!({ "numbers": ["000"], "status": "available" })),
        ),
        (Method::GET, "/api/users".to_string(), None),
        (Method::GET, format!("/api/users/{user_id}"), None),
        (
            Method::POST,
            "/api/users".to_string(),
            Some(json!({ "username": "blocked", "password": "password123", "role": "admin" })),
        ),
        (Method::PUT, format!("/api/users/{user_id}"), Some(json!({ "role": "admin" }))),
        (Method::DELETE, format!("/api/users/{user_id}"), None),
        (Method::PUT, "/api/content/hero".to_string(), Some(json!({ "title": "x" }))),
    ]
}

/// Test 1: Anonymous callers get 401 everywhere a capability is required.
#[tokio::test]
async fn test_protected_endpoints_require_a_session() {
    let app = TestApp::new();
    let admin = app.token(Role::Admin).await;
    let raffle_id = app.initialized_raffle(&admin, "Moto", 10).await;
    let (user, _) = app.user_with_token("someone", Role::User).await;

    let mut endpoints = admin_only_endpoints(&raffle_id, &user.id.to_string());
    endpoints.push((
        Method::POST,
        format!("/api/raffles/{raffle_id}/tickets/sell"),
        Some(json!({ "numbers": ["000"], "buyer": { "name": "Ana" } })),
    ));
    endpoints.push((Method::GET, format!("/api/raffles/{raffle_id}/tickets/summary"), None));
    endpoints.push((Method::GET, "/api/auth/profile".to_string(), None));
    endpoints.push((Method::POST, "/api/auth/logout".to_string(), None));

    for (method, uri, body) in endpoints {
        let response = app.request(method.clone(), &uri, None, body).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(response.body["code"], "UNAUTHORIZED", "{method} {uri}");
    }
}

/// Test 2: A `user` token is forbidden from every admin endpoint.
#[tokio::test]
async fn test_user_role_is_forbidden_from_admin_endpoints() {
    let app = TestApp::new();
    let admin = app.token(Role::Admin).await;
    let raffle_id = app.initialized_raffle(&admin, "Moto", 10).await;
    let (user, user_token) = app.user_with_token("visitor", Role::User).await;

    let mut endpoints = admin_only_endpoints(&raffle_id, &user.id.to_string());
    endpoints.push((
        Method::POST,
        format!("/api/raffles/{raffle_id}/tickets/sell"),
        Some(json!({ "numbers": ["000"], "buyer": { "name": "Ana" } })),
    ));
    endpoints.push((Method::GET, format!("/api/raffles/{raffle_id}/tickets/summary"), None));

    for (method, uri, body) in endpoints {
        let response = app.request(method.clone(), &uri, Some(&user_token), body).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert_eq!(response.body["code"], "FORBIDDEN", "{method} {uri}");
    }

    // Nothing was changed behind the 403s
    let ticket = app.get(&format!("/api/raffles/{raffle_id}/tickets/000"), None).await;
    assert_eq!(ticket.body["status"], "available");
}

/// Test 3: Sellers can sell and read the dashboard, nothing more.
#[tokio::test]
async fn test_seller_capabilities() {
    let app = TestApp::new();
    let admin = app.token(Role::Admin).await;
    let raffle_id = app.initialized_raffle(&admin, "Moto", 10).await;
    let (user, seller) = app.user_with_token("seller", Role::Seller).await;

    let sold = app
        .post(
            &format!("/api/raffles/{raffle_id}/tickets/sell"),
            Some(&seller),
            json!({ "numbers": ["000"], "buyer": { "name": "Ana" } }),
        )
        .await;
    assert_eq!(sold.status, StatusCode::OK);

    let summary = app
        .get(&format!("/api/raffles/{raffle_id}/tickets/summary"), Some(&seller))
        .await;
    assert_eq!(summary.status, StatusCode::OK);
    assert_eq!(summary.body["sold"], 1);

    for (method, uri, body) in admin_only_endpoints(&raffle_id, &user.id.to_string()) {
        let response = app.request(method.clone(), &uri, Some(&seller), body).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{method} {uri}");
    }
}

/// Test 4: Public endpoints need no token.
#[tokio::test]
async fn test_reservation_and_browsing_are_public() {
    let app = TestApp::new();
    let admin = app.token(Role::Admin).await;
    let raffle_id = app.initialized_raffle(&admin, "Moto", 10).await;

    for uri in [
        "/api/raffles".to_string(),
        format!("/api/raffles/{raffle_id}"),
        format!("/api/raffles/{raffle_id}/promotions"),
        format!("/api/raffles/{raffle_id}/quote?quantity=2"),
        format!("/api/raffles/{raffle_id}/tickets"),
        format!("/api/raffles/{raffle_id}/tickets/available"),
        format!("/api/raffles/{raffle_id}/tickets/003"),
        "/api/site".to_string(),
    ] {
        let response = app.get(&uri, None).await;
        assert_eq!(response.status, StatusCode::OK, "GET {uri}");
    }

    let reserved = app
        .post(
            &format!("/api/raffles/{raffle_id}/tickets/reserve"),
            None,
            json!({ "numbers": ["003"] }),
        )
        .await;
    assert_eq!(reserved.status, StatusCode::OK);
}

/// Test 5: Malformed and unknown tokens are rejected.
#[tokio::test]
async fn test_bad_tokens_are_unauthorized() {
    let app = TestApp::new();

    let unknown = app.get("/api/auth/profile", Some(SessionToken::generate().as_str())).await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);

    let basic = app
        .send(
            Request::builder()
                .uri("/api/auth/profile")
                .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(basic.status, StatusCode::UNAUTHORIZED);

    let empty = app
        .send(
            Request::builder()
                .uri("/api/auth/profile")
                .header(header::AUTHORIZATION, "Bearer ")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(empty.status, StatusCode::UNAUTHORIZED);
}

/// Test 6: Register, log in, read the profile, log out.
#[tokio::test]
async fn test_register_login_profile_logout() {
    let app = TestApp::new();

    let registered = app
        .post(
            "/api/auth/register",
            None,
            json!({ "username": "ana", "password": "correct-horse" }),
        )
        .await;
    assert_eq!(registered.status, StatusCode::CREATED, "{:?}", registered.body);
    assert_eq!(registered.body["role"], "user");
    assert!(registered.body.get("password_hash").is_none());

    let wrong = app
        .post(
            "/api/auth/login",
            None,
            json!({ "username": "ana", "password": "wrong-horse" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    let unknown = app
        .post(
            "/api/auth/login",
            None,
            json!({ "username": "nobody", "password": "wrong-horse" }),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.body["message"], wrong.body["message"]);

    let login = app
        .post(
            "/api/auth/login",
            None,
            json!({ "username": "ana", "password": "correct-horse" }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK, "{:?}", login.body);
    let token = login.body["token"].as_str().unwrap().to_string();
    assert_eq!(login.body["user"]["username"], "ana");

    let profile = app.get("/api/auth/profile", Some(&token)).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["username"], "ana");
    assert_eq!(profile.body["capabilities"], json!([]));

    let logout = app.post("/api/auth/logout", Some(&token), Value::Null).await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);

    let after = app.get("/api/auth/profile", Some(&token)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

/// Test 7: Admin profile lists every capability.
#[tokio::test]
async fn test_admin_profile_lists_capabilities() {
    let app = TestApp::new();
    let admin = app.token(Role::Admin).await;

    let profile = app.get("/api/auth/profile", Some(&admin)).await;

    let capabilities = profile.body["capabilities"].as_array().unwrap();
    assert_eq!(capabilities.len(), 7);
    assert!(capabilities.contains(&json!("manage_users")));
    assert!(capabilities.contains(&json!("sell_tickets")));
}

/// Test 8: Deactivated and deleted accounts lose access immediately.
#[tokio::test]
async fn test_deactivated_and_deleted_users_lose_access() {
    let app = TestApp::new();
    let (_, admin) = app.user_with_token("boss", Role::Admin).await;
    let (seller, seller_token) = app.user_with_token("seller", Role::Seller).await;
    let (other, other_token) = app.user_with_token("other", Role::Seller).await;

    let deactivated = app
        .put(&format!("/api/users/{}", seller.id), Some(&admin), json!({ "active": false }))
        .await;
    assert_eq!(deactivated.status, StatusCode::OK, "{:?}", deactivated.body);
    assert_eq!(deactivated.body["active"], false);
    let response = app.get("/api/auth/profile", Some(&seller_token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // Remove the row directly so the session outlives the account.
    app.harness.stores.users.delete(other.id).await.unwrap();
    let response = app.get("/api/auth/profile", Some(&other_token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

/// Test 9: Admins manage accounts but cannot remove or deactivate themselves.
#[tokio::test]
async fn test_user_administration() {
    let app = TestApp::new();
    let (me, admin) = app.user_with_token("boss", Role::Admin).await;

    let created = app
        .post(
            "/api/users",
            Some(&admin),
            json!({ "username": "cashier", "password": "password123", "role": "seller" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    assert_eq!(created.body["role"], "seller");
    let cashier_id = created.body["id"].as_str().unwrap().to_string();

    let duplicate = app
        .post(
            "/api/users",
            Some(&admin),
            json!({ "username": "cashier", "password": "password123", "role": "user" }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.body["code"], "DUPLICATE");

    let listed = app.get("/api/users", Some(&admin)).await;
    assert_eq!(listed.body.as_array().unwrap().len(), 2);

    let promoted = app
        .put(&format!("/api/users/{cashier_id}"), Some(&admin), json!({ "role": "admin" }))
        .await;
    assert_eq!(promoted.body["role"], "admin");

    let self_delete = app.delete(&format!("/api/users/{}", me.id), Some(&admin)).await;
    assert_eq!(self_delete.status, StatusCode::BAD_REQUEST);
    let self_deactivate = app
        .put(&format!("/api/users/{}", me.id), Some(&admin), json!({ "active": false }))
        .await;
    assert_eq!(self_deactivate.status, StatusCode::BAD_REQUEST);

    let deleted = app.delete(&format!("/api/users/{cashier_id}"), Some(&admin)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    let gone = app.get(&format!("/api/users/{cashier_id}"), Some(&admin)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

/// Test 10: The bootstrap administrator can log in through the API.
#[tokio::test]
async fn test_bootstrap_admin_can_log_in() {
    let app = TestApp::new();
    let created = app
        .state
        .accounts
        .ensure_admin("root", "bootstrap-pass")
        .await
        .unwrap();
    assert!(created.is_some());
    assert!(app.state.accounts.ensure_admin("root", "bootstrap-pass").await.unwrap().is_none());

    let login = app
        .post(
            "/api/auth/login",
            None,
            json!({ "username": "root", "password": "bootstrap-pass" }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    let token = login.body["token"].as_str().unwrap();

    let users = app.get("/api/users", Some(token)).await;
    assert_eq!(users.status, StatusCode::OK);
}

/// Test 11: Accounts created by an admin start with working credentials.
#[tokio::test]
async fn test_created_account_can_log_in() {
    let app = TestApp::new();
    app.state
        .accounts
        .create_user(NewAccount {
            username: "cashier".to_string(),
            password: "password123".to_string(),
            role: Role::Seller,
        })
        .await
        .unwrap();

    let login = app
        .post(
            "/api/auth/login",
            None,
            json!({ "username": "cashier", "password": "password123" }),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["user"]["role"], "seller");
}
