// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password reset completion tests.
//!
//! These tests verify that:
//! 1. Expired tokens are rejected and removed
//! 2. Valid tokens replace the password hash and are single-use
//! 3. Malformed bodies and unknown tokens are rejected
//! 4. The endpoint is throttled per client address

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use fedi_accounts::models::PasswordResetRequest;
use fedi_accounts::services::password::verify_password;
use serde_json::json;
use tower::ServiceExt;

mod common;

use common::{body_json, create_test_app, json_post, local_user, seed_user, verified_profile};

fn reset_body(token: &str, password: &str) -> serde_json::Value {
    json!({ "token": token, "password": password })
}

#[tokio::test]
async fn test_expired_token_is_rejected_and_deleted() {
    let (app, state) = create_test_app();
    seed_user(&state, &local_user("u1", "alice"), &verified_profile("u1", &[])).await;

    let request = PasswordResetRequest::new("abc123", "u1", Utc::now() - Duration::minutes(31));
    state.db.insert_reset_request(&request).await.unwrap();

    let response = app
        .oneshot(json_post("/api/reset-password", reset_body("abc123", "new-pass")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NO_SUCH_RESET_REQUEST");
    assert_eq!(body["error"]["id"], "6382759d-294c-43de-89b3-4e825006ca43");

    assert!(state.db.get_reset_request("abc123").await.unwrap().is_none());

    // Password untouched
    let profile = state.db.get_user_profile("u1").await.unwrap().unwrap();
    assert!(profile.password.is_none());
}

#[tokio::test]
async fn test_valid_token_sets_password_once() {
    let (app, state) = create_test_app();
    seed_user(&state, &local_user("u1", "alice"), &verified_profile("u1", &[])).await;

    let request = PasswordResetRequest::new("tok-valid", "u1", Utc::now() - Duration::minutes(5));
    state.db.insert_reset_request(&request).await.unwrap();

    let response = app
        .clone()
        .oneshot(json_post(
            "/api/reset-password",
            reset_body("tok-valid", "correct horse"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let profile = state.db.get_user_profile("u1").await.unwrap().unwrap();
    let hash = profile.password.expect("password should be set");
    assert!(hash.starts_with("$2b$08$"));
    assert!(verify_password("correct horse".to_string(), hash).await);

    assert!(state.db.get_reset_request("tok-valid").await.unwrap().is_none());

    // Second redemption of the same token fails
    let response = app
        .oneshot(json_post(
            "/api/reset-password",
            reset_body("tok-valid", "another"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NO_SUCH_RESET_REQUEST");
}

#[tokio::test]
async fn test_unknown_token() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(json_post("/api/reset-password", reset_body("nope", "pw")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NO_SUCH_RESET_REQUEST");
}

#[tokio::test]
async fn test_missing_profile_is_internal_error_and_consumes_token() {
    let (app, state) = create_test_app();

    let request = PasswordResetRequest::new("orphan", "ghost", Utc::now());
    state.db.insert_reset_request(&request).await.unwrap();

    let response = app
        .oneshot(json_post("/api/reset-password", reset_body("orphan", "pw")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    assert!(!body["error"]["message"].as_str().unwrap().contains("ghost"));

    assert!(state.db.get_reset_request("orphan").await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_field_is_invalid_param() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(json_post("/api/reset-password", json!({ "token": "abc" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_PARAM");
}

#[tokio::test]
async fn test_rate_limited_per_client() {
    let (app, _state) = create_test_app();

    let from = |ip: &str| {
        let mut request = json_post("/api/reset-password", reset_body("nope", "pw"));
        request
            .headers_mut()
            .insert("x-forwarded-for", ip.parse().unwrap());
        request
    };

    for _ in 0..3 {
        let response = app.clone().oneshot(from("203.0.113.9")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = app.clone().oneshot(from("203.0.113.9")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");

    // A different client still gets through
    let response = app.oneshot(from("203.0.113.10")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rotating_forwarded_prefix_does_not_evade_limit() {
    let (app, _state) = create_test_app();

    let mut statuses = Vec::new();
    for i in 0..4 {
        let mut request = json_post("/api/reset-password", reset_body("nope", "pw"));
        // Client-supplied entries come first; the load balancer appends the real address
        request.headers_mut().insert(
            "x-forwarded-for",
            format!("10.9.9.{}, 203.0.113.9", i).parse().unwrap(),
        );
        statuses.push(app.clone().oneshot(request).await.unwrap().status());
    }

    assert_eq!(
        statuses,
        vec![
            StatusCode::BAD_REQUEST,
            StatusCode::BAD_REQUEST,
            StatusCode::BAD_REQUEST,
            StatusCode::TOO_MANY_REQUESTS,
        ]
    );
}
