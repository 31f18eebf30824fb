// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use fedi_accounts::config::Config;
use fedi_accounts::db::FirestoreDb;
use fedi_accounts::middleware::auth::create_jwt;
use fedi_accounts::models::{NotificationCategory, User, UserProfile};
use fedi_accounts::routes::create_router;
use fedi_accounts::services::TasksService;
use fedi_accounts::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by the in-memory store and recording job queue.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = FirestoreDb::new_in_memory();
    let tasks_service = Arc::new(TasksService::new_mock());

    let state = Arc::new(AppState::new(config, db, tasks_service));

    (create_router(state.clone()), state)
}

/// A local user with no display name.
#[allow(dead_code)]
pub fn local_user(id: &str, username: &str) -> User {
    User {
        id: id.to_string(),
        username: username.to_string(),
        host: None,
        name: None,
        is_admin: false,
        is_suspended: false,
        created_at: "2026-01-01T00:00:00Z".to_string(),
    }
}

/// A profile with a verified address opted into `categories`.
#[allow(dead_code)]
pub fn verified_profile(user_id: &str, categories: &[NotificationCategory]) -> UserProfile {
    UserProfile {
        user_id: user_id.to_string(),
        password: None,
        email: Some(format!("{}@example.com", user_id)),
        email_verified: true,
        email_notification_types: categories.iter().copied().collect(),
    }
}

/// Store a user and their profile.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, user: &User, profile: &UserProfile) {
    state.db.upsert_user(user).await.unwrap();
    state.db.upsert_user_profile(profile).await.unwrap();
}

/// Build a JSON POST request.
#[allow(dead_code)]
pub fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build an authenticated JSON POST request for `user_id`.
#[allow(dead_code)]
pub fn authed_json_post(
    state: &AppState,
    user_id: &str,
    uri: &str,
    body: serde_json::Value,
) -> Request<Body> {
    let token = create_jwt(user_id, &state.config.jwt_signing_key).unwrap();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
