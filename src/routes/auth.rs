// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential routes: completing a password reset.

use axum::{extract::State, http::StatusCode, routing::post, Router};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::routes::extract::ValidatedJson;
use crate::services::password::hash_password;
use crate::AppState;

/// Public credential routes. The rate limiter is applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/reset-password", post(reset_password))
}

/// Body of `POST /api/reset-password`.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    /// Token from the reset email
    pub token: String,
    /// New plaintext password
    pub password: String,
}

/// Redeem a reset token and set a new password.
///
/// The token is consumed before anything else happens, so it can never be
/// used twice, even if a later step fails.
async fn reset_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<ResetPasswordRequest>,
) -> Result<StatusCode> {
    let request = state
        .db
        .take_reset_request(&body.token)
        .await?
        .ok_or(AppError::NoSuchResetRequest)?;

    if request.is_expired_at(chrono::Utc::now()) {
        tracing::info!(
            request_id = %request.id,
            user_id = %request.user_id,
            created_at = %request.created_at,
            "Rejected expired reset request"
        );
        return Err(AppError::NoSuchResetRequest);
    }

    let hash = hash_password(body.password).await?;

    if !state.db.set_password_hash(&request.user_id, &hash).await? {
        return Err(AppError::Internal(anyhow::anyhow!(
            "Profile {} missing for reset request {}",
            request.user_id,
            request.id
        )));
    }

    tracing::info!(user_id = %request.user_id, "Password reset completed");

    Ok(StatusCode::NO_CONTENT)
}
