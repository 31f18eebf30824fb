// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-client rate limiting for unauthenticated endpoints.

use crate::config::RESET_PASSWORD_LIMIT_PER_HOUR;
use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{QuantaClock, QuantaInstant},
    middleware::NoOpMiddleware,
    state::InMemoryState,
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

type KeyedLimiter = RateLimiter<
    String,
    dashmap::DashMap<String, InMemoryState>,
    QuantaClock,
    NoOpMiddleware<QuantaInstant>,
>;

/// Client address as seen by the load balancer.
///
/// The Google front end appends the connecting address to whatever
/// `X-Forwarded-For` the client sent, so only the last entry is trustworthy.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.rsplit(',').map(str::trim).find(|ip| !ip.is_empty()))
        .unwrap_or("unknown")
        .to_string()
}

/// Limiter for `POST /api/reset-password`, keyed by client address.
pub struct ResetPasswordLimiter(KeyedLimiter);

impl Default for ResetPasswordLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResetPasswordLimiter {
    pub fn new() -> Self {
        let per_hour =
            NonZeroU32::new(RESET_PASSWORD_LIMIT_PER_HOUR).unwrap_or(NonZeroU32::MIN);
        Self(RateLimiter::keyed(Quota::per_hour(per_hour)))
    }

    pub fn check(&self, key: &str) -> Result<(), AppError> {
        if self.0.check_key(&key.to_string()).is_err() {
            tracing::warn!(client = %key, "Reset password rate limit triggered");
            return Err(AppError::RateLimitExceeded);
        }
        Ok(())
    }

    /// Forget clients whose quota has fully replenished.
    pub fn prune(&self) {
        self.0.retain_recent();
        self.0.shrink_to_fit();
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.0.len()
    }
}

/// Middleware enforcing [`ResetPasswordLimiter`].
pub async fn limit_reset_password(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = client_key(request.headers());
    state.reset_limiter.check(&key)?;
    Ok(next.run(request).await)
}
