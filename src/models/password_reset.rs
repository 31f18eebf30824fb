// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Password reset request model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RESET_REQUEST_TTL_MINUTES;
use crate::time_utils::{format_utc_rfc3339, parse_utc_rfc3339};

/// Outstanding password reset, keyed by its token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub id: String,
    /// Secret handed to the user; also the (URL-encoded) document ID
    pub token: String,
    /// Owner of the profile whose password will be replaced
    pub user_id: String,
    /// When the request was issued (ISO 8601)
    pub created_at: String,
}

impl PasswordResetRequest {
    /// New request issued at `created_at`.
    pub fn new(token: impl Into<String>, user_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            token: token.into(),
            user_id: user_id.into(),
            created_at: format_utc_rfc3339(created_at),
        }
    }

    /// Whether the request is past its validity window at `now`.
    ///
    /// An unparseable `created_at` counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match parse_utc_rfc3339(&self.created_at) {
            Some(created) => now - created > Duration::minutes(RESET_REQUEST_TTL_MINUTES),
            None => true,
        }
    }
}

/// Oldest `created_at` still valid at `now`; anything earlier is expired.
pub fn expiry_cutoff(now: DateTime<Utc>) -> String {
    format_utc_rfc3339(now - Duration::minutes(RESET_REQUEST_TTL_MINUTES))
}
