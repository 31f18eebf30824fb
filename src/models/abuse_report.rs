// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Abuse report model.

use serde::{Deserialize, Serialize};

/// A complaint filed by a local user against another account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbuseUserReport {
    /// Report ID (also used as document ID)
    pub id: String,
    /// When the report was filed (ISO 8601)
    pub created_at: String,
    pub target_user_id: String,
    pub target_user_host: Option<String>,
    pub reporter_id: String,
    /// Always None: reports are filed by local users
    pub reporter_host: Option<String>,
    pub comment: String,
}
