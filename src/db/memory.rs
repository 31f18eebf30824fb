// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store used for tests and local development.
//!
//! Mirrors the Firestore collections one map per collection, keyed the same
//! way as the Firestore document IDs.

use crate::models::{AbuseUserReport, PasswordResetRequest, User, UserProfile};
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryStore {
    pub(super) users: DashMap<String, User>,
    pub(super) user_profiles: DashMap<String, UserProfile>,
    /// Keyed by token
    pub(super) reset_requests: DashMap<String, PasswordResetRequest>,
    pub(super) abuse_reports: DashMap<String, AbuseUserReport>,
}

impl MemoryStore {
    /// Remove and return the request for `token`.
    ///
    /// `DashMap::remove` holds the shard lock for the lookup and the removal,
    /// so two concurrent callers can never both receive the same request.
    pub(super) fn take_reset_request(&self, token: &str) -> Option<PasswordResetRequest> {
        self.reset_requests.remove(token).map(|(_, request)| request)
    }

    pub(super) fn delete_reset_requests_before(&self, cutoff: &str) -> usize {
        let mut removed = 0;
        self.reset_requests.retain(|_, request| {
            let keep = request.created_at.as_str() >= cutoff;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }
}
