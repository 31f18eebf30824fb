// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore, with an in-memory stand-in).

pub mod firestore;
mod memory;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const USER_PROFILES: &str = "user_profiles";
    /// Keyed by URL-encoded token
    pub const PASSWORD_RESET_REQUESTS: &str = "password_reset_requests";
    pub const ABUSE_USER_REPORTS: &str = "abuse_user_reports";
}
