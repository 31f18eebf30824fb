// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod abuse_report;
pub mod password_reset;
pub mod user;

pub use abuse_report::AbuseUserReport;
pub use password_reset::PasswordResetRequest;
pub use user::{NotificationCategory, User, UserProfile};
