// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! User and profile models for storage.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Account record stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID (also used as document ID)
    pub id: String,
    /// Handle without the leading `@`
    pub username: String,
    /// Home instance; None for local accounts
    pub host: Option<String>,
    /// Display name
    pub name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_suspended: bool,
    /// When the account was created (ISO 8601)
    pub created_at: String,
}

impl User {
    /// Fully qualified handle: `alice` locally, `alice@example.social` remotely.
    pub fn acct(&self) -> String {
        match &self.host {
            Some(host) => format!("{}@{}", self.username, host),
            None => self.username.clone(),
        }
    }
}

/// Email notification categories a user can opt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationCategory {
    Follow,
    ReceiveFollowRequest,
    Reply,
    Mention,
    Quote,
    GroupInvited,
    App,
}

/// Private per-user settings (keyed by user ID).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    /// bcrypt hash; None for accounts without a local password
    pub password: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub email_notification_types: HashSet<NotificationCategory>,
}

impl UserProfile {
    /// Address to notify for `category`, if the user verified an email and opted in.
    pub fn notification_address(&self, category: NotificationCategory) -> Option<&str> {
        if !self.email_verified || !self.email_notification_types.contains(&category) {
            return None;
        }
        self.email.as_deref().filter(|email| !email.is_empty())
    }
}
