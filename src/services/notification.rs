// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email notifications for account events.
//!
//! A notification is sent only if the recipient has a verified address, has
//! opted into the notification's category, and is not suspended. Otherwise it
//! is skipped without error. Rendered emails are handed to the email delivery
//! task; nothing here waits for delivery.

use crate::db::FirestoreDb;
use crate::models::{NotificationCategory, User};
use crate::services::tasks::{EmailDeliveryPayload, TasksService};
use std::sync::Arc;

/// An event worth emailing about, with its template inputs.
#[derive(Debug, Clone)]
pub enum EmailNotification {
    Follow {
        follower: User,
    },
    ReceiveFollowRequest {
        follower: User,
    },
    Reply {
        author: User,
        body: String,
        url: String,
    },
    Mention {
        author: User,
        body: String,
        url: String,
    },
    Quote {
        author: User,
        body: String,
        url: String,
        quoted_url: String,
    },
    GroupInvited {
        body: String,
    },
    App {
        header: String,
        body: String,
    },
}

/// Subject plus HTML and plain-text bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: &'static str,
    pub html: String,
    pub text: String,
}

/// `Name (@acct)` if the user set a display name, `@acct` otherwise.
fn actor_label(user: &User) -> String {
    match user.name.as_deref() {
        Some(name) if !name.is_empty() => format!("{} (@{})", name, user.acct()),
        _ => format!("@{}", user.acct()),
    }
}

impl EmailNotification {
    /// Profile opt-in flag that gates this notification.
    pub fn category(&self) -> NotificationCategory {
        match self {
            EmailNotification::Follow { .. } => NotificationCategory::Follow,
            EmailNotification::ReceiveFollowRequest { .. } => {
                NotificationCategory::ReceiveFollowRequest
            }
            EmailNotification::Reply { .. } => NotificationCategory::Reply,
            EmailNotification::Mention { .. } => NotificationCategory::Mention,
            EmailNotification::Quote { .. } => NotificationCategory::Quote,
            EmailNotification::GroupInvited { .. } => NotificationCategory::GroupInvited,
            EmailNotification::App { .. } => NotificationCategory::App,
        }
    }

    fn subject(&self) -> &'static str {
        match self {
            EmailNotification::Follow { .. } => "New Follower",
            EmailNotification::ReceiveFollowRequest { .. } => "New Follow Request",
            EmailNotification::Reply { .. } => "New Reply",
            EmailNotification::Mention { .. } => "New Mention",
            EmailNotification::Quote { .. } => "New Quote",
            EmailNotification::GroupInvited { .. } => "New Group Invitation",
            EmailNotification::App { .. } => "New Application Notice",
        }
    }

    /// Body lines before escaping.
    fn lines(&self) -> Vec<String> {
        match self {
            EmailNotification::Follow { follower }
            | EmailNotification::ReceiveFollowRequest { follower } => vec![actor_label(follower)],
            EmailNotification::Reply { author, body, url }
            | EmailNotification::Mention { author, body, url } => {
                vec![actor_label(author), body.clone(), url.clone()]
            }
            EmailNotification::Quote {
                author,
                body,
                url,
                quoted_url,
            } => vec![
                actor_label(author),
                body.clone(),
                format!("RE: {}", quoted_url),
                url.clone(),
            ],
            EmailNotification::GroupInvited { body } => vec![body.clone()],
            EmailNotification::App { header, body } => vec![header.clone(), body.clone()],
        }
    }

    pub fn render(&self) -> RenderedEmail {
        let lines = self.lines();
        let html = lines
            .iter()
            .map(|line| html_escape::encode_text(line))
            .collect::<Vec<_>>()
            .join(" <br> ");

        RenderedEmail {
            subject: self.subject(),
            html,
            text: lines.join("\n"),
        }
    }
}

/// Sends notification emails through the job queue.
#[derive(Clone)]
pub struct EmailNotifier {
    db: FirestoreDb,
    tasks: Arc<TasksService>,
    /// Base URL the delivery task is POSTed to
    service_url: String,
}

impl EmailNotifier {
    pub fn new(db: FirestoreDb, tasks: Arc<TasksService>, service_url: impl Into<String>) -> Self {
        Self {
            db,
            tasks,
            service_url: service_url.into(),
        }
    }

    /// Email `user_id` about `notification` if their settings allow it.
    ///
    /// Never fails: policy mismatches are skipped and lookup or queue errors
    /// are logged.
    pub async fn notify(&self, user_id: &str, notification: EmailNotification) {
        let category = notification.category();

        let profile = match self.db.get_user_profile(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::warn!(user_id, ?category, "No profile for notification recipient");
                return;
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to load profile for notification");
                return;
            }
        };

        let Some(address) = profile.notification_address(category) else {
            tracing::debug!(
                user_id,
                ?category,
                "Skipping email: no verified address or category disabled"
            );
            return;
        };

        let recipient = match self.db.get_user(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!(user_id, ?category, "Notification recipient not found");
                return;
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Failed to load notification recipient");
                return;
            }
        };

        if recipient.is_suspended {
            tracing::debug!(user_id, ?category, "Skipping email: recipient is suspended");
            return;
        }

        let email = notification.render();
        let payload = EmailDeliveryPayload {
            to: address.to_string(),
            subject: email.subject.to_string(),
            html: email.html,
            text: email.text,
        };

        match self
            .tasks
            .queue_email_delivery(&self.service_url, payload)
            .await
        {
            Ok(()) => tracing::info!(user_id, ?category, "Notification email queued"),
            Err(e) => {
                tracing::warn!(user_id, ?category, error = %e, "Failed to queue notification email")
            }
        }
    }

    /// Run [`notify`](Self::notify) in the background.
    ///
    /// Callers may drop the handle; it is returned only so tests can wait.
    pub fn notify_detached(
        &self,
        user_id: impl Into<String>,
        notification: EmailNotification,
    ) -> tokio::task::JoinHandle<()> {
        let notifier = self.clone();
        let user_id = user_id.into();
        tokio::spawn(async move { notifier.notify(&user_id, notification).await })
    }
}
