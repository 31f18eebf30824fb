// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Background cleanup: expired password reset requests and idle rate limit
//! state.

use crate::db::FirestoreDb;
use crate::error::Result;
use crate::models::password_reset::expiry_cutoff;
use crate::AppState;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// How often the sweep runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Delete every reset request that had expired as of `now`.
pub async fn sweep_expired_reset_requests(db: &FirestoreDb, now: DateTime<Utc>) -> Result<usize> {
    let cutoff = expiry_cutoff(now);
    let deleted = db.delete_expired_reset_requests(&cutoff).await?;
    if deleted > 0 {
        tracing::info!(deleted, cutoff = %cutoff, "Swept expired reset requests");
    }
    Ok(deleted)
}

/// One sweep pass over everything that expires.
pub async fn sweep_once(state: &AppState, now: DateTime<Utc>) {
    if let Err(e) = sweep_expired_reset_requests(&state.db, now).await {
        tracing::warn!(error = %e, "Reset request sweep failed");
    }
    state.reset_limiter.prune();
}

/// Spawn the periodic sweep. Runs until the runtime shuts down.
pub fn spawn_sweeper(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            sweep_once(&state, Utc::now()).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PasswordResetRequest;
    use chrono::Duration as ChronoDuration;

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let db = FirestoreDb::new_in_memory();
        let now = Utc::now();

        let stale = PasswordResetRequest::new(
            "stale".to_string(),
            "u1".to_string(),
            now - ChronoDuration::minutes(45),
        );
        let fresh = PasswordResetRequest::new(
            "fresh".to_string(),
            "u1".to_string(),
            now - ChronoDuration::minutes(10),
        );
        db.insert_reset_request(&stale).await.unwrap();
        db.insert_reset_request(&fresh).await.unwrap();

        let deleted = sweep_expired_reset_requests(&db, now).await.unwrap();

        assert_eq!(deleted, 1);
        assert!(db.get_reset_request("stale").await.unwrap().is_none());
        assert!(db.get_reset_request("fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sweep_once_clears_expired_requests() {
        let state = AppState::new(
            crate::config::Config::test_default(),
            FirestoreDb::new_in_memory(),
            Arc::new(crate::services::TasksService::new_mock()),
        );
        let now = Utc::now();
        let stale = PasswordResetRequest::new("stale", "u1", now - ChronoDuration::hours(1));
        state.db.insert_reset_request(&stale).await.unwrap();
        state.reset_limiter.check("203.0.113.9").unwrap();

        sweep_once(&state, now).await;

        assert!(state.db.get_reset_request("stale").await.unwrap().is_none());
        // Client still has a partly used quota
        assert_eq!(state.reset_limiter.tracked_clients(), 1);
    }

    #[tokio::test]
    async fn test_sweep_on_empty_store() {
        let db = FirestoreDb::new_in_memory();
        assert_eq!(sweep_expired_reset_requests(&db, Utc::now()).await.unwrap(), 0);
    }
}
