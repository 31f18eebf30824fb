// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users and user profiles
//! - Password reset requests (single-use tokens)
//! - Abuse reports
//!
//! Every operation also runs against an in-memory store, selected with
//! [`FirestoreDb::new_in_memory`], so handlers can be exercised offline.

use super::memory::MemoryStore;
use crate::db::collections;
use crate::error::AppError;
use crate::models::{AbuseUserReport, PasswordResetRequest, User, UserProfile};
use firestore::errors::{BackoffError, FirestoreError};
use firestore::{paths, FirestoreWritePrecondition};
use futures_util::FutureExt;
use std::sync::Arc;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
}

/// Document ID for a reset request. Tokens may contain `/`, which Firestore
/// rejects in IDs.
fn reset_doc_id(token: &str) -> String {
    urlencoding::encode(token).into_owned()
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a database backed by process memory (tests, local development).
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::default())),
        }
    }

    /// Raw Firestore client, for callers that need documents this layer
    /// does not model.
    pub fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        match &self.backend {
            Backend::Firestore(client) => Ok(client),
            Backend::Memory(_) => Err(AppError::Database(
                "No Firestore client (in-memory store)".to_string(),
            )),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::USERS)
                .obj()
                .one(user_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => Ok(store.users.get(user_id).map(|u| u.clone())),
        }
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::USERS)
                    .document_id(&user.id)
                    .object(user)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            Backend::Memory(store) => {
                store.users.insert(user.id.clone(), user.clone());
            }
        }
        Ok(())
    }

    // ─── Profile Operations ──────────────────────────────────────

    /// Get the private profile for a user.
    pub async fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::USER_PROFILES)
                .obj()
                .one(user_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => Ok(store.user_profiles.get(user_id).map(|p| p.clone())),
        }
    }

    /// Create or update a user profile.
    pub async fn upsert_user_profile(&self, profile: &UserProfile) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::USER_PROFILES)
                    .document_id(&profile.user_id)
                    .object(profile)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            Backend::Memory(store) => {
                store
                    .user_profiles
                    .insert(profile.user_id.clone(), profile.clone());
            }
        }
        Ok(())
    }

    /// Replace the stored password hash for a user.
    ///
    /// Returns `false` if the user has no profile.
    pub async fn set_password_hash(&self, user_id: &str, hash: &str) -> Result<bool, AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let Some(mut profile) = self.get_user_profile(user_id).await? else {
                    return Ok(false);
                };
                profile.password = Some(hash.to_string());

                // Field mask: concurrent edits to other profile fields survive
                let _: () = client
                    .fluent()
                    .update()
                    .fields(paths!(UserProfile::{password}))
                    .in_col(collections::USER_PROFILES)
                    .precondition(FirestoreWritePrecondition::Exists(true))
                    .document_id(user_id)
                    .object(&profile)
                    .execute()
                    .await
                    .map_err(|e| {
                        AppError::Database(format!("Failed to update password: {}", e))
                    })?;
                Ok(true)
            }
            Backend::Memory(store) => match store.user_profiles.get_mut(user_id) {
                Some(mut profile) => {
                    profile.password = Some(hash.to_string());
                    Ok(true)
                }
                None => Ok(false),
            },
        }
    }

    // ─── Password Reset Operations ───────────────────────────────

    /// Store a newly issued reset request.
    pub async fn insert_reset_request(&self, request: &PasswordResetRequest) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::PASSWORD_RESET_REQUESTS)
                    .document_id(reset_doc_id(&request.token))
                    .object(request)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            Backend::Memory(store) => {
                store
                    .reset_requests
                    .insert(request.token.clone(), request.clone());
            }
        }
        Ok(())
    }

    /// Look up a reset request without consuming it.
    pub async fn get_reset_request(
        &self,
        token: &str,
    ) -> Result<Option<PasswordResetRequest>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::PASSWORD_RESET_REQUESTS)
                .obj()
                .one(&reset_doc_id(token))
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => Ok(store.reset_requests.get(token).map(|r| r.clone())),
        }
    }

    /// Atomically delete the reset request for `token` and return it.
    ///
    /// Of any number of concurrent callers with the same token, at most one
    /// receives `Some`. On Firestore the read and the delete run in one
    /// transaction, which is retried if another redemption commits first.
    pub async fn take_reset_request(
        &self,
        token: &str,
    ) -> Result<Option<PasswordResetRequest>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let doc_id = reset_doc_id(token);
                client
                    .run_transaction(move |db, transaction| {
                        let doc_id = doc_id.clone();
                        async move {
                            let request: Option<PasswordResetRequest> = db
                                .fluent()
                                .select()
                                .by_id_in(collections::PASSWORD_RESET_REQUESTS)
                                .obj()
                                .one(&doc_id)
                                .await?;

                            if request.is_some() {
                                db.fluent()
                                    .delete()
                                    .from(collections::PASSWORD_RESET_REQUESTS)
                                    .document_id(&doc_id)
                                    .add_to_transaction(transaction)?;
                            }

                            Ok::<_, BackoffError<FirestoreError>>(request)
                        }
                        .boxed()
                    })
                    .await
                    .map_err(|e| {
                        AppError::Database(format!("Failed to redeem reset request: {}", e))
                    })
            }
            Backend::Memory(store) => Ok(store.take_reset_request(token)),
        }
    }

    /// Delete every reset request created before `cutoff` (ISO 8601).
    ///
    /// Returns the number of requests deleted.
    pub async fn delete_expired_reset_requests(&self, cutoff: &str) -> Result<usize, AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let cutoff = cutoff.to_string();
                let expired: Vec<PasswordResetRequest> = client
                    .fluent()
                    .select()
                    .from(collections::PASSWORD_RESET_REQUESTS)
                    .filter(move |q| q.for_all([q.field("created_at").less_than(cutoff.clone())]))
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                self.batch_delete(
                    client,
                    &expired,
                    collections::PASSWORD_RESET_REQUESTS,
                    |request: &PasswordResetRequest| reset_doc_id(&request.token),
                )
                .await?;

                Ok(expired.len())
            }
            Backend::Memory(store) => Ok(store.delete_reset_requests_before(cutoff)),
        }
    }

    // ─── Abuse Report Operations ─────────────────────────────────

    /// Store a new abuse report.
    pub async fn insert_abuse_report(&self, report: &AbuseUserReport) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::ABUSE_USER_REPORTS)
                    .document_id(&report.id)
                    .object(report)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            Backend::Memory(store) => {
                store.abuse_reports.insert(report.id.clone(), report.clone());
            }
        }
        Ok(())
    }

    /// Get an abuse report by ID.
    pub async fn get_abuse_report(
        &self,
        report_id: &str,
    ) -> Result<Option<AbuseUserReport>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::ABUSE_USER_REPORTS)
                .obj()
                .one(report_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => Ok(store.abuse_reports.get(report_id).map(|r| r.clone())),
        }
    }

    /// All reports filed by one user, newest first.
    pub async fn get_abuse_reports_by_reporter(
        &self,
        reporter_id: &str,
    ) -> Result<Vec<AbuseUserReport>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let reporter_id = reporter_id.to_string();
                client
                    .fluent()
                    .select()
                    .from(collections::ABUSE_USER_REPORTS)
                    .filter(move |q| q.for_all([q.field("reporter_id").eq(reporter_id.clone())]))
                    .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            }
            Backend::Memory(store) => {
                let mut reports: Vec<AbuseUserReport> = store
                    .abuse_reports
                    .iter()
                    .filter(|r| r.reporter_id == reporter_id)
                    .map(|r| r.clone())
                    .collect();
                reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                Ok(reports)
            }
        }
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        client: &firestore::FirestoreDb,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_reset_doc_id_escapes_slashes() {
        assert_eq!(reset_doc_id("abc123"), "abc123");
        assert!(!reset_doc_id("a/b").contains('/'));
    }

    #[tokio::test]
    async fn test_take_reset_request_is_single_use() {
        let db = FirestoreDb::new_in_memory();
        let request = PasswordResetRequest::new("abc123", "u1", Utc::now());
        db.insert_reset_request(&request).await.unwrap();

        let first = db.take_reset_request("abc123").await.unwrap();
        let second = db.take_reset_request("abc123").await.unwrap();

        assert_eq!(first, Some(request));
        assert_eq!(second, None);
        assert!(db.get_reset_request("abc123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_take_has_one_winner() {
        let db = FirestoreDb::new_in_memory();
        let request = PasswordResetRequest::new("race", "u1", Utc::now());
        db.insert_reset_request(&request).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let db = db.clone();
                tokio::spawn(async move { db.take_reset_request("race").await.unwrap() })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_set_password_hash_without_profile() {
        let db = FirestoreDb::new_in_memory();
        assert!(!db.set_password_hash("ghost", "$2b$08$x").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_expired_reset_requests() {
        let db = FirestoreDb::new_in_memory();
        let now = Utc::now();

        let stale = PasswordResetRequest::new("stale", "u1", now - Duration::minutes(45));
        let fresh = PasswordResetRequest::new("fresh", "u1", now - Duration::minutes(10));
        db.insert_reset_request(&stale).await.unwrap();
        db.insert_reset_request(&fresh).await.unwrap();

        let cutoff = crate::models::password_reset::expiry_cutoff(now);
        let deleted = db.delete_expired_reset_requests(&cutoff).await.unwrap();

        assert_eq!(deleted, 1);
        assert!(db.get_reset_request("stale").await.unwrap().is_none());
        assert!(db.get_reset_request("fresh").await.unwrap().is_some());
    }
}
