// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User lookup shared by endpoints that act on another account.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::User;

/// Errors from resolving a user by ID.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("No such user: {0}")]
    NotFound(String),

    #[error(transparent)]
    App(#[from] AppError),
}

/// Resolve a user by ID, failing with [`LookupError::NotFound`] if absent.
pub async fn get_user(db: &FirestoreDb, user_id: &str) -> Result<User, LookupError> {
    db.get_user(user_id)
        .await?
        .ok_or_else(|| LookupError::NotFound(user_id.to_string()))
}
