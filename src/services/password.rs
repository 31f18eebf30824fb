// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing.
//!
//! bcrypt is CPU-bound, so hashing runs on the blocking thread pool to keep
//! the async workers free.

use crate::config::PASSWORD_HASH_COST;
use crate::error::{AppError, Result};

/// Hash a password with a fresh salt at the configured cost.
pub async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, PASSWORD_HASH_COST))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::Internal(anyhow::anyhow!("bcrypt error: {}", e)))
}

/// Check a password against a stored bcrypt hash.
pub async fn verify_password(password: String, hash: String) -> bool {
    tokio::task::spawn_blocking(move || bcrypt::verify(&password, &hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_uses_configured_cost() {
        let hash = hash_password("hunter2".to_string()).await.unwrap();
        assert!(hash.starts_with("$2b$08$"), "unexpected hash prefix: {}", hash);
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let a = hash_password("hunter2".to_string()).await.unwrap();
        let b = hash_password("hunter2".to_string()).await.unwrap();
        assert_ne!(a, b);

        assert!(verify_password("hunter2".to_string(), a.clone()).await);
        assert!(!verify_password("hunter3".to_string(), a).await);
    }

    #[tokio::test]
    async fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("hunter2".to_string(), "plaintext".to_string()).await);
    }
}
