// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;

/// Cloud Tasks queue that carries email delivery and abuse-report jobs.
pub const JOB_QUEUE_NAME: &str = "account-jobs";

/// Reset requests older than this are treated as nonexistent.
pub const RESET_REQUEST_TTL_MINUTES: i64 = 30;

/// bcrypt cost factor for stored password hashes.
pub const PASSWORD_HASH_COST: u32 = 8;

/// Reset-password attempts allowed per client address per hour.
pub const RESET_PASSWORD_LIMIT_PER_HOUR: u32 = 3;

/// Maximum abuse report comment length, in characters.
pub const COMMENT_MAX_CHARS: u64 = 2048;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Public base URL of this service; queued jobs are POSTed back here
    pub api_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// GCP region (Cloud Tasks location)
    pub gcp_region: String,
    /// Server port
    pub port: u16,
    /// Use the in-memory store and recording job queue instead of GCP
    pub use_in_memory_db: bool,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            Err(_) => 8080,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            api_url: env::var("API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            gcp_region: env::var("GCP_REGION").unwrap_or_else(|_| "us-west1".to_string()),
            port,
            use_in_memory_db: env::var("USE_IN_MEMORY_DB")
                .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }

    /// Config for tests: in-memory store, fixed signing key.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            api_url: "http://localhost:8080".to_string(),
            gcp_project_id: "test-project".to_string(),
            gcp_region: "us-west1".to_string(),
            port: 8080,
            use_in_memory_db: true,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
