// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! fedi-accounts: account endpoints for a federated social network
//!
//! This crate provides password reset completion, abuse report filing, and
//! email notification dispatch. Side effects (email delivery, abuse report
//! processing) are handed off to Cloud Tasks.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use middleware::ResetPasswordLimiter;
use services::{EmailNotifier, TasksService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub tasks_service: Arc<TasksService>,
    pub notifier: EmailNotifier,
    pub reset_limiter: ResetPasswordLimiter,
}

impl AppState {
    /// Wire up state from its backing clients.
    pub fn new(config: Config, db: FirestoreDb, tasks_service: Arc<TasksService>) -> Self {
        let notifier = EmailNotifier::new(db.clone(), tasks_service.clone(), &config.api_url);
        Self {
            config,
            db,
            tasks_service,
            notifier,
            reset_limiter: ResetPasswordLimiter::new(),
        }
    }
}
