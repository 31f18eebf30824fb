// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! fedi-accounts API Server
//!
//! Serves password reset completion and abuse report filing, and sweeps
//! expired reset requests in the background.

use fedi_accounts::{
    config::Config, db::FirestoreDb, services::sweeper::spawn_sweeper,
    services::TasksService, AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting fedi-accounts API");

    let (db, tasks_service) = if config.use_in_memory_db {
        tracing::warn!("Using in-memory store and recording job queue; nothing is persisted");
        (FirestoreDb::new_in_memory(), TasksService::new_mock())
    } else {
        let db = FirestoreDb::new(&config.gcp_project_id).await?;
        let tasks_service = TasksService::new(&config.gcp_project_id, &config.gcp_region);
        tracing::info!(
            project = %config.gcp_project_id,
            "Cloud Tasks service initialized"
        );
        (db, tasks_service)
    };

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, Arc::new(tasks_service)));

    spawn_sweeper(state.clone());

    // Build router
    let app = fedi_accounts::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fedi_accounts=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
