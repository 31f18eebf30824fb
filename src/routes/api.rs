// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::config::COMMENT_MAX_CHARS;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::AbuseUserReport;
use crate::routes::extract::ValidatedJson;
use crate::services::tasks::ReportAbusePayload;
use crate::services::users::{self, LookupError};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Extension, Router};
use serde::Deserialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/users/report-abuse", post(report_abuse))
}

// ─── Abuse Reports ───────────────────────────────────────────

/// Body of `POST /api/users/report-abuse`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReportAbuseRequest {
    /// User being reported
    pub user_id: String,
    /// Free-text reason
    #[validate(length(min = 1, max = COMMENT_MAX_CHARS))]
    pub comment: String,
}

/// File an abuse report against another user.
///
/// Self-reports and reports against admins are rejected before anything is
/// written.
async fn report_abuse(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(body): ValidatedJson<ReportAbuseRequest>,
) -> Result<StatusCode> {
    let target = users::get_user(&state.db, &body.user_id)
        .await
        .map_err(|e| match e {
            LookupError::NotFound(_) => AppError::NoSuchUser,
            LookupError::App(e) => e,
        })?;

    if target.id == user.user_id {
        return Err(AppError::CannotReportYourself);
    }

    if target.is_admin {
        return Err(AppError::CannotReportAdmin);
    }

    let report = AbuseUserReport {
        id: uuid::Uuid::new_v4().to_string(),
        created_at: format_utc_rfc3339(chrono::Utc::now()),
        target_user_id: target.id.clone(),
        target_user_host: target.host.clone(),
        reporter_id: user.user_id.clone(),
        reporter_host: None,
        comment: body.comment,
    };

    state.db.insert_abuse_report(&report).await?;

    let stored = state
        .db
        .get_abuse_report(&report.id)
        .await?
        .ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "Abuse report {} missing after insert",
                report.id
            ))
        })?;

    tracing::info!(
        report_id = %stored.id,
        reporter_id = %stored.reporter_id,
        target_user_id = %stored.target_user_id,
        "Abuse report filed"
    );

    state
        .tasks_service
        .queue_report_abuse(&state.config.api_url, ReportAbusePayload { report: stored })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
