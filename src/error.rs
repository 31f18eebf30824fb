// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Client-facing errors carry a stable `code` and `id` so that frontends can
//! match on them regardless of the (human readable) message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No such reset request.")]
    NoSuchResetRequest,

    #[error("No such user.")]
    NoSuchUser,

    #[error("Cannot report yourself.")]
    CannotReportYourself,

    #[error("Cannot report the admin.")]
    CannotReportAdmin,

    #[error("Invalid param: {0}")]
    InvalidParam(String),

    #[error("Credential required.")]
    Unauthorized,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimitExceeded,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NoSuchResetRequest => "NO_SUCH_RESET_REQUEST",
            AppError::NoSuchUser => "NO_SUCH_USER",
            AppError::CannotReportYourself => "CANNOT_REPORT_YOURSELF",
            AppError::CannotReportAdmin => "CANNOT_REPORT_THE_ADMIN",
            AppError::InvalidParam(_) => "INVALID_PARAM",
            AppError::Unauthorized => "CREDENTIAL_REQUIRED",
            AppError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            AppError::Database(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Stable error identifier (UUID).
    pub fn id(&self) -> &'static str {
        match self {
            AppError::NoSuchResetRequest => "6382759d-294c-43de-89b3-4e825006ca43",
            AppError::NoSuchUser => "1acefcb5-0959-43fd-9685-b48305736cb5",
            AppError::CannotReportYourself => "1e13149e-b1e8-43cf-902e-c01dbfcb202f",
            AppError::CannotReportAdmin => "35e166f5-05fb-4f87-a2d5-adb42676d48f",
            AppError::InvalidParam(_) => "3d81ceae-475f-4600-b2a8-2bc116157532",
            AppError::Unauthorized => "1384574d-a912-4b81-8601-c7b1c4085df1",
            AppError::RateLimitExceeded => "d5826d14-3982-4d2e-8011-b9e9f02499ef",
            AppError::Database(_) | AppError::Internal(_) => {
                "5d37dbcb-891e-41ca-a3d6-e690c97775ac"
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NoSuchResetRequest
            | AppError::NoSuchUser
            | AppError::CannotReportYourself
            | AppError::CannotReportAdmin
            | AppError::InvalidParam(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ErrorDetail {
    pub message: String,
    pub code: String,
    pub id: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                "Internal error occurred.".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                "Internal error occurred.".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                message,
                code: self.code().to_string(),
                id: self.id().to_string(),
            },
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
