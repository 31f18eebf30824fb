// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloud Tasks service for asynchronous side effects.
//!
//! This service creates Cloud Tasks for:
//! - Delivering notification emails
//! - Processing filed abuse reports
//!
//! Enqueueing returns as soon as Cloud Tasks accepts the task. Delivery,
//! retries and failure handling belong to the task consumer.
//!
//! Uses the official google-cloud-tasks-v2 SDK.

use crate::error::AppError;
use crate::error::Result;
use crate::models::AbuseUserReport;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub const DELIVER_EMAIL_ENDPOINT: &str = "/tasks/deliver-email";
pub const REPORT_ABUSE_ENDPOINT: &str = "/tasks/report-abuse";

/// Payload sent to the email delivery task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDeliveryPayload {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Payload sent to the abuse report task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportAbusePayload {
    pub report: AbuseUserReport,
}

/// A task captured by the recording queue instead of being sent.
#[derive(Debug, Clone)]
pub struct QueuedTask {
    pub endpoint: String,
    pub body: serde_json::Value,
}

/// Cloud Tasks client wrapper.
pub struct TasksService {
    project_id: String,
    location: String,
    queue_name: String,
    /// Set for the recording queue (tests, local development).
    recorded: Option<Mutex<Vec<QueuedTask>>>,
    /// Recording queue only: reject every task.
    mock_fail: AtomicBool,
}

impl TasksService {
    pub fn new(project_id: &str, region: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            location: region.to_string(),
            queue_name: crate::config::JOB_QUEUE_NAME.to_string(),
            recorded: None,
            mock_fail: AtomicBool::new(false),
        }
    }

    /// Create a queue that records tasks in memory instead of calling Cloud Tasks.
    pub fn new_mock() -> Self {
        Self {
            recorded: Some(Mutex::new(Vec::new())),
            ..Self::new("mock", "mock")
        }
    }

    /// Make the recording queue reject (or accept again) all tasks.
    pub fn set_mock_fail(&self, fail: bool) {
        self.mock_fail.store(fail, Ordering::Relaxed);
    }

    /// Tasks captured so far by the recording queue.
    pub fn recorded_tasks(&self) -> Vec<QueuedTask> {
        self.recorded
            .as_ref()
            .map(|tasks| tasks.lock().map(|t| t.clone()).unwrap_or_default())
            .unwrap_or_default()
    }

    /// Queue an email for delivery.
    pub async fn queue_email_delivery(
        &self,
        service_url: &str,
        payload: EmailDeliveryPayload,
    ) -> Result<()> {
        tracing::debug!(subject = %payload.subject, "Queuing email delivery task");
        self.queue_task(service_url, DELIVER_EMAIL_ENDPOINT, &payload)
            .await
    }

    /// Queue processing of a newly filed abuse report.
    pub async fn queue_report_abuse(
        &self,
        service_url: &str,
        payload: ReportAbusePayload,
    ) -> Result<()> {
        tracing::info!(
            report_id = %payload.report.id,
            target_user_id = %payload.report.target_user_id,
            "Queuing abuse report task"
        );
        self.queue_task(service_url, REPORT_ABUSE_ENDPOINT, &payload)
            .await
    }

    /// Generic task queuing helper.
    async fn queue_task<T: Serialize>(
        &self,
        service_url: &str,
        endpoint: &str,
        payload: &T,
    ) -> Result<()> {
        use google_cloud_tasks_v2::client::CloudTasks;
        use google_cloud_tasks_v2::model::{HttpRequest, OidcToken, Task};

        if let Some(recorded) = &self.recorded {
            if self.mock_fail.load(Ordering::Relaxed) {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "Mock queue rejected task for {}",
                    endpoint
                )));
            }
            let body = serde_json::to_value(payload)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("JSON error: {}", e)))?;
            recorded
                .lock()
                .map_err(|_| AppError::Internal(anyhow::anyhow!("Mock queue lock poisoned")))?
                .push(QueuedTask {
                    endpoint: endpoint.to_string(),
                    body,
                });
            return Ok(());
        }

        let client = CloudTasks::builder()
            .build()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Cloud Tasks client error: {}", e)))?;

        let queue_path = format!(
            "projects/{}/locations/{}/queues/{}",
            self.project_id, self.location, self.queue_name
        );

        let body = serde_json::to_vec(payload)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JSON error: {}", e)))?;

        let http_request = HttpRequest::default()
            .set_url(format!("{}{}", service_url, endpoint))
            .set_http_method("POST")
            .set_body(axum::body::Bytes::from(body))
            .set_headers(std::collections::HashMap::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]))
            .set_oidc_token(
                OidcToken::default()
                    .set_service_account_email(format!(
                        "fedi-accounts-api@{}.iam.gserviceaccount.com",
                        self.project_id
                    ))
                    .set_audience(service_url.to_string()),
            );

        let task = Task::default().set_http_request(http_request);

        let _response = client
            .create_task()
            .set_parent(queue_path)
            .set_task(task)
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Cloud Tasks create error: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> EmailDeliveryPayload {
        EmailDeliveryPayload {
            to: "alice@example.com".to_string(),
            subject: "New Follower".to_string(),
            html: "@bob".to_string(),
            text: "@bob".to_string(),
        }
    }

    #[tokio::test]
    async fn mock_queue_records_tasks() {
        let service = TasksService::new_mock();

        service
            .queue_email_delivery("http://localhost", email())
            .await
            .unwrap();

        let tasks = service.recorded_tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].endpoint, DELIVER_EMAIL_ENDPOINT);
        assert_eq!(tasks[0].body["to"], "alice@example.com");
        assert_eq!(tasks[0].body["subject"], "New Follower");
    }

    #[tokio::test]
    async fn mock_queue_failure_is_reported() {
        let service = TasksService::new_mock();
        service.set_mock_fail(true);

        let result = service.queue_email_delivery("http://localhost", email()).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert!(service.recorded_tasks().is_empty());

        service.set_mock_fail(false);
        service
            .queue_email_delivery("http://localhost", email())
            .await
            .unwrap();
        assert_eq!(service.recorded_tasks().len(), 1);
    }

    #[test]
    fn real_queue_records_nothing() {
        let service = TasksService::new("test-project", "us-west1");
        assert!(service.recorded_tasks().is_empty());
    }
}
