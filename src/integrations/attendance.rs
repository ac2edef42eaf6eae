use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::{
    config::AttendanceApiConfig,
    domain::{AttendanceEntry, AttendanceSummary},
    error::{AppError, Result},
    integrations::AttendanceSource,
};

/// Proxy to the external attendance service.
pub struct HttpAttendanceGateway {
    client: Client,
    base_url: String,
}

impl HttpAttendanceGateway {
    pub fn new(config: &AttendanceApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn summary_url(&self, student_id: &str) -> String {
        format!("{}/attendance/{}", self.base_url, urlencoding::encode(student_id))
    }

    fn logs_url(&self, student_id: &str) -> String {
        format!("{}/logs", self.summary_url(student_id))
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::External(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::External(format!("{} answered {}", url, status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::External(format!("invalid JSON from {}: {}", url, e)))
    }
}

#[async_trait]
impl AttendanceSource for HttpAttendanceGateway {
    fn name(&self) -> &str {
        "attendance-api"
    }

    async fn summary(&self, student_id: &str) -> AttendanceSummary {
        match self.fetch_json::<AttendanceSummary>(&self.summary_url(student_id)).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(student_id, "Error fetching attendance data: {}", e);
                AttendanceSummary::zeroed()
            }
        }
    }

    async fn logs(&self, student_id: &str) -> Vec<AttendanceEntry> {
        match self.fetch_json::<Vec<AttendanceEntry>>(&self.logs_url(student_id)).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(student_id, "Error fetching attendance logs: {}", e);
                Vec::new()
            }
        }
    }
}
