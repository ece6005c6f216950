use std::error::Error as _;
use std::time::Duration;

use reqwest::Client;

use super::types::{excerpt, ImportOutcome, ImportRequest, ImportResponse};
use super::{HealthProbe, ImportInvoker};
use crate::config::{ImportJob, RunConfig};
use crate::error::ImportError;

const IMPORT_PATH: &str = "/api/admin/import-github";
const HTTP_BODY_EXCERPT: usize = 500;

pub struct HubClient {
    client: Client,
    base_url: String,
    admin_secret: String,
    timeout: Duration,
    health_timeout: Duration,
}

impl HubClient {
    pub fn new(config: &RunConfig) -> Result<Self, ImportError> {
        Self::with_base_url(
            config.base_url.clone(),
            config.admin_secret.clone(),
            config.timeout(),
            config.health_timeout(),
        )
    }

    /// Create a client pointing at an arbitrary base URL (useful for testing).
    pub fn with_base_url(
        base_url: String,
        admin_secret: String,
        timeout: Duration,
        health_timeout: Duration,
    ) -> Result<Self, ImportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10).min(timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_secret,
            timeout,
            health_timeout,
        })
    }

    pub fn import_url(&self) -> String {
        format!("{}{IMPORT_PATH}", self.base_url)
    }
}

impl HealthProbe for HubClient {
    async fn check(&self) -> bool {
        let result = self
            .client
            .head(format!("{}/", self.base_url))
            .timeout(self.health_timeout)
            .send()
            .await;
        match result {
            Ok(response) => {
                tracing::debug!(status = response.status().as_u16(), "health probe answered");
                true
            }
            Err(e) => {
                tracing::debug!(error = %root_cause(&e), "health probe failed");
                false
            }
        }
    }
}

impl ImportInvoker for HubClient {
    async fn invoke(&self, job: &ImportJob) -> ImportOutcome {
        let body = ImportRequest::from_job(job);
        let result = self
            .client
            .post(self.import_url())
            .header("x-admin-secret", &self.admin_secret)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => return classify_transport_error(&e),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return ImportOutcome::HttpError {
                status: status.as_u16(),
                body_excerpt: excerpt(&body, HTTP_BODY_EXCERPT),
            };
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return classify_transport_error(&e),
        };

        match serde_json::from_str::<ImportResponse>(&text) {
            Ok(parsed) if parsed.success => ImportOutcome::Success(parsed.into_asset()),
            Ok(parsed) => ImportOutcome::UnknownError {
                message: parsed.error.unwrap_or_else(|| "Unknown".to_string()),
            },
            Err(e) => ImportOutcome::UnknownError {
                message: format!("invalid response body: {e}"),
            },
        }
    }
}

fn classify_transport_error(e: &reqwest::Error) -> ImportOutcome {
    if e.is_timeout() {
        ImportOutcome::Timeout
    } else if e.is_connect() || e.is_request() {
        ImportOutcome::ConnectionError {
            reason: root_cause(e),
        }
    } else {
        ImportOutcome::UnknownError {
            message: e.to_string(),
        }
    }
}

// reqwest wraps the interesting part (e.g. "Connection refused") a few sources deep.
fn root_cause(e: &reqwest::Error) -> String {
    let mut current: &dyn std::error::Error = e;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}
