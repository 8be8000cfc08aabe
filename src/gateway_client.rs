use crate::config::Config;
use crate::datasets::DatasetPayload;
use crate::errors::FetchError;
use crate::models::{
    AiLogsPayload, ApiEnvelope, DatasetId, KeywordSample, Lead, LeadStatus, LeadStatusUpdate,
    LeadsPayload, Plan, PlanSeoReport, PLAN_HEADER,
};
use crate::retry::RetryPolicy;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for the dashboard API.
///
/// Every request carries the caller's plan; the server decides what shape of
/// data that plan is entitled to.
#[derive(Clone)]
pub struct DashboardClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl DashboardClient {
    /// Creates a new `DashboardClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the dashboard API, without trailing slash.
    /// * `timeout` - Upper bound for each individual attempt.
    /// * `retry` - Attempts and backoff for retryable failures.
    pub fn new(base_url: String, timeout: Duration, retry: RetryPolicy) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(
            config.api_base_url.clone(),
            config.fetch_timeout,
            RetryPolicy::from_config(config),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches one dataset, retrying transport and 5xx failures with
    /// exponential backoff.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        dataset: DatasetId,
        plan: Plan,
    ) -> Result<T, FetchError> {
        let mut delays = None;
        let mut attempt = 1;

        loop {
            let request = self.request(Method::GET, dataset.path(), plan);
            match send_enveloped(request).await {
                Ok(data) => {
                    if attempt > 1 {
                        tracing::info!("✓ Fetched {} on attempt {}", dataset, attempt);
                    }
                    return Ok(data);
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = delays
                        .get_or_insert_with(|| self.retry.delays())
                        .next()
                        .unwrap_or(self.retry.max_delay);
                    tracing::warn!(
                        "Fetching {} failed (attempt {}/{}), retrying in {:?}: {}",
                        dataset,
                        attempt,
                        self.retry.max_attempts,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("Fetching {} failed after {} attempt(s): {}", dataset, attempt, e);
                    return Err(e);
                }
            }
        }
    }

    pub async fn fetch_leads(&self, plan: Plan) -> Result<LeadsPayload, FetchError> {
        self.fetch(DatasetId::Leads, plan).await
    }

    pub async fn fetch_seo(&self, plan: Plan) -> Result<PlanSeoReport, FetchError> {
        self.fetch(DatasetId::Seo, plan).await
    }

    pub async fn fetch_keywords(&self, plan: Plan) -> Result<Vec<KeywordSample>, FetchError> {
        self.fetch(DatasetId::Keywords, plan).await
    }

    pub async fn fetch_ai_logs(&self, plan: Plan) -> Result<AiLogsPayload, FetchError> {
        self.fetch(DatasetId::AiLogs, plan).await
    }

    /// Fetches any dataset and tags it with its kind.
    pub async fn fetch_dataset(
        &self,
        dataset: DatasetId,
        plan: Plan,
    ) -> Result<DatasetPayload, FetchError> {
        let payload = match dataset {
            DatasetId::Leads => DatasetPayload::Leads(self.fetch_leads(plan).await?),
            DatasetId::Seo => DatasetPayload::Seo(self.fetch_seo(plan).await?),
            DatasetId::Keywords => DatasetPayload::Keywords(self.fetch_keywords(plan).await?),
            DatasetId::AiLogs => DatasetPayload::AiLogs(self.fetch_ai_logs(plan).await?),
        };
        Ok(payload)
    }

    /// Changes a lead's status. Sent once; the caller decides whether to retry.
    pub async fn update_lead_status(
        &self,
        plan: Plan,
        lead_id: u32,
        status: LeadStatus,
    ) -> Result<Lead, FetchError> {
        tracing::info!("Updating lead {} to {}", lead_id, status.label());
        let request = self
            .request(Method::PATCH, &format!("/api/leads/{}", lead_id), plan)
            .json(&LeadStatusUpdate { status });
        send_enveloped(request).await
    }

    fn request(&self, method: Method, path: &str, plan: Plan) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {} as {}", method, url, plan);
        self.client
            .request(method, &url)
            .header(PLAN_HEADER, plan.as_str())
    }
}

/// Sends `request` and unwraps the `{success, data}` envelope.
async fn send_enveloped<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, FetchError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
            .ok()
            .and_then(|envelope| envelope.error)
            .unwrap_or_else(|| format!("unexpected status {}", status));
        return Err(FetchError::Protocol {
            status: Some(status.as_u16()),
            message,
        });
    }

    let envelope: ApiEnvelope<T> =
        serde_json::from_str(&body).map_err(|e| FetchError::Protocol {
            status: Some(status.as_u16()),
            message: format!("malformed envelope: {}", e),
        })?;

    if !envelope.success {
        return Err(FetchError::Application(
            envelope
                .error
                .unwrap_or_else(|| "API returned an error".to_string()),
        ));
    }

    envelope.data.ok_or_else(|| FetchError::Protocol {
        status: Some(status.as_u16()),
        message: "envelope is missing data".to_string(),
    })
}
