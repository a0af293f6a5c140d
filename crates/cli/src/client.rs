//! HTTP client for the window gate daemon

use anyhow::{Context, Result};
use gate_lib::{Rejection, ServiceStatus};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// API client for the gate daemon
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Make a GET request and decode a JSON body
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        // The health endpoint answers 503 with a status body once finalized
        let status = response.status();
        if !status.is_success() && status != StatusCode::SERVICE_UNAVAILABLE {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Make a GET request and return the body as text
    pub async fn get_text(&self, path: &str) -> Result<String> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.text().await.context("Failed to read response")
    }

    /// Offer one sample literal to the ingestion endpoint
    ///
    /// Refusals by the gate are an `Ok` outcome; only transport failures
    /// and unexpected responses are errors.
    pub async fn push_sample(&self, literal: &str) -> Result<PushOutcome> {
        let url = self.base_url.join("data_in").context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .body(literal.to_string())
            .send()
            .await
            .context("Failed to send sample")?;

        let status = response.status();
        if status.is_success() {
            let accepted: IngestResponse =
                response.json().await.context("Failed to parse response")?;
            return Ok(PushOutcome::Accepted {
                consumed: accepted.consumed,
            });
        }

        if status == StatusCode::BAD_REQUEST || status == StatusCode::SERVICE_UNAVAILABLE {
            let refused: ApiError = response.json().await.context("Failed to parse error")?;
            return Ok(PushOutcome::Refused(refused));
        }

        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("API error ({}): {}", status, body)
    }

    /// Fetch the inspection report
    pub async fn window(&self) -> Result<String> {
        self.get_text("data_out").await
    }

    /// Fetch the service status
    pub async fn status(&self) -> Result<ServiceStatus> {
        self.get("healthz").await
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub consumed: usize,
}

/// Error body returned by the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: String,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

impl ApiError {
    /// True when the gate judged the sample an outlier
    pub fn is_rejection(&self) -> bool {
        self.kind == "range"
    }
}

/// Result of offering a sample
#[derive(Debug, Clone)]
pub enum PushOutcome {
    Accepted { consumed: usize },
    Refused(ApiError),
}

impl PushOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, PushOutcome::Accepted { .. })
    }
}

/// Split an inspection report into its values
pub fn parse_window_report(report: &str) -> Result<Vec<i64>> {
    let mut lines = report.lines();
    match lines.next() {
        Some(header) if header == gate_lib::service::REPORT_HEADER => {}
        _ => anyhow::bail!("Unexpected window report: {:?}", report),
    }

    lines
        .next()
        .unwrap_or_default()
        .split_whitespace()
        .map(|v| v.parse::<i64>().with_context(|| format!("Bad window value {:?}", v)))
        .collect()
}
