use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::domain::usage::model::TimeSeries;

const QUERY_RANGE_PATH: &str = "/api/v1/query_range";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Range queries against a Prometheus-compatible Metrics API.
#[async_trait]
pub trait MetricsApi: Send + Sync {
    async fn query_range(
        &self,
        promql: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step_seconds: u64,
    ) -> Result<Vec<TimeSeries>>;
}

pub struct PrometheusClient {
    client: Client,
    base_url: String,
}

impl PrometheusClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Adds a missing scheme and strips trailing slashes.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[derive(Debug, Deserialize)]
struct PromResponse {
    status: String,
    #[serde(default)]
    data: Option<PromData>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromData {
    #[serde(rename = "resultType")]
    result_type: String,
    #[serde(default)]
    result: Vec<TimeSeries>,
}

/// Decode a `query_range` body into its matrix series.
fn parse_range_response(body: PromResponse) -> Result<Vec<TimeSeries>> {
    if body.status != "success" {
        return Err(anyhow!(
            "Prometheus query failed ({}): {}",
            body.error_type.unwrap_or_else(|| "unknown".to_string()),
            body.error.unwrap_or_default()
        ));
    }

    let data = body
        .data
        .ok_or_else(|| anyhow!("Prometheus response is missing 'data'"))?;

    if data.result_type != "matrix" {
        return Err(anyhow!(
            "Expected a matrix result from query_range, got '{}'",
            data.result_type
        ));
    }

    Ok(data.result)
}

#[async_trait]
impl MetricsApi for PrometheusClient {
    async fn query_range(
        &self,
        promql: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step_seconds: u64,
    ) -> Result<Vec<TimeSeries>> {
        let url = format!("{}{}", self.base_url, QUERY_RANGE_PATH);
        debug!("Prometheus query_range {} step={}s: {}", url, step_seconds, promql);

        let params = [
            ("query", promql.to_string()),
            ("start", start.timestamp().to_string()),
            ("end", end.timestamp().to_string()),
            ("step", format!("{}s", step_seconds)),
        ];

        let resp = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to call Prometheus (url={}): {}", url, e))?;

        let status = resp.status();
        if !status.is_success() && status.as_u16() != 400 && status.as_u16() != 422 {
            // 400/422 still carry a JSON error body worth surfacing
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Prometheus returned {}: {}", status, text));
        }

        let body: PromResponse = resp
            .json()
            .await
            .map_err(|e| anyhow!("Failed to decode Prometheus response: {}", e))?;

        let series = parse_range_response(body)?;
        debug!("Prometheus returned {} series", series.len());
        Ok(series)
    }
}
