//! Stats API client.
//!
//! Fetches per-path hit counts from a GoatCounter-compatible API. A run
//! makes exactly one request and fails fast on any error.

use crate::models::{HitRecord, HitsResponse};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors returned by the stats client.
#[derive(Debug, Error)]
pub enum StatsError {
    /// The API answered with a non-success status.
    #[error("Stats API error {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response.
    #[error("{0}")]
    Request(String),

    /// The response body was not the expected JSON.
    #[error("Failed to parse stats response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Inclusive date range sent as `start` and `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Window ending on the UTC date of `now` and reaching `days_back` days back.
    ///
    /// Returns `None` when the start would fall outside the representable range.
    pub fn last_days(now: DateTime<Utc>, days_back: u32) -> Option<Self> {
        let start = now.checked_sub_signed(ChronoDuration::days(i64::from(days_back)))?;
        Some(Self {
            start: start.date_naive(),
            end: now.date_naive(),
        })
    }

    /// Query parameters for the window.
    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("start", self.start.format("%Y-%m-%d").to_string()),
            ("end", self.end.format("%Y-%m-%d").to_string()),
        ]
    }
}

/// Default API base URL for a GoatCounter site code.
pub fn base_url_for(site_code: &str) -> String {
    format!("https://{}.goatcounter.com/api/v0", site_code)
}

/// Client for the stats API.
pub struct StatsClient {
    base_url: String,
    token: String,
    http_client: reqwest::Client,
}

impl StatsClient {
    /// Create a client. Without a timeout, reqwest's defaults apply.
    pub fn new(base_url: &str, token: &str, timeout: Option<Duration>) -> Result<Self, StatsError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("sitekeeper/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| StatsError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http_client,
        })
    }

    /// Fetch hit records for `window`, asking for at most `limit` paths.
    pub async fn fetch_hits(
        &self,
        window: &DateWindow,
        limit: u32,
    ) -> Result<Vec<HitRecord>, StatsError> {
        let url = format!("{}/stats/hits", self.base_url);
        info!(
            "Fetching hits {} .. {} (limit {})",
            window.start, window.end, limit
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&window.query())
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StatsError::Request(format!("Request to {} timed out", url))
                } else if e.is_connect() {
                    StatsError::Request(format!("Cannot connect to stats API at {}", self.base_url))
                } else {
                    StatsError::Request(format!("Failed to send request: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StatsError::Request(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(StatsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let hits: HitsResponse = serde_json::from_str(&body)?;
        debug!("Received {} hit records", hits.hits.len());

        Ok(hits.hits)
    }
}
