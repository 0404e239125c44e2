use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    config::TideApiConfig,
    error::ForecastError,
    forecast::parse_forecast,
    model::{ForecastQuery, ForecastTime},
};

use super::TideForecastSource;

pub const DEFAULT_BASE_URL: &str = "https://opendata.cwa.gov.tw/api/v1/rest/datastore";
pub const DEFAULT_RESOURCE_ID: &str = "F-A0021-001";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the CWA open-data tide forecast dataset.
#[derive(Debug, Clone)]
pub struct CwaTideClient {
    api_token: String,
    endpoint: String,
    http: Client,
}

impl CwaTideClient {
    pub fn new(api_token: String) -> Result<Self> {
        Self::with_endpoint(api_token, DEFAULT_BASE_URL, DEFAULT_RESOURCE_ID, DEFAULT_TIMEOUT)
    }

    pub fn from_config(api: &TideApiConfig, api_token: &str) -> Result<Self> {
        Self::with_endpoint(
            api_token.to_string(),
            &api.base_url,
            &api.resource_id,
            Duration::from_secs(api.timeout_secs),
        )
    }

    pub fn with_endpoint(
        api_token: String,
        base_url: &str,
        resource_id: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .context("Failed to build HTTP client for the tide API")?;

        Ok(Self {
            api_token,
            endpoint: format!("{}/{}", base_url.trim_end_matches('/'), resource_id),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch(&self, query: &ForecastQuery) -> Result<Vec<ForecastTime>, ForecastError> {
        let date = query.date_param();

        let res = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("Authorization", self.api_token.as_str()),
                ("format", "JSON"),
                ("LocationId", query.location_id.as_str()),
                ("Date", date.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ForecastError::Transport(e.to_string()))?;

        let status = res.status();
        if status != StatusCode::OK {
            return Err(ForecastError::Status(status.as_u16()));
        }

        let body = res.text().await.map_err(|e| ForecastError::Transport(e.to_string()))?;
        let parsed: Value =
            serde_json::from_str(&body).map_err(|e| ForecastError::Decode(e.to_string()))?;

        parse_forecast(&parsed, &date)
    }
}

#[async_trait]
impl TideForecastSource for CwaTideClient {
    async fn get_forecast(&self, query: &ForecastQuery) -> Option<Vec<ForecastTime>> {
        match self.fetch(query).await {
            Ok(times) => {
                debug!(
                    location_id = %query.location_id,
                    date = %query.date,
                    entries = times.len(),
                    "tide forecast fetched"
                );
                Some(times)
            }
            Err(error) => {
                warn!(
                    location_id = %query.location_id,
                    date = %query.date,
                    %error,
                    "tide forecast unavailable"
                );
                None
            }
        }
    }
}
