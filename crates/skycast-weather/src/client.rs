//! weatherapi.com client: forecast by city or coordinate, and place search.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::instrument;

use crate::error::{FetchCause, WeatherError, WeatherResult};
use crate::types::{ForecastQuery, ForecastResult, LocationCandidate};

pub const FORECAST_PATH: &str = "/v1/forecast.json";
pub const SEARCH_PATH: &str = "/v1/search.json";
const USER_AGENT: &str = concat!("SkyCast/", env!("CARGO_PKG_VERSION"));

/// Where forecasts and place candidates come from.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Single GET for the query's target and horizon; body returned verbatim.
    async fn fetch_forecast(&self, query: &ForecastQuery) -> WeatherResult<ForecastResult>;

    /// Single GET against the place-search endpoint; may be empty.
    async fn search_locations(&self, text: &str) -> WeatherResult<Vec<LocationCandidate>>;
}

/// Explicit client settings
#[derive(Debug, Clone)]
pub struct ForecastClientConfig {
    pub api_key: String,
    pub base_url: String,
}

pub struct ForecastClient {
    client: Client,
    config: ForecastClientConfig,
}

impl std::fmt::Debug for ForecastClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl ForecastClient {
    /// # Errors
    /// Returns `FetchFailed` if the HTTP client cannot be built.
    pub fn new(config: ForecastClientConfig) -> WeatherResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| WeatherError::fetch_failed(config.base_url.clone(), e))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// GET `endpoint` with `params` plus the API key, returning the parsed body.
    async fn get_json(&self, endpoint: &str, params: &[(&str, &str)]) -> WeatherResult<Value> {
        let result = self.send(endpoint, params).await;
        if let Err(e) = &result {
            tracing::error!("Error fetching data from {}: {}", endpoint, e);
        }
        result.map_err(|cause| WeatherError::fetch_failed(endpoint, cause))
    }

    async fn send(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value, FetchCause> {
        let response = self
            .client
            .get(endpoint)
            .query(&[("key", self.config.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchCause::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(reqwest::Error::without_url)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ForecastSource for ForecastClient {
    #[instrument(skip(self), level = "info")]
    async fn fetch_forecast(&self, query: &ForecastQuery) -> WeatherResult<ForecastResult> {
        let endpoint = self.endpoint(FORECAST_PATH);
        let target = query.target_text();
        let days = query.days.to_string();

        tracing::debug!("Fetching forecast for '{}' ({} days)", target, days);

        let body = self
            .get_json(
                &endpoint,
                &[
                    ("q", target.as_str()),
                    ("days", days.as_str()),
                    ("aqi", "no"),
                    ("alerts", "no"),
                ],
            )
            .await?;

        Ok(ForecastResult::new(body))
    }

    #[instrument(skip(self), level = "info")]
    async fn search_locations(&self, text: &str) -> WeatherResult<Vec<LocationCandidate>> {
        let endpoint = self.endpoint(SEARCH_PATH);
        let body = self.get_json(&endpoint, &[("q", text)]).await?;

        let candidates: Vec<LocationCandidate> = serde_json::from_value(body).map_err(|e| {
            tracing::error!("Unexpected search response from {}: {}", endpoint, e);
            WeatherError::fetch_failed(endpoint.as_str(), e)
        })?;

        tracing::debug!("Search '{}' returned {} candidates", text, candidates.len());
        Ok(candidates)
    }
}
