//! Forecast API HTTP client (api.weather.gov shape).
//!
//! The lookup is two-step: resolve the forecast grid for a point, then
//! read the first forecast period for that grid. Only the CURRENT
//! forecast is ever fetched, whatever the requested trip time; the model
//! was trained against the same reading (see the core weather module).

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use roadrisk_core::{Coordinate, RiskError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The upstream API rejects anonymous clients.
const USER_AGENT: &str = concat!("roadrisk/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct PointsResponse {
    properties: PointsProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointsProperties {
    grid_id: String,
    grid_x: i64,
    grid_y: i64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    #[serde(default)]
    periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForecastPeriod {
    short_forecast: String,
}

/// HTTP client for the weather forecast provider.
pub struct ForecastClient {
    client: Client,
    base_url: String,
}

impl ForecastClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
        }
    }

    /// Resolve the current short-forecast text for a point.
    pub async fn current_short_forecast(&self, point: Coordinate) -> Result<String, RiskError> {
        let points_url = format!("{}/points/{},{}", self.base_url, point.lat, point.lon);
        let points: PointsResponse = self.get_json(&points_url).await?;

        let grid = points.properties;
        tracing::debug!(
            grid_id = %grid.grid_id,
            grid_x = grid.grid_x,
            grid_y = grid.grid_y,
            "resolved forecast grid"
        );

        let forecast_url = format!(
            "{}/gridpoints/{}/{},{}/forecast?units=us",
            self.base_url, grid.grid_id, grid.grid_x, grid.grid_y
        );
        let forecast: ForecastResponse = self.get_json(&forecast_url).await?;

        forecast
            .properties
            .periods
            .into_iter()
            .next()
            .map(|period| period.short_forecast)
            .ok_or_else(|| RiskError::provider("forecast", "forecast contains no periods"))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, RiskError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| RiskError::provider("forecast", format!("request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RiskError::provider(
                "forecast",
                format!("request failed: {status} {body}"),
            ));
        }

        response
            .json()
            .await
            .map_err(|err| RiskError::provider("forecast", format!("unexpected shape: {err}")))
    }
}
