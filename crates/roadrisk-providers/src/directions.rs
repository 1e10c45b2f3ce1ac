//! Directions API HTTP client.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use roadrisk_core::{Coordinate, DirectionsResponse, RiskError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for a Mapbox-style directions API.
pub struct DirectionsClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl DirectionsClient {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }

    /// Fetch the driving route between two points: full-overview GeoJSON
    /// geometry, per-leg maxspeed annotations, and step intersections.
    ///
    /// Returns the raw payload (echoed back to callers) alongside the
    /// typed view the pipeline reads; both come from one fetch.
    pub async fn fetch(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<(Value, DirectionsResponse), RiskError> {
        let url = format!(
            "{}/directions/v5/mapbox/driving/{},{};{},{}",
            self.base_url, origin.lon, origin.lat, destination.lon, destination.lat
        );
        tracing::debug!(
            o_lat = origin.lat,
            o_lon = origin.lon,
            d_lat = destination.lat,
            d_lon = destination.lon,
            "fetching directions"
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("alternatives", "false"),
                ("annotations", "maxspeed"),
                ("geometries", "geojson"),
                ("language", "en"),
                ("overview", "full"),
                ("steps", "true"),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|err| RiskError::provider("directions", format!("request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RiskError::provider(
                "directions",
                format!("request failed: {status} {body}"),
            ));
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|err| RiskError::provider("directions", format!("undecodable body: {err}")))?;
        let typed: DirectionsResponse = serde_json::from_value(raw.clone())
            .map_err(|err| RiskError::provider("directions", format!("unexpected shape: {err}")))?;

        Ok((raw, typed))
    }
}
