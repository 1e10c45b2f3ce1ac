//! The /drive-risk query endpoint.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use roadrisk_core::{derive_features, score_trip, temporal, Coordinate, PredictionResult, RiskError};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DriveRiskParams {
    pub o_lat: f64,
    pub o_lng: f64,
    pub d_lat: f64,
    pub d_lng: f64,
    /// ISO-8601 wall-clock departure; absent or empty means "now".
    #[serde(default)]
    pub date_str: Option<String>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

pub async fn drive_risk_get(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DriveRiskParams>,
) -> Result<Json<PredictionResult>, ApiError> {
    calc_drive_risk(&state, &params)
        .await
        .map(Json)
        .map_err(into_api_error)
}

pub async fn drive_risk_post(
    State(state): State<Arc<AppState>>,
    Json(params): Json<DriveRiskParams>,
) -> Result<Json<PredictionResult>, ApiError> {
    calc_drive_risk(&state, &params)
        .await
        .map(Json)
        .map_err(into_api_error)
}

/// Resolve route, weather, and temporal context, then score the trip.
async fn calc_drive_risk(
    state: &AppState,
    params: &DriveRiskParams,
) -> Result<PredictionResult, RiskError> {
    // Input validation happens before any provider is contacted.
    let origin = Coordinate::new(params.o_lat, params.o_lng)?;
    let destination = Coordinate::new(params.d_lat, params.d_lng)?;

    let tz = state.timezones.resolve(origin);
    let departure = temporal::parse_departure(params.date_str.as_deref(), tz)?;

    let (raw, directions) = state.directions.fetch(origin, destination).await?;
    tracing::info!(
        o_lat = origin.lat,
        o_lon = origin.lon,
        d_lat = destination.lat,
        d_lon = destination.lon,
        "directions obtained"
    );

    let short_forecast = state.forecast.current_short_forecast(origin).await?;

    let row = derive_features(&directions, origin, departure, &short_forecast)?;
    tracing::debug!(?row, "derived model inputs");

    score_trip(state.predictor.as_ref(), raw, row)
}

fn into_api_error(err: RiskError) -> ApiError {
    let status = match &err {
        RiskError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        RiskError::Provider { .. } => StatusCode::BAD_GATEWAY,
        RiskError::ModelSchema(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "drive-risk query failed");
    } else {
        tracing::warn!(error = %err, "drive-risk query rejected");
    }
    (status, Json(json!({ "error": err.to_string() })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_accept_an_optional_departure() {
        let with_date: DriveRiskParams = serde_json::from_value(json!({
            "o_lat": 38.8977, "o_lng": -77.0365,
            "d_lat": 38.8895, "d_lng": -77.0353,
            "date_str": "2024-07-04T09:00:00"
        }))
        .unwrap();
        assert_eq!(with_date.date_str.as_deref(), Some("2024-07-04T09:00:00"));

        let without_date: DriveRiskParams = serde_json::from_value(json!({
            "o_lat": 38.8977, "o_lng": -77.0365,
            "d_lat": 38.8895, "d_lng": -77.0353
        }))
        .unwrap();
        assert!(without_date.date_str.is_none());
    }

    #[test]
    fn error_statuses_follow_the_taxonomy() {
        let (status, _) = into_api_error(RiskError::InvalidInput("bad".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = into_api_error(RiskError::provider("directions", "down"));
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _) = into_api_error(RiskError::ModelSchema("drift".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
