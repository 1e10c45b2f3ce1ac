//! Assembles provider payloads and trip context into the model input.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

use crate::annotations::RouteFacts;
use crate::error::RiskError;
use crate::features::{engineer, EngineeredTable, FeatureRow};
use crate::geometry::RouteGeometry;
use crate::models::{Coordinate, DirectionsResponse, TripWindow};
use crate::temporal;
use crate::weather::Weather;

/// Trained risk model: one score per engineered row.
///
/// Implementations must reject, loudly, any table whose columns or
/// category values drift from what the model was trained on.
pub trait Predictor: Send + Sync {
    fn predict(&self, table: &EngineeredTable) -> Result<Vec<f64>, RiskError>;
}

/// Everything one query produces: the raw directions payload, the
/// pre-engineering feature row, and the model score. Returned to the
/// caller and never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    pub mapbox_data: serde_json::Value,
    pub model_inputs: FeatureRow,
    pub prediction: f64,
}

/// Derive the pre-engineering feature row for one trip.
///
/// `departure` must already be localized to the trip origin's timezone.
/// `short_forecast` is the provider's current-conditions text; current
/// conditions feed the row no matter when the trip is scheduled (the model
/// was trained that way).
pub fn derive_features(
    directions: &DirectionsResponse,
    origin: Coordinate,
    departure: DateTime<Tz>,
    short_forecast: &str,
) -> Result<FeatureRow, RiskError> {
    let route = directions.primary_route()?;
    let geometry = RouteGeometry::project(&route.geometry, origin)?;
    let facts = RouteFacts::scan(directions);
    let window = TripWindow::from_duration(departure, route.duration);

    Ok(FeatureRow {
        road_type: facts.road_type,
        num_lanes: facts.lane_count,
        curvature: geometry.curviness(),
        speed_limit: facts.max_speed_mph,
        lighting: temporal::trip_lighting(origin, &window),
        weather: Weather::classify(short_forecast),
        road_signs_present: facts.road_signs_present,
        public_road: true,
        time_of_day: temporal::trip_time_of_day(&window),
        holiday: temporal::trip_holiday(&window),
        school_season: temporal::trip_school_season(&window),
        num_reported_accidents: None,
    })
}

/// Engineer a single-row table (duplicate dropping off) and score it.
pub fn score_trip<P: Predictor + ?Sized>(
    predictor: &P,
    raw_payload: serde_json::Value,
    row: FeatureRow,
) -> Result<PredictionResult, RiskError> {
    let table = engineer(std::slice::from_ref(&row), false);
    let scores = predictor.predict(&table)?;
    let prediction = scores.first().copied().ok_or_else(|| {
        RiskError::ModelSchema("predictor returned no score for a one-row table".to_string())
    })?;

    Ok(PredictionResult {
        mapbox_data: raw_payload,
        model_inputs: row,
        prediction,
    })
}
