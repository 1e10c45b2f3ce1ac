//! Core data model for trip risk queries.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::RiskError;

/// A WGS84 point. The constructor is the only way to build one and rejects
/// out-of-range values before any provider is contacted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, RiskError> {
        if !lat.is_finite() || lat.abs() > 90.0 {
            return Err(RiskError::InvalidInput(format!(
                "not a valid latitude: {lat}"
            )));
        }
        if !lon.is_finite() || lon.abs() > 180.0 {
            return Err(RiskError::InvalidInput(format!(
                "not a valid longitude: {lon}"
            )));
        }
        Ok(Self { lat, lon })
    }
}

/// Typed mirror of the directions provider payload.
///
/// Only the fields the pipeline reads are modeled. Anything the provider
/// may omit is an `Option` or a defaulted container, so traversal is a
/// plain tree walk with no dynamic key lookups.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub routes: Vec<Route>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Route {
    pub geometry: LineStringGeometry,
    #[serde(default)]
    pub legs: Vec<RouteLeg>,
    /// Estimated drive time in seconds.
    #[serde(default)]
    pub duration: f64,
}

/// GeoJSON line string: `[lon, lat]` pairs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineStringGeometry {
    #[serde(default)]
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteLeg {
    #[serde(default)]
    pub annotation: Option<LegAnnotation>,
    #[serde(default)]
    pub steps: Vec<RouteStep>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegAnnotation {
    #[serde(default)]
    pub maxspeed: Vec<MaxSpeedEntry>,
}

/// One per-segment speed annotation. Entries flagged `unknown` or `none`
/// carry no speed value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaxSpeedEntry {
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub unknown: Option<bool>,
    #[serde(default)]
    pub none: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RouteStep {
    #[serde(default)]
    pub intersections: Vec<Intersection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Intersection {
    /// Present (with any value) when the segment has urban elements.
    #[serde(default)]
    pub is_urban: Option<bool>,
    #[serde(default)]
    pub mapbox_streets_v8: Option<StreetMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreetMetadata {
    #[serde(default)]
    pub class: Option<String>,
}

impl DirectionsResponse {
    /// The driven route. The provider is asked for a single route; an empty
    /// list is a malformed response, not a valid "no route" answer.
    pub fn primary_route(&self) -> Result<&Route, RiskError> {
        self.routes
            .first()
            .ok_or_else(|| RiskError::provider("directions", "response contains no routes"))
    }

    /// Flatten every intersection across all routes, legs, and steps.
    pub fn intersections(&self) -> impl Iterator<Item = &Intersection> {
        self.routes
            .iter()
            .flat_map(|route| route.legs.iter())
            .flat_map(|leg| leg.steps.iter())
            .flat_map(|step| step.intersections.iter())
    }

    /// Every numeric speed annotation across all route legs.
    pub fn speed_annotations(&self) -> impl Iterator<Item = f64> + '_ {
        self.routes
            .iter()
            .flat_map(|route| route.legs.iter())
            .filter_map(|leg| leg.annotation.as_ref())
            .flat_map(|annotation| annotation.maxspeed.iter())
            .filter_map(|entry| entry.speed)
    }
}

impl Intersection {
    pub fn street_class(&self) -> Option<&str> {
        self.mapbox_streets_v8
            .as_ref()
            .and_then(|meta| meta.class.as_deref())
    }
}

/// The span from requested departure to estimated arrival, in the trip
/// origin's local timezone. Time-dependent features evaluate at both
/// endpoints and merge.
#[derive(Debug, Clone, Copy)]
pub struct TripWindow {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl TripWindow {
    pub fn from_duration(start: DateTime<Tz>, duration_secs: f64) -> Self {
        let millis = (duration_secs * 1000.0).round() as i64;
        Self {
            start,
            end: start + Duration::milliseconds(millis),
        }
    }
}
