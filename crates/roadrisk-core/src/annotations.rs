//! Categorical and scalar facts scanned out of the directions payload.
//!
//! Everything here is an existence/membership check over the annotation
//! tree: no partial credit, no weighting by segment length.

use serde::Serialize;

use crate::models::DirectionsResponse;

const KMH_PER_MPH: f64 = 1.60934;

/// Used when the provider annotates no speeds anywhere; equals 10 mph.
const DEFAULT_MAX_SPEED_KMH: f64 = 16.0934;

const HIGHWAY_CLASSES: [&str; 3] = ["primary", "secondary", "motorway"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadType {
    Highway,
    Urban,
    Rural,
}

impl RoadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoadType::Highway => "highway",
            RoadType::Urban => "urban",
            RoadType::Rural => "rural",
        }
    }
}

/// Route-level facts derived from the annotation tree.
#[derive(Debug, Clone, Copy)]
pub struct RouteFacts {
    pub max_speed_mph: f64,
    pub is_urban: bool,
    pub is_highway: bool,
    pub road_type: RoadType,
    pub road_signs_present: bool,
    pub lane_count: u32,
}

impl RouteFacts {
    pub fn scan(directions: &DirectionsResponse) -> Self {
        let is_urban = any_urban_marker(directions);
        let is_highway = any_highway_class(directions);

        // Highway trumps urban: a route with both markers is a highway.
        let road_type = if is_highway {
            RoadType::Highway
        } else if is_urban {
            RoadType::Urban
        } else {
            RoadType::Rural
        };

        Self {
            max_speed_mph: max_speed_mph(directions),
            is_urban,
            is_highway,
            road_type,
            // The payload has no signage signal; urban presence is the proxy.
            road_signs_present: is_urban,
            lane_count: lane_count(directions),
        }
    }
}

/// Maximum annotated speed across all legs, converted from km/h to mph.
/// Falls back to a 10 mph equivalent when nothing is annotated.
pub fn max_speed_mph(directions: &DirectionsResponse) -> f64 {
    directions
        .speed_annotations()
        .reduce(f64::max)
        .unwrap_or(DEFAULT_MAX_SPEED_KMH)
        / KMH_PER_MPH
}

fn any_urban_marker(directions: &DirectionsResponse) -> bool {
    directions
        .intersections()
        .any(|intersection| intersection.is_urban.is_some())
}

fn any_highway_class(directions: &DirectionsResponse) -> bool {
    directions.intersections().any(|intersection| {
        matches!(intersection.street_class(), Some(class) if HIGHWAY_CLASSES.contains(&class))
    })
}

/// Lane-count proxy from the street class: motorway reads as three lanes,
/// primary/secondary as two, everything else as one. Evaluated on its own,
/// not through the road-type precedence rule.
pub fn lane_count(directions: &DirectionsResponse) -> u32 {
    if directions
        .intersections()
        .any(|intersection| intersection.street_class() == Some("motorway"))
    {
        return 3;
    }
    if directions.intersections().any(|intersection| {
        matches!(
            intersection.street_class(),
            Some("primary") | Some("secondary")
        )
    }) {
        return 2;
    }
    1
}
