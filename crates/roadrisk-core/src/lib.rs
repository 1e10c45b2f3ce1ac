//! Trip risk feature pipeline.
//!
//! Turns a directions payload, a departure time, and the current weather
//! into the tabular feature vector consumed by the trained risk model:
//! route curvature over a locally-projected polyline, categorical facts
//! scanned from the annotation tree, time-dependent context merged across
//! the trip window, and the engineered interaction columns.

pub mod annotations;
pub mod error;
pub mod features;
pub mod geometry;
pub mod models;
pub mod pipeline;
pub mod temporal;
pub mod weather;

pub use annotations::{RoadType, RouteFacts};
pub use error::RiskError;
pub use features::{engineer, EngineeredRow, EngineeredTable, FeatureRow, CATEGORICAL_FEATURES};
pub use geometry::RouteGeometry;
pub use models::{Coordinate, DirectionsResponse, TripWindow};
pub use pipeline::{derive_features, score_trip, PredictionResult, Predictor};
pub use temporal::{Lighting, TimeOfDay, TimezoneResolver};
pub use weather::Weather;
