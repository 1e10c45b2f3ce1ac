//! Shared application state.
//!
//! Everything here is built once at startup and read-only afterwards;
//! concurrent requests share it through an `Arc` with no further locking.

use std::sync::Arc;

use roadrisk_core::{Predictor, TimezoneResolver};
use roadrisk_providers::{DirectionsClient, ForecastClient};

use crate::config::Config;

pub struct AppState {
    pub config: Config,
    pub directions: DirectionsClient,
    pub forecast: ForecastClient,
    pub timezones: TimezoneResolver,
    pub predictor: Arc<dyn Predictor>,
}

impl AppState {
    pub fn new(config: Config, predictor: Arc<dyn Predictor>) -> Self {
        let directions = DirectionsClient::new(
            config.directions_base_url.clone(),
            config.directions_token.clone(),
        );
        let forecast = ForecastClient::new(config.forecast_base_url.clone());
        Self {
            config,
            directions,
            forecast,
            timezones: TimezoneResolver::new(),
            predictor,
        }
    }
}
