//! Server configuration from environment.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub directions_base_url: String,
    pub directions_token: String,
    pub forecast_base_url: String,
    pub model_path: String,
    pub meta_path: String,
    /// CORS origin whitelist, comma-separated in the environment.
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("RISK_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(9400),
            directions_base_url: env::var("MAPBOX_BASE_URL")
                .unwrap_or_else(|_| "https://api.mapbox.com".to_string()),
            directions_token: env::var("MAPBOX_TOKEN").unwrap_or_default(),
            forecast_base_url: env::var("WEATHER_BASE_URL")
                .unwrap_or_else(|_| "https://api.weather.gov".to_string()),
            model_path: env::var("RISK_MODEL_PATH")
                .unwrap_or_else(|_| "ml_model/export/model.gbdt".to_string()),
            meta_path: env::var("RISK_MODEL_META_PATH")
                .unwrap_or_else(|_| "ml_model/export/meta.json".to_string()),
            allowed_origins: env::var("RISK_ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(|origin| origin.trim().to_string())
                        .filter(|origin| !origin.is_empty())
                        .collect()
                })
                .unwrap_or_else(|_| {
                    vec![
                        "http://localhost:3000".to_string(),
                        "http://road-risk-playground.tarterware.info:3000".to_string(),
                        "https://road-risk-playground.tarterware.com".to_string(),
                    ]
                }),
        }
    }
}
