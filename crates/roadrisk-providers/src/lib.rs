//! HTTP clients for the external data providers.
//!
//! Transport failures and unexpected payload shapes surface as
//! `RiskError::Provider`; nothing here fabricates a value on failure.

pub mod directions;
pub mod forecast;

pub use directions::DirectionsClient;
pub use forecast::ForecastClient;
