//! API routes for the risk server.

mod risk;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route(
            "/drive-risk",
            get(risk::drive_risk_get).post(risk::drive_risk_post),
        )
}
