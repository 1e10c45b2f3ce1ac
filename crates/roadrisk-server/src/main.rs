//! Road risk server - scores accident risk for proposed car trips.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roadrisk_server::config::Config;
use roadrisk_server::predictor::GbdtPredictor;
use roadrisk_server::state::AppState;
use roadrisk_server::api;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("roadrisk_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting road risk server...");

    let config = Config::from_env();
    let port = config.server_port;

    // Load the model once, before the listener binds; requests share the
    // published instance read-only.
    let predictor = Arc::new(GbdtPredictor::load(&config.model_path, &config.meta_path)?);

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let state = Arc::new(AppState::new(config, predictor));

    let app = api::routes().with_state(state).layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
