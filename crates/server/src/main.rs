mod api;
mod config;
mod dto;
mod state;

use crate::{config::Config, state::AppState};
use axum::routing::{get, post};
use citytransit::{
    provider::{Settings, TransitDataProvider},
    source::{HttpDownloader, HttpTransitService, MemoryStore},
};
use std::{sync::Arc, time::Instant};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    info!("Starting server...");
    let config = Config::from_env();
    let settings = Settings {
        city: config.city.clone(),
        must_refresh: config.must_refresh,
        ..Default::default()
    };
    let provider = TransitDataProvider::new(
        settings,
        Arc::new(HttpDownloader::new(config.feed_url.as_str())),
        Arc::new(MemoryStore::new()),
        Arc::new(HttpTransitService::new(config.service_url.as_str())),
    );

    info!("Loading data for {}...", config.city.name);
    let now = Instant::now();
    match provider.provide_routes().await {
        Ok((routes, _)) => info!("Loaded {} routes in {:?}", routes.len(), now.elapsed()),
        Err(err) => warn!("Initial load failed, serving on demand: {err}"),
    }
    let state = Arc::new(AppState::new(provider));

    let app = axum::Router::new()
        .route("/routes", get(api::routes))
        .route("/routes/kinds", get(api::routes_by_kind))
        .route("/routes/selected", get(api::selected_routes))
        .route("/routes/{id}", get(api::route))
        .route("/stops", get(api::stops))
        .route("/arrivals", get(api::arrivals))
        .route("/realtime", get(api::realtime))
        .route("/update", post(api::update))
        .route("/age", get(api::age))
        .with_state(state);

    let port = config.port;
    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Could not bind port {port}: {err}");
            std::process::exit(1);
        }
    };
    info!("Listening to port {port}");
    if let Err(err) = axum::serve(listener, app).await {
        error!("Server stopped: {err}");
        std::process::exit(1);
    }
}
