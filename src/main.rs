//! PSC map - foreign persons with significant control of UK companies.
//!
//! This is the main entry point for the map web server.
//! The application is organized into the following modules:
//!
//! - `models`: Records, categories, coordinates and view snapshots
//! - `classify`: Risk category decision list
//! - `location`: Coordinate choice per location mode
//! - `index`: Record ingestion, lookup and search
//! - `links`: Ordered set of linked records
//! - `codec`: Share-token encoding and decoding
//! - `session`: Investigator session operations
//! - `templates`: HTML/CSS/JS for the map page
//! - `handlers`: HTTP route handlers

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use psc_map::{handlers, render::RenderQueue, AppState, Config};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    let addr = config.addr;
    let state = Arc::new(AppState::new(config).context("building HTTP client")?);

    // Initial load; failures leave an empty map and are logged.
    let ticket = state.session.lock().await.begin_load();
    handlers::load_dataset(&state, ticket, &mut RenderQueue::new()).await;

    let app = Router::new()
        .route("/", get(handlers::index))
        // Records and search
        .route("/api/records", get(handlers::records))
        .route("/api/search", get(handlers::search))
        // Links and layers
        .route("/api/links", axum::routing::delete(handlers::clear_links))
        .route("/api/links/select", post(handlers::select_area))
        .route("/api/links/{id}", post(handlers::show_link))
        .route("/api/layers/{category}", post(handlers::set_layer))
        .route("/api/mode/{mode}", post(handlers::switch_mode))
        // Sharing
        .route("/api/share", post(handlers::share))
        .route("/api/restore", get(handlers::restore))
        // Place search
        .route("/api/places", get(handlers::places))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    info!(%addr, dataset = %state.config.dataset, "PSC map server running");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
