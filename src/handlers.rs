//! HTTP route handlers for the map application.
//!
//! Mutating routes run the session operation under the session lock and
//! answer with the render commands the browser must apply, as
//! `{"commands": [...]}`. Failures add an `"error"` message.

use crate::codec::{normalize_center, share_url, MAX_ZOOM};
use crate::dataset;
use crate::geocode::search_places;
use crate::models::{Bounds, Category, LatLng, Mode, Viewport};
use crate::render::{RenderBoundary, RenderCommand, RenderQueue};
use crate::session::{LoadTicket, RestoreOutcome, SessionError};
use crate::templates::map_page;
use crate::AppState;
use axum::{
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

pub const DATASET_FAILED: &str = "Could not load the PSC dataset.";
pub const RESTORE_FAILED: &str = "Could not restore the shared view.";
pub const GEOCODE_FAILED: &str = "Error retrieving geocoder results.";

// ============================================================================
// Responses
// ============================================================================

fn commands(queue: RenderQueue) -> Response {
    Json(json!({ "commands": queue })).into_response()
}

fn failure(status: StatusCode, message: impl std::fmt::Display, queue: RenderQueue) -> Response {
    (status, Json(json!({ "commands": queue, "error": message.to_string() }))).into_response()
}

pub fn status_for(err: &SessionError) -> StatusCode {
    match err {
        SessionError::UnknownRecord(_) => StatusCode::NOT_FOUND,
        SessionError::SelectionTooLarge { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::StaleDataset { .. } => StatusCode::CONFLICT,
    }
}

// ============================================================================
// Dataset Loading
// ============================================================================

/// Fetch the dataset with the session unlocked, then apply it if `ticket` is
/// still current. Load failures leave the index as it was.
pub async fn load_dataset(state: &AppState, ticket: LoadTicket, queue: &mut RenderQueue) {
    let raw = match dataset::load(&state.http, &state.config.dataset, state.config.limit).await {
        Ok(raw) => raw,
        Err(e) => {
            error!(source = %state.config.dataset, error = %e, "dataset load failed");
            queue.notify(DATASET_FAILED);
            return;
        }
    };

    let mut session = state.session.lock().await;
    match session.apply_dataset(ticket, &raw, queue) {
        Ok(report) => debug!(kept = report.kept, "dataset applied"),
        Err(e) => info!(error = %e, "dataset superseded by a later mode switch"),
    }
}

// ============================================================================
// Page and Records
// ============================================================================

pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let session = state.session.lock().await;
    Html(map_page(session.mode(), session.visible()))
}

/// Full render of the current session: markers, layers and links.
pub async fn records(State(state): State<Arc<AppState>>) -> Response {
    let session = state.session.lock().await;
    let mut queue = RenderQueue::new();
    session.render_all(&mut queue);
    commands(queue)
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let session = state.session.lock().await;
    let results: Vec<_> = session
        .search(&query.q)
        .into_iter()
        .map(|r| {
            json!({
                "id": r.id(),
                "title": r.metadata().company_name,
                "category": r.category(),
            })
        })
        .collect();
    Json(json!({ "results": results })).into_response()
}

// ============================================================================
// Links and Layers
// ============================================================================

pub async fn show_link(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let mut session = state.session.lock().await;
    let mut queue = RenderQueue::new();
    match session.show_link(&id, &mut queue) {
        Ok(()) => commands(queue),
        Err(e) => {
            warn!(id = %id, "show link for unknown record");
            failure(status_for(&e), e, queue)
        }
    }
}

pub async fn clear_links(State(state): State<Arc<AppState>>) -> Response {
    let mut session = state.session.lock().await;
    let mut queue = RenderQueue::new();
    session.clear_links(&mut queue);
    commands(queue)
}

#[derive(Debug, Deserialize)]
pub struct AreaRequest {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

pub async fn select_area(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AreaRequest>,
) -> Response {
    let bounds = Bounds::from_corners(
        LatLng::new(body.south, body.west),
        LatLng::new(body.north, body.east),
    );
    let mut session = state.session.lock().await;
    let mut queue = RenderQueue::new();
    match session.select_area(bounds, &mut queue) {
        Ok(added) => {
            debug!(added = added.len(), "area selection linked");
            commands(queue)
        }
        // The notify command already carries the message.
        Err(e) => (status_for(&e), Json(json!({ "commands": queue }))).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct LayerRequest {
    pub visible: bool,
}

pub async fn set_layer(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Json(body): Json<LayerRequest>,
) -> Response {
    let Some(category) = Category::parse(&category) else {
        let message = format!("Unknown category: {}", category);
        return failure(StatusCode::NOT_FOUND, message, RenderQueue::new());
    };
    let mut session = state.session.lock().await;
    let mut queue = RenderQueue::new();
    session.set_layer_visible(category, body.visible, &mut queue);
    commands(queue)
}

// ============================================================================
// Mode
// ============================================================================

pub async fn switch_mode(State(state): State<Arc<AppState>>, Path(mode): Path<String>) -> Response {
    let Some(mode) = Mode::parse(&mode) else {
        let message = format!("Unknown mode: {}", mode);
        return failure(StatusCode::NOT_FOUND, message, RenderQueue::new());
    };

    let mut queue = RenderQueue::new();
    let ticket = state.session.lock().await.switch_mode(mode, &mut queue);
    info!(mode = ?mode, epoch = ticket.epoch, "location mode switched");
    load_dataset(&state, ticket, &mut queue).await;
    commands(queue)
}

// ============================================================================
// Sharing
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub center: LatLng,
    pub zoom: u8,
    #[serde(default)]
    pub popup: Option<String>,
    /// The page URL the share link is built on.
    pub base: String,
}

pub async fn share(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ShareRequest>,
) -> Response {
    let invalid = |message: String| {
        failure(StatusCode::UNPROCESSABLE_ENTITY, message, RenderQueue::new())
    };
    let base = match Url::parse(&body.base) {
        Ok(u) => u,
        Err(e) => return invalid(format!("Invalid page URL: {}", e)),
    };
    let center = match normalize_center(body.center) {
        Ok(c) => c,
        Err(e) => return invalid(format!("Invalid map center: {}", e)),
    };
    if body.zoom > MAX_ZOOM {
        return invalid(format!("Invalid zoom: {}", body.zoom));
    }

    let mut session = state.session.lock().await;
    session.set_viewport(Viewport {
        center,
        zoom: body.zoom,
    });
    session.set_active_popup(body.popup);
    let share = session.share();
    if share.truncated() {
        info!(total = share.total_links, "share truncated links");
    }

    Json(json!({
        "url": share_url(&base, &share.token),
        "token": share.token,
        "warning": share.warning(),
    }))
    .into_response()
}

pub async fn restore(State(state): State<Arc<AppState>>, RawQuery(query): RawQuery) -> Response {
    let mut session = state.session.lock().await;
    let mut queue = RenderQueue::new();
    match session.restore_from_query(query.as_deref().unwrap_or(""), &mut queue) {
        RestoreOutcome::Nothing => commands(queue),
        RestoreOutcome::Restored(report) => Json(json!({
            "commands": queue,
            "linked": report.linked,
            "skipped": report.skipped,
        }))
        .into_response(),
        RestoreOutcome::Failed(_) => {
            failure(StatusCode::UNPROCESSABLE_ENTITY, RESTORE_FAILED, queue)
        }
    }
}

// ============================================================================
// Place Search
// ============================================================================

pub async fn places(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let q = query.q.trim();
    if q.is_empty() {
        return Json(json!({ "places": [] })).into_response();
    }

    match search_places(&state.http, &state.config.geocoder, q).await {
        Ok(places) => {
            let places: Vec<_> = places
                .iter()
                .map(|p| {
                    json!({
                        "display_name": p.display_name,
                        "lat": p.lat,
                        "lon": p.lon,
                        "view": RenderCommand::SetView(p.view()),
                    })
                })
                .collect();
            Json(json!({ "places": places })).into_response()
        }
        Err(e) => {
            warn!(query = %q, error = %e, "geocoder lookup failed");
            failure(StatusCode::BAD_GATEWAY, GEOCODE_FAILED, RenderQueue::new())
        }
    }
}
