//! HTTP router setup
//!
//! Builds the axum router with the embedded UI, the JSON API, and the SSE
//! stream. The service is local-only; CORS stays permissive so browser tabs
//! on other loopback ports can talk to it.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::PlayerState;

/// Uploads carry whole audio bundles; the axum default of 2 MB is far too
/// small
const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<PlayerState>,
}

/// Create the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Embedded player UI
        .route("/", get(|| async { Html(include_str!("player_ui.html")) }))
        // Health check
        .route("/health", get(super::handlers::health))
        // Playlist
        .route("/api/tracks", get(super::handlers::get_tracks))
        .route("/api/track_info/:index", get(super::handlers::get_track_info))
        .route("/api/load_upload", post(super::handlers::load_upload))
        .route("/api/load_paths", post(super::handlers::load_paths))
        .route("/api/clear", post(super::handlers::clear_playlist))
        // Bundle content
        .route("/api/cover/:index", get(super::handlers::get_cover))
        .route("/api/audio/:index", get(super::handlers::get_audio))
        .route("/api/asset/:index/:kind", get(super::handlers::get_asset))
        // SSE event stream
        .route("/api/events", get(super::sse::event_stream))
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
