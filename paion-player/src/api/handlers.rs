//! HTTP request handlers
//!
//! Implements the player's JSON API. Index parameters are clamped into the
//! playlist range (not rejected), so a UI holding a stale index after a
//! playlist shrink still gets a sensible answer.

use std::path::PathBuf;

use axum::extract::{Multipart, Path, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{error, info, warn};
use uuid::Uuid;

use paion_common::assets::{self, AssetKind};

use crate::api::server::AppContext;
use crate::scan::collect_aifm_files;
use crate::state::{read_member, Track, TrackInfo};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
pub struct TracksResponse {
    tracks: Vec<TrackSummary>,
    playlist_version: u64,
}

#[derive(Debug, Serialize)]
pub struct TrackSummary {
    id: Uuid,
    title: String,
    path: String,
}

impl From<Track> for TrackSummary {
    fn from(track: Track) -> Self {
        Self {
            id: track.id,
            title: track.title,
            path: track.path.to_string_lossy().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoadPathsRequest {
    paths: Vec<PathBuf>,
}

/// Load endpoints answer in the `{ok, count}` / `{ok, error}` shape the UI
/// expects
#[derive(Debug, Serialize)]
pub struct LoadResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl LoadResponse {
    fn loaded(count: usize) -> Self {
        Self {
            ok: true,
            count: Some(count),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            count: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    ok: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn not_found(msg: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: msg.to_string(),
        }),
    )
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "paion-player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Playlist Endpoints
// ============================================================================

/// GET /api/tracks - Current playlist with version counter
pub async fn get_tracks(State(ctx): State<AppContext>) -> Json<TracksResponse> {
    let tracks = ctx.state.tracks().await;
    Json(TracksResponse {
        tracks: tracks.into_iter().map(TrackSummary::from).collect(),
        playlist_version: ctx.state.playlist_version(),
    })
}

/// GET /api/track_info/:index - Metadata, verification and asset presence
pub async fn get_track_info(
    State(ctx): State<AppContext>,
    Path(index): Path<usize>,
) -> Result<Json<TrackInfo>, ApiError> {
    let track = ctx
        .state
        .track_at_clamped(index)
        .await
        .ok_or_else(|| not_found("no tracks"))?;

    match ctx.state.track_info(&track).await {
        Ok(info) => Ok(Json((*info).clone())),
        Err(e) => {
            error!(bundle = %track.path.display(), "Failed to build track info: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("track info error: {e}"),
                }),
            ))
        }
    }
}

/// POST /api/load_upload - Multipart upload of `.aifm` bundles.
///
/// Replaces the playlist with the uploaded set; anything that is not an
/// `.aifm` file is skipped.
pub async fn load_upload(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> Result<Json<LoadResponse>, (StatusCode, Json<LoadResponse>)> {
    let mut saved: Vec<PathBuf> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart upload: {}", e);
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(LoadResponse::failed(format!("upload error: {e}"))),
                ));
            }
        };

        // only the `files` field carries bundles
        if field.name() != Some("files") {
            continue;
        }
        let Some(name) = field.file_name().map(sanitize_filename) else {
            continue;
        };
        if !crate::scan::is_aifm(std::path::Path::new(&name)) {
            continue;
        }

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                warn!(file = %name, "Failed to read upload body: {}", e);
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(LoadResponse::failed(format!("upload error: {e}"))),
                ));
            }
        };

        let out = ctx.state.upload_dir().join(&name);
        if let Err(e) = tokio::fs::write(&out, &data).await {
            error!(file = %out.display(), "Failed to save upload: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(LoadResponse::failed(format!("save error: {e}"))),
            ));
        }
        saved.push(out);
    }

    if saved.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(LoadResponse::failed("No .aifm files uploaded")),
        ));
    }

    saved.sort();
    saved.dedup();
    let count = ctx.state.load_tracks(saved).await;
    info!(count, "Playlist loaded from upload");
    Ok(Json(LoadResponse::loaded(count)))
}

/// POST /api/load_paths - Load bundles from local files and folders
pub async fn load_paths(
    State(ctx): State<AppContext>,
    Json(req): Json<LoadPathsRequest>,
) -> Result<Json<LoadResponse>, (StatusCode, Json<LoadResponse>)> {
    let inputs = req.paths;
    let found = tokio::task::spawn_blocking(move || collect_aifm_files(&inputs))
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(LoadResponse::failed(format!("scan failed: {e}"))),
            )
        })?;

    if found.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(LoadResponse::failed("No .aifm files found")),
        ));
    }

    let count = ctx.state.load_tracks(found).await;
    info!(count, "Playlist loaded from local paths");
    Ok(Json(LoadResponse::loaded(count)))
}

/// POST /api/clear - Empty the playlist
pub async fn clear_playlist(State(ctx): State<AppContext>) -> Json<OkResponse> {
    ctx.state.clear().await;
    info!("Playlist cleared");
    Json(OkResponse { ok: true })
}

// ============================================================================
// Bundle Content Endpoints
// ============================================================================

/// GET /api/cover/:index - Cover art bytes
pub async fn get_cover(State(ctx): State<AppContext>, Path(index): Path<usize>) -> Response {
    let Some(track) = ctx.state.track_at_clamped(index).await else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Ok(info) = ctx.state.track_info(&track).await else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if !info.assets.cover.exists {
        return StatusCode::NOT_FOUND.into_response();
    }
    serve_zip_member(&track.path, info.assets.cover.member.clone()).await
}

/// GET /api/asset/:index/:kind - Declaration/prompt/lyrics/manifest bytes
pub async fn get_asset(
    State(ctx): State<AppContext>,
    Path((index, kind)): Path<(usize, String)>,
) -> Response {
    // cover has its own endpoint; everything else resolves through the map
    let kind = match AssetKind::parse(&kind) {
        Some(AssetKind::Cover) | None => return StatusCode::NOT_FOUND.into_response(),
        Some(kind) => kind,
    };

    let Some(track) = ctx.state.track_at_clamped(index).await else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Ok(info) = ctx.state.track_info(&track).await else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let asset = info.assets.get(kind);
    if !asset.exists {
        return StatusCode::NOT_FOUND.into_response();
    }
    serve_zip_member(&track.path, asset.member.clone()).await
}

/// GET /api/audio/:index - Payload audio, with Range support for seeking
pub async fn get_audio(
    State(ctx): State<AppContext>,
    Path(index): Path<usize>,
    request: Request,
) -> Response {
    let Some(track) = ctx.state.track_at_clamped(index).await else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let state = ctx.state.clone();
    let path = track.path.clone();
    let extracted =
        tokio::task::spawn_blocking(move || state.payload_cache.get_audio_file(&path)).await;

    let audio_path = match extracted {
        Ok(Ok(path)) => path,
        Ok(Err(e)) => {
            error!(bundle = %track.path.display(), "Payload extraction failed: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("audio error: {e}"))
                .into_response();
        }
        Err(e) => {
            error!("Payload extraction task failed: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // ServeFile handles Range/If-Modified-Since and guesses the MIME from
    // the extension preserved during extraction
    match ServeFile::new(&audio_path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            error!(file = %audio_path.display(), "Failed to serve audio: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Read an archive member on the blocking pool and answer with inline bytes
async fn serve_zip_member(bundle: &std::path::Path, member: String) -> Response {
    let bundle = bundle.to_path_buf();
    let member_for_task = member.clone();
    let data =
        tokio::task::spawn_blocking(move || read_member(&bundle, &member_for_task)).await;

    match data {
        Ok(Ok(bytes)) => {
            let disposition = format!("inline; filename=\"{}\"", assets::basename(&member));
            (
                [
                    (header::CONTENT_TYPE, assets::guess_mime(&member).to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Ok(Err(e)) => {
            warn!(member = %member, "Failed to read bundle member: {}", e);
            StatusCode::NOT_FOUND.into_response()
        }
        Err(e) => {
            error!("Member read task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Reduce an uploaded filename to a safe basename
fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);
    base.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | ' '))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\music\\song.aifm"), "song.aifm");
        assert_eq!(sanitize_filename("my song (1).aifm"), "my song 1.aifm");
    }
}
