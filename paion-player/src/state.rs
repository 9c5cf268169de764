//! Shared player state
//!
//! Thread-safe state shared between all HTTP handlers: the playlist, the
//! per-bundle info cache, the payload extraction cache, and the event
//! broadcaster feeding SSE clients.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

use paion_common::assets::{self, AssetKind};
use paion_common::events::{event_channel, PlayerEvent};
use paion_common::manifest::{read_manifest, TrackFields};
use paion_common::verify::{verify_bundle, VerifyReport};

use crate::payload::PayloadCache;

/// One playlist entry
#[derive(Debug, Clone)]
pub struct Track {
    pub id: Uuid,
    pub path: PathBuf,
    /// Display title (bundle file stem)
    pub title: String,
}

impl Track {
    fn new(path: PathBuf) -> Self {
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Self {
            id: Uuid::new_v4(),
            path,
            title,
        }
    }
}

/// Presence and location of one companion asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetRef {
    pub exists: bool,
    pub member: String,
    pub ext: String,
}

impl AssetRef {
    fn absent(ext: &str) -> Self {
        Self {
            exists: false,
            member: String::new(),
            ext: ext.to_string(),
        }
    }
}

/// Companion assets of one bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetMap {
    pub cover: AssetRef,
    pub declaration: AssetRef,
    pub prompt: AssetRef,
    pub lyrics: AssetRef,
    pub manifest: AssetRef,
}

impl AssetMap {
    fn empty() -> Self {
        Self {
            cover: AssetRef::absent(""),
            declaration: AssetRef::absent(""),
            prompt: AssetRef::absent(""),
            lyrics: AssetRef::absent(""),
            manifest: AssetRef::absent("json"),
        }
    }

    pub fn get(&self, kind: AssetKind) -> &AssetRef {
        match kind {
            AssetKind::Cover => &self.cover,
            AssetKind::Declaration => &self.declaration,
            AssetKind::Prompt => &self.prompt,
            AssetKind::Lyrics => &self.lyrics,
            AssetKind::Manifest => &self.manifest,
        }
    }

    fn set(&mut self, kind: AssetKind, asset: AssetRef) {
        match kind {
            AssetKind::Cover => self.cover = asset,
            AssetKind::Declaration => self.declaration = asset,
            AssetKind::Prompt => self.prompt = asset,
            AssetKind::Lyrics => self.lyrics = asset,
            AssetKind::Manifest => self.manifest = asset,
        }
    }
}

/// Everything the UI needs to render one playlist entry
#[derive(Debug, Clone, Serialize)]
pub struct TrackInfo {
    pub fields: TrackFields,
    pub verify: VerifyReport,
    pub assets: AssetMap,
}

/// Shared state accessible by all handlers
pub struct PlayerState {
    tracks: RwLock<Vec<Track>>,
    /// Bumped on every load/clear so stale UIs can detect playlist changes
    playlist_version: AtomicU64,
    info_cache: RwLock<HashMap<PathBuf, Arc<TrackInfo>>>,
    pub payload_cache: PayloadCache,
    /// Uploaded bundles live here for the process lifetime
    upload_dir: tempfile::TempDir,
    event_tx: broadcast::Sender<PlayerEvent>,
}

impl PlayerState {
    pub fn new() -> io::Result<Self> {
        let (event_tx, _) = event_channel();
        Ok(Self {
            tracks: RwLock::new(Vec::new()),
            playlist_version: AtomicU64::new(0),
            info_cache: RwLock::new(HashMap::new()),
            payload_cache: PayloadCache::new()?,
            upload_dir: tempfile::Builder::new()
                .prefix("paion_uploads_")
                .tempdir()?,
            event_tx,
        })
    }

    /// Directory where uploaded bundles are saved
    pub fn upload_dir(&self) -> &Path {
        self.upload_dir.path()
    }

    pub fn playlist_version(&self) -> u64 {
        self.playlist_version.load(Ordering::Relaxed)
    }

    /// Broadcast an event to all SSE listeners (no receivers is fine)
    pub fn broadcast_event(&self, event: PlayerEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to the event stream for SSE
    pub fn subscribe_events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_tx.subscribe()
    }

    /// Replace the playlist, bump the version, drop caches
    pub async fn load_tracks(&self, paths: Vec<PathBuf>) -> usize {
        let tracks: Vec<Track> = paths.into_iter().map(Track::new).collect();
        let count = tracks.len();
        *self.tracks.write().await = tracks;
        let version = self.playlist_version.fetch_add(1, Ordering::Relaxed) + 1;
        self.info_cache.write().await.clear();
        self.payload_cache.clear();
        self.broadcast_event(PlayerEvent::PlaylistLoaded {
            track_count: count,
            playlist_version: version,
            timestamp: chrono::Utc::now(),
        });
        count
    }

    /// Empty the playlist
    pub async fn clear(&self) {
        self.tracks.write().await.clear();
        let version = self.playlist_version.fetch_add(1, Ordering::Relaxed) + 1;
        self.info_cache.write().await.clear();
        self.payload_cache.clear();
        self.broadcast_event(PlayerEvent::PlaylistCleared {
            playlist_version: version,
            timestamp: chrono::Utc::now(),
        });
    }

    pub async fn tracks(&self) -> Vec<Track> {
        self.tracks.read().await.clone()
    }

    pub async fn track_count(&self) -> usize {
        self.tracks.read().await.len()
    }

    /// Fetch a track by index, clamped into range.
    ///
    /// Returns `None` only when the playlist is empty; out-of-range indices
    /// resolve to the nearest end so UIs survive playlist shrinks.
    pub async fn track_at_clamped(&self, index: usize) -> Option<Track> {
        let tracks = self.tracks.read().await;
        if tracks.is_empty() {
            return None;
        }
        let clamped = index.min(tracks.len() - 1);
        Some(tracks[clamped].clone())
    }

    /// Compute (or reuse) the full info block for a track.
    ///
    /// Bundle inspection and hashing are blocking work, so they run on the
    /// blocking thread pool.
    pub async fn track_info(&self, track: &Track) -> crate::Result<Arc<TrackInfo>> {
        if let Some(cached) = self.info_cache.read().await.get(&track.path) {
            return Ok(Arc::clone(cached));
        }

        let path = track.path.clone();
        let info = tokio::task::spawn_blocking(move || build_track_info(&path))
            .await
            .map_err(|e| crate::Error::Internal(format!("track info task failed: {e}")))?;
        let info = Arc::new(info);

        self.broadcast_event(PlayerEvent::TrackVerified {
            track_id: track.id,
            status: info.verify.status.label().to_string(),
            timestamp: chrono::Utc::now(),
        });

        self.info_cache
            .write()
            .await
            .insert(track.path.clone(), Arc::clone(&info));
        Ok(info)
    }
}

/// Inspect one bundle: manifest fields, asset members, integrity report.
///
/// Manifest and asset failures degrade to placeholders; only the verify
/// report records what went wrong.
fn build_track_info(path: &Path) -> TrackInfo {
    let fields = match read_manifest(path) {
        Ok(manifest) => TrackFields::from_manifest(&manifest),
        Err(e) => {
            debug!(bundle = %path.display(), "Manifest unreadable: {}", e);
            TrackFields::placeholder()
        }
    };

    let mut asset_map = AssetMap::empty();
    if let Ok(names) = member_names(path) {
        for kind in AssetKind::ALL {
            if let Some(member) = assets::pick_member(&names, kind) {
                let ext = if kind == AssetKind::Manifest {
                    "json".to_string()
                } else {
                    assets::ext_of(&member)
                };
                asset_map.set(
                    kind,
                    AssetRef {
                        exists: true,
                        member,
                        ext,
                    },
                );
            }
        }
    }

    TrackInfo {
        fields,
        verify: verify_bundle(path),
        assets: asset_map,
    }
}

fn member_names(path: &Path) -> paion_common::Result<Vec<String>> {
    let file = std::fs::File::open(path)?;
    let archive = zip::ZipArchive::new(file)?;
    Ok(archive.file_names().map(str::to_owned).collect())
}

/// Read one archive member fully into memory
pub fn read_member(path: &Path, member: &str) -> paion_common::Result<Vec<u8>> {
    use std::io::Read;
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut data = Vec::new();
    archive.by_name(member)?.read_to_end(&mut data)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_bumps_version_and_clear_empties() {
        let state = PlayerState::new().unwrap();
        assert_eq!(state.playlist_version(), 0);
        assert!(state.track_at_clamped(0).await.is_none());

        let count = state
            .load_tracks(vec![PathBuf::from("/tmp/a.aifm"), PathBuf::from("/tmp/b.aifm")])
            .await;
        assert_eq!(count, 2);
        assert_eq!(state.playlist_version(), 1);
        assert_eq!(state.track_count().await, 2);

        state.clear().await;
        assert_eq!(state.playlist_version(), 2);
        assert_eq!(state.track_count().await, 0);
    }

    #[tokio::test]
    async fn track_at_clamps_into_range() {
        let state = PlayerState::new().unwrap();
        state
            .load_tracks(vec![PathBuf::from("/tmp/a.aifm"), PathBuf::from("/tmp/b.aifm")])
            .await;
        let last = state.track_at_clamped(99).await.unwrap();
        assert_eq!(last.title, "b");
        let first = state.track_at_clamped(0).await.unwrap();
        assert_eq!(first.title, "a");
    }

    #[tokio::test]
    async fn load_broadcasts_event() {
        let state = PlayerState::new().unwrap();
        let mut rx = state.subscribe_events();
        state.load_tracks(vec![PathBuf::from("/tmp/a.aifm")]).await;
        match rx.recv().await.unwrap() {
            PlayerEvent::PlaylistLoaded {
                track_count,
                playlist_version,
                ..
            } => {
                assert_eq!(track_count, 1);
                assert_eq!(playlist_version, 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreadable_bundle_still_yields_info() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("junk.aifm");
        std::fs::write(&bad, b"not a zip").unwrap();

        let state = PlayerState::new().unwrap();
        state.load_tracks(vec![bad]).await;
        let track = state.track_at_clamped(0).await.unwrap();
        let info = state.track_info(&track).await.unwrap();
        assert_eq!(info.fields.author, paion_common::manifest::FIELD_PLACEHOLDER);
        assert!(!info.verify.ok);
        assert!(!info.assets.cover.exists);

        // cached on second call
        let again = state.track_info(&track).await.unwrap();
        assert!(Arc::ptr_eq(&info, &again));
    }
}
