//! Event types for the PAION event system
//!
//! Events are broadcast via `tokio::sync::broadcast` and serialized for SSE
//! transmission to connected UIs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Default broadcast channel capacity for event fan-out
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

/// PAION player event types
///
/// Serialized with a `type` tag so SSE clients can dispatch on the event
/// name without inspecting the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// Playlist replaced by a load operation
    PlaylistLoaded {
        track_count: usize,
        playlist_version: u64,
        timestamp: DateTime<Utc>,
    },

    /// Playlist emptied
    PlaylistCleared {
        playlist_version: u64,
        timestamp: DateTime<Utc>,
    },

    /// A bundle finished integrity verification
    TrackVerified {
        track_id: Uuid,
        /// Status badge label (INTACT, TAMPERED, ...)
        status: String,
        timestamp: DateTime<Utc>,
    },
}

impl PlayerEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::PlaylistLoaded { .. } => "PlaylistLoaded",
            PlayerEvent::PlaylistCleared { .. } => "PlaylistCleared",
            PlayerEvent::TrackVerified { .. } => "TrackVerified",
        }
    }
}

/// Create a broadcast channel sized for SSE fan-out
pub fn event_channel() -> (broadcast::Sender<PlayerEvent>, broadcast::Receiver<PlayerEvent>) {
    broadcast::channel(EVENT_CHANNEL_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_tag_with_type() {
        let event = PlayerEvent::PlaylistCleared {
            playlist_version: 3,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PlaylistCleared");
        assert_eq!(json["playlist_version"], 3);
        assert_eq!(event.event_type(), "PlaylistCleared");
    }
}
