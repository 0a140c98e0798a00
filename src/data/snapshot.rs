/// Media snapshot data structure and the comparison policy that decides
/// when a snapshot is worth republishing
use serde::{Serialize, Deserialize};

use super::PlaybackState;

/// Outcome of a media-session query
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    /// A session exists and the fields are populated
    Success,
    /// No active media session on the host
    NoMedia,
    /// The query itself failed
    Error,
}

impl Default for SnapshotStatus {
    fn default() -> Self {
        SnapshotStatus::NoMedia
    }
}

impl std::fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotStatus::Success => write!(f, "success"),
            SnapshotStatus::NoMedia => write!(f, "no_media"),
            SnapshotStatus::Error => write!(f, "error"),
        }
    }
}

fn default_speed() -> f64 {
    1.0
}

/// One observation of the host's playback state.
///
/// Snapshots are immutable once produced: the publish loop holds whole
/// values and replaces them, it never patches fields in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaSnapshot {
    pub status: SnapshotStatus,

    pub title: String,
    pub artist: String,
    pub album: String,

    pub playback_status: PlaybackState,

    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default)]
    pub position_seconds: f64,

    /// Playback rate multiplier, 1.0 when the platform does not report one
    #[serde(default = "default_speed")]
    pub speed: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Default for MediaSnapshot {
    fn default() -> Self {
        MediaSnapshot {
            status: SnapshotStatus::NoMedia,
            title: String::new(),
            artist: String::new(),
            album: String::new(),
            playback_status: PlaybackState::Unknown,
            duration_seconds: 0.0,
            position_seconds: 0.0,
            speed: 1.0,
            error_message: None,
        }
    }
}

impl MediaSnapshot {
    /// Snapshot for a host with no active media session
    pub fn no_media() -> Self {
        MediaSnapshot {
            status: SnapshotStatus::NoMedia,
            playback_status: PlaybackState::Stopped,
            ..Default::default()
        }
    }

    /// Snapshot representing a failed session query
    pub fn query_error(message: impl Into<String>) -> Self {
        MediaSnapshot {
            status: SnapshotStatus::Error,
            playback_status: PlaybackState::Unknown,
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Project this snapshot to its comparison key.
    ///
    /// Position and duration advance on every poll while a track plays,
    /// so they are excluded from the key. They still appear in the
    /// published payload.
    pub fn comparison_key(&self) -> ComparisonKey<'_> {
        ComparisonKey {
            status: self.status,
            title: &self.title,
            artist: &self.artist,
            album: &self.album,
            playback_status: self.playback_status,
            speed: self.speed,
        }
    }
}

impl std::fmt::Display for MediaSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            SnapshotStatus::Success => {
                write!(f, "{} - {} [{}]", self.artist, self.title, self.playback_status)
            }
            SnapshotStatus::NoMedia => write!(f, "no media session"),
            SnapshotStatus::Error => write!(
                f,
                "query error: {}",
                self.error_message.as_deref().unwrap_or("unknown")
            ),
        }
    }
}

/// Derived view of a snapshot used only for equality testing, never published
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonKey<'a> {
    pub status: SnapshotStatus,
    pub title: &'a str,
    pub artist: &'a str,
    pub album: &'a str,
    pub playback_status: PlaybackState,
    pub speed: f64,
}

/// Decide whether `curr` differs from the previously published snapshot
/// in a way that warrants a publish.
///
/// A `None` previous state is the startup sentinel and is always a
/// material change, so the first genuine snapshot is always published.
pub fn is_material_change(prev: Option<&MediaSnapshot>, curr: &MediaSnapshot) -> bool {
    match prev {
        Some(prev) => prev.comparison_key() != curr.comparison_key(),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_snapshot() -> MediaSnapshot {
        MediaSnapshot {
            status: SnapshotStatus::Success,
            title: "Song A".to_string(),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            playback_status: PlaybackState::Playing,
            duration_seconds: 240.0,
            position_seconds: 10.0,
            speed: 1.0,
            error_message: None,
        }
    }

    #[test]
    fn test_position_and_duration_are_not_material() {
        let a = playing_snapshot();
        let mut b = a.clone();
        b.position_seconds = 13.0;
        b.duration_seconds = 241.0;
        assert!(!is_material_change(Some(&a), &b));
    }

    #[test]
    fn test_identical_snapshots_are_not_material() {
        let a = playing_snapshot();
        assert!(!is_material_change(Some(&a), &a.clone()));
    }

    #[test]
    fn test_each_identity_field_is_material() {
        let base = playing_snapshot();

        let mut title = base.clone();
        title.title = "Song B".to_string();
        assert!(is_material_change(Some(&base), &title));

        let mut artist = base.clone();
        artist.artist = "Other Artist".to_string();
        assert!(is_material_change(Some(&base), &artist));

        let mut album = base.clone();
        album.album = "Other Album".to_string();
        assert!(is_material_change(Some(&base), &album));

        let mut state = base.clone();
        state.playback_status = PlaybackState::Paused;
        assert!(is_material_change(Some(&base), &state));

        let mut speed = base.clone();
        speed.speed = 1.5;
        assert!(is_material_change(Some(&base), &speed));
    }

    #[test]
    fn test_status_change_is_material() {
        let playing = playing_snapshot();
        let gone = MediaSnapshot::no_media();
        assert!(is_material_change(Some(&playing), &gone));
    }

    #[test]
    fn test_startup_sentinel_always_publishes() {
        assert!(is_material_change(None, &playing_snapshot()));
        assert!(is_material_change(None, &MediaSnapshot::no_media()));
        assert!(is_material_change(None, &MediaSnapshot::query_error("boom")));
    }

    #[test]
    fn test_no_media_snapshot_shape() {
        let snap = MediaSnapshot::no_media();
        assert_eq!(snap.status, SnapshotStatus::NoMedia);
        assert_eq!(snap.playback_status, PlaybackState::Stopped);
        assert!(snap.title.is_empty());
        assert_eq!(snap.duration_seconds, 0.0);
        assert_eq!(snap.position_seconds, 0.0);
    }

    #[test]
    fn test_error_message_serialized_only_when_present() {
        let ok = serde_json::to_value(playing_snapshot()).unwrap();
        assert!(ok.get("error_message").is_none());
        assert_eq!(ok["status"], "success");
        assert_eq!(ok["playback_status"], "playing");
        assert_eq!(ok["position_seconds"], 10.0);

        let err = serde_json::to_value(MediaSnapshot::query_error("query failed")).unwrap();
        assert_eq!(err["status"], "error");
        assert_eq!(err["error_message"], "query failed");
    }
}
