/// Playback state enumeration covering the states reported by the OS media session
use serde::{Serialize, Deserialize};
use strum_macros::EnumString;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlaybackState {
    /// Media is actively playing
    Playing,
    /// Playback is paused
    Paused,
    /// Playback is stopped
    Stopped,
    /// Session is switching tracks or sources
    Changing,
    /// Session has been closed by the player
    Closed,
    /// State reported by the platform could not be mapped
    Unknown,
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState::Unknown
    }
}

impl PlaybackState {
    /// Map a platform status string to a state, defaulting unmapped codes to `Unknown`
    pub fn from_platform(code: &str) -> Self {
        match code.to_lowercase().as_str() {
            "playing" => PlaybackState::Playing,
            "paused" => PlaybackState::Paused,
            "stopped" => PlaybackState::Stopped,
            "changing" => PlaybackState::Changing,
            "closed" => PlaybackState::Closed,
            _ => PlaybackState::Unknown,
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Stopped => write!(f, "stopped"),
            PlaybackState::Changing => write!(f, "changing"),
            PlaybackState::Closed => write!(f, "closed"),
            PlaybackState::Unknown => write!(f, "unknown"),
        }
    }
}
