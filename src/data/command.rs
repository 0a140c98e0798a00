/// Playback commands that can arrive on the command topic
use serde::{Serialize, Deserialize};
use strum_macros::EnumString;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaCommand {
    /// Toggle between playing and paused
    #[serde(rename = "playpause")]
    PlayPause,

    #[serde(rename = "next")]
    Next,

    #[serde(rename = "prev")]
    Prev,

    /// Catch-all for unrecognized actions; logged, never executed
    #[serde(other)]
    Unknown,
}

impl MediaCommand {
    /// Argument passed to the platform control command
    pub fn action_name(&self) -> Option<&'static str> {
        match self {
            MediaCommand::PlayPause => Some("playpause"),
            MediaCommand::Next => Some("next"),
            MediaCommand::Prev => Some("prev"),
            MediaCommand::Unknown => None,
        }
    }
}

impl std::fmt::Display for MediaCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaCommand::PlayPause => write!(f, "playpause"),
            MediaCommand::Next => write!(f, "next"),
            MediaCommand::Prev => write!(f, "prev"),
            MediaCommand::Unknown => write!(f, "unknown"),
        }
    }
}

/// Wire format of messages on the command topic: `{"action": "..."} `
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandMessage {
    pub action: MediaCommand,
}

impl CommandMessage {
    pub fn new(action: MediaCommand) -> Self {
        CommandMessage { action }
    }
}
