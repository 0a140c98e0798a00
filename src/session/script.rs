use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use tokio::process::Command;

use crate::data::{MediaSnapshot, PlaybackState, SnapshotStatus};
use super::MediaSessionProvider;

/// Raw JSON printed by the media query helper.
///
/// Every field is optional so a partially populated session still
/// parses; missing values normalize to the snapshot defaults.
#[derive(Debug, Deserialize)]
struct HelperOutput {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    album: Option<String>,
    #[serde(default)]
    playback_status: Option<String>,
    #[serde(default)]
    duration_seconds: Option<f64>,
    #[serde(default)]
    position_seconds: Option<f64>,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    message: Option<String>,
}

/// Media session provider that runs an external helper command and
/// parses the single JSON snapshot it prints to stdout.
///
/// The platform-specific part of "ask the OS what is playing" lives in
/// the helper; this provider only normalizes its output.
pub struct ScriptSessionProvider {
    /// Helper command as an argv vector (program first)
    command: Vec<String>,
    /// Upper bound on one query; a slow helper becomes an error snapshot
    timeout: Duration,
}

impl ScriptSessionProvider {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        debug!("Creating ScriptSessionProvider: {:?}", command);
        Self { command, timeout }
    }

    async fn run_helper(&self) -> Result<Vec<u8>, String> {
        let program = self
            .command
            .first()
            .ok_or_else(|| "media query command is empty".to_string())?;

        let mut cmd = Command::new(program);
        cmd.args(&self.command[1..]);
        cmd.kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| format!("media query timed out after {:?}", self.timeout))?
            .map_err(|e| format!("failed to run media query helper: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "media query helper exited with {}: {}",
                output.status,
                stderr.trim()
            ));
        }

        Ok(output.stdout)
    }
}

/// Normalize raw helper output into a snapshot
pub(crate) fn parse_snapshot(raw: &[u8]) -> Result<MediaSnapshot, String> {
    let parsed: HelperOutput = serde_json::from_slice(raw)
        .map_err(|e| format!("unparseable media query output: {}", e))?;

    let status = match parsed.status.as_deref() {
        Some("success") | None => SnapshotStatus::Success,
        Some("no_media") => return Ok(MediaSnapshot::no_media()),
        Some("error") => {
            let message = parsed
                .message
                .unwrap_or_else(|| "media query reported an error".to_string());
            return Ok(MediaSnapshot::query_error(message));
        }
        Some(other) => {
            return Err(format!("unknown media query status '{}'", other));
        }
    };

    Ok(MediaSnapshot {
        status,
        title: parsed.title.unwrap_or_default(),
        artist: parsed.artist.unwrap_or_default(),
        album: parsed.album.unwrap_or_default(),
        playback_status: parsed
            .playback_status
            .as_deref()
            .map(PlaybackState::from_platform)
            .unwrap_or(PlaybackState::Unknown),
        duration_seconds: parsed.duration_seconds.unwrap_or(0.0).max(0.0),
        position_seconds: parsed.position_seconds.unwrap_or(0.0).max(0.0),
        speed: parsed.speed.unwrap_or(1.0),
        error_message: None,
    })
}

#[async_trait]
impl MediaSessionProvider for ScriptSessionProvider {
    async fn fetch(&self) -> MediaSnapshot {
        let raw = match self.run_helper().await {
            Ok(raw) => raw,
            Err(message) => {
                warn!("Media query failed: {}", message);
                return MediaSnapshot::query_error(message);
            }
        };

        match parse_snapshot(&raw) {
            Ok(snapshot) => snapshot,
            Err(message) => {
                warn!("Media query returned bad data: {}", message);
                MediaSnapshot::query_error(message)
            }
        }
    }

    fn name(&self) -> &str {
        "script"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_snapshot() {
        let raw = br#"{
            "status": "success",
            "title": "Song A",
            "artist": "Artist",
            "album": "Album",
            "playback_status": "playing",
            "duration_seconds": 240.5,
            "position_seconds": 12.25
        }"#;
        let snap = parse_snapshot(raw).unwrap();
        assert_eq!(snap.status, SnapshotStatus::Success);
        assert_eq!(snap.title, "Song A");
        assert_eq!(snap.playback_status, PlaybackState::Playing);
        assert_eq!(snap.duration_seconds, 240.5);
        assert_eq!(snap.speed, 1.0);
    }

    #[test]
    fn test_parse_missing_fields_normalize_to_defaults() {
        let snap = parse_snapshot(br#"{"status":"success","title":"Song A"}"#).unwrap();
        assert_eq!(snap.title, "Song A");
        assert_eq!(snap.artist, "");
        assert_eq!(snap.album, "");
        assert_eq!(snap.playback_status, PlaybackState::Unknown);
        assert_eq!(snap.position_seconds, 0.0);
    }

    #[test]
    fn test_parse_unmapped_playback_status() {
        let snap =
            parse_snapshot(br#"{"status":"success","playback_status":"buffering"}"#).unwrap();
        assert_eq!(snap.playback_status, PlaybackState::Unknown);
    }

    #[test]
    fn test_parse_no_media() {
        let snap = parse_snapshot(br#"{"status":"no_media"}"#).unwrap();
        assert_eq!(snap.status, SnapshotStatus::NoMedia);
        assert_eq!(snap.playback_status, PlaybackState::Stopped);
    }

    #[test]
    fn test_parse_helper_error_becomes_error_snapshot() {
        let snap = parse_snapshot(br#"{"status":"error","message":"session gone"}"#).unwrap();
        assert_eq!(snap.status, SnapshotStatus::Error);
        assert_eq!(snap.error_message.as_deref(), Some("session gone"));
    }

    #[test]
    fn test_parse_garbage_is_an_error() {
        assert!(parse_snapshot(b"not json at all").is_err());
    }

    #[tokio::test]
    async fn test_fetch_from_echo_helper() {
        let provider = ScriptSessionProvider::new(
            vec![
                "sh".to_string(),
                "-c".to_string(),
                r#"echo '{"status":"success","title":"Song A","playback_status":"playing"}'"#
                    .to_string(),
            ],
            Duration::from_secs(5),
        );
        let snap = provider.fetch().await;
        assert_eq!(snap.status, SnapshotStatus::Success);
        assert_eq!(snap.title, "Song A");
    }

    #[tokio::test]
    async fn test_fetch_failure_becomes_error_snapshot() {
        let provider = ScriptSessionProvider::new(
            vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()],
            Duration::from_secs(5),
        );
        let snap = provider.fetch().await;
        assert_eq!(snap.status, SnapshotStatus::Error);
        assert!(snap.error_message.is_some());
    }

    #[tokio::test]
    async fn test_fetch_timeout_becomes_error_snapshot() {
        let provider = ScriptSessionProvider::new(
            vec!["sleep".to_string(), "5".to_string()],
            Duration::from_millis(50),
        );
        let snap = provider.fetch().await;
        assert_eq!(snap.status, SnapshotStatus::Error);
    }
}
