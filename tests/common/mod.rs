//! Shared fakes for the integration tests: a scripted session provider,
//! a recording status publisher and a recording control executor.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use mediabridge::control::{ControlActionExecutor, ControlError};
use mediabridge::data::{MediaCommand, MediaSnapshot, PlaybackState, SnapshotStatus};
use mediabridge::session::MediaSessionProvider;
use mediabridge::transport::{StatusPublisher, TransportError};

/// Provider that replays a scripted sequence of snapshots, repeating
/// the last one once the sequence is exhausted
pub struct SequenceProvider {
    snapshots: Mutex<VecDeque<MediaSnapshot>>,
    last: Mutex<MediaSnapshot>,
    pub fetches: AtomicUsize,
}

impl SequenceProvider {
    pub fn new(snapshots: Vec<MediaSnapshot>) -> Arc<Self> {
        Arc::new(Self {
            snapshots: Mutex::new(snapshots.into()),
            last: Mutex::new(MediaSnapshot::no_media()),
            fetches: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl MediaSessionProvider for SequenceProvider {
    async fn fetch(&self) -> MediaSnapshot {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.snapshots.lock().await;
        match queue.pop_front() {
            Some(snapshot) => {
                *self.last.lock().await = snapshot.clone();
                snapshot
            }
            None => self.last.lock().await.clone(),
        }
    }

    fn name(&self) -> &str {
        "sequence"
    }
}

/// Publisher that records every snapshot it is asked to publish
pub struct RecordingPublisher {
    pub published: Mutex<Vec<MediaSnapshot>>,
    pub fail: AtomicBool,
}

impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            published: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl StatusPublisher for RecordingPublisher {
    async fn publish_status(&self, snapshot: &MediaSnapshot) -> Result<(), TransportError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransportError::Connect("broker unavailable".to_string()));
        }
        self.published.lock().await.push(snapshot.clone());
        Ok(())
    }
}

/// Executor that records every action it is asked to run
pub struct RecordingExecutor {
    pub calls: Mutex<Vec<MediaCommand>>,
}

impl RecordingExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ControlActionExecutor for RecordingExecutor {
    async fn execute(&self, command: MediaCommand) -> Result<(), ControlError> {
        self.calls.lock().await.push(command);
        Ok(())
    }
}

/// A playing snapshot for the given title
pub fn song(title: &str) -> MediaSnapshot {
    MediaSnapshot {
        status: SnapshotStatus::Success,
        title: title.to_string(),
        artist: "Artist".to_string(),
        album: "Album".to_string(),
        playback_status: PlaybackState::Playing,
        duration_seconds: 180.0,
        position_seconds: 0.0,
        speed: 1.0,
        error_message: None,
    }
}
