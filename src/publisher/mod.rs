// The polling / publish loop
//
// Single steady state: poll, compare, publish on material change. The
// loop owns `last_published` outright; no other task reads or writes
// it.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::data::{is_material_change, MediaSnapshot};
use crate::session::MediaSessionProvider;
use crate::transport::StatusPublisher;

pub struct PublishLoop {
    provider: Arc<dyn MediaSessionProvider>,
    publisher: Arc<dyn StatusPublisher>,
    interval: Duration,

    /// Last snapshot the broker has confirmed. Advanced only after a
    /// successful publish, so a transient transport failure is retried
    /// on the next tick.
    last_published: Option<MediaSnapshot>,
}

impl PublishLoop {
    pub fn new(
        provider: Arc<dyn MediaSessionProvider>,
        publisher: Arc<dyn StatusPublisher>,
        interval: Duration,
    ) -> Self {
        Self {
            provider,
            publisher,
            interval,
            last_published: None,
        }
    }

    /// One poll cycle: fetch, compare, publish on material change.
    ///
    /// Fetch never fails (failures arrive as error snapshots) and is
    /// awaited with no lock held, serialized by the loop itself.
    pub async fn tick(&mut self) {
        let snapshot = self.provider.fetch().await;

        if !is_material_change(self.last_published.as_ref(), &snapshot) {
            debug!("No material change, skipping publish");
            return;
        }

        match self.publisher.publish_status(&snapshot).await {
            Ok(()) => {
                info!("Published media state: {}", snapshot);
                self.last_published = Some(snapshot);
            }
            Err(e) => {
                // Keep last_published as-is; the unchanged snapshot
                // stays material and is re-attempted next tick.
                warn!("Failed to publish media state: {}", e);
            }
        }
    }

    /// Run until shutdown is signalled. The first tick fires
    /// immediately so the initial state is published at startup.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Starting publish loop ({}s interval, provider '{}')",
            self.interval.as_secs_f64(),
            self.provider.name()
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                _ = shutdown.changed() => {
                    info!("Publish loop stopping");
                    break;
                }
            }
        }
    }
}
