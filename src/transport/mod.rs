// MQTT transport bridge
//
// Owns the broker connection. Outbound: retained status publishes.
// Inbound: the command topic, subscribed before startup completes so
// no command is missed, and re-subscribed on every reconnect.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::watch;

use crate::config::BridgeConfig;
use crate::control::CommandDispatcher;
use crate::data::MediaSnapshot;

/// Delay before re-polling the event loop after a connection error;
/// rumqttc reconnects on the next poll
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on flushing the disconnect at shutdown
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to connect to broker: {0}")]
    Connect(String),

    #[error("mqtt client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("failed to serialize status payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Something that can publish a media snapshot to the status channel.
///
/// The publish loop only depends on this seam, which keeps it testable
/// without a broker.
#[async_trait]
pub trait StatusPublisher: Send + Sync {
    async fn publish_status(&self, snapshot: &MediaSnapshot) -> Result<(), TransportError>;
}

/// Status topic for a host
pub fn status_topic(host: &str) -> String {
    format!("media/status/{}", host)
}

/// Command topic for a host
pub fn command_topic(host: &str) -> String {
    format!("media/commands/{}", host)
}

/// Bridge between the publish loop and the MQTT broker.
///
/// Cloning is cheap; all clones share the one underlying connection,
/// which is safe for concurrent publish-from-one-task /
/// deliver-on-another-task use.
#[derive(Clone)]
pub struct TransportBridge {
    client: AsyncClient,
    status_topic: String,
    command_topic: String,
}

impl TransportBridge {
    /// Connect to the broker and subscribe to the host's command topic.
    ///
    /// Blocks until the broker acknowledges both the connection and the
    /// subscription; an unreachable broker is an error here and fatal
    /// at startup. Returns the bridge plus the event loop that the
    /// caller must keep driving via [`TransportBridge::run`].
    pub async fn connect(config: &BridgeConfig) -> Result<(Self, EventLoop), TransportError> {
        let host = config.host_id();
        let client_id = format!("mediabridge-{}", host);

        info!(
            "Connecting to MQTT broker {}:{} as '{}'",
            config.broker_host, config.broker_port, client_id
        );

        let mut options =
            MqttOptions::new(client_id, config.broker_host.clone(), config.broker_port);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut event_loop) = AsyncClient::new(options, 16);

        let bridge = TransportBridge {
            client,
            status_topic: status_topic(&host),
            command_topic: command_topic(&host),
        };

        // Drive the handshake: connection first, then the command-topic
        // subscription, so no inbound command can be missed once
        // connect() returns.
        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    info!("Connected to broker, subscribing to '{}'", bridge.command_topic);
                    bridge
                        .client
                        .subscribe(&bridge.command_topic, QoS::AtLeastOnce)
                        .await?;
                }
                Ok(Event::Incoming(Packet::SubAck(_))) => {
                    debug!("Command topic subscription acknowledged");
                    break;
                }
                Ok(event) => {
                    debug!("Ignoring event during connect: {:?}", event);
                }
                Err(e) => {
                    return Err(TransportError::Connect(e.to_string()));
                }
            }
        }

        Ok((bridge, event_loop))
    }

    /// Topic that status snapshots are published on
    pub fn status_topic(&self) -> &str {
        &self.status_topic
    }

    /// Topic that inbound commands arrive on
    pub fn command_topic(&self) -> &str {
        &self.command_topic
    }

    /// Drive the MQTT event loop until shutdown is signalled.
    ///
    /// Inbound publishes on the command topic are handed to the
    /// dispatcher. On every reconnect acknowledgement the command topic
    /// is re-subscribed, since the broker session may have been lost.
    pub async fn run(
        &self,
        mut event_loop: EventLoop,
        dispatcher: CommandDispatcher,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                event = event_loop.poll() => match event {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        if publish.topic == self.command_topic {
                            dispatcher.dispatch(&publish.topic, &publish.payload);
                        } else {
                            debug!("Ignoring message on unexpected topic '{}'", publish.topic);
                        }
                    }
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("Reconnected to broker, re-subscribing to '{}'", self.command_topic);
                        if let Err(e) = self
                            .client
                            .subscribe(&self.command_topic, QoS::AtLeastOnce)
                            .await
                        {
                            warn!("Failed to re-subscribe to command topic: {}", e);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("MQTT connection error: {}, retrying", e);
                        tokio::time::sleep(RECONNECT_DELAY).await;
                    }
                },
                _ = shutdown.changed() => {
                    debug!("Transport event loop stopping");
                    self.shutdown().await;
                    // The unsubscribe and disconnect only reach the
                    // broker while the event loop is still polled, so
                    // drain until the connection closes.
                    let drain = async {
                        while event_loop.poll().await.is_ok() {}
                    };
                    if tokio::time::timeout(DRAIN_TIMEOUT, drain).await.is_err() {
                        warn!("Timed out draining the MQTT connection");
                    }
                    break;
                }
            }
        }
    }

    /// Queue an unsubscribe and disconnect, best-effort
    async fn shutdown(&self) {
        if let Err(e) = self.client.unsubscribe(&self.command_topic).await {
            warn!("Failed to unsubscribe on shutdown: {}", e);
        }
        if let Err(e) = self.client.disconnect().await {
            warn!("Failed to disconnect cleanly: {}", e);
        }
    }
}

#[async_trait]
impl StatusPublisher for TransportBridge {
    async fn publish_status(&self, snapshot: &MediaSnapshot) -> Result<(), TransportError> {
        let payload = serde_json::to_vec(snapshot)?;
        // retain=true so late subscribers immediately get the last state
        self.client
            .publish(&self.status_topic, QoS::AtLeastOnce, true, payload)
            .await?;
        Ok(())
    }
}
