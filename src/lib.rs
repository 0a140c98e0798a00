/// Media snapshot and command data structures
pub mod data;

/// Media session providers (OS "now playing" queries)
pub mod session;

/// MQTT transport bridge
pub mod transport;

/// The polling / publish loop
pub mod publisher;

/// Inbound command dispatch and control actions
pub mod control;

/// Configuration loading
pub mod config;

/// Logging setup
pub mod logging;

// Re-export the core types for convenient access
pub use config::BridgeConfig;
pub use data::{MediaCommand, MediaSnapshot, PlaybackState, SnapshotStatus};
pub use publisher::PublishLoop;
pub use transport::TransportBridge;
