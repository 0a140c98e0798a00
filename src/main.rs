use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};
use tokio::sync::watch;

use mediabridge::config::BridgeConfig;
use mediabridge::control::{CommandDispatcher, ScriptActionExecutor};
use mediabridge::publisher::PublishLoop;
use mediabridge::session::ScriptSessionProvider;
use mediabridge::transport::TransportBridge;

#[derive(Parser, Debug)]
#[command(name = "mediabridge", version, about = "Publishes the host's now-playing media state over MQTT")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the broker host
    #[arg(long)]
    broker: Option<String>,

    /// Override the broker port
    #[arg(long)]
    port: Option<u16>,

    /// Override the poll interval in seconds
    #[arg(long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match BridgeConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                std::process::exit(1);
            }
        },
        None => BridgeConfig::default(),
    };

    if let Some(broker) = args.broker {
        config.broker_host = broker;
    }
    if let Some(port) = args.port {
        config.broker_port = port;
    }
    if let Some(interval) = args.interval {
        config.poll_interval_secs = interval;
    }

    mediabridge::logging::init(&config.log_level);

    info!("mediabridge starting for host '{}'", config.host_id());

    // Ctrl+C flips the shutdown flag that both tasks watch
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down");
        let _ = shutdown_tx.send(true);
    }) {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::process::exit(1);
    }

    // An unreachable broker is the one fatal startup condition
    let (bridge, event_loop) = match TransportBridge::connect(&config).await {
        Ok(connected) => connected,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Publishing to '{}', listening on '{}'",
        bridge.status_topic(),
        bridge.command_topic()
    );

    let executor = Arc::new(ScriptActionExecutor::new(
        config.control_command.clone(),
        config.fetch_timeout(),
    ));
    let dispatcher = CommandDispatcher::new(executor);

    let transport = bridge.clone();
    let transport_shutdown = shutdown_rx.clone();
    let transport_task = tokio::spawn(async move {
        transport.run(event_loop, dispatcher, transport_shutdown).await;
    });

    let provider = Arc::new(ScriptSessionProvider::new(
        config.query_command.clone(),
        config.fetch_timeout(),
    ));
    let publish_loop = PublishLoop::new(provider, Arc::new(bridge.clone()), config.poll_interval());

    publish_loop.run(shutdown_rx).await;

    // Loop has stopped; the transport task unsubscribes, disconnects
    // and drains the connection before exiting
    if let Err(e) = transport_task.await {
        warn!("Transport task ended abnormally: {}", e);
    }

    info!("mediabridge stopped");
}
