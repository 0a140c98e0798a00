use std::time::Duration;

use clap::Parser;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};

use mediabridge::data::{CommandMessage, MediaCommand};
use mediabridge::transport::command_topic;

/// Send a playback command to a mediabridge instance
///
/// Example: mediabridge_send_command livingroom next
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Args {
    /// Host identifier of the target mediabridge instance
    host: String,

    /// Action to send: playpause, next or prev
    action: String,

    #[clap(long, default_value = "localhost")]
    broker: String,

    #[clap(long, default_value_t = 1883)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let action = match args.action.as_str() {
        "playpause" => MediaCommand::PlayPause,
        "next" => MediaCommand::Next,
        "prev" => MediaCommand::Prev,
        other => {
            eprintln!("Unknown action '{}': expected playpause, next or prev", other);
            std::process::exit(2);
        }
    };

    let payload = serde_json::to_vec(&CommandMessage::new(action))?;
    let topic = command_topic(&args.host);

    let mut options = MqttOptions::new(
        format!("mediabridge-send-{}", std::process::id()),
        args.broker.clone(),
        args.port,
    );
    options.set_keep_alive(Duration::from_secs(10));

    let (client, mut event_loop) = AsyncClient::new(options, 4);
    client.publish(&topic, QoS::AtLeastOnce, false, payload).await?;

    // Drive the connection until the broker acknowledges the publish
    let deliver = async {
        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::PubAck(_))) => break Ok(()),
                Ok(_) => continue,
                Err(e) => break Err(e),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(10), deliver)
        .await
        .map_err(|_| "timed out waiting for broker acknowledgement")??;

    client.disconnect().await?;
    println!("Sent '{}' to {}", action, topic);
    Ok(())
}
