//! View station process: follows one table through a remote relay and prints every page
//! change as a JSON line for the renderer.

use std::time::Duration;

use clap::Parser;
use tokio::{
    io::BufReader,
    sync::{mpsc, watch},
};
use tracing::{info, warn};

use tennis_relay::{
    config::AppConfig,
    init_tracing,
    stations::{client, console, view::ViewStation},
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Show the countdowns and the winner of one table")]
struct Cli {
    /// Websocket endpoint of the relay.
    #[arg(long, env = "RELAY_URL", default_value = "ws://127.0.0.1:5000/ws")]
    relay: String,
    /// Delay between reconnection attempts, in milliseconds.
    #[arg(long, default_value_t = 2_000)]
    retry_ms: u64,
}

#[tokio::main]
async fn main() {
    init_tracing("info");
    let cli = Cli::parse();
    let config = AppConfig::load();

    let link = client::connect(cli.relay, Duration::from_millis(cli.retry_ms));
    let station = ViewStation::from_config(&config, link.outbound);
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (warning_tx, mut warning_rx) = mpsc::unbounded_channel();
    let (display_tx, mut display_rx) = watch::channel(station.display());

    tokio::spawn(console::read_commands(
        BufReader::new(tokio::io::stdin()),
        console::parse_view,
        command_tx,
    ));
    tokio::spawn(async move {
        while let Some(warning) = warning_rx.recv().await {
            println!("warning: {warning}");
        }
    });
    tokio::spawn(async move {
        while display_rx.changed().await.is_ok() {
            let display = display_rx.borrow_and_update().clone();
            match serde_json::to_string(&display) {
                Ok(line) => println!("{line}"),
                Err(err) => warn!(error = %err, "failed to serialize display"),
            }
        }
    });

    station
        .run(link.inbound, link.status, command_rx, display_tx, warning_tx)
        .await;
    info!("view station stopped");
}
