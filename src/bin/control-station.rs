//! Control station process: scores tables from operator lines on stdin and publishes them
//! through a remote relay.

use std::time::Duration;

use clap::Parser;
use tokio::{io::BufReader, sync::mpsc};
use tracing::info;

use tennis_relay::{
    config::AppConfig,
    init_tracing,
    stations::{client, console, control::ControlStation},
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Score tables and publish them through the relay")]
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
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();

    tokio::spawn(console::read_commands(
        BufReader::new(tokio::io::stdin()),
        console::parse_control,
        command_tx,
    ));
    tokio::spawn(async move {
        while let Some(notice) = notice_rx.recv().await {
            println!("{notice}");
        }
    });

    let station = ControlStation::from_config(&config, link.outbound);
    station
        .run(link.inbound, link.status, command_rx, notice_tx)
        .await;
    info!("control station stopped");
}
