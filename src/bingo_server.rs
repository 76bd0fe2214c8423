// src/bingo_server.rs
//
// Bingo game server. Hosts games over a JSON HTTP API: game admins draw
// numbers and adjudicate claims, players mark tickets and claim wins.
//
// CLI Options:
// - --config: Path to the server configuration file (default conf/server.conf)
// - --host / --port: Override the bind address from the configuration
// - --hints: Enable player hints for newly created games

use std::error::Error;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use clap::Parser;

use bingo::config::ServerConfig;
use bingo::logging::log_info;
use bingo::server;

#[derive(Parser)]
#[command(name = env!("CARGO_BIN_NAME"))]
#[command(about = "Bingo Server - Host 75-ball bingo games over HTTP")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Configuration file to load
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind, overrides the configuration file
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to bind, overrides the configuration file
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable player hints for new games
    #[arg(long)]
    hints: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::load_or_default(),
    };
    if let Some(host) = args.host {
        config.host = host.to_string();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.hints {
        config.hints_enabled = true;
    }

    log_info(&format!("Starting bingo server on {}", config.bind_address()));
    let (server_handle, shutdown_signal) = server::start_server(config);

    tokio::signal::ctrl_c().await?;
    log_info("Shutdown requested, stopping API server...");
    shutdown_signal.store(true, Ordering::Relaxed);

    server_handle.await?;
    log_info("API server stopped");
    Ok(())
}
