//! nestkv Store Server
//!
//! Hosts the remote key/value store used by `nestkv --database remote`.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use clap::Parser;
use nestkv::memtable::MemTable;
use nestkv::network::Server;
use nestkv::Config;
use tracing_subscriber::{fmt, EnvFilter};

/// nestkv Store Server
#[derive(Parser, Debug)]
#[command(name = "nestkv-server")]
#[command(about = "Remote key-value store for nestkv sessions")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    listen: String,

    /// Maximum queued plus active connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Connection worker threads
    #[arg(short, long, default_value = "8")]
    workers: usize,

    /// Idle tick / read timeout in milliseconds
    #[arg(long, default_value = "5000")]
    read_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,nestkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("nestkv Server v{}", nestkv::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .workers(args.workers)
        .read_timeout_ms(args.read_timeout_ms)
        .build();

    let server = match Server::bind(config, Arc::new(MemTable::new())) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    // Setup graceful shutdown
    let shutdown_flag = server.shutdown_flag();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, initiating shutdown...");
        shutdown_flag.store(true, Ordering::Relaxed);
    }) {
        tracing::warn!("Could not install Ctrl+C handler: {}", e);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
