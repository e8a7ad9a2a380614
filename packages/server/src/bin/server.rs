//! Real-time room messaging and presence server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tamariba-server
//! cargo run --bin tamariba-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;

use tamariba_server::{
    infrastructure::transport::ChannelTransport,
    service::{
        Broadcaster, ChatService, ConnectionRegistry, HistoryStore, Notifier, RoomDirectory,
        StatsService,
    },
    ui::Server,
};
use tamariba_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Real-time room messaging and presence server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Clock and transport
    // 2. Leaf components (registry, room directory, history store)
    // 3. Broadcaster, notifier, stats
    // 4. ChatService
    // 5. Server

    // 1. Clock and transport
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let transport = Arc::new(ChannelTransport::new());

    // 2. Leaf components; the protected rooms and their histories exist
    //    before any traffic is accepted
    let registry = Arc::new(ConnectionRegistry::new());
    let directory = Arc::new(RoomDirectory::with_protected_rooms(clock.now_millis()));
    let history = Arc::new(HistoryStore::with_rooms(
        &RoomDirectory::protected_room_ids(),
    ));

    // 3. Broadcaster, notifier, stats
    let broadcaster = Arc::new(Broadcaster::new(
        registry.clone(),
        directory.clone(),
        transport.clone(),
    ));
    let notifier = Arc::new(Notifier::new(
        registry.clone(),
        broadcaster.clone(),
        transport.clone(),
        clock.clone(),
    ));
    let stats = Arc::new(StatsService::new(registry.clone(), directory.clone()));

    // 4. ChatService
    let chat = Arc::new(ChatService::new(
        registry,
        directory,
        history,
        broadcaster.clone(),
        clock,
    ));

    // 5. Create and run the server
    let server = Server::new(chat, broadcaster, notifier, stats, transport);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
