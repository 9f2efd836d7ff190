use clap::Parser;
use log::{error, info};
use server::network::{Server, ServerMessage};
use server::RoomConfig;
use shared::{MAX_PLAYERS, ROUND_DURATION_MS, TICK_RATE};
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Tick rate (updates per second)
    #[clap(short, long, default_value_t = TICK_RATE)]
    tick_rate: u32,
    /// Active participants per room, later joiners spectate
    #[clap(short, long, default_value_t = MAX_PLAYERS)]
    max_players: usize,
    /// Maximum concurrent sessions including spectators
    #[clap(long, default_value = "32")]
    max_sessions: usize,
    /// Round length in seconds
    #[clap(short, long, default_value_t = ROUND_DURATION_MS / 1000)]
    round_secs: u64,
    /// Seed for reproducible spawns
    #[clap(short, long)]
    seed: Option<u64>,
    /// Seconds of silence before a session is dropped
    #[clap(long, default_value = "10")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    if args.tick_rate == 0 {
        return Err("tick rate must be positive".into());
    }

    let config = RoomConfig {
        max_players: args.max_players,
        round_duration_ms: args.round_secs * 1000,
        seed: args.seed,
        ..RoomConfig::default()
    };

    let address = format!("{}:{}", args.host, args.port);
    let tick_duration = Duration::from_secs_f64(1.0 / args.tick_rate as f64);

    info!(
        "Starting server on {} at {}Hz ({} players, {}s rounds)",
        address, args.tick_rate, args.max_players, args.round_secs
    );

    let mut server = Server::new(
        &address,
        tick_duration,
        config,
        args.max_sessions,
        Duration::from_secs(args.timeout_secs),
    )
    .await?;

    let shutdown = server.shutdown_sender();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Received Ctrl+C, shutting down gracefully...");
        if shutdown.send(ServerMessage::Shutdown).is_err() {
            error!("Server loop already stopped");
        }
    });

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
    }

    Ok(())
}
