use clap::Parser;
use log::{error, info};
use tracker::config::{TrackerConfig, DEFAULT_MAX_ROOMS, DEFAULT_MAX_ROOM_SIZE};
use tracker::network::Server;

#[derive(Parser, Debug)]
#[command(author, version, about = "Rendezvous tracker for peer-to-peer chat rooms", long_about = None)]
struct Args {
    /// UDP port to listen on
    #[arg(default_value = "8080")]
    port: u16,

    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Maximum number of rooms that may exist at once
    #[arg(long, default_value_t = DEFAULT_MAX_ROOMS)]
    max_rooms: usize,

    /// Maximum number of peers per room
    #[arg(long, default_value_t = DEFAULT_MAX_ROOM_SIZE)]
    max_room_size: usize,
}

/// Parses the command line, binds the tracker socket and serves until Ctrl+C
/// or a fatal error.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = TrackerConfig::new(args.max_rooms, args.max_room_size);
    let address = format!("{}:{}", args.host, args.port);

    info!("Starting tracker on {}", address);
    let mut server = Server::new(&address, config).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Tracker stopped: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
