use clap::Parser;
use log::{error, info};
use peer::TrackerClient;
use shared::{Packet, PacketType, Request};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about = "Interactive peer for the rendezvous tracker", long_about = None)]
struct Args {
    /// Tracker address to talk to
    #[arg(short = 't', long, default_value = "127.0.0.1:8080")]
    tracker: String,

    /// Local address to bind instead of an automatic one
    #[arg(short = 'b', long)]
    bind: Option<String>,
}

fn parse_command(line: &str) -> Result<Option<Request>, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };

    match command {
        "create" | "c" => Ok(Some(Request::Create)),
        "join" | "j" => {
            let room = words
                .next()
                .ok_or("usage: join <room>")?
                .parse()
                .map_err(|_| "room must be a number".to_string())?;
            Ok(Some(Request::Join { room }))
        }
        "leave" | "l" => Ok(Some(Request::Leave)),
        "list" | "r" => Ok(Some(Request::List)),
        other => Err(format!("unknown command {:?}", other)),
    }
}

fn describe(packet: &Packet) -> String {
    if packet.is_error() {
        return match packet.error_code() {
            Some(code) => format!("{} failed: {}", packet.kind, code),
            None => format!("{} failed with code {:#04x}", packet.kind, packet.error),
        };
    }

    match packet.kind {
        PacketType::Create => format!("created room {}", packet.room),
        PacketType::Leave => format!("left room {}", packet.room),
        PacketType::List => packet.text(),
        PacketType::Join | PacketType::Update => {
            let verb = if packet.kind == PacketType::Join {
                "joined"
            } else {
                "update for"
            };
            match packet.roster() {
                Ok(roster) => {
                    let members: Vec<String> = roster.iter().map(|p| p.to_string()).collect();
                    format!("{} room {}: [{}]", verb, packet.room, members.join(", "))
                }
                Err(e) => format!("{} room {}: bad roster ({})", verb, packet.room, e),
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let client = match &args.bind {
        Some(local) => TrackerClient::bind(local, &args.tracker).await?,
        None => TrackerClient::connect(&args.tracker).await?,
    };

    info!("Peer {} using tracker {}", client.local_addr()?, client.tracker_addr());
    info!("Commands: create, join <room>, leave, list, quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if matches!(line.trim(), "quit" | "q") {
                    break;
                }
                match parse_command(&line) {
                    Ok(Some(request)) => {
                        if let Err(e) = client.send(request).await {
                            error!("Failed to send {}: {}", request.kind(), e);
                        }
                    }
                    Ok(None) => {}
                    Err(msg) => println!("{}", msg),
                }
            },

            packet = client.next_packet() => {
                match packet {
                    Ok(packet) => println!("{}", describe(&packet)),
                    Err(e) => error!("Error receiving packet: {}", e),
                }
            },
        }
    }

    Ok(())
}
