use bincode::{deserialize, serialize};
use clap::Parser;
use shared::{Direction, Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout};

/// Scripted participant for poking at a running server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server address
    #[clap(short, long, default_value = "127.0.0.1:8080")]
    server: String,
    /// Display name to join with
    #[clap(short, long, default_value = "bot")]
    name: String,
    /// Comma separated headings to cycle through, e.g. "up,left,down"
    #[clap(short, long, default_value = "up,right,down,left")]
    turns: String,
    /// Mark ready after joining
    #[clap(short, long)]
    ready: bool,
    /// Ask to start the round (only honoured for the host)
    #[clap(long)]
    start: bool,
    /// Seconds to stay connected
    #[clap(short, long, default_value = "10")]
    duration: u64,
}

async fn send(
    socket: &UdpSocket,
    packet: &Packet,
    server: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    socket.send_to(&serialize(packet)?, server).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let turns: Vec<Direction> = args
        .turns
        .split(',')
        .filter_map(|token| Direction::parse(token.trim()))
        .collect();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    println!("Client socket bound to {}", socket.local_addr()?);

    let server_addr = args.server.parse::<SocketAddr>()?;
    let join = Packet::Join {
        client_version: PROTOCOL_VERSION,
        name: args.name.clone(),
    };
    println!("Sending join request to {}", server_addr);
    send(&socket, &join, server_addr).await?;

    let mut buf = vec![0u8; 65_507];

    // The server starts broadcasting as soon as we are registered, so skip
    // anything until the welcome arrives.
    let welcome = loop {
        let (len, _) = timeout(Duration::from_secs(5), socket.recv_from(&mut buf)).await??;
        match deserialize::<Packet>(&buf[..len]) {
            Ok(Packet::Welcome(welcome)) => break welcome,
            Ok(Packet::Disconnected { reason }) => {
                println!("Join refused: {}", reason);
                return Ok(());
            }
            Ok(_) => continue,
            Err(e) => println!("Failed to deserialize response: {}", e),
        }
    };
    println!(
        "Joined as {} ({:?}) id={} host={:?}",
        welcome.name, welcome.role, welcome.id, welcome.host
    );

    if args.ready {
        send(&socket, &Packet::SetReady { ready: true }, server_addr).await?;
    }
    if args.start {
        send(&socket, &Packet::Start, server_addr).await?;
    }

    let mut turn_index = 0;
    for second in 0..args.duration {
        if !turns.is_empty() {
            let direction = turns[turn_index % turns.len()];
            turn_index += 1;
            send(&socket, &Packet::Turn { direction }, server_addr).await?;
        }
        send(&socket, &Packet::Heartbeat, server_addr).await?;

        match timeout(Duration::from_millis(500), socket.recv_from(&mut buf)).await {
            Ok(Ok((len, _))) => match deserialize::<Packet>(&buf[..len]) {
                Ok(Packet::Snapshot(snapshot)) => {
                    println!(
                        "[{}s] tick {} {:?} {}ms left, {} apples",
                        second,
                        snapshot.tick,
                        snapshot.phase,
                        snapshot.time_remaining_ms,
                        snapshot.apples.len()
                    );
                    for e in &snapshot.entities {
                        println!(
                            "  {} {} score={} kills={} len={} alive={}",
                            e.icon,
                            e.name,
                            e.score,
                            e.kills,
                            e.body.len(),
                            e.alive
                        );
                    }
                }
                Ok(other) => println!("Unexpected packet: {:?}", other),
                Err(e) => println!("Failed to deserialize snapshot: {}", e),
            },
            Ok(Err(e)) => println!("Error receiving snapshot: {}", e),
            Err(_) => println!("No snapshot within 500ms"),
        }

        sleep(Duration::from_secs(1)).await;
    }

    println!("Sending leave");
    send(&socket, &Packet::Leave, server_addr).await?;
    println!("Test client finished");

    Ok(())
}
