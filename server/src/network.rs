//! Server network layer handling UDP communications and the room's owning task
//!
//! The receiver and timeout tasks never touch the room. They forward
//! [`ServerMessage`]s over a channel to [`Server::run`], which is the only
//! place commands are applied and ticks are executed, one at a time.

use crate::client_manager::ClientManager;
use crate::command::Command;
use crate::config::RoomConfig;
use crate::game::Room;
use crate::utils::get_timestamp;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, MissedTickBehavior};

/// Largest datagram we accept or produce
const MAX_DATAGRAM: usize = 65_507;

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    ClientTimeout {
        client_id: u32,
    },
    Shutdown,
}

/// Messages sent from game loop to network tasks
#[derive(Debug)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
    },
}

/// Owns the room and coordinates networking around it
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    room: Room,
    tick_duration: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        config: RoomConfig,
        max_clients: usize,
        timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients, timeout))),
            room: Room::new(config),
            tick_duration,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        Ok(self.socket.local_addr()?)
    }

    /// Handle for asking the running loop to stop after its current message
    pub fn shutdown_sender(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = vec![0u8; MAX_DATAGRAM];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { packet } => {
                        let data = match serialize(&packet) {
                            Ok(data) => data,
                            Err(e) => {
                                error!("Failed to serialize broadcast: {}", e);
                                continue;
                            }
                        };
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        for (client_id, addr) in client_addrs {
                            if let Err(e) = socket.send_to(&data, addr).await {
                                error!("Failed to send to client {}: {}", client_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        return;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn broadcast_packet(&self, packet: Packet) {
        if let Err(e) = self.game_tx.send(GameMessage::BroadcastPacket { packet }) {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Applies one inbound packet to the room
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        let now = get_timestamp();

        match packet {
            Packet::Join {
                client_version,
                name,
            } => {
                info!(
                    "Client joining from {} (version: {})",
                    addr, client_version
                );

                if client_version != PROTOCOL_VERSION {
                    let reason = "Protocol version mismatch".to_string();
                    self.send_packet(Packet::Disconnected { reason }, addr);
                    return;
                }

                // A second join from the same address replaces the old session
                let existing = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };
                if let Some(existing_id) = existing {
                    info!("Replacing session {} from {}", existing_id, addr);
                    self.clients.write().await.remove_client(&existing_id);
                    self.room.leave(existing_id);
                }

                if self.clients.read().await.is_full() {
                    let reason = "Server full".to_string();
                    self.send_packet(Packet::Disconnected { reason }, addr);
                    return;
                }

                let welcome = self.room.join(&name, now);
                self.clients.write().await.add_client(welcome.id, addr);
                self.send_packet(Packet::Welcome(welcome), addr);
            }

            Packet::Leave => {
                let client_id = self.clients.read().await.find_client_by_addr(addr);
                if let Some(client_id) = client_id {
                    self.clients.write().await.remove_client(&client_id);
                    self.room.leave(client_id);
                }
            }

            packet => {
                let client_id = self.clients.write().await.touch(addr);
                let Some(client_id) = client_id else {
                    debug!("Packet from unknown address {}", addr);
                    return;
                };

                match Command::from_packet(packet) {
                    Some(command) => self.room.apply(client_id, command, now),
                    None => debug!("Non-command packet from client {}", client_id),
                }
            }
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        // Initialize concurrent tasks
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Server started successfully");

        loop {
            tokio::select! {
                // Handle network events
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            info!("Client {} timed out", client_id);
                            self.room.leave(client_id);
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                // Handle server tick events
                _ = tick_interval.tick() => {
                    let snapshot = self.room.tick(get_timestamp());

                    if snapshot.tick % 100 == 0 && !self.room.is_empty() {
                        debug!(
                            "Tick {}: {} entities, phase {:?}, {} apples",
                            snapshot.tick,
                            self.room.len(),
                            snapshot.phase,
                            snapshot.apples.len()
                        );
                    }

                    if !self.clients.read().await.is_empty() {
                        self.broadcast_packet(Packet::Snapshot(snapshot));
                    }
                },
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_client_timeout_message() {
        let msg = ServerMessage::ClientTimeout { client_id: 42 };

        match msg {
            ServerMessage::ClientTimeout { client_id } => assert_eq!(client_id, 42),
            _ => panic!("Unexpected message type"),
        }
    }

    #[test]
    fn test_channel_communication() {
        let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080);

        let msg = ServerMessage::PacketReceived {
            packet: Packet::Fire,
            addr,
        };
        assert!(tx.send(msg).is_ok());

        match rx.try_recv().unwrap() {
            ServerMessage::PacketReceived { packet, addr: a } => {
                assert_eq!(a, addr);
                assert!(matches!(packet, Packet::Fire));
            }
            _ => panic!("Unexpected message type"),
        }
    }

    async fn test_server() -> Server {
        Server::new(
            "127.0.0.1:0",
            Duration::from_millis(50),
            RoomConfig::seeded(1),
            4,
            Duration::from_secs(5),
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_bind_reports_local_addr() {
        let server = tokio_test::block_on(Server::new(
            "127.0.0.1:0",
            Duration::from_millis(50),
            RoomConfig::seeded(1),
            4,
            Duration::from_secs(5),
        ))
        .unwrap();

        let local = server.local_addr().unwrap();
        assert!(local.ip().is_loopback());
        assert_ne!(local.port(), 0);
        assert!(server.room.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_stops_run() {
        let mut server = test_server().await;
        server.handle_packet(join("alice"), addr(9001)).await;

        let shutdown = server.shutdown_sender();
        assert!(shutdown.send(ServerMessage::Shutdown).is_ok());

        let result = tokio::time::timeout(Duration::from_secs(1), server.run()).await;
        assert!(matches!(result, Ok(Ok(()))));
        assert_eq!(server.room.len(), 1);
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), port)
    }

    fn join(name: &str) -> Packet {
        Packet::Join {
            client_version: PROTOCOL_VERSION,
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_join_creates_session_and_entity() {
        let mut server = test_server().await;

        server.handle_packet(join("alice"), addr(9001)).await;

        assert_eq!(server.room.len(), 1);
        assert_eq!(server.clients.read().await.find_client_by_addr(addr(9001)), Some(1));
        match server.game_rx.try_recv().unwrap() {
            GameMessage::SendPacket {
                packet: Packet::Welcome(welcome),
                addr: a,
            } => {
                assert_eq!(a, addr(9001));
                assert_eq!(welcome.name, "alice");
                assert_eq!(welcome.host, Some(1));
            }
            other => panic!("Unexpected message {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_version_mismatch_is_refused() {
        let mut server = test_server().await;
        let packet = Packet::Join {
            client_version: PROTOCOL_VERSION + 1,
            name: "old".to_string(),
        };

        server.handle_packet(packet, addr(9001)).await;

        assert!(server.room.is_empty());
        assert!(matches!(
            server.game_rx.try_recv().unwrap(),
            GameMessage::SendPacket {
                packet: Packet::Disconnected { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_session_cap() {
        let mut server = test_server().await;
        for port in 9001..9006 {
            server.handle_packet(join("p"), addr(port)).await;
        }

        assert_eq!(server.room.len(), 4);
        assert_eq!(server.clients.read().await.len(), 4);
    }

    #[tokio::test]
    async fn test_rejoin_replaces_session() {
        let mut server = test_server().await;
        server.handle_packet(join("first"), addr(9001)).await;
        server.handle_packet(join("second"), addr(9001)).await;

        assert_eq!(server.room.len(), 1);
        assert_eq!(server.clients.read().await.find_client_by_addr(addr(9001)), Some(2));
        assert_eq!(server.room.host(), Some(2));
    }

    #[tokio::test]
    async fn test_commands_route_to_sender() {
        let mut server = test_server().await;
        server.handle_packet(join("host"), addr(9001)).await;
        server.handle_packet(join("guest"), addr(9002)).await;

        server.handle_packet(Packet::SetReady { ready: true }, addr(9002)).await;
        server.handle_packet(Packet::SetReady { ready: true }, addr(9009)).await;

        assert!(!server.room.entity(1).unwrap().ready);
        assert!(server.room.entity(2).unwrap().ready);
    }

    #[tokio::test]
    async fn test_leave_reassigns_host() {
        let mut server = test_server().await;
        server.handle_packet(join("host"), addr(9001)).await;
        server.handle_packet(join("guest"), addr(9002)).await;

        server.handle_packet(Packet::Leave, addr(9001)).await;

        assert_eq!(server.room.len(), 1);
        assert_eq!(server.room.host(), Some(2));
        assert_eq!(server.clients.read().await.len(), 1);
    }
}
