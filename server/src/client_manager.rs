//! Session tracking for the UDP adapter
//!
//! This module maps network addresses to room entities, including:
//! - Session lifecycle (join, leave, timeout)
//! - Address lookup for incoming packets
//! - Session capacity, counting spectators as well as active players
//!
//! Sessions carry no game state. Everything about the match lives in the
//! room; a session only remembers who is behind an address and when they
//! last spoke.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A connected participant as seen by the transport
#[derive(Debug)]
pub struct Client {
    /// Entity id assigned by the room on join
    pub id: u32,
    /// Network address for sending responses
    pub addr: SocketAddr,
    /// Last time we received any packet from this client
    pub last_seen: Instant,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
        }
    }

    /// Checks if the client has exceeded the connection timeout
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Tracks every open session and enforces the session cap
pub struct ClientManager {
    /// Sessions indexed by entity id
    clients: HashMap<u32, Client>,
    /// Maximum number of concurrent sessions allowed
    max_clients: usize,
    /// Silence after which a session is dropped
    timeout: Duration,
}

impl ClientManager {
    pub fn new(max_clients: usize, timeout: Duration) -> Self {
        Self {
            clients: HashMap::new(),
            max_clients,
            timeout,
        }
    }

    pub fn is_full(&self) -> bool {
        self.clients.len() >= self.max_clients
    }

    /// Binds an entity id to an address. Returns false if the server is full.
    pub fn add_client(&mut self, id: u32, addr: SocketAddr) -> bool {
        if self.is_full() {
            return false;
        }

        info!("Client {} connected from {}", id, addr);
        self.clients.insert(id, Client::new(id, addr));
        true
    }

    /// Removes a session. Returns true if the client was found and removed,
    /// false if they were already gone.
    pub fn remove_client(&mut self, id: &u32) -> bool {
        if let Some(client) = self.clients.remove(id) {
            info!("Client {} disconnected", client.id);
            true
        } else {
            false
        }
    }

    /// Finds a client ID by their network address
    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<u32> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Refreshes the activity timestamp for whoever sent from `addr`.
    pub fn touch(&mut self, addr: SocketAddr) -> Option<u32> {
        let client = self.clients.values_mut().find(|client| client.addr == addr)?;
        client.last_seen = Instant::now();
        Some(client.id)
    }

    /// Removes and returns every session that has been silent too long.
    pub fn check_timeouts(&mut self) -> Vec<u32> {
        let timeout = self.timeout;
        let timed_out: Vec<u32> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect();

        for id in &timed_out {
            self.remove_client(id);
        }

        timed_out
    }

    /// Gets all client IDs and their network addresses
    pub fn get_client_addrs(&self) -> Vec<(u32, SocketAddr)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.addr))
            .collect()
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
