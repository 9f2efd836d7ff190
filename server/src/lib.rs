//! # Snake Arena Server Library
//!
//! Authoritative server for a multiplayer snake arena played on a toroidal
//! grid. The server owns the canonical match state, applies participant
//! commands, advances the simulation on a fixed tick and broadcasts a full
//! snapshot to every connected session.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Movement, collisions, consumables, powerups and projectiles are all
//! resolved here. Clients only send intents (turn, ready, fire) and render
//! whatever the latest snapshot says.
//!
//! ### Match Lifecycle
//! A room moves through `Lobby -> Playing -> Ended`. The host starts a round
//! once enough active participants are ready, the round ends on a deadline,
//! and the host may restart back to the lobby at any time.
//!
//! ### Session Management
//! Sessions are bound to UDP addresses. Joining allocates an entity,
//! leaving or timing out removes it and hands the host role to the oldest
//! remaining participant.
//!
//! ## Architecture Design
//!
//! ### Single Owner
//! [`Room`] is a plain value with no interior locking. Exactly one task,
//! [`network::Server::run`], owns it and interleaves commands with ticks.
//!
//! ### Injected Time
//! Every simulation entry point takes `now` in milliseconds, so the whole
//! game can be driven deterministically from tests with a seeded
//! [`RoomConfig`].
//!
//! ## Module Organization
//!
//! - `config`: tunable room parameters
//! - `entity`: per-participant state and buff timers
//! - `game`: the room aggregate, phase machine and tick
//! - `registry`: join, leave, rename and cosmetics
//! - `command`: validated participant commands
//! - `occupancy`: cell ownership index used by collisions
//! - `movement`: one movement step and respawns
//! - `projectile`: firing and projectile travel
//! - `spawner`: apple and powerup placement
//! - `snapshot`: read-only views for broadcast
//! - `client_manager`, `network`: the UDP adapter
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use server::RoomConfig;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(
//!         "127.0.0.1:8080",
//!         Duration::from_millis(50), // 20Hz
//!         RoomConfig::default(),
//!         32,
//!         Duration::from_secs(10),
//!     )
//!     .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod command;
pub mod config;
pub mod entity;
pub mod game;
pub mod movement;
pub mod network;
pub mod occupancy;
pub mod projectile;
pub mod registry;
pub mod snapshot;
pub mod spawner;
pub mod utils;

pub use command::Command;
pub use config::RoomConfig;
pub use game::Room;
