//! Validated participant commands
//!
//! Packets are decoded into [`Command`] at the edge. Dispatch never fails:
//! anything out of context (wrong phase, not host, dead snake, missing buff)
//! is dropped without touching state.

use crate::game::Room;
use log::debug;
use shared::{Direction, Packet, Phase, ScoreMode, SpeedTier};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Turn(Direction),
    SetReady(bool),
    SetName(String),
    SetCosmetics {
        color: Option<String>,
        icon: Option<String>,
    },
    SetSpeed(SpeedTier),
    SetMode(ScoreMode),
    Start,
    Restart,
    Fire,
}

impl Command {
    /// Maps a per-entity packet to a command. Session packets (join, leave)
    /// and server-bound-only packets yield `None`.
    pub fn from_packet(packet: Packet) -> Option<Command> {
        match packet {
            Packet::Turn { direction } => Some(Command::Turn(direction)),
            Packet::SetReady { ready } => Some(Command::SetReady(ready)),
            Packet::SetName { name } => Some(Command::SetName(name)),
            Packet::SetCosmetics { color, icon } => Some(Command::SetCosmetics { color, icon }),
            Packet::SetSpeed { speed } => Some(Command::SetSpeed(speed)),
            Packet::SetMode { mode } => Some(Command::SetMode(mode)),
            Packet::Start => Some(Command::Start),
            Packet::Restart => Some(Command::Restart),
            Packet::Fire => Some(Command::Fire),
            Packet::Join { .. }
            | Packet::Heartbeat
            | Packet::Leave
            | Packet::Welcome(_)
            | Packet::Snapshot(_)
            | Packet::Disconnected { .. } => None,
        }
    }
}

impl Room {
    /// Applies a command from `id`. Unknown ids and invalid commands are no-ops.
    pub fn apply(&mut self, id: u32, command: Command, now: u64) {
        if !self.entities.contains_key(&id) {
            debug!("Dropping {:?} from unknown entity {}", command, id);
            return;
        }

        match command {
            Command::Turn(direction) => self.turn(id, direction),
            Command::SetReady(ready) => self.set_ready(id, ready),
            Command::SetName(name) => self.rename(id, &name),
            Command::SetCosmetics { color, icon } => {
                self.set_cosmetics(id, color.as_deref(), icon.as_deref())
            }
            Command::SetSpeed(speed) => self.set_speed(id, speed),
            Command::SetMode(mode) => self.set_mode(id, mode),
            Command::Start => self.start_round(id, now),
            Command::Restart => self.restart(id),
            Command::Fire => self.fire(id, now),
        }
    }

    /// Buffers a heading for the next movement step. The reversal guard is
    /// applied when the step consumes it.
    fn turn(&mut self, id: u32, direction: Direction) {
        if self.phase != Phase::Playing {
            return;
        }
        if let Some(entity) = self.entities.get_mut(&id) {
            if entity.is_playing() {
                entity.pending_heading = Some(direction);
            }
        }
    }
}
