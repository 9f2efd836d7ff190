//! The room aggregate and its match state machine
//!
//! [`Room`] owns every piece of simulation state. Commands and ticks are the
//! only ways to change it and both are expected to come from a single owning
//! task, so nothing in here locks or synchronises. Time is never read from the
//! system clock: every entry point takes `now` in milliseconds.

use crate::config::RoomConfig;
use crate::entity::Entity;
use crate::projectile::Projectile;
use crate::spawner::Powerup;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{Cell, Phase, ScoreMode, Snapshot, SpeedTier};
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct Room {
    pub(crate) config: RoomConfig,
    pub(crate) tick: u32,
    pub(crate) phase: Phase,
    pub(crate) host: Option<u32>,
    pub(crate) round_ends_at: u64,
    pub(crate) speed: SpeedTier,
    pub(crate) mode: ScoreMode,
    /// Keyed by id, ids grow with join order
    pub(crate) entities: BTreeMap<u32, Entity>,
    pub(crate) apples: Vec<Cell>,
    pub(crate) powerups: Vec<Powerup>,
    pub(crate) projectiles: Vec<Projectile>,
    pub(crate) last_step_at: Option<u64>,
    pub(crate) next_id: u32,
    pub(crate) rng: StdRng,
}

impl Room {
    pub fn new(config: RoomConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            config,
            tick: 0,
            phase: Phase::Lobby,
            host: None,
            round_ends_at: 0,
            speed: SpeedTier::default(),
            mode: ScoreMode::default(),
            entities: BTreeMap::new(),
            apples: Vec::new(),
            powerups: Vec::new(),
            projectiles: Vec::new(),
            last_step_at: None,
            next_id: 1,
            rng,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn host(&self) -> Option<u32> {
        self.host
    }

    pub fn speed(&self) -> SpeedTier {
        self.speed
    }

    pub fn mode(&self) -> ScoreMode {
        self.mode
    }

    pub fn round_ends_at(&self) -> u64 {
        self.round_ends_at
    }

    pub fn entity(&self, id: u32) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn apples(&self) -> &[Cell] {
        &self.apples
    }

    pub fn powerups(&self) -> &[Powerup] {
        &self.powerups
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.entities.values().filter(|e| e.is_active()).count()
    }

    pub fn ready_count(&self) -> usize {
        self.entities
            .values()
            .filter(|e| e.is_active() && e.ready)
            .count()
    }

    /// Milliseconds left in the round, zero outside of play.
    pub fn time_remaining(&self, now: u64) -> u64 {
        if self.phase == Phase::Playing {
            self.round_ends_at.saturating_sub(now)
        } else {
            0
        }
    }

    /// Runs one broadcast tick and returns the state every observer should see.
    ///
    /// While playing: the round deadline is checked first, then consumables
    /// are topped up and, if the speed tier's interval has elapsed, one
    /// movement step runs followed by projectiles and respawns.
    pub fn tick(&mut self, now: u64) -> Snapshot {
        if self.phase == Phase::Playing {
            if now >= self.round_ends_at {
                self.phase = Phase::Ended;
                info!("Round ended at tick {}", self.tick);
            } else {
                self.top_up_consumables();
                if self.movement_due(now) {
                    self.last_step_at = Some(now);
                    self.resolve_movement(now);
                    self.advance_projectiles(now);
                    self.respawn_due(now);
                    self.top_up_consumables();
                }
            }
        }

        self.tick = self.tick.wrapping_add(1);
        self.snapshot(now)
    }

    pub(crate) fn movement_due(&self, now: u64) -> bool {
        match self.last_step_at {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.speed.interval_ms(),
        }
    }

    /// Host command: lobby → playing, if enough active participants are ready.
    pub(crate) fn start_round(&mut self, requester: u32, now: u64) {
        if !self.is_host(requester) || self.phase != Phase::Lobby {
            debug!("Ignoring start from {} in {:?}", requester, self.phase);
            return;
        }
        let ready = self.ready_count();
        if ready < self.config.min_ready {
            debug!("Ignoring start: only {} ready", ready);
            return;
        }

        self.phase = Phase::Playing;
        self.round_ends_at = now + self.config.round_duration_ms;
        self.last_step_at = None;
        self.apples.clear();
        self.powerups.clear();
        self.projectiles.clear();

        let ids: Vec<u32> = self.entities.keys().copied().collect();
        for id in ids {
            let head = self.random_cell();
            let (width, height) = (self.config.width, self.config.height);
            let (length, shield_ms) = (self.config.default_body_length, self.config.shield_ms);
            if let Some(entity) = self.entities.get_mut(&id) {
                entity.reset_round();
                if entity.is_active() {
                    entity.respawn(head, length, width, height, now, shield_ms);
                }
            }
        }

        self.top_up_consumables();
        info!(
            "Round started with {} active participants ({} ready), ends at {}",
            self.active_count(),
            ready,
            self.round_ends_at
        );
    }

    /// Host command: any phase → lobby. The roster survives, the round does not.
    pub(crate) fn restart(&mut self, requester: u32) {
        if !self.is_host(requester) {
            debug!("Ignoring restart from non-host {}", requester);
            return;
        }

        self.phase = Phase::Lobby;
        self.round_ends_at = 0;
        self.last_step_at = None;
        self.apples.clear();
        self.powerups.clear();
        self.projectiles.clear();
        for entity in self.entities.values_mut() {
            entity.reset_round();
            entity.ready = false;
        }
        self.ensure_host();
        info!("Room returned to lobby");
    }

    pub(crate) fn set_speed(&mut self, requester: u32, speed: SpeedTier) {
        if self.is_host(requester) {
            self.speed = speed;
            info!("Speed set to {:?}", speed);
        }
    }

    pub(crate) fn set_mode(&mut self, requester: u32, mode: ScoreMode) {
        if self.is_host(requester) {
            self.mode = mode;
            info!("Score mode set to {:?}", mode);
        }
    }

    pub(crate) fn is_host(&self, id: u32) -> bool {
        self.host == Some(id)
    }

    /// Keeps the current host if still present, otherwise promotes the
    /// earliest-joined remaining entity.
    pub(crate) fn ensure_host(&mut self) {
        if let Some(host) = self.host {
            if self.entities.contains_key(&host) {
                return;
            }
        }
        self.host = self.entities.keys().next().copied();
        if let Some(host) = self.host {
            info!("Entity {} is now host", host);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;

    fn lobby_with_ready(count: usize) -> (Room, Vec<u32>) {
        let mut room = Room::new(RoomConfig::seeded(11));
        let ids: Vec<u32> = (0..count)
            .map(|i| room.join(&format!("p{}", i), 0).id)
            .collect();
        for id in &ids {
            room.apply(*id, Command::SetReady(true), 0);
        }
        (room, ids)
    }

    #[test]
    fn test_room_creation() {
        let room = Room::new(RoomConfig::seeded(1));
        assert_eq!(room.phase(), Phase::Lobby);
        assert!(room.host().is_none());
        assert!(room.is_empty());
        assert_eq!(room.time_remaining(0), 0);
    }

    #[test]
    fn test_start_requires_two_ready() {
        let (mut room, ids) = lobby_with_ready(1);
        room.join("late", 0);

        room.apply(ids[0], Command::Start, 100);
        assert_eq!(room.phase(), Phase::Lobby);
    }

    #[test]
    fn test_start_requires_host() {
        let (mut room, ids) = lobby_with_ready(2);

        room.apply(ids[1], Command::Start, 100);
        assert_eq!(room.phase(), Phase::Lobby);

        room.apply(ids[0], Command::Start, 100);
        assert_eq!(room.phase(), Phase::Playing);
    }

    #[test]
    fn test_start_spawns_every_active_entity() {
        let (mut room, ids) = lobby_with_ready(2);
        let idle = room.join("idle", 0).id;

        room.apply(ids[0], Command::Start, 1_000);

        assert_eq!(room.round_ends_at(), 1_000 + room.config.round_duration_ms);
        for id in ids.iter().chain(std::iter::once(&idle)) {
            let entity = room.entity(*id).unwrap();
            assert!(entity.alive);
            assert_eq!(entity.body.len(), room.config.default_body_length);
            assert!(entity.shielded(1_000));
            assert_eq!(entity.score, 0);
        }
        assert_eq!(room.apples().len(), room.config.apple_count);
    }

    #[test]
    fn test_round_ends_at_deadline() {
        let (mut room, ids) = lobby_with_ready(2);
        room.apply(ids[0], Command::Start, 0);
        let deadline = room.round_ends_at();

        room.tick(deadline - 1);
        assert_eq!(room.phase(), Phase::Playing);

        let snapshot = room.tick(deadline);
        assert_eq!(room.phase(), Phase::Ended);
        assert_eq!(snapshot.phase, Phase::Ended);
        assert_eq!(snapshot.time_remaining_ms, 0);
    }

    #[test]
    fn test_ended_room_is_frozen() {
        let (mut room, ids) = lobby_with_ready(2);
        room.apply(ids[0], Command::Start, 0);
        let deadline = room.round_ends_at();
        room.tick(deadline);

        let before: Vec<_> = room.entities().map(|e| e.body.clone()).collect();
        room.tick(deadline + 1_000);
        let after: Vec<_> = room.entities().map(|e| e.body.clone()).collect();

        assert_eq!(before, after);
    }

    #[test]
    fn test_restart_returns_to_lobby() {
        let (mut room, ids) = lobby_with_ready(2);
        room.apply(ids[0], Command::Start, 0);
        room.tick(0);
        room.tick(room.round_ends_at());

        room.apply(ids[0], Command::Restart, 70_000);

        assert_eq!(room.phase(), Phase::Lobby);
        assert!(room.apples().is_empty());
        assert!(room.powerups().is_empty());
        assert!(room.projectiles().is_empty());
        assert_eq!(room.ready_count(), 0);
        assert_eq!(room.len(), 2);
        for entity in room.entities() {
            assert_eq!(entity.score, 0);
            assert_eq!(entity.kills, 0);
            assert_eq!(entity.deaths, 0);
            assert!(entity.body.is_empty());
        }
    }

    #[test]
    fn test_restart_from_non_host_is_ignored() {
        let (mut room, ids) = lobby_with_ready(2);
        room.apply(ids[0], Command::Start, 0);

        room.apply(ids[1], Command::Restart, 10);

        assert_eq!(room.phase(), Phase::Playing);
    }

    #[test]
    fn test_movement_cadence_follows_speed() {
        let (mut room, ids) = lobby_with_ready(2);
        room.apply(ids[0], Command::SetSpeed(SpeedTier::Fast), 0);
        room.apply(ids[0], Command::Start, 0);

        assert!(room.movement_due(0));
        room.tick(0);
        assert!(!room.movement_due(49));
        assert!(room.movement_due(50));
    }

    #[test]
    fn test_host_settings() {
        let (mut room, ids) = lobby_with_ready(2);

        room.apply(ids[1], Command::SetMode(ScoreMode::Classic), 0);
        assert_eq!(room.mode(), ScoreMode::Balanced);

        room.apply(ids[0], Command::SetMode(ScoreMode::Classic), 0);
        room.apply(ids[0], Command::SetSpeed(SpeedTier::Normal), 0);
        assert_eq!(room.mode(), ScoreMode::Classic);
        assert_eq!(room.speed(), SpeedTier::Normal);
    }

    #[test]
    fn test_time_remaining_counts_down() {
        let (mut room, ids) = lobby_with_ready(2);
        room.apply(ids[0], Command::Start, 5_000);

        assert_eq!(room.time_remaining(5_000), room.config.round_duration_ms);
        assert_eq!(room.time_remaining(6_000), room.config.round_duration_ms - 1_000);
        assert_eq!(room.time_remaining(u64::MAX), 0);
    }
}
