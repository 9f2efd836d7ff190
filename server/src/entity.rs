use shared::{Cell, Direction, PowerupKind, Role, ScoreMode};
use std::collections::VecDeque;

/// One connected participant and everything the current round tracks for them.
///
/// Timed effects are stored as absolute millisecond deadlines. A buff is on
/// while `now` is strictly below its deadline; nothing ever counts down.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: u32,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub role: Role,
    /// Head first
    pub body: VecDeque<Cell>,
    pub heading: Direction,
    /// Applied once at the start of this entity's next movement step
    pub pending_heading: Option<Direction>,
    pub alive: bool,
    pub score: u32,
    /// Only meaningful while not alive
    pub respawn_at: Option<u64>,
    pub shield_until: u64,
    pub ghost_until: u64,
    pub fire_until: u64,
    pub kills: u32,
    pub deaths: u32,
    pub consumed: u32,
    pub max_length: usize,
    pub streak: u32,
    pub ready: bool,
}

impl Entity {
    pub fn new(id: u32, name: String, color: String, icon: String, role: Role) -> Self {
        Self {
            id,
            name,
            color,
            icon,
            role,
            body: VecDeque::new(),
            heading: Direction::Right,
            pending_heading: None,
            alive: false,
            score: 0,
            respawn_at: None,
            shield_until: 0,
            ghost_until: 0,
            fire_until: 0,
            kills: 0,
            deaths: 0,
            consumed: 0,
            max_length: 0,
            streak: 0,
            ready: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.role == Role::Active
    }

    /// Alive and taking part in the round.
    pub fn is_playing(&self) -> bool {
        self.alive && self.is_active()
    }

    pub fn head(&self) -> Option<Cell> {
        self.body.front().copied()
    }

    pub fn shielded(&self, now: u64) -> bool {
        now < self.shield_until
    }

    pub fn ghosted(&self, now: u64) -> bool {
        now < self.ghost_until
    }

    pub fn on_fire(&self, now: u64) -> bool {
        now < self.fire_until
    }

    pub fn grant(&mut self, kind: PowerupKind, now: u64) {
        let until = now + kind.duration_ms();
        match kind {
            PowerupKind::Ghost => self.ghost_until = until,
            PowerupKind::Fire => self.fire_until = until,
        }
    }

    /// Takes the buffered heading, discarding it if it would reverse the snake.
    pub fn apply_pending_heading(&mut self) {
        if let Some(next) = self.pending_heading.take() {
            if next != self.heading.opposite() {
                self.heading = next;
            }
        }
    }

    /// Places a fresh default body with its head on `head`, trailing behind
    /// the forward heading, and grants the spawn shield.
    pub fn respawn(
        &mut self,
        head: Cell,
        length: usize,
        width: i32,
        height: i32,
        now: u64,
        shield_ms: u64,
    ) {
        let forward = Direction::Right;
        let (dx, dy) = forward.opposite().vector();

        self.body = (0..length as i32)
            .map(|i| head.offset(dx * i, dy * i, width, height))
            .collect();
        self.heading = forward;
        self.pending_heading = None;
        self.alive = true;
        self.respawn_at = None;
        self.shield_until = now + shield_ms;
        self.ghost_until = 0;
        self.fire_until = 0;
        self.track_length();
    }

    /// Death bookkeeping shared by body collisions and projectile eliminations.
    pub fn eliminate(&mut self, now: u64, mode: ScoreMode, respawn_delay_ms: u64) {
        self.alive = false;
        self.deaths += 1;
        self.score = mode.apply_death_penalty(self.score);
        self.respawn_at = Some(now + respawn_delay_ms);
        self.streak = 0;
        self.pending_heading = None;
    }

    pub fn credit_kill(&mut self, bonus: u32) {
        self.kills += 1;
        self.streak += 1;
        self.score += bonus;
    }

    /// Removes `amount` segments from the tail. Returns false, leaving the
    /// body untouched, when that would drop below `min_length`.
    pub fn shrink(&mut self, amount: usize, min_length: usize) -> bool {
        if self.body.len() < min_length + amount {
            return false;
        }
        self.body.truncate(self.body.len() - amount);
        true
    }

    pub fn track_length(&mut self) {
        self.max_length = self.max_length.max(self.body.len());
    }

    /// Clears everything a round accumulates, keeping identity and roster data.
    pub fn reset_round(&mut self) {
        self.body.clear();
        self.heading = Direction::Right;
        self.pending_heading = None;
        self.alive = false;
        self.score = 0;
        self.respawn_at = None;
        self.shield_until = 0;
        self.ghost_until = 0;
        self.fire_until = 0;
        self.kills = 0;
        self.deaths = 0;
        self.consumed = 0;
        self.max_length = 0;
        self.streak = 0;
    }
}
