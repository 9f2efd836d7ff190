//! Room tuning knobs
//!
//! Every rule constant the simulation reads lives in [`RoomConfig`]. The
//! defaults mirror the constants exported by `shared`, the binary overrides a
//! few of them from the command line, and tests shrink grids or timers to
//! build precise scenarios.

use shared::{
    GridSize, APPLE_COUNT, DEFAULT_BODY_LENGTH, FIRE_DAMAGE, FIRE_RANGE, GRID_HEIGHT, GRID_WIDTH,
    KILL_BONUS, MAX_NAME_LENGTH, MAX_PLAYERS, MIN_BODY_LENGTH, POWERUP_COUNT, RESPAWN_DELAY_MS,
    ROUND_DURATION_MS, SHIELD_MS, SPAWN_ATTEMPTS,
};

#[derive(Debug, Clone)]
pub struct RoomConfig {
    pub width: i32,
    pub height: i32,
    /// Active participants allowed before newcomers become spectators
    pub max_players: usize,
    /// Ready active participants needed before the host may start
    pub min_ready: usize,
    pub apple_count: usize,
    pub powerup_count: usize,
    /// Placement samples per consumable before the spawner gives up
    pub spawn_attempts: u32,
    pub round_duration_ms: u64,
    pub respawn_delay_ms: u64,
    pub shield_ms: u64,
    pub default_body_length: usize,
    pub min_body_length: usize,
    pub kill_bonus: u32,
    pub fire_range: u32,
    pub fire_damage: usize,
    pub max_name_length: usize,
    /// Fixed RNG seed; `None` seeds from OS entropy
    pub seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
            max_players: MAX_PLAYERS,
            min_ready: 2,
            apple_count: APPLE_COUNT,
            powerup_count: POWERUP_COUNT,
            spawn_attempts: SPAWN_ATTEMPTS,
            round_duration_ms: ROUND_DURATION_MS,
            respawn_delay_ms: RESPAWN_DELAY_MS,
            shield_ms: SHIELD_MS,
            default_body_length: DEFAULT_BODY_LENGTH,
            min_body_length: MIN_BODY_LENGTH,
            kill_bonus: KILL_BONUS,
            fire_range: FIRE_RANGE,
            fire_damage: FIRE_DAMAGE,
            max_name_length: MAX_NAME_LENGTH,
            seed: None,
        }
    }
}

impl RoomConfig {
    pub fn grid(&self) -> GridSize {
        GridSize {
            width: self.width,
            height: self.height,
        }
    }

    /// Deterministic configuration for tests and replays.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}
