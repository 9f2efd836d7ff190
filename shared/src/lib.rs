use serde::{Deserialize, Serialize};

pub const GRID_WIDTH: i32 = 48;
pub const GRID_HEIGHT: i32 = 32;
pub const TICK_RATE: u32 = 20;
pub const MAX_PLAYERS: usize = 10;
pub const APPLE_COUNT: usize = 4;
pub const POWERUP_COUNT: usize = 2;
pub const SPAWN_ATTEMPTS: u32 = 500;
pub const ROUND_DURATION_MS: u64 = 60_000;
pub const RESPAWN_DELAY_MS: u64 = 600;
pub const SHIELD_MS: u64 = 1_500;
pub const GHOST_MS: u64 = 5_000;
pub const FIRE_MS: u64 = 6_000;
pub const DEFAULT_BODY_LENGTH: usize = 3;
pub const MIN_BODY_LENGTH: usize = 2;
pub const KILL_BONUS: u32 = 2;
pub const FIRE_RANGE: u32 = 16;
pub const FIRE_DAMAGE: usize = 1;
pub const MAX_NAME_LENGTH: usize = 16;
pub const PROTOCOL_VERSION: u32 = 1;

pub const COLORS: [&str; 10] = [
    "#e11d48", "#0ea5e9", "#22c55e", "#a855f7", "#f97316", "#14b8a6", "#f43f5e", "#10b981",
    "#f59e0b", "#3b82f6",
];

pub const ICONS: [&str; 10] = ["🐸", "🦄", "🐧", "🐙", "🐝", "🐲", "🦖", "👾", "😎", "🦈"];

/// A grid coordinate. Always kept reduced modulo the grid dimensions.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Moves by `(dx, dy)` and wraps both axes onto a `width` x `height` torus.
    pub fn offset(self, dx: i32, dy: i32, width: i32, height: i32) -> Cell {
        Cell {
            x: (self.x + dx).rem_euclid(width),
            y: (self.y + dy).rem_euclid(height),
        }
    }

    pub fn step(self, direction: Direction, width: i32, height: i32) -> Cell {
        let (dx, dy) = direction.vector();
        self.offset(dx, dy, width, height)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit vector with y growing downwards.
    pub fn vector(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn parse(token: &str) -> Option<Direction> {
        match token {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Movement cadence presets. Lower interval is faster.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedTier {
    #[default]
    Slow,
    Normal,
    Fast,
}

impl SpeedTier {
    pub fn interval_ms(self) -> u64 {
        match self {
            SpeedTier::Slow => 110,
            SpeedTier::Normal => 70,
            SpeedTier::Fast => 50,
        }
    }
}

/// Score penalty applied when a snake dies.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreMode {
    /// Score drops back to zero.
    Classic,
    /// Score loses three points, never going negative.
    #[default]
    Balanced,
}

impl ScoreMode {
    pub fn apply_death_penalty(self, score: u32) -> u32 {
        match self {
            ScoreMode::Classic => 0,
            ScoreMode::Balanced => score.saturating_sub(3),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PowerupKind {
    Ghost,
    Fire,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 2] = [PowerupKind::Ghost, PowerupKind::Fire];

    pub fn duration_ms(self) -> u64 {
        match self {
            PowerupKind::Ghost => GHOST_MS,
            PowerupKind::Fire => FIRE_MS,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Active,
    Spectator,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Lobby,
    Playing,
    Ended,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PowerupView {
    pub cell: Cell,
    pub kind: PowerupKind,
}

/// Public view of one participant inside a [`Snapshot`].
///
/// Buffs are reported as their state at snapshot time, never as expiries.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EntityView {
    pub id: u32,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub role: Role,
    pub body: Vec<Cell>,
    pub alive: bool,
    pub ready: bool,
    pub score: u32,
    pub kills: u32,
    pub deaths: u32,
    pub consumed: u32,
    pub max_length: usize,
    pub streak: u32,
    pub shield: bool,
    pub ghost: bool,
    pub fire: bool,
}

/// Full room state pushed to every session each broadcast tick.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Snapshot {
    pub tick: u32,
    pub grid: GridSize,
    pub phase: Phase,
    pub host: Option<u32>,
    pub time_remaining_ms: u64,
    pub speed: SpeedTier,
    pub mode: ScoreMode,
    pub ready_count: usize,
    pub active_count: usize,
    pub entities: Vec<EntityView>,
    pub apples: Vec<Cell>,
    pub powerups: Vec<PowerupView>,
    pub projectiles: Vec<Cell>,
}

/// Reply to a successful join.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Welcome {
    pub id: u32,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub role: Role,
    pub grid: GridSize,
    pub max_players: usize,
    pub phase: Phase,
    pub host: Option<u32>,
    pub time_remaining_ms: u64,
    pub speed: SpeedTier,
    pub mode: ScoreMode,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    Join {
        client_version: u32,
        name: String,
    },
    Turn {
        direction: Direction,
    },
    SetReady {
        ready: bool,
    },
    SetName {
        name: String,
    },
    SetCosmetics {
        color: Option<String>,
        icon: Option<String>,
    },
    SetSpeed {
        speed: SpeedTier,
    },
    SetMode {
        mode: ScoreMode,
    },
    Start,
    Restart,
    Fire,
    Heartbeat,
    Leave,

    Welcome(Welcome),
    Snapshot(Snapshot),
    Disconnected {
        reason: String,
    },
}
