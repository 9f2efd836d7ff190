//! Joining, leaving and the per-participant lobby commands

use crate::entity::Entity;
use crate::game::Room;
use log::{debug, info};
use shared::{Phase, Role, Welcome, COLORS, ICONS};

/// Trims and length-caps a proposed display name. Empty results yield `None`.
pub fn sanitize_name(raw: &str, max_len: usize) -> Option<String> {
    let name: String = raw.trim().chars().take(max_len).collect();
    let name = name.trim_end().to_string();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Accepts `rrggbb` or `#rrggbb` hex and returns it with a leading `#`.
pub fn normalize_color(raw: &str) -> Option<String> {
    let hex = raw.strip_prefix('#').unwrap_or(raw);
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("#{}", hex))
    } else {
        None
    }
}

pub fn is_known_icon(icon: &str) -> bool {
    ICONS.contains(&icon)
}

impl Room {
    /// Registers a new participant and returns what they need to render the room.
    ///
    /// Newcomers are active until the room holds `max_players` active
    /// participants, after which they spectate. Someone joining mid-round is
    /// queued to spawn on the next movement step.
    pub fn join(&mut self, name: &str, now: u64) -> Welcome {
        let id = self.next_id;
        self.next_id += 1;

        let name = sanitize_name(name, self.config.max_name_length)
            .unwrap_or_else(|| format!("Player-{}", id));
        let role = if self.active_count() >= self.config.max_players {
            Role::Spectator
        } else {
            Role::Active
        };
        let slot = (id as usize - 1) % COLORS.len().min(ICONS.len());
        let color = COLORS[slot].to_string();
        let icon = ICONS[slot].to_string();

        let mut entity = Entity::new(id, name, color, icon, role);
        if self.phase == Phase::Playing && entity.is_active() {
            entity.respawn_at = Some(now);
        }

        info!("Entity {} joined as {:?} ({})", id, role, entity.name);
        self.entities.insert(id, entity);
        self.ensure_host();

        let entity = &self.entities[&id];
        Welcome {
            id,
            name: entity.name.clone(),
            color: entity.color.clone(),
            icon: entity.icon.clone(),
            role,
            grid: self.config.grid(),
            max_players: self.config.max_players,
            phase: self.phase,
            host: self.host,
            time_remaining_ms: self.time_remaining(now),
            speed: self.speed,
            mode: self.mode,
        }
    }

    /// Removes a participant immediately and hands the host role on if needed.
    pub fn leave(&mut self, id: u32) -> bool {
        if self.entities.remove(&id).is_none() {
            return false;
        }
        info!("Entity {} left", id);
        self.ensure_host();
        true
    }

    pub(crate) fn rename(&mut self, id: u32, name: &str) {
        let max_len = self.config.max_name_length;
        if let Some(entity) = self.entities.get_mut(&id) {
            match sanitize_name(name, max_len) {
                Some(name) => entity.name = name,
                None => debug!("Ignoring empty rename from {}", id),
            }
        }
    }

    /// Applies each cosmetic field independently; invalid values are dropped.
    pub(crate) fn set_cosmetics(&mut self, id: u32, color: Option<&str>, icon: Option<&str>) {
        let Some(entity) = self.entities.get_mut(&id) else {
            return;
        };
        if let Some(color) = color.and_then(normalize_color) {
            entity.color = color;
        }
        if let Some(icon) = icon.filter(|icon| is_known_icon(icon)) {
            entity.icon = icon.to_string();
        }
    }

    pub(crate) fn set_ready(&mut self, id: u32, ready: bool) {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.ready = ready;
        }
    }
}
