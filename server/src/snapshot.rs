use crate::entity::Entity;
use crate::game::Room;
use shared::{EntityView, PowerupView, Snapshot};

impl Entity {
    /// Public view with buffs collapsed to their state at `now`.
    pub fn view(&self, now: u64) -> EntityView {
        EntityView {
            id: self.id,
            name: self.name.clone(),
            color: self.color.clone(),
            icon: self.icon.clone(),
            role: self.role,
            body: self.body.iter().copied().collect(),
            alive: self.alive,
            ready: self.ready,
            score: self.score,
            kills: self.kills,
            deaths: self.deaths,
            consumed: self.consumed,
            max_length: self.max_length,
            streak: self.streak,
            shield: self.shielded(now),
            ghost: self.ghosted(now),
            fire: self.on_fire(now),
        }
    }
}

impl Room {
    /// Full, read-only state for observers. There is no diff protocol.
    pub fn snapshot(&self, now: u64) -> Snapshot {
        Snapshot {
            tick: self.tick,
            grid: self.config.grid(),
            phase: self.phase,
            host: self.host,
            time_remaining_ms: self.time_remaining(now),
            speed: self.speed,
            mode: self.mode,
            ready_count: self.ready_count(),
            active_count: self.active_count(),
            entities: self.entities.values().map(|e| e.view(now)).collect(),
            apples: self.apples.clone(),
            powerups: self
                .powerups
                .iter()
                .map(|p| PowerupView {
                    cell: p.cell,
                    kind: p.kind,
                })
                .collect(),
            projectiles: self.projectiles.iter().map(|p| p.position).collect(),
        }
    }
}
