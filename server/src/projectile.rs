//! Fireballs shot by snakes holding the fire buff

use crate::game::Room;
use crate::occupancy::OccupancyIndex;
use log::debug;
use shared::{Cell, Direction, Phase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projectile {
    pub position: Cell,
    pub velocity: Direction,
    pub owner: u32,
    /// Cells still to travel; the projectile is gone once this reaches zero
    pub range_left: u32,
}

impl Room {
    /// Launches a projectile from the shooter's head along its current heading.
    pub(crate) fn fire(&mut self, shooter: u32, now: u64) {
        if self.phase != Phase::Playing {
            return;
        }
        let Some(entity) = self.entities.get(&shooter) else {
            return;
        };
        if !entity.is_playing() || !entity.on_fire(now) {
            debug!("Ignoring fire from {} without an active fire buff", shooter);
            return;
        }
        let Some(head) = entity.head() else {
            return;
        };

        self.projectiles.push(Projectile {
            position: head,
            velocity: entity.heading,
            owner: shooter,
            range_left: self.config.fire_range,
        });
    }

    /// Moves every projectile one cell and resolves impacts against the
    /// bodies as they stand after this step's movement.
    pub(crate) fn advance_projectiles(&mut self, now: u64) {
        if self.projectiles.is_empty() {
            return;
        }
        let index = OccupancyIndex::build(&self.entities);
        let (width, height) = (self.config.width, self.config.height);

        let mut in_flight = Vec::with_capacity(self.projectiles.len());
        for mut projectile in std::mem::take(&mut self.projectiles) {
            projectile.position = projectile.position.step(projectile.velocity, width, height);
            projectile.range_left = projectile.range_left.saturating_sub(1);

            let victim = index
                .get(projectile.position)
                .map(|occupant| occupant.owner)
                .filter(|owner| *owner != projectile.owner);
            if let Some(victim) = victim {
                // Any indexed body absorbs the projectile, even one already
                // hit earlier this step.
                if !self.strike(victim, projectile.owner, projectile.position, now) {
                    debug!("Projectile from {} absorbed by {}", projectile.owner, victim);
                }
                continue;
            }

            if projectile.range_left > 0 {
                in_flight.push(projectile);
            }
        }
        self.projectiles = in_flight;
    }

    /// Applies one hit. Returns false, without damage or credit, if the
    /// victim no longer covers `cell`, for instance because an earlier hit
    /// this step already shortened or eliminated it.
    fn strike(&mut self, victim: u32, shooter: u32, cell: Cell, now: u64) -> bool {
        let (damage, min_length) = (self.config.fire_damage, self.config.min_body_length);
        let Some(target) = self.entities.get_mut(&victim) else {
            return false;
        };
        if !target.is_playing() || !target.body.contains(&cell) {
            return false;
        }

        if !target.shrink(damage, min_length) {
            target.eliminate(now, self.mode, self.config.respawn_delay_ms);
            debug!("Entity {} eliminated by projectile from {}", victim, shooter);
        }

        if let Some(shooter) = self.entities.get_mut(&shooter) {
            shooter.credit_kill(self.config.kill_bonus);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::config::RoomConfig;

    fn duel() -> Room {
        let config = RoomConfig {
            apple_count: 0,
            powerup_count: 0,
            fire_range: 4,
            ..RoomConfig::seeded(8)
        };
        let mut room = Room::new(config);
        for (id, cells) in [(1, [(5, 5), (4, 5), (3, 5)]), (2, [(9, 4), (9, 5), (9, 6)])] {
            let joined = room.join("duelist", 0).id;
            assert_eq!(joined, id);
            let entity = room.entities.get_mut(&id).unwrap();
            entity.body = cells.iter().map(|&(x, y)| Cell::new(x, y)).collect();
            entity.alive = true;
        }
        room.phase = Phase::Playing;
        room.round_ends_at = u64::MAX;
        room
    }

    #[test]
    fn test_fire_requires_buff() {
        let mut room = duel();
        room.apply(1, Command::Fire, 1_000);
        assert!(room.projectiles.is_empty());

        room.entities.get_mut(&1).unwrap().fire_until = 2_000;
        room.apply(1, Command::Fire, 1_000);
        assert_eq!(room.projectiles.len(), 1);

        let projectile = room.projectiles[0];
        assert_eq!(projectile.position, Cell::new(5, 5));
        assert_eq!(projectile.velocity, Direction::Right);
        assert_eq!(projectile.owner, 1);
        assert_eq!(projectile.range_left, 4);

        room.apply(1, Command::Fire, 2_000);
        assert_eq!(room.projectiles.len(), 1, "buff expired");
    }

    #[test]
    fn test_fire_ignored_outside_play() {
        let mut room = duel();
        room.entities.get_mut(&1).unwrap().fire_until = 2_000;
        room.phase = Phase::Ended;
        room.apply(1, Command::Fire, 1_000);
        assert!(room.projectiles.is_empty());
    }

    #[test]
    fn test_projectile_expires_after_range() {
        let mut room = duel();
        room.projectiles.push(Projectile {
            position: Cell::new(0, 20),
            velocity: Direction::Right,
            owner: 1,
            range_left: 3,
        });

        room.advance_projectiles(1_000);
        room.advance_projectiles(1_100);
        assert_eq!(room.projectiles.len(), 1);
        assert_eq!(room.projectiles[0].position, Cell::new(2, 20));
        assert_eq!(room.projectiles[0].range_left, 1);

        room.advance_projectiles(1_200);
        assert!(room.projectiles.is_empty());
        assert_eq!(room.entity(1).unwrap().kills, 0);
    }

    #[test]
    fn test_projectile_shortens_victim() {
        let mut room = duel();
        room.projectiles.push(Projectile {
            position: Cell::new(8, 5),
            velocity: Direction::Right,
            owner: 1,
            range_left: 4,
        });

        room.advance_projectiles(1_000);

        assert!(room.projectiles.is_empty());
        let victim = room.entity(2).unwrap();
        assert!(victim.alive);
        assert_eq!(victim.body.len(), 2);
        let shooter = room.entity(1).unwrap();
        assert_eq!(shooter.kills, 1);
        assert_eq!(shooter.score, room.config.kill_bonus);
    }

    #[test]
    fn test_projectile_eliminates_short_victim() {
        let mut room = duel();
        room.entities.get_mut(&2).unwrap().body.pop_back();
        room.projectiles.push(Projectile {
            position: Cell::new(8, 5),
            velocity: Direction::Right,
            owner: 1,
            range_left: 4,
        });

        room.advance_projectiles(1_000);

        let victim = room.entity(2).unwrap();
        assert!(!victim.alive);
        assert_eq!(victim.deaths, 1);
        assert_eq!(victim.respawn_at, Some(1_000 + room.config.respawn_delay_ms));
        assert!(victim.body.len() >= room.config.min_body_length);
    }

    #[test]
    fn test_second_hit_on_eliminated_victim_is_absorbed() {
        let mut room = duel();
        room.entities.get_mut(&2).unwrap().body.pop_back();
        for y in [4, 5] {
            room.projectiles.push(Projectile {
                position: Cell::new(8, y),
                velocity: Direction::Right,
                owner: 1,
                range_left: 4,
            });
        }

        room.advance_projectiles(1_000);

        let victim = room.entity(2).unwrap();
        assert!(!victim.alive);
        assert_eq!(victim.deaths, 1);
        assert!(room.projectiles.is_empty());
        assert_eq!(room.entity(1).unwrap().kills, 1);
    }

    #[test]
    fn test_projectile_ignores_owner() {
        let mut room = duel();
        room.projectiles.push(Projectile {
            position: Cell::new(2, 5),
            velocity: Direction::Right,
            owner: 1,
            range_left: 4,
        });

        room.advance_projectiles(1_000);

        assert_eq!(room.projectiles.len(), 1);
        assert_eq!(room.entity(1).unwrap().body.len(), 3);
    }

    #[test]
    fn test_ghost_does_not_stop_projectiles() {
        let mut room = duel();
        room.entities.get_mut(&2).unwrap().ghost_until = 10_000;
        room.projectiles.push(Projectile {
            position: Cell::new(8, 5),
            velocity: Direction::Right,
            owner: 1,
            range_left: 4,
        });

        room.advance_projectiles(1_000);

        assert_eq!(room.entity(2).unwrap().body.len(), 2);
    }

    #[test]
    fn test_projectile_wraps() {
        let mut room = duel();
        let width = room.config.width;
        room.projectiles.push(Projectile {
            position: Cell::new(width - 1, 20),
            velocity: Direction::Right,
            owner: 1,
            range_left: 4,
        });

        room.advance_projectiles(1_000);

        assert_eq!(room.projectiles[0].position, Cell::new(0, 20));
    }
}
