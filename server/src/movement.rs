//! Movement step: heading, apples, collisions, powerups and respawns
//!
//! Every collision decision reads the occupancy index built before anyone
//! moved, so the order in which entities are visited does not change the
//! outcome of a step.

use crate::game::Room;
use crate::occupancy::OccupancyIndex;
use log::debug;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collision {
    OwnBody,
    Other(u32),
}

impl Room {
    /// Advances every living active entity by one cell.
    pub(crate) fn resolve_movement(&mut self, now: u64) {
        let index = OccupancyIndex::build(&self.entities);
        let ghosts: HashSet<u32> = self
            .entities
            .values()
            .filter(|e| e.is_playing() && e.ghosted(now))
            .map(|e| e.id)
            .collect();
        let movers: Vec<u32> = self
            .entities
            .values()
            .filter(|e| e.is_playing())
            .map(|e| e.id)
            .collect();

        let (width, height) = (self.config.width, self.config.height);
        let mut credits = Vec::new();

        for id in movers {
            let Some(entity) = self.entities.get_mut(&id) else {
                continue;
            };
            entity.apply_pending_heading();
            let Some(head) = entity.head() else {
                continue;
            };
            let destination = head.step(entity.heading, width, height);

            let ate = match self.apples.iter().position(|apple| *apple == destination) {
                Some(pos) => {
                    self.apples.remove(pos);
                    true
                }
                None => false,
            };

            let collision = if entity.shielded(now) {
                None
            } else {
                match index.get(destination) {
                    Some(occupant) if occupant.owner == id => {
                        let vacating_tail = occupant.index + 1 == entity.body.len() && !ate;
                        (!vacating_tail).then_some(Collision::OwnBody)
                    }
                    Some(occupant) if ghosts.contains(&occupant.owner) => None,
                    Some(occupant) => Some(Collision::Other(occupant.owner)),
                    None => None,
                }
            };

            entity.body.push_front(destination);
            if ate {
                entity.score += 1;
                entity.consumed += 1;
            } else {
                entity.body.pop_back();
            }
            entity.track_length();

            if let Some(collision) = collision {
                debug!("Entity {} collided ({:?})", id, collision);
                entity.eliminate(now, self.mode, self.config.respawn_delay_ms);
                if let Collision::Other(owner) = collision {
                    credits.push(owner);
                }
            }

            if let Some(pos) = self.powerups.iter().position(|p| p.cell == destination) {
                let powerup = self.powerups.remove(pos);
                entity.grant(powerup.kind, now);
            }
        }

        let bonus = self.config.kill_bonus;
        for owner in credits {
            if let Some(killer) = self.entities.get_mut(&owner) {
                killer.credit_kill(bonus);
            }
        }
    }

    /// Brings back every active entity whose respawn deadline has passed.
    pub(crate) fn respawn_due(&mut self, now: u64) {
        let due: Vec<u32> = self
            .entities
            .values()
            .filter(|e| e.is_active() && !e.alive)
            .filter(|e| e.respawn_at.is_some_and(|at| now >= at))
            .map(|e| e.id)
            .collect();

        for id in due {
            let head = self.random_cell();
            let (width, height) = (self.config.width, self.config.height);
            let (length, shield_ms) = (self.config.default_body_length, self.config.shield_ms);
            if let Some(entity) = self.entities.get_mut(&id) {
                entity.respawn(head, length, width, height, now, shield_ms);
                debug!("Entity {} respawned at {:?}", id, head);
            }
        }
    }
}
