//! Apple and powerup placement
//!
//! Placement is rejection sampling with a fixed attempt budget. A crowded
//! grid therefore yields fewer consumables for a while instead of a tick that
//! never finishes.

use crate::game::Room;
use log::debug;
use rand::Rng;
use shared::{Cell, PowerupKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Powerup {
    pub cell: Cell,
    pub kind: PowerupKind,
}

impl Room {
    pub(crate) fn random_cell(&mut self) -> Cell {
        Cell::new(
            self.rng.gen_range(0..self.config.width),
            self.rng.gen_range(0..self.config.height),
        )
    }

    fn has_consumable(&self, cell: Cell) -> bool {
        self.apples.contains(&cell) || self.powerups.iter().any(|p| p.cell == cell)
    }

    /// Samples cells until one holds neither an apple nor a powerup.
    fn find_free_cell(&mut self) -> Option<Cell> {
        for _ in 0..self.config.spawn_attempts {
            let cell = self.random_cell();
            if !self.has_consumable(cell) {
                return Some(cell);
            }
        }
        None
    }

    /// Brings apples and powerups back up to their target counts.
    pub(crate) fn top_up_consumables(&mut self) {
        while self.apples.len() < self.config.apple_count {
            match self.find_free_cell() {
                Some(cell) => self.apples.push(cell),
                None => {
                    debug!("No free cell for apple after {} attempts", self.config.spawn_attempts);
                    return;
                }
            }
        }

        while self.powerups.len() < self.config.powerup_count {
            match self.find_free_cell() {
                Some(cell) => {
                    let kind = PowerupKind::ALL[self.rng.gen_range(0..PowerupKind::ALL.len())];
                    self.powerups.push(Powerup { cell, kind });
                }
                None => {
                    debug!("No free cell for powerup after {} attempts", self.config.spawn_attempts);
                    return;
                }
            }
        }
    }
}
