//! Cell → body segment lookup rebuilt for every movement step

use crate::entity::Entity;
use shared::Cell;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupant {
    pub owner: u32,
    /// Segment position in the owner's body, 0 is the head
    pub index: usize,
}

#[derive(Debug, Default)]
pub struct OccupancyIndex {
    cells: HashMap<Cell, Occupant>,
}

impl OccupancyIndex {
    /// Indexes every segment of every living, active entity.
    ///
    /// Always built from scratch so a step never sees last step's bodies.
    pub fn build(entities: &BTreeMap<u32, Entity>) -> Self {
        let mut cells = HashMap::new();
        for entity in entities.values().filter(|e| e.is_playing()) {
            for (index, cell) in entity.body.iter().enumerate() {
                cells.insert(
                    *cell,
                    Occupant {
                        owner: entity.id,
                        index,
                    },
                );
            }
        }
        Self { cells }
    }

    pub fn get(&self, cell: Cell) -> Option<Occupant> {
        self.cells.get(&cell).copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Role;

    fn entity(id: u32, role: Role, alive: bool, cells: &[(i32, i32)]) -> Entity {
        let mut entity = Entity::new(id, format!("e{}", id), String::new(), String::new(), role);
        entity.alive = alive;
        entity.body = cells.iter().map(|&(x, y)| Cell::new(x, y)).collect();
        entity
    }

    #[test]
    fn test_indexes_living_active_bodies() {
        let mut entities = BTreeMap::new();
        entities.insert(1, entity(1, Role::Active, true, &[(5, 5), (4, 5), (3, 5)]));
        entities.insert(2, entity(2, Role::Active, true, &[(9, 9), (9, 10)]));

        let index = OccupancyIndex::build(&entities);

        assert_eq!(index.len(), 5);
        assert_eq!(index.get(Cell::new(3, 5)), Some(Occupant { owner: 1, index: 2 }));
        assert_eq!(index.get(Cell::new(9, 9)), Some(Occupant { owner: 2, index: 0 }));
        assert_eq!(index.get(Cell::new(0, 0)), None);
    }

    #[test]
    fn test_skips_dead_and_spectators() {
        let mut entities = BTreeMap::new();
        entities.insert(1, entity(1, Role::Active, false, &[(5, 5), (4, 5)]));
        entities.insert(2, entity(2, Role::Spectator, true, &[(9, 9), (9, 10)]));

        let index = OccupancyIndex::build(&entities);

        assert!(index.is_empty());
    }
}
