//! # Encounter Generation
//!
//! Spawns the player, the exit, enemies and potions into a carved level.

use crate::generation::{GenerationConfig, Room};
use crate::{DungeonError, DungeonResult, EnemyKind, Entity, Level, Position};
use log::debug;
use rand::{rngs::StdRng, Rng};
use std::collections::HashSet;

/// Places occupants into the rooms of a freshly carved level.
///
/// The player always starts at the first room's center and the exit sits at
/// the last room's center. Enemies and then potions go on random bare floor
/// cells inside random rooms.
#[derive(Debug, Clone, Default)]
pub struct EncounterGenerator;

impl EncounterGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Spawns every occupant. `player` is moved to the start position.
    ///
    /// The level must already have its terrain snapshot.
    pub fn populate(
        &self,
        level: &mut Level,
        mut player: Entity,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> DungeonResult<()> {
        let rooms = level.rooms().to_vec();
        let (Some(first), Some(last)) = (rooms.first(), rooms.last()) else {
            return Err(DungeonError::GenerationFailed(
                "Cannot spawn into a level without rooms".to_string(),
            ));
        };

        player.position = first.center();
        level.spawn(player)?;
        level.spawn(Entity::exit(last.center()))?;

        let wanted = (config.num_enemies + config.num_potions) as usize;
        let free = Self::free_floor_cells(level, &rooms);
        if free < wanted {
            return Err(DungeonError::GenerationFailed(format!(
                "{} occupants requested but only {} free floor cells",
                wanted, free
            )));
        }

        let mut enemies = config.num_enemies;
        let mut potions = config.num_potions;
        while enemies > 0 || potions > 0 {
            let pos = Self::random_interior_cell(&rooms, rng);
            if level.glyph_at(pos) != Some('.') {
                continue;
            }

            if enemies > 0 {
                let kind = if rng.gen_range(0..3) == 0 {
                    EnemyKind::Vampire
                } else {
                    EnemyKind::Zombie
                };
                let id = level.spawn(Entity::enemy(kind, pos))?;
                debug!("Spawned {} {} at {}", kind.name(), id, pos);
                enemies -= 1;
            } else {
                let id = level.spawn(Entity::potion(pos))?;
                debug!("Spawned potion {} at {}", id, pos);
                potions -= 1;
            }
        }

        Ok(())
    }

    /// Picks a room uniformly, then an interior cell of it uniformly.
    fn random_interior_cell(rooms: &[Room], rng: &mut StdRng) -> Position {
        let room = &rooms[rng.gen_range(0..rooms.len())];
        Position::new(
            rng.gen_range(room.x1 + 1..room.x2),
            rng.gen_range(room.y1 + 1..room.y2),
        )
    }

    /// Distinct bare floor cells across all room interiors.
    fn free_floor_cells(level: &Level, rooms: &[Room]) -> usize {
        rooms
            .iter()
            .flat_map(Room::interior)
            .filter(|pos| level.glyph_at(*pos) == Some('.'))
            .collect::<HashSet<_>>()
            .len()
    }
}
