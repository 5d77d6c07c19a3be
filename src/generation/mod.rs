//! # Generation Module
//!
//! Procedural level generation: room carving, tunnels and spawning.
//!
//! A level is built in a fixed order: carve rooms and tunnels into solid
//! rock, snapshot the terrain into the background and visibility grids,
//! spawn the player, exit, enemies and potions, then run the consistency
//! cleanup. [`build_level`] drives the whole sequence.

pub mod dungeon;
pub mod encounters;

pub use dungeon::*;
pub use encounters::*;

use crate::game::{Entity, Level, Position};
use crate::{config, DungeonError, DungeonResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Configuration for generating one level.
///
/// Controls the room count and size bounds, spawn counts and the attempt
/// budgets of rejection sampling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Grid width in tiles
    pub width: u32,
    /// Grid height in tiles
    pub height: u32,
    /// Minimum number of rooms per level
    pub min_rooms: u32,
    /// Maximum number of rooms per level
    pub max_rooms: u32,
    /// Minimum room width/height
    pub min_room_size: u32,
    /// Maximum room width/height
    pub max_room_size: u32,
    /// Enemies to spawn
    pub num_enemies: u32,
    /// Potions to spawn
    pub num_potions: u32,
    /// Candidates sampled for one room before the layout restarts
    pub max_placement_attempts: u32,
    /// Layout restarts before generation gives up
    pub max_layout_attempts: u32,
}

impl GenerationConfig {
    /// Derives the generation parameters for a dungeon depth.
    ///
    /// Difficulty grows with depth and every parameter is capped.
    ///
    /// # Examples
    ///
    /// ```
    /// use dungeon_sim::GenerationConfig;
    ///
    /// let config = GenerationConfig::for_depth(0, 42);
    /// assert_eq!((config.min_rooms, config.max_rooms), (3, 3));
    /// assert_eq!((config.min_room_size, config.max_room_size), (4, 4));
    /// assert_eq!((config.num_enemies, config.num_potions), (2, 2));
    ///
    /// let deep = GenerationConfig::for_depth(10, 42);
    /// assert_eq!(deep.num_enemies, 6);
    /// ```
    pub fn for_depth(depth: u32, seed: u64) -> Self {
        let scaled = depth - depth / 4;
        let rooms = (3 + scaled).min(4);
        Self {
            seed,
            width: config::MAP_WIDTH,
            height: config::MAP_HEIGHT,
            min_rooms: rooms,
            max_rooms: rooms,
            min_room_size: 4,
            max_room_size: (4 + scaled).min(5),
            num_enemies: (2 + depth).min(6),
            num_potions: (2 + depth / 2).min(6),
            max_placement_attempts: config::MAX_PLACEMENT_ATTEMPTS,
            max_layout_attempts: config::MAX_LAYOUT_ATTEMPTS,
        }
    }

    /// Creates a configuration for testing with the depth-0 parameters.
    pub fn for_testing(seed: u64) -> Self {
        Self::for_depth(0, seed)
    }

    /// Checks the construction contract.
    ///
    /// Rejects sizes that cannot produce a room with a floor, room counts
    /// that cannot give separate start and exit rooms, and rooms that cannot
    /// fit inside the grid.
    pub fn validate(&self) -> DungeonResult<()> {
        let fail = |message: String| Err(DungeonError::InvalidConfig(message));

        if self.width < 3 || self.height < 3 {
            return fail(format!(
                "grid {}x{} is too small to hold a room",
                self.width, self.height
            ));
        }
        if self.width > config::MAX_MAP_DIMENSION || self.height > config::MAX_MAP_DIMENSION {
            return fail(format!(
                "grid {}x{} exceeds the {} tile limit per side",
                self.width,
                self.height,
                config::MAX_MAP_DIMENSION
            ));
        }
        if self.min_room_size < 2 {
            return fail(format!(
                "min_room_size {} leaves no interior floor",
                self.min_room_size
            ));
        }
        if self.min_room_size > self.max_room_size {
            return fail(format!(
                "min_room_size {} exceeds max_room_size {}",
                self.min_room_size, self.max_room_size
            ));
        }
        if self.max_room_size >= self.width || self.max_room_size >= self.height {
            return fail(format!(
                "max_room_size {} does not fit in a {}x{} grid",
                self.max_room_size, self.width, self.height
            ));
        }
        if self.min_rooms < 2 {
            return fail(format!(
                "min_rooms {} cannot separate the start room from the exit room",
                self.min_rooms
            ));
        }
        if self.min_rooms > self.max_rooms {
            return fail(format!(
                "min_rooms {} exceeds max_rooms {}",
                self.min_rooms, self.max_rooms
            ));
        }
        if self.max_placement_attempts == 0 || self.max_layout_attempts == 0 {
            return fail("attempt budgets must be positive".to_string());
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::for_depth(0, 42)
    }
}

/// A rectangular room with a one-tile wall border.
///
/// The room covers `x1..=x2` by `y1..=y2`; the outer ring stays wall and the
/// interior `x1+1..x2` by `y1+1..y2` is carved to floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Room {
    /// Index of this room in placement order
    pub id: u32,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Room {
    /// Creates a room whose top-left corner is `(x1, y1)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dungeon_sim::{Room, Position};
    ///
    /// let room = Room::new(0, 2, 3, 4, 4);
    /// assert_eq!(room.center(), Position::new(4, 5));
    /// assert_eq!(room.interior().len(), 9);
    /// ```
    pub fn new(id: u32, x1: i32, y1: i32, width: u32, height: u32) -> Self {
        Self {
            id,
            x1,
            y1,
            x2: x1 + width as i32,
            y2: y1 + height as i32,
        }
    }

    /// Spawn anchor and tunnel endpoint.
    pub fn center(&self) -> Position {
        Position::new((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }

    /// All carvable floor positions, row by row.
    pub fn interior(&self) -> Vec<Position> {
        ((self.y1 + 1)..self.y2)
            .flat_map(|y| ((self.x1 + 1)..self.x2).map(move |x| Position::new(x, y)))
            .collect()
    }

    /// Whether `pos` lies in the carvable interior.
    pub fn interior_contains(&self, pos: Position) -> bool {
        pos.x > self.x1 && pos.x < self.x2 && pos.y > self.y1 && pos.y < self.y2
    }

    /// Whether `pos` lies within the outer bounds, border included.
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.x1 && pos.x <= self.x2 && pos.y >= self.y1 && pos.y <= self.y2
    }

    /// Inclusive overlap test on the outer bounds.
    ///
    /// Rooms that would share a wall count as intersecting.
    pub fn intersects(&self, other: &Room) -> bool {
        self.x1 <= other.x2 && self.x2 >= other.x1 && self.y1 <= other.y2 && self.y2 >= other.y1
    }

    /// Whether the whole room, border included, lies inside a grid.
    pub fn fits_in(&self, width: u32, height: u32) -> bool {
        self.x1 >= 0 && self.y1 >= 0 && self.x2 < width as i32 && self.y2 < height as i32
    }
}

/// Trait for procedural generators.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DungeonResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> DungeonResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// RNG construction helpers.
pub mod seeding {
    use super::*;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Creates a generator seeded from OS entropy.
    pub fn entropy_rng() -> StdRng {
        StdRng::from_entropy()
    }

    /// Seed for one depth of a seeded run.
    pub fn depth_seed(seed: u64, depth: u32) -> u64 {
        seed.wrapping_add(depth as u64 * config::DEPTH_SEED_STRIDE)
    }
}

/// Builds a complete level: carve, snapshot, spawn, clean up.
///
/// The player entity is moved into the new level at the first room's center.
pub fn build_level(
    config: &GenerationConfig,
    player: Entity,
    rng: &mut StdRng,
) -> DungeonResult<Level> {
    config.validate()?;

    let mut level = RoomCorridorGenerator::new().generate(config, rng)?;
    EncounterGenerator::new().populate(&mut level, player, config, rng)?;
    level.cleanup();

    if level.player_id().is_none() {
        return Err(DungeonError::GenerationFailed(
            "Player was displaced during spawning".to_string(),
        ));
    }

    Ok(level)
}
