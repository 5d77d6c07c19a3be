//! # Dungeon Generation
//!
//! Room-and-corridor layout generation.
//!
//! Rooms are placed by rejection sampling inside the fixed grid bounds. Each
//! accepted room is carved to floor and joined to the previously accepted room
//! by an L-shaped tunnel. When a room cannot be placed within its attempt
//! budget the whole layout is thrown away and sampling starts over.

use crate::generation::{GenerationConfig, Generator, Room};
use crate::{DungeonError, DungeonResult, Level, Position, Tile};
use log::{debug, warn};
use rand::{rngs::StdRng, Rng};

/// Primary layout generator using the room-and-corridor algorithm.
#[derive(Debug, Clone, Default)]
pub struct RoomCorridorGenerator;

impl RoomCorridorGenerator {
    /// Creates a new layout generator.
    ///
    /// # Examples
    ///
    /// ```
    /// use dungeon_sim::{Generator, GenerationConfig, RoomCorridorGenerator};
    /// use dungeon_sim::generation::seeding;
    ///
    /// let config = GenerationConfig::for_testing(42);
    /// let mut rng = seeding::create_rng(&config);
    /// let level = RoomCorridorGenerator::new().generate(&config, &mut rng).unwrap();
    /// assert_eq!(level.rooms().len(), 3);
    /// ```
    pub fn new() -> Self {
        Self
    }

    /// Tries to lay out every room once. Returns `false` if some room ran out
    /// of placement attempts, leaving a partial layout behind.
    fn place_rooms(
        &self,
        level: &mut Level,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> DungeonResult<bool> {
        let room_count = rng.gen_range(config.min_rooms..=config.max_rooms);

        for room_id in 0..room_count {
            let Some(room) = self.try_place_room(level, config, rng, room_id) else {
                debug!(
                    "Room {} of {} did not fit after {} attempts",
                    room_id + 1,
                    room_count,
                    config.max_placement_attempts
                );
                return Ok(false);
            };

            self.carve_room(level, &room)?;
            if let Some(previous) = level.rooms().last().copied() {
                let horizontal_first = rng.gen_bool(0.5);
                self.carve_l_corridor(level, previous.center(), room.center(), horizontal_first)?;
            }
            debug!(
                "Placed room {} at ({}, {})-({}, {})",
                room.id, room.x1, room.y1, room.x2, room.y2
            );
            level.push_room(room);
        }

        Ok(true)
    }

    /// Samples candidates until one fits without touching an accepted room.
    fn try_place_room(
        &self,
        level: &Level,
        config: &GenerationConfig,
        rng: &mut StdRng,
        room_id: u32,
    ) -> Option<Room> {
        (0..config.max_placement_attempts)
            .map(|_| self.generate_room_candidate(config, rng, room_id))
            .find(|room| {
                room.fits_in(level.width(), level.height())
                    && !level.rooms().iter().any(|existing| room.intersects(existing))
            })
    }

    /// Draws a random size, then a corner that keeps the border inside the grid.
    fn generate_room_candidate(
        &self,
        config: &GenerationConfig,
        rng: &mut StdRng,
        room_id: u32,
    ) -> Room {
        let width = rng.gen_range(config.min_room_size..=config.max_room_size);
        let height = rng.gen_range(config.min_room_size..=config.max_room_size);
        let x = rng.gen_range(0..=(config.width - width - 1)) as i32;
        let y = rng.gen_range(0..=(config.height - height - 1)) as i32;
        Room::new(room_id, x, y, width, height)
    }

    fn carve_room(&self, level: &mut Level, room: &Room) -> DungeonResult<()> {
        for pos in room.interior() {
            level.set_terrain(pos, Tile::floor())?;
        }
        Ok(())
    }

    /// Carves an L-shaped corridor between two points.
    fn carve_l_corridor(
        &self,
        level: &mut Level,
        start: Position,
        end: Position,
        horizontal_first: bool,
    ) -> DungeonResult<()> {
        if horizontal_first {
            self.carve_horizontal(level, start.x, end.x, start.y)?;
            self.carve_vertical(level, start.y, end.y, end.x)
        } else {
            self.carve_vertical(level, start.y, end.y, start.x)?;
            self.carve_horizontal(level, start.x, end.x, end.y)
        }
    }

    fn carve_horizontal(&self, level: &mut Level, x1: i32, x2: i32, y: i32) -> DungeonResult<()> {
        for x in x1.min(x2)..=x1.max(x2) {
            level.set_terrain(Position::new(x, y), Tile::floor())?;
        }
        Ok(())
    }

    fn carve_vertical(&self, level: &mut Level, y1: i32, y2: i32, x: i32) -> DungeonResult<()> {
        for y in y1.min(y2)..=y1.max(y2) {
            level.set_terrain(Position::new(x, y), Tile::floor())?;
        }
        Ok(())
    }
}

impl Generator<Level> for RoomCorridorGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> DungeonResult<Level> {
        config.validate()?;
        let mut level = Level::new(config.width, config.height);

        for attempt in 0..config.max_layout_attempts {
            if self.place_rooms(&mut level, config, rng)? {
                level.snapshot_terrain();
                self.validate(&level, config)?;
                debug!(
                    "{} laid out {} rooms after {} restarts",
                    self.generator_type(),
                    level.rooms().len(),
                    attempt
                );
                return Ok(level);
            }
            warn!(
                "Restarting layout ({} of {} attempts used)",
                attempt + 1,
                config.max_layout_attempts
            );
            level.clear_layout();
        }

        Err(DungeonError::GenerationFailed(format!(
            "Could not place {} rooms in a {}x{} grid after {} layouts",
            config.min_rooms, config.width, config.height, config.max_layout_attempts
        )))
    }

    fn validate(&self, level: &Level, config: &GenerationConfig) -> DungeonResult<()> {
        let rooms = level.rooms();
        if (rooms.len() as u32) < config.min_rooms {
            return Err(DungeonError::GenerationFailed(format!(
                "Only {} rooms placed, {} required",
                rooms.len(),
                config.min_rooms
            )));
        }

        for (i, room) in rooms.iter().enumerate() {
            if rooms[i + 1..].iter().any(|other| room.intersects(other)) {
                return Err(DungeonError::GenerationFailed(format!(
                    "Room {} overlaps a later room",
                    room.id
                )));
            }
            if level.glyph_at(room.center()) != Some('.') {
                return Err(DungeonError::GenerationFailed(format!(
                    "Room {} center {} was not carved",
                    room.id,
                    room.center()
                )));
            }
        }

        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "RoomCorridorGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::seeding;
    use crate::TileType;

    #[test]
    fn test_generation_produces_rooms() {
        let generator = RoomCorridorGenerator::new();
        let config = GenerationConfig::for_testing(12345);
        let mut rng = seeding::create_rng(&config);

        let level = generator.generate(&config, &mut rng).unwrap();
        assert_eq!(level.rooms().len(), 3);
        assert_eq!(level.entity_count(), 0);

        for room in level.rooms() {
            assert!(room.fits_in(level.width(), level.height()));
            for pos in room.interior() {
                assert_eq!(level.glyph_at(pos), Some('.'));
            }
        }
    }

    #[test]
    fn test_grid_edge_stays_wall() {
        let generator = RoomCorridorGenerator::new();
        for seed in 0..20 {
            let config = GenerationConfig::for_depth(3, seed);
            let mut rng = seeding::create_rng(&config);
            let level = generator.generate(&config, &mut rng).unwrap();
            let (w, h) = (level.width() as i32, level.height() as i32);

            for (pos, tile) in level.background().iter() {
                if pos.x == 0 || pos.y == 0 || pos.x == w - 1 || pos.y == h - 1 {
                    assert_eq!(tile.tile_type, TileType::Wall, "seed {} at {}", seed, pos);
                }
            }
        }
    }

    #[test]
    fn test_same_seed_same_layout() {
        let generator = RoomCorridorGenerator::new();
        let config = GenerationConfig::for_testing(42);

        let first = generator.generate(&config, &mut seeding::create_rng(&config)).unwrap();
        let second = generator.generate(&config, &mut seeding::create_rng(&config)).unwrap();

        assert_eq!(first.rooms(), second.rooms());
        assert_eq!(first.render_glyphs(), second.render_glyphs());
    }

    #[test]
    fn test_l_corridor_carving() {
        let generator = RoomCorridorGenerator::new();
        let mut level = Level::new(20, 20);
        let start = Position::new(5, 5);
        let end = Position::new(15, 12);

        generator.carve_l_corridor(&mut level, start, end, true).unwrap();
        assert_eq!(level.glyph_at(start), Some('.'));
        assert_eq!(level.glyph_at(end), Some('.'));
        // Horizontal leg first turns at the end column.
        assert_eq!(level.glyph_at(Position::new(15, 5)), Some('.'));
        assert_eq!(level.glyph_at(Position::new(5, 12)), Some('#'));

        let mut level = Level::new(20, 20);
        generator.carve_l_corridor(&mut level, start, end, false).unwrap();
        assert_eq!(level.glyph_at(Position::new(5, 12)), Some('.'));
        assert_eq!(level.glyph_at(Position::new(15, 5)), Some('#'));
    }

    #[test]
    fn test_background_matches_carved_terrain() {
        let generator = RoomCorridorGenerator::new();
        let config = GenerationConfig::for_testing(7);
        let level = generator.generate(&config, &mut seeding::create_rng(&config)).unwrap();

        for (pos, tile) in level.background().iter() {
            assert_eq!(level.glyph_at(pos), Some(tile.glyph()));
            assert_ne!(tile.tile_type, TileType::Corpse);
        }
    }

    #[test]
    fn test_impossible_layout_fails() {
        let generator = RoomCorridorGenerator::new();
        let mut config = GenerationConfig::for_testing(1);
        config.width = 6;
        config.height = 6;
        config.min_rooms = 4;
        config.max_rooms = 4;
        config.max_placement_attempts = 10;
        config.max_layout_attempts = 3;

        let result = generator.generate(&config, &mut seeding::create_rng(&config));
        assert!(matches!(result, Err(DungeonError::GenerationFailed(_))));
    }

    #[test]
    fn test_validation_rejects_missing_rooms() {
        let generator = RoomCorridorGenerator::new();
        let config = GenerationConfig::for_testing(1);
        let level = Level::new(config.width, config.height);
        assert!(generator.validate(&level, &config).is_err());
    }
}
