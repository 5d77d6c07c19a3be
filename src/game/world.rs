//! # World Representation
//!
//! Tiles, dense grids and the [`Level`] that owns them.
//!
//! A level keeps three grids of identical dimensions, each separately owned:
//!
//! - the *occupancy* grid, where a cell is either terrain or an entity id
//! - the *background* grid, a terrain-only snapshot used to restore cells
//!   that an entity vacates
//! - the *visibility* grid, whose `explored` flags are the fog of war
//!
//! Invariant: every entity in the arena is the occupant of the cell at its own
//! position. [`Level::cleanup`] drops entities that violate it.

use crate::generation::Room;
use crate::{DungeonError, DungeonResult, Entity, EntityId, Position};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kinds of terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    Wall,
    Floor,
    /// Left behind where an actor died
    Corpse,
}

impl TileType {
    pub fn glyph(self) -> char {
        match self {
            TileType::Wall => '#',
            TileType::Floor => '.',
            TileType::Corpse => 'q',
        }
    }
}

/// A single terrain cell.
///
/// Tiles are `Copy` values: every grid cell owns its own tile and writing one
/// cell never affects another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub tile_type: TileType,
    pub blocks_movement: bool,
    pub see_through: bool,
    /// Seen by the player at least once
    pub explored: bool,
    /// Already counted by exploration bookkeeping
    pub already_explored: bool,
}

impl Tile {
    /// Creates a fresh, unexplored tile of the given type.
    pub fn new(tile_type: TileType) -> Self {
        let (blocks_movement, see_through) = match tile_type {
            TileType::Wall => (true, false),
            TileType::Floor | TileType::Corpse => (false, true),
        };
        Self {
            tile_type,
            blocks_movement,
            see_through,
            explored: false,
            already_explored: false,
        }
    }

    pub fn floor() -> Self {
        Self::new(TileType::Floor)
    }

    pub fn wall() -> Self {
        Self::new(TileType::Wall)
    }

    pub fn corpse() -> Self {
        Self::new(TileType::Corpse)
    }

    pub fn glyph(&self) -> char {
        self.tile_type.glyph()
    }
}

/// Dense row-major 2D array indexed by [`Position`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: u32,
    height: u32,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Creates a grid with every cell set to a clone of `fill`.
    pub fn new(width: u32, height: u32, fill: T) -> Self {
        Self {
            width,
            height,
            cells: vec![fill; width as usize * height as usize],
        }
    }
}

impl<T> Grid<T> {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    pub fn get(&self, pos: Position) -> Option<&T> {
        self.index(pos).map(|index| &self.cells[index])
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut T> {
        self.index(pos).map(move |index| &mut self.cells[index])
    }

    /// Overwrites the cell at `pos`.
    pub fn set(&mut self, pos: Position, value: T) -> DungeonResult<()> {
        let index = self.index(pos).ok_or_else(|| {
            DungeonError::InvalidState(format!("Position {} is outside the grid", pos))
        })?;
        self.cells[index] = value;
        Ok(())
    }

    /// Iterates over all positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let width = self.width as i32;
        let height = self.height as i32;
        (0..height).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }

    /// Iterates over `(position, cell)` pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &T)> {
        self.positions().zip(self.cells.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.cells.iter_mut()
    }

    /// Projects the grid into rows of `f(cell)`.
    pub fn map_rows<U>(&self, mut f: impl FnMut(&T) -> U) -> Vec<Vec<U>> {
        self.cells
            .chunks(self.width.max(1) as usize)
            .map(|row| row.iter().map(&mut f).collect())
            .collect()
    }
}

/// Content of an occupancy-grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    /// Bare terrain
    Terrain(Tile),
    /// An entity stands here and hides the terrain beneath it
    Occupant(EntityId),
}

/// One dungeon depth: grids, rooms and live entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    occupancy: Grid<Cell>,
    background: Grid<Tile>,
    visibility: Grid<Tile>,
    rooms: Vec<Room>,
    entities: BTreeMap<EntityId, Entity>,
    player_id: Option<EntityId>,
    next_entity_id: u32,
}

impl Level {
    /// Creates a solid-rock level of the given size.
    ///
    /// # Examples
    ///
    /// ```
    /// use dungeon_sim::{Level, Position, TileType};
    ///
    /// let level = Level::new(18, 15);
    /// assert_eq!(level.width(), 18);
    /// assert_eq!(level.glyph_at(Position::new(0, 0)), Some('#'));
    /// ```
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            occupancy: Grid::new(width, height, Cell::Terrain(Tile::wall())),
            background: Grid::new(width, height, Tile::wall()),
            visibility: Grid::new(width, height, Tile::wall()),
            rooms: Vec::new(),
            entities: BTreeMap::new(),
            player_id: None,
            next_entity_id: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.occupancy.width()
    }

    pub fn height(&self) -> u32 {
        self.occupancy.height()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.occupancy.contains(pos)
    }

    pub fn occupancy(&self) -> &Grid<Cell> {
        &self.occupancy
    }

    pub fn background(&self) -> &Grid<Tile> {
        &self.background
    }

    pub fn visibility(&self) -> &Grid<Tile> {
        &self.visibility
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        self.occupancy.get(pos)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Iterates over live entities in spawn order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().map(|(id, entity)| (*id, entity))
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player_id
    }

    pub fn player(&self) -> Option<&Entity> {
        self.player_id.and_then(|id| self.entities.get(&id))
    }

    /// Id of the entity occupying `pos`, if any.
    pub fn occupant_id(&self, pos: Position) -> Option<EntityId> {
        match self.occupancy.get(pos)? {
            Cell::Occupant(id) => Some(*id),
            Cell::Terrain(_) => None,
        }
    }

    /// The entity occupying `pos`, if any.
    pub fn occupant(&self, pos: Position) -> Option<&Entity> {
        self.occupant_id(pos).and_then(|id| self.entities.get(&id))
    }

    /// Ids of all enemies in spawn order.
    pub fn enemy_ids(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, entity)| entity.is_enemy())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Position of the exit item, if it is still on the level.
    pub fn exit_position(&self) -> Option<Position> {
        self.entities
            .values()
            .find(|entity| entity.is_exit())
            .map(|entity| entity.position)
    }

    /// Symbol shown at `pos`: the occupant's glyph, else the terrain's.
    pub fn glyph_at(&self, pos: Position) -> Option<char> {
        match self.occupancy.get(pos)? {
            Cell::Terrain(tile) => Some(tile.glyph()),
            Cell::Occupant(id) => Some(
                self.entities
                    .get(id)
                    .map(|entity| entity.glyph)
                    .or_else(|| self.background.get(pos).map(Tile::glyph))?,
            ),
        }
    }

    /// Whether the current occupant or terrain at `pos` stops movement.
    ///
    /// Positions outside the grid always block.
    pub fn blocks_movement_at(&self, pos: Position) -> bool {
        match self.occupancy.get(pos) {
            Some(Cell::Terrain(tile)) => tile.blocks_movement,
            Some(Cell::Occupant(id)) => self
                .entities
                .get(id)
                .map(|entity| entity.blocks_movement)
                .unwrap_or(true),
            None => true,
        }
    }

    pub fn is_explored(&self, pos: Position) -> bool {
        self.visibility.get(pos).is_some_and(|tile| tile.explored)
    }

    /// Whether the entity arena and the occupancy grid agree.
    ///
    /// Every live entity must occupy the cell at its position, and every
    /// occupant id in the grid must name a live entity.
    pub fn is_consistent(&self) -> bool {
        let entities_placed = self
            .entities
            .iter()
            .all(|(id, entity)| self.occupant_id(entity.position) == Some(*id));
        let occupants_live = self.occupancy.iter().all(|(_, cell)| match cell {
            Cell::Occupant(id) => self.entities.contains_key(id),
            Cell::Terrain(_) => true,
        });
        entities_placed && occupants_live
    }

    /// Occupancy glyphs as rows.
    pub fn render_glyphs(&self) -> Vec<Vec<char>> {
        let mut rows = Vec::with_capacity(self.height() as usize);
        for y in 0..self.height() as i32 {
            let row = (0..self.width() as i32)
                .map(|x| self.glyph_at(Position::new(x, y)).unwrap_or(' '))
                .collect();
            rows.push(row);
        }
        rows
    }

    /// Visibility-grid explored flags as rows.
    pub fn render_explored(&self) -> Vec<Vec<bool>> {
        self.visibility.map_rows(|tile| tile.explored)
    }

    // ------------------------------------------------------------------
    // Mutation, restricted to generation and action resolution
    // ------------------------------------------------------------------

    /// Writes terrain into the occupancy grid (used while carving).
    pub(crate) fn set_terrain(&mut self, pos: Position, tile: Tile) -> DungeonResult<()> {
        self.occupancy.set(pos, Cell::Terrain(tile))
    }

    /// Writes terrain into both the occupancy and background grids.
    pub(crate) fn set_terrain_everywhere(&mut self, pos: Position, tile: Tile) -> DungeonResult<()> {
        self.occupancy.set(pos, Cell::Terrain(tile))?;
        self.background.set(pos, tile)
    }

    pub(crate) fn push_room(&mut self, room: Room) {
        self.rooms.push(room);
    }

    /// Resets every grid to rock and forgets all rooms.
    pub(crate) fn clear_layout(&mut self) {
        for cell in self.occupancy.iter_mut() {
            *cell = Cell::Terrain(Tile::wall());
        }
        self.rooms.clear();
    }

    /// Copies the carved terrain into the background and visibility grids.
    ///
    /// Must run after carving and before any entity is placed.
    pub(crate) fn snapshot_terrain(&mut self) {
        let width = self.width();
        let height = self.height();
        let mut terrain = Grid::new(width, height, Tile::wall());
        for (pos, cell) in self.occupancy.iter() {
            if let Cell::Terrain(tile) = cell {
                // Positions come from the same dimensions, so set cannot fail.
                let _ = terrain.set(pos, *tile);
            }
        }
        self.visibility = terrain.clone();
        self.background = terrain;
    }

    /// Adds an entity to the arena and makes it the occupant of its cell.
    ///
    /// Whatever occupied the cell before is overwritten; a displaced entity
    /// is dropped by the next [`Level::cleanup`].
    pub(crate) fn spawn(&mut self, entity: Entity) -> DungeonResult<EntityId> {
        let pos = entity.position;
        if !self.contains(pos) {
            return Err(DungeonError::InvalidState(format!(
                "Cannot spawn {} outside the grid at {}",
                entity.name, pos
            )));
        }

        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;

        if entity.is_player() {
            self.player_id = Some(id);
        }
        self.occupancy.set(pos, Cell::Occupant(id))?;
        self.entities.insert(id, entity);
        Ok(id)
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Moves an entity, restoring the vacated cell from the background grid.
    pub(crate) fn move_entity(&mut self, id: EntityId, to: Position) -> DungeonResult<()> {
        let from = self
            .entities
            .get(&id)
            .map(|entity| entity.position)
            .ok_or_else(|| DungeonError::InvalidState(format!("Entity {} not found", id)))?;
        let restored = *self.background.get(from).ok_or_else(|| {
            DungeonError::InvalidState(format!("Entity {} stands outside the grid", id))
        })?;

        self.occupancy.set(to, Cell::Occupant(id))?;
        self.occupancy.set(from, Cell::Terrain(restored))?;
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.position = to;
        }
        Ok(())
    }

    /// Removes an entity from the arena. Its cell is left untouched.
    pub(crate) fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        if self.player_id == Some(id) {
            self.player_id = None;
        }
        self.entities.remove(&id)
    }

    pub(crate) fn visibility_mut(&mut self) -> &mut Grid<Tile> {
        &mut self.visibility
    }

    /// Drops every entity that is not the occupant of its own cell.
    ///
    /// Returns the ids that were dropped.
    pub(crate) fn cleanup(&mut self) -> Vec<EntityId> {
        let stale: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|(id, entity)| self.occupant_id(entity.position) != Some(**id))
            .map(|(id, _)| *id)
            .collect();

        for id in &stale {
            if let Some(entity) = self.remove_entity(*id) {
                debug!("Dropped stale {} {} at {}", entity.name, id, entity.position);
            }
        }

        // Occupant ids whose entity is gone fall back to the terrain beneath.
        let orphaned: Vec<Position> = self
            .occupancy
            .iter()
            .filter_map(|(pos, cell)| match cell {
                Cell::Occupant(id) if !self.entities.contains_key(id) => Some(pos),
                _ => None,
            })
            .collect();
        for pos in orphaned {
            if let Some(tile) = self.background.get(pos).copied() {
                let _ = self.occupancy.set(pos, Cell::Terrain(tile));
            }
        }

        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EnemyKind;

    fn open_level() -> Level {
        let mut level = Level::new(10, 10);
        for y in 1..9 {
            for x in 1..9 {
                level.set_terrain(Position::new(x, y), Tile::floor()).unwrap();
            }
        }
        level.snapshot_terrain();
        level
    }

    #[test]
    fn test_tile_properties() {
        let wall = Tile::wall();
        assert!(wall.blocks_movement);
        assert!(!wall.see_through);
        assert_eq!(wall.glyph(), '#');

        let floor = Tile::floor();
        assert!(!floor.blocks_movement);
        assert_eq!(floor.glyph(), '.');

        let corpse = Tile::corpse();
        assert!(!corpse.blocks_movement);
        assert_eq!(corpse.glyph(), 'q');
    }

    #[test]
    fn test_grid_bounds() {
        let mut grid = Grid::new(4, 3, 0u8);
        assert!(grid.contains(Position::new(3, 2)));
        assert!(!grid.contains(Position::new(4, 2)));
        assert!(!grid.contains(Position::new(-1, 0)));
        assert!(grid.set(Position::new(4, 0), 1).is_err());

        grid.set(Position::new(1, 2), 7).unwrap();
        assert_eq!(grid.get(Position::new(1, 2)), Some(&7));
        assert_eq!(grid.get(Position::new(2, 1)), Some(&0));
    }

    #[test]
    fn test_grid_cells_are_independent() {
        let mut grid = Grid::new(3, 3, Tile::wall());
        grid.get_mut(Position::new(1, 1)).unwrap().explored = true;
        let explored = grid.iter().filter(|(_, tile)| tile.explored).count();
        assert_eq!(explored, 1);
    }

    #[test]
    fn test_grid_map_rows() {
        let grid = Grid::new(3, 2, 'x');
        let rows = grid.map_rows(|c| *c);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 3);
    }

    #[test]
    fn test_snapshot_is_separate_from_occupancy() {
        let mut level = open_level();
        let pos = Position::new(2, 2);
        level.set_terrain(pos, Tile::wall()).unwrap();
        assert_eq!(level.background().get(pos).unwrap().tile_type, TileType::Floor);
        assert_eq!(level.visibility().get(pos).unwrap().tile_type, TileType::Floor);
    }

    #[test]
    fn test_spawn_and_move_restores_background() {
        let mut level = open_level();
        let id = level.spawn(Entity::player(Position::new(2, 2))).unwrap();
        assert_eq!(level.player_id(), Some(id));
        assert_eq!(level.glyph_at(Position::new(2, 2)), Some('@'));

        level.move_entity(id, Position::new(3, 2)).unwrap();
        assert_eq!(level.glyph_at(Position::new(2, 2)), Some('.'));
        assert_eq!(level.glyph_at(Position::new(3, 2)), Some('@'));
        assert_eq!(level.player().unwrap().position, Position::new(3, 2));
        assert!(level.is_consistent());
    }

    #[test]
    fn test_cleanup_drops_displaced_entities() {
        let mut level = open_level();
        let pos = Position::new(4, 4);
        let zombie = level.spawn(Entity::enemy(EnemyKind::Zombie, pos)).unwrap();
        let exit = level.spawn(Entity::exit(pos)).unwrap();
        assert!(!level.is_consistent());

        let dropped = level.cleanup();
        assert_eq!(dropped, vec![zombie]);
        assert!(level.contains_entity(exit));
        assert!(level.is_consistent());
    }

    #[test]
    fn test_cleanup_clears_orphaned_occupants() {
        let mut level = open_level();
        let pos = Position::new(5, 5);
        let id = level.spawn(Entity::potion(pos)).unwrap();
        level.remove_entity(id);
        assert!(!level.is_consistent());

        level.cleanup();
        assert_eq!(level.cell(pos), Some(&Cell::Terrain(Tile::floor())));
        assert!(level.is_consistent());
    }

    #[test]
    fn test_blocks_movement_at() {
        let mut level = open_level();
        assert!(level.blocks_movement_at(Position::new(0, 0)));
        assert!(level.blocks_movement_at(Position::new(-1, 3)));
        assert!(!level.blocks_movement_at(Position::new(3, 3)));

        level.spawn(Entity::enemy(EnemyKind::Vampire, Position::new(3, 3))).unwrap();
        level.spawn(Entity::potion(Position::new(4, 3))).unwrap();
        assert!(level.blocks_movement_at(Position::new(3, 3)));
        assert!(!level.blocks_movement_at(Position::new(4, 3)));
    }

    #[test]
    fn test_render_snapshots() {
        let level = open_level();
        let glyphs = level.render_glyphs();
        assert_eq!(glyphs.len(), 10);
        assert_eq!(glyphs[0][0], '#');
        assert_eq!(glyphs[1][1], '.');

        let explored = level.render_explored();
        assert!(explored.iter().flatten().all(|flag| !flag));
    }

    #[test]
    fn test_exit_position() {
        let mut level = open_level();
        assert_eq!(level.exit_position(), None);
        level.spawn(Entity::exit(Position::new(7, 7))).unwrap();
        assert_eq!(level.exit_position(), Some(Position::new(7, 7)));
    }
}
