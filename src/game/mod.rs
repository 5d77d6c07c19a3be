//! # Game Module
//!
//! Core simulation state: the tile world, entities, action resolution and the
//! turn engine.
//!
//! This module contains the fundamental building blocks of the simulation:
//! - Grid and level representation with separate occupancy, background and
//!   visibility layers
//! - Closed entity variants (player, enemies, potions, exits)
//! - Bump resolution into Movement, Attack and Take
//! - The round-based engine and its depth progression

pub mod actions;
pub mod autoexplore;
pub mod entities;
pub mod state;
pub mod world;

pub use actions::*;
pub use autoexplore::*;
pub use entities::*;
pub use state::*;
pub use world::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a 2D coordinate on the level grid.
///
/// `x` grows to the right and `y` grows downwards; every grid in the crate is
/// indexed with this same convention.
///
/// # Examples
///
/// ```
/// use dungeon_sim::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
///
/// let adjacent = pos.cardinal_adjacent_positions();
/// assert_eq!(adjacent.len(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the origin position (0, 0).
    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Calculates the Manhattan distance to another position.
    ///
    /// # Examples
    ///
    /// ```
    /// use dungeon_sim::Position;
    ///
    /// let pos1 = Position::new(0, 0);
    /// let pos2 = Position::new(3, 4);
    /// assert_eq!(pos1.manhattan_distance(pos2), 7);
    /// ```
    pub fn manhattan_distance(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Returns only the 4 cardinal adjacent positions (no diagonals).
    pub fn cardinal_adjacent_positions(self) -> Vec<Position> {
        Direction::all()
            .into_iter()
            .map(|direction| self + direction.to_delta())
            .collect()
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The four directions a player can step in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use dungeon_sim::{Direction, Position};
    ///
    /// let delta = Direction::Up.to_delta();
    /// assert_eq!(delta, Position::new(0, -1));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::Up => Position::new(0, -1),
            Direction::Down => Position::new(0, 1),
            Direction::Left => Position::new(-1, 0),
            Direction::Right => Position::new(1, 0),
        }
    }

    /// Converts a position delta to a direction.
    ///
    /// Returns None if the delta is not a unit cardinal step.
    pub fn from_delta(delta: Position) -> Option<Direction> {
        match (delta.x, delta.y) {
            (0, -1) => Some(Direction::Up),
            (0, 1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            _ => None,
        }
    }

    /// Returns all 4 directions.
    pub fn all() -> [Direction; 4] {
        [
            Direction::Up,
            Direction::Left,
            Direction::Right,
            Direction::Down,
        ]
    }
}

/// Stable identifier for an entity within a level's arena.
///
/// Ids are handed out in spawn order, which also fixes the order in which
/// enemies take their turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_creation() {
        let pos = Position::new(5, 10);
        assert_eq!(pos.x, 5);
        assert_eq!(pos.y, 10);
        assert_eq!(Position::origin(), Position::new(0, 0));
    }

    #[test]
    fn test_position_manhattan_distance() {
        let pos1 = Position::new(0, 0);
        let pos2 = Position::new(3, 4);
        assert_eq!(pos1.manhattan_distance(pos2), 7);
        assert_eq!(pos2.manhattan_distance(pos1), 7);
    }

    #[test]
    fn test_position_cardinal_adjacent() {
        let pos = Position::new(5, 5);
        let adjacent = pos.cardinal_adjacent_positions();
        assert_eq!(adjacent.len(), 4);
        assert!(adjacent.contains(&Position::new(5, 4)));
        assert!(adjacent.contains(&Position::new(4, 5)));
        assert!(!adjacent.contains(&Position::new(4, 4)));
    }

    #[test]
    fn test_position_arithmetic() {
        let pos1 = Position::new(5, 10);
        let pos2 = Position::new(3, 2);
        assert_eq!(pos1 + pos2, Position::new(8, 12));
        assert_eq!(pos1 - pos2, Position::new(2, 8));
    }

    #[test]
    fn test_direction_round_trip() {
        for direction in Direction::all() {
            assert_eq!(Direction::from_delta(direction.to_delta()), Some(direction));
        }
        assert_eq!(Direction::from_delta(Position::new(1, 1)), None);
        assert_eq!(Direction::from_delta(Position::origin()), None);
    }
}
