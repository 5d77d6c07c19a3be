//! # Pathfinding
//!
//! Weighted 4-directional shortest paths over a level.
//!
//! A [`Pathfinder`] snapshots per-cell movement costs when it is built, so it
//! must be rebuilt after the level changes.

use crate::{config, Cell, Entity, Grid, Level, Position};
use log::trace;
use pathfinding::prelude::astar;

/// Movement-cost grid built from the current state of a level.
///
/// Blocking terrain is impassable. Cells holding an actor are expensive, item
/// cells are more expensive still, and all other open cells cost the base
/// floor cost. Searches for enemies use [`Pathfinder::avoiding_items`], since
/// only the player may enter an item cell.
#[derive(Debug, Clone)]
pub struct Pathfinder {
    costs: Grid<Option<u32>>,
}

impl Pathfinder {
    /// Builds the cost grid for `level`.
    pub fn new(level: &Level) -> Self {
        Self::build(level, true)
    }

    /// Builds a cost grid in which potion and exit cells are impassable.
    pub fn avoiding_items(level: &Level) -> Self {
        Self::build(level, false)
    }

    fn build(level: &Level, items_passable: bool) -> Self {
        let mut costs = Grid::new(level.width(), level.height(), None);
        for (pos, cell) in level.occupancy().iter() {
            let cost = match cell {
                Cell::Terrain(tile) if tile.blocks_movement => None,
                Cell::Terrain(_) => Some(config::FLOOR_COST),
                Cell::Occupant(id) => level
                    .entity(*id)
                    .and_then(|entity| Self::occupant_cost(entity, items_passable)),
            };
            if let Some(slot) = costs.get_mut(pos) {
                *slot = cost;
            }
        }
        Self { costs }
    }

    fn occupant_cost(entity: &Entity, items_passable: bool) -> Option<u32> {
        match (entity.is_item(), items_passable) {
            (true, true) => Some(config::ITEM_COST),
            (true, false) => None,
            (false, _) => Some(config::ACTOR_COST),
        }
    }

    /// Cost of entering `pos`, or `None` if it cannot be entered.
    pub fn cost(&self, pos: Position) -> Option<u32> {
        self.costs.get(pos).copied().flatten()
    }

    /// Cheapest path from `start` to `goal`, both ends included, and its cost.
    ///
    /// # Examples
    ///
    /// ```
    /// use dungeon_sim::{Level, Pathfinder, Position};
    ///
    /// // Solid rock: nothing is reachable.
    /// let level = Level::new(5, 5);
    /// let pathfinder = Pathfinder::new(&level);
    /// assert!(pathfinder.find_path(Position::new(1, 1), Position::new(3, 3)).is_none());
    /// ```
    pub fn find_path(&self, start: Position, goal: Position) -> Option<(Vec<Position>, u32)> {
        if self.cost(goal).is_none() {
            return None;
        }
        astar(
            &start,
            |pos| {
                pos.cardinal_adjacent_positions()
                    .into_iter()
                    .filter_map(|next| self.cost(next).map(|cost| (next, cost)))
                    .collect::<Vec<_>>()
            },
            |pos| pos.manhattan_distance(goal),
            |pos| *pos == goal,
        )
    }

    /// The first step along the cheapest path toward `goal`.
    ///
    /// Returns `start` itself when no path exists or `start == goal`.
    pub fn next_step(&self, start: Position, goal: Position) -> Position {
        let step = self
            .find_path(start, goal)
            .and_then(|(path, _)| path.get(1).copied())
            .unwrap_or(start);
        trace!("Next step from {} toward {} is {}", start, goal, step);
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EnemyKind, Tile};

    fn corridor_level() -> Level {
        // A 1-wide corridor from (1, 1) to (7, 1) plus a detour row at y = 3
        // joined at both ends.
        let mut level = Level::new(9, 5);
        for x in 1..8 {
            level.set_terrain(Position::new(x, 1), Tile::floor()).unwrap();
            level.set_terrain(Position::new(x, 3), Tile::floor()).unwrap();
        }
        level.set_terrain(Position::new(1, 2), Tile::floor()).unwrap();
        level.set_terrain(Position::new(7, 2), Tile::floor()).unwrap();
        level.snapshot_terrain();
        level
    }

    #[test]
    fn test_costs() {
        let mut level = corridor_level();
        level.spawn(Entity::enemy(EnemyKind::Zombie, Position::new(3, 1))).unwrap();
        level.spawn(Entity::potion(Position::new(4, 1))).unwrap();
        level.spawn(Entity::exit(Position::new(5, 1))).unwrap();

        let pathfinder = Pathfinder::new(&level);
        assert_eq!(pathfinder.cost(Position::new(0, 0)), None);
        assert_eq!(pathfinder.cost(Position::new(2, 1)), Some(1));
        assert_eq!(pathfinder.cost(Position::new(3, 1)), Some(5));
        assert_eq!(pathfinder.cost(Position::new(4, 1)), Some(8));
        assert_eq!(pathfinder.cost(Position::new(5, 1)), Some(8));
        assert_eq!(pathfinder.cost(Position::new(-1, 1)), None);
    }

    #[test]
    fn test_straight_path() {
        let level = corridor_level();
        let pathfinder = Pathfinder::new(&level);

        let (path, cost) = pathfinder
            .find_path(Position::new(1, 1), Position::new(7, 1))
            .unwrap();
        assert_eq!(path.len(), 7);
        assert_eq!(cost, 6);
        assert_eq!(pathfinder.next_step(Position::new(1, 1), Position::new(7, 1)), Position::new(2, 1));
    }

    #[test]
    fn test_detour_around_expensive_cells() {
        let mut level = corridor_level();
        level.spawn(Entity::potion(Position::new(4, 1))).unwrap();
        level.spawn(Entity::potion(Position::new(5, 1))).unwrap();

        let pathfinder = Pathfinder::new(&level);
        // Through the potions: 4 floor + 2 * 8 = 20. Detour via row 3: 10.
        let (path, cost) = pathfinder
            .find_path(Position::new(1, 1), Position::new(7, 1))
            .unwrap();
        assert_eq!(cost, 10);
        assert!(path.contains(&Position::new(4, 3)));
        assert_eq!(pathfinder.next_step(Position::new(1, 1), Position::new(7, 1)), Position::new(1, 2));
    }

    #[test]
    fn test_avoiding_items_takes_the_long_way() {
        let mut level = corridor_level();
        level.spawn(Entity::potion(Position::new(4, 1))).unwrap();
        let (start, goal) = (Position::new(2, 1), Position::new(6, 1));

        // Through the potion: 3 floor + 8 = 11. Around it: 12.
        let through = Pathfinder::new(&level);
        assert_eq!(through.next_step(start, goal), Position::new(3, 1));

        let around = Pathfinder::avoiding_items(&level);
        assert_eq!(around.cost(Position::new(4, 1)), None);
        let (path, cost) = around.find_path(start, goal).unwrap();
        assert_eq!(cost, 12);
        assert!(!path.contains(&Position::new(4, 1)));
        assert_eq!(around.next_step(start, goal), Position::new(1, 1));
    }

    #[test]
    fn test_unreachable_goal_stays_put() {
        let level = corridor_level();
        let pathfinder = Pathfinder::new(&level);

        let start = Position::new(1, 1);
        assert_eq!(pathfinder.next_step(start, Position::new(0, 0)), start);
        assert_eq!(pathfinder.next_step(start, start), start);
    }

    #[test]
    fn test_path_uses_x_y_convention() {
        let mut level = Level::new(6, 4);
        for x in 1..5 {
            level.set_terrain(Position::new(x, 1), Tile::floor()).unwrap();
        }
        level.snapshot_terrain();
        let pathfinder = Pathfinder::new(&level);

        assert_eq!(pathfinder.next_step(Position::new(1, 1), Position::new(4, 1)), Position::new(2, 1));
        assert_eq!(pathfinder.next_step(Position::new(1, 1), Position::new(1, 4)), Position::new(1, 1));
    }
}
