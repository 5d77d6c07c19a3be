//! # Autopilot
//!
//! Steers the player toward the exit, or toward a fixed target, one step at a
//! time. Used by the headless runner and by tests that need to make progress
//! through levels without scripted input.

use crate::{Direction, Engine, Pathfinder, Position};
use log::trace;

/// Picks the player's next direction along the cheapest path to a goal.
///
/// The path is recomputed every turn, since enemies move between turns.
/// Enemies on the path get bumped (attacked) and potions on the path get
/// taken, exactly as if the player had walked there by hand.
#[derive(Debug, Clone, Default)]
pub struct Autopilot {
    /// Whether the autopilot is currently steering
    pub enabled: bool,
    /// Fixed goal; the current level's exit when `None`
    pub target: Option<Position>,
}

impl Autopilot {
    /// Creates an enabled autopilot heading for the exit.
    pub fn new() -> Self {
        Self {
            enabled: true,
            target: None,
        }
    }

    /// Creates an enabled autopilot heading for `target`.
    pub fn toward(target: Position) -> Self {
        Self {
            enabled: true,
            target: Some(target),
        }
    }

    /// Toggles the autopilot on/off.
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }

    /// The position currently being steered to.
    pub fn goal(&self, engine: &Engine) -> Option<Position> {
        self.target.or_else(|| engine.level().exit_position())
    }

    /// The direction of the next step, or `None` when disabled, already at the
    /// goal, or cut off from it.
    pub fn next_direction(&self, engine: &Engine) -> Option<Direction> {
        if !self.enabled || engine.is_player_dead() {
            return None;
        }

        let start = engine.player_position()?;
        let goal = self.goal(engine)?;
        let next = Pathfinder::new(engine.level()).next_step(start, goal);
        let direction = Direction::from_delta(next - start);
        trace!("Autopilot at {} heading {:?} toward {}", start, direction, goal);
        direction
    }
}
