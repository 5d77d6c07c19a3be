//! # Game State Module
//!
//! The turn engine: depth progression, round resolution and read-only views.
//!
//! One [`Engine`] owns the current [`Level`]. Each level is built from its own
//! RNG, seeded per depth for reproducible runs. A round computes the field of view, resolves one player bump, lets every awake enemy
//! take a step toward the player, and finally runs the consistency cleanup.

use crate::generation::{build_level, seeding, GenerationConfig};
use crate::{
    config, Action, ActionKind, ConcreteAction, Direction, DungeonError, DungeonResult, Entity,
    GameEvent, Item, Level, Occupant, Pathfinder, PlayerStats, Position,
};
use log::{debug, info};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine construction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base seed; only used when `fixed_seed` is set
    pub seed: u64,
    /// Reproducible generation from `seed` instead of OS entropy
    pub fixed_seed: bool,
    /// Grid width in tiles
    pub width: u32,
    /// Grid height in tiles
    pub height: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            fixed_seed: false,
            width: config::MAP_WIDTH,
            height: config::MAP_HEIGHT,
        }
    }
}

impl EngineConfig {
    /// A reproducible configuration with the default grid size.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            fixed_seed: true,
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> DungeonResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }
}

/// Result of one [`Engine::step`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    /// How the player's bump resolved, or `None` for a no-op
    pub action: Option<ActionKind>,
    /// The destination cell as it was before the player acted
    pub destination: Option<Occupant>,
    /// Everything that happened this round, player first
    pub events: Vec<GameEvent>,
}

impl StepOutcome {
    /// Whether the player's bump was a Take on the exit.
    pub fn took_exit(&self) -> bool {
        self.action == Some(ActionKind::Take)
            && self.destination.as_ref().is_some_and(Occupant::is_exit)
    }
}

/// Game statistics tracking player progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    /// Rounds resolved
    pub turns_taken: u64,
    /// Enemies killed by the player
    pub enemies_defeated: u32,
    /// Potions consumed
    pub potions_taken: u32,
    /// Level transitions through an exit
    pub exits_taken: u32,
    /// Total damage dealt by the player
    pub damage_dealt: u64,
    /// Total damage taken by the player
    pub damage_taken: u64,
    /// Gold earned from kills
    pub gold_earned: u64,
    /// Deepest level reached
    pub max_depth_reached: u32,
    /// Times the player died
    pub deaths: u32,
}

impl GameStatistics {
    /// Creates new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates statistics based on a game event.
    pub fn update_from_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::EntityAttacked {
                damage, by_player, ..
            } => {
                if *by_player {
                    self.damage_dealt += *damage as u64;
                } else {
                    self.damage_taken += *damage as u64;
                }
            }
            GameEvent::EntityDied {
                is_player,
                killed_by_player,
                ..
            } => {
                if *is_player {
                    self.deaths += 1;
                } else if *killed_by_player {
                    self.enemies_defeated += 1;
                }
            }
            GameEvent::GoldEarned { amount, .. } => {
                self.gold_earned += *amount as u64;
            }
            GameEvent::ItemPickedUp { item, .. } => match item {
                Item::Potion(_) => self.potions_taken += 1,
                Item::Exit => self.exits_taken += 1,
            },
            GameEvent::LevelChanged { depth } => {
                self.max_depth_reached = self.max_depth_reached.max(*depth);
            }
            GameEvent::EntityMoved { .. } | GameEvent::EntityHealed { .. } => {}
        }
    }
}

/// The top-level simulation state machine.
///
/// # Examples
///
/// ```
/// use dungeon_sim::{Direction, Engine, EngineConfig};
///
/// let mut engine = Engine::new(EngineConfig::seeded(42)).unwrap();
/// assert_eq!(engine.depth(), 0);
///
/// let outcome = engine.step(Direction::Right).unwrap();
/// assert!(outcome.action.is_some() || engine.is_player_dead());
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    depth: u32,
    level: Level,
    statistics: GameStatistics,
}

impl Engine {
    /// Creates an engine at depth 0 with a freshly generated level.
    pub fn new(config: EngineConfig) -> DungeonResult<Self> {
        let mut rng = Self::level_rng(&config, 0);
        let generation = Self::parameters_for(&config, 0);
        let level = build_level(&generation, Entity::player(Position::origin()), &mut rng)?;

        info!(
            "Engine started (seed {}, fixed {}) with {} rooms",
            config.seed,
            config.fixed_seed,
            level.rooms().len()
        );

        Ok(Self {
            config,
            depth: 0,
            level,
            statistics: GameStatistics::new(),
        })
    }

    /// Discards all state and starts over from depth 0.
    pub fn reset(&mut self, seed: u64, fixed_seed: bool) -> DungeonResult<()> {
        let config = EngineConfig {
            seed,
            fixed_seed,
            ..self.config.clone()
        };
        *self = Self::new(config)?;
        Ok(())
    }

    fn level_rng(config: &EngineConfig, depth: u32) -> StdRng {
        if config.fixed_seed {
            let generation = Self::parameters_for(config, depth);
            seeding::create_rng(&generation)
        } else {
            seeding::entropy_rng()
        }
    }

    fn parameters_for(config: &EngineConfig, depth: u32) -> GenerationConfig {
        GenerationConfig {
            width: config.width,
            height: config.height,
            ..GenerationConfig::for_depth(depth, seeding::depth_seed(config.seed, depth))
        }
    }

    /// Generation parameters for the current depth.
    pub fn calculate_parameters(&self) -> GenerationConfig {
        Self::parameters_for(&self.config, self.depth)
    }

    /// Resolves one full round with the player stepping in `direction`.
    ///
    /// Stepping once the player is dead changes nothing.
    pub fn step(&mut self, direction: Direction) -> DungeonResult<StepOutcome> {
        if self.is_player_dead() {
            return Ok(StepOutcome::default());
        }

        self.fov();

        let start = self.require_player_position()?;
        let depth_before = self.depth;
        let mut outcome = StepOutcome::default();

        if let Some((kind, destination, events)) = self.bump(start, direction.to_delta())? {
            outcome.action = Some(kind);
            outcome.destination = Some(destination);
            outcome.events = events;
        }

        // A fresh level has nothing explored, so no enemy could wake up.
        if self.depth == depth_before {
            let enemy_events = self.handle_enemy_turns()?;
            outcome.events.extend(enemy_events);
        }

        self.clean_up();

        self.statistics.turns_taken += 1;
        for event in &outcome.events {
            self.statistics.update_from_event(event);
        }

        Ok(outcome)
    }

    /// Resolves one bump by the actor at `start`.
    ///
    /// Returns the resolved kind, the destination as it was before
    /// resolution, and the resulting events; `None` for a no-op. A Take on the
    /// exit performs the level transition before returning.
    pub fn bump(
        &mut self,
        start: Position,
        delta: Position,
    ) -> DungeonResult<Option<(ActionKind, Occupant, Vec<GameEvent>)>> {
        let Some((action, destination)) = ConcreteAction::from_bump(&self.level, start, delta)
        else {
            return Ok(None);
        };

        let kind = action.kind();
        let mut events = action.perform(&mut self.level)?;

        if kind == ActionKind::Take && destination.is_exit() {
            self.next_level()?;
            events.push(GameEvent::LevelChanged { depth: self.depth });
        }

        Ok(Some((kind, destination, events)))
    }

    /// Marks the square around the player as explored.
    ///
    /// Walls do not block sight; the box is clamped to the grid.
    pub fn fov(&mut self) {
        let Some(center) = self.player_position() else {
            return;
        };
        let radius = config::FOV_RADIUS;
        let visibility = self.level.visibility_mut();
        for y in (center.y - radius)..=(center.y + radius) {
            for x in (center.x - radius)..=(center.x + radius) {
                if let Some(tile) = visibility.get_mut(Position::new(x, y)) {
                    tile.explored = true;
                }
            }
        }
    }

    /// Lets every enemy standing on an explored cell step toward the player.
    ///
    /// Enemies route around potions and the exit. They act in spawn order. The loop stops as soon as the player dies.
    pub fn handle_enemy_turns(&mut self) -> DungeonResult<Vec<GameEvent>> {
        let mut events = Vec::new();

        for id in self.level.enemy_ids() {
            let Some(position) = self.level.entity(id).map(|enemy| enemy.position) else {
                continue;
            };
            if !self.level.is_explored(position) {
                continue;
            }

            let target = self.require_player_position()?;
            let next = Pathfinder::avoiding_items(&self.level).next_step(position, target);
            if let Some((_, _, enemy_events)) = self.bump(position, next - position)? {
                events.extend(enemy_events);
            }

            if self.is_player_dead() {
                info!("Player killed by {} on depth {}", id, self.depth);
                break;
            }
        }

        Ok(events)
    }

    /// Builds the next depth's level and moves the player into it.
    pub fn next_level(&mut self) -> DungeonResult<()> {
        let player = self
            .level
            .player()
            .cloned()
            .ok_or_else(|| DungeonError::InvalidState("No player to carry forward".to_string()))?;

        self.depth += 1;
        let mut rng = Self::level_rng(&self.config, self.depth);
        let generation = self.calculate_parameters();
        self.level = build_level(&generation, player, &mut rng)?;

        info!(
            "Descended to depth {} ({} rooms, {} enemies, {} potions)",
            self.depth,
            self.level.rooms().len(),
            generation.num_enemies,
            generation.num_potions
        );
        Ok(())
    }

    /// Drops entities that no longer occupy their own cell.
    pub fn clean_up(&mut self) -> usize {
        let dropped = self.level.cleanup();
        if !dropped.is_empty() {
            debug!("Cleanup dropped {} stale entities", dropped.len());
        }
        dropped.len()
    }

    /// Occupancy glyphs as rows of `width` characters.
    pub fn render_grid(&self) -> Vec<Vec<char>> {
        self.level.render_glyphs()
    }

    /// Fog-of-war flags as rows of `width` booleans.
    pub fn render_visibility(&self) -> Vec<Vec<bool>> {
        self.level.render_explored()
    }

    /// Text dump of the level followed by a status line.
    ///
    /// Unexplored cells are blank unless `perfect_info` is set.
    pub fn render_text(&self, perfect_info: bool) -> String {
        let glyphs = self.render_grid();
        let explored = self.render_visibility();

        let mut text = String::new();
        for (glyph_row, explored_row) in glyphs.iter().zip(&explored) {
            for (glyph, seen) in glyph_row.iter().zip(explored_row) {
                text.push(if perfect_info || *seen { *glyph } else { ' ' });
            }
            text.push('\n');
        }

        if let Some(stats) = self.player_stats() {
            text.push_str(&format!(
                "HP: {}/{}  Depth: {}  Gold: {}",
                stats.hp, stats.max_hp, self.depth, stats.gold
            ));
        }
        text
    }

    /// Whether the episode has ended.
    pub fn is_player_dead(&self) -> bool {
        self.level
            .player()
            .and_then(Entity::as_actor)
            .map_or(true, |actor| actor.is_dead())
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn player_stats(&self) -> Option<PlayerStats> {
        self.level
            .player()
            .and_then(Entity::as_actor)
            .map(|actor| actor.stats())
    }

    pub fn player_position(&self) -> Option<Position> {
        self.level.player().map(|player| player.position)
    }

    fn require_player_position(&self) -> DungeonResult<Position> {
        self.player_position()
            .ok_or_else(|| DungeonError::InvalidState("No player found".to_string()))
    }

    pub fn statistics(&self) -> &GameStatistics {
        &self.statistics
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read-only view of the current level.
    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Debug cheat: reveals the whole level and makes the player very hard to kill.
    pub fn enable_god_mode(&mut self) {
        for tile in self.level.visibility_mut().iter_mut() {
            tile.explored = true;
        }
        if let Some(id) = self.level.player_id() {
            if let Some(actor) = self.level.entity_mut(id).and_then(Entity::as_actor_mut) {
                actor.hp = config::GOD_MODE_HP;
            }
        }
        info!("God mode enabled");
    }

    /// Counts explored bare-floor cells that have not been counted before.
    pub fn mark_newly_explored(&mut self) -> usize {
        let fresh: Vec<Position> = self
            .level
            .visibility()
            .iter()
            .filter(|(pos, tile)| {
                tile.explored && !tile.already_explored && self.level.glyph_at(*pos) == Some('.')
            })
            .map(|(pos, _)| pos)
            .collect();

        let visibility = self.level.visibility_mut();
        for pos in &fresh {
            if let Some(tile) = visibility.get_mut(*pos) {
                tile.already_explored = true;
            }
        }
        fresh.len()
    }

    /// Test hook for building scenarios on a hand-made level.
    #[cfg(test)]
    pub(crate) fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }
}
