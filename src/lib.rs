//! # Dungeon Sim
//!
//! A turn-based, tile-grid dungeon simulation core.
//!
//! ## Architecture Overview
//!
//! The crate is organised around a handful of concepts:
//!
//! - **Level**: three parallel grids (occupancy, terrain background, fog of war),
//!   the accepted rooms, and an arena of live entities keyed by [`EntityId`]
//! - **Generation**: room placement, L-shaped tunnels and spawning, all driven by
//!   a [`GenerationConfig`] derived from the current depth
//! - **Actions**: a bump resolves into Movement, Attack or Take
//! - **Engine**: the round loop (field of view, player action, enemy turns) and
//!   level transitions
//!
//! Observation encoding, reward shaping and interactive front-ends are clients
//! of this crate and only consume the read-only snapshots the [`Engine`] exposes.

pub mod game;
pub mod generation;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use utils::*;

// Explicit re-exports for commonly used types
pub use game::{
    // From game
    Direction,
    EntityId,
    Position,
    // From actions
    Action,
    ActionKind,
    AttackAction,
    ConcreteAction,
    GameEvent,
    MovementAction,
    Occupant,
    TakeAction,
    // From autoexplore
    Autopilot,
    // From entities
    Actor,
    ActorRole,
    EnemyKind,
    Entity,
    EntityKind,
    Item,
    PlayerStats,
    Potion,
    // From state
    Engine,
    EngineConfig,
    GameStatistics,
    StepOutcome,
    // From world
    Cell,
    Grid,
    Level,
    Tile,
    TileType,
};

pub use generation::{EncounterGenerator, GenerationConfig, Room, RoomCorridorGenerator};

pub use utils::Pathfinder;

/// Core error type for the dungeon simulation.
#[derive(thiserror::Error, Debug)]
pub enum DungeonError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Construction parameters violate the generation contract
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type used throughout the crate.
pub type DungeonResult<T> = Result<T, DungeonError>;

/// Version information for the simulation.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation configuration constants.
pub mod config {
    /// Dungeon width in tiles
    pub const MAP_WIDTH: u32 = 18;

    /// Dungeon height in tiles
    pub const MAP_HEIGHT: u32 = 15;

    /// Largest accepted grid width or height
    pub const MAX_MAP_DIMENSION: u32 = 4096;

    /// Half-width of the square field of view
    pub const FOV_RADIUS: i32 = 3;

    /// Player starting stats
    pub const PLAYER_HP: i32 = 20;
    pub const PLAYER_ATTACK: i32 = 5;
    pub const PLAYER_DEFENSE: i32 = 2;

    /// Zombie stats
    pub const ZOMBIE_HP: i32 = 8;
    pub const ZOMBIE_ATTACK: i32 = 3;
    pub const ZOMBIE_DEFENSE: i32 = 1;

    /// Vampire stats
    pub const VAMPIRE_HP: i32 = 12;
    pub const VAMPIRE_ATTACK: i32 = 4;
    pub const VAMPIRE_DEFENSE: i32 = 1;

    /// Gold granted to the player per kill
    pub const ZOMBIE_GOLD: u32 = 1;
    pub const VAMPIRE_GOLD: u32 = 5;

    /// Health restored by a potion
    pub const POTION_HEAL: i32 = 10;

    /// Pathfinding cost of a plain floor cell
    pub const FLOOR_COST: u32 = 1;

    /// Pathfinding cost of a cell occupied by an actor
    pub const ACTOR_COST: u32 = 5;

    /// Pathfinding cost of a cell holding an exit or potion
    pub const ITEM_COST: u32 = 8;

    /// Candidates sampled for a single room before the layout restarts
    pub const MAX_PLACEMENT_ATTEMPTS: u32 = 200;

    /// Full layout restarts before generation gives up
    pub const MAX_LAYOUT_ATTEMPTS: u32 = 64;

    /// Seed stride between consecutive depths of a seeded run
    pub const DEPTH_SEED_STRIDE: u64 = 1000;

    /// Hit points granted by the god mode cheat
    pub const GOD_MODE_HP: i32 = 5000;
}
