//! # Utilities Module
//!
//! Pathfinding over level state.

pub mod pathfinding;

pub use self::pathfinding::*;
