//! # Utilities Module
//!
//! Pathfinding and text helpers shared by the game systems.

pub mod pathfinding;
pub mod text;

pub use self::pathfinding::*;
pub use text::*;
