//! # Undercrawl
//!
//! Turn-resolution core of a single-player roguelike set in the lost city under the
//! mountain.
//!
//! ## Architecture Overview
//!
//! The crate owns the simulation and nothing else. Rendering, menus and input devices
//! talk to it through small value types:
//!
//! - **Game State**: the explicit session (`GameState`) that owns the world, the player
//!   controller, the message log and run statistics
//! - **Entity Model**: an arena of actors, items and props addressed by `EntityId`
//! - **Action System**: one closed `Action` enum for every turn-unit of behavior
//! - **AI State Machine**: one closed `Ai` enum, including transient overrides and
//!   player-directed tasks
//! - **Interactables**: the `Interactable` enum for consumables, spells, social
//!   abilities and props
//! - **Generation System**: hub-and-satellite floor layouts seeded by depth
//! - **Rendering System**: a render view plus an ASCII frame for headless runs

pub mod game;
pub mod generation;
pub mod input;
pub mod rendering;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use input::*;
pub use rendering::*;
pub use utils::*;

pub use game::{
    // From actions
    Action,
    // From ai
    Ai,
    AiStep,
    // From entities
    Actor,
    ActorType,
    Container,
    Direction,
    Entity,
    EntityArena,
    EntityId,
    EntityKind,
    // From components
    EquipSlot,
    Fighter,
    // From state
    GameCompletionState,
    GameEvent,
    GameState,
    GameStatistics,
    // From map
    GameMap,
    Interactable,
    Inventory,
    Item,
    MessageLog,
    MessageTag,
    PlayerController,
    Position,
    StatusEffect,
    Tile,
    TileKind,
    World,
};

pub use generation::{DungeonGenerator, FloorLayout, GenerationConfig, Generator, Room, RoomType};

pub use rendering::{RenderEntity, RenderView};

/// Core error type for the Undercrawl engine.
#[derive(thiserror::Error, Debug)]
pub enum UndercrawlError {
    /// A player-facing precondition failed; the turn is not consumed
    #[error("{0}")]
    Impossible(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

impl UndercrawlError {
    /// Builds an `Impossible` error from any message.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercrawl::UndercrawlError;
    ///
    /// let err = UndercrawlError::impossible("That way is blocked.");
    /// assert!(err.is_impossible());
    /// assert_eq!(err.to_string(), "That way is blocked.");
    /// ```
    pub fn impossible(reason: impl Into<String>) -> Self {
        UndercrawlError::Impossible(reason.into())
    }

    /// Returns true for the recoverable, player-facing error kind.
    pub fn is_impossible(&self) -> bool {
        matches!(self, UndercrawlError::Impossible(_))
    }
}

/// Result type used throughout the Undercrawl codebase.
pub type UndercrawlResult<T> = Result<T, UndercrawlError>;

/// Version information for the game.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Game configuration constants.
pub mod config {
    /// Default floor width in tiles
    pub const DEFAULT_MAP_WIDTH: i32 = 80;

    /// Default floor height in tiles
    pub const DEFAULT_MAP_HEIGHT: i32 = 43;

    /// Radius of the player's field of view
    pub const FOV_RADIUS: i32 = 8;

    /// Number of entries kept by the message log
    pub const MESSAGE_LOG_CAPACITY: usize = 200;

    /// Carrying capacity of the player
    pub const PLAYER_INVENTORY_CAPACITY: usize = 27;

    /// Extra path cost for tiles holding a movement-blocking entity
    pub const BLOCKER_PATH_COST: u32 = 10;

    /// Floor the run starts on
    pub const SURFACE_FLOOR: i32 = 0;
}
