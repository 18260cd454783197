//! # Generation Module
//!
//! Procedural floors: the room layout and what lives in it.
//!
//! Every floor is generated from a [`GenerationConfig`] whose seed is derived from
//! the run seed and the floor depth, so revisiting a depth rebuilds the same
//! layout. Depth 0 is the surface; floors below it are negative.

pub mod dungeon;
pub mod encounters;
pub mod items;

pub use dungeon::*;
pub use encounters::*;
pub use items::*;

use crate::config::{DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH, SURFACE_FLOOR};
use crate::game::Position;
use crate::{UndercrawlError, UndercrawlResult};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for procedural generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Map width in tiles
    pub width: i32,
    /// Map height in tiles
    pub height: i32,
    /// Floor this configuration describes
    pub depth: i32,
    /// Outer size of the square entry and exit hubs, walls included
    pub hub_size: i32,
    /// Outer height of the corridor joining the hubs, walls included
    pub corridor_height: i32,
    /// Minimum outer size of a satellite room
    pub min_room_size: i32,
    /// Maximum outer size of a satellite room
    pub max_room_size: i32,
    /// Upper bound on rooms per floor, hubs and corridor included
    pub max_rooms: usize,
    /// Satellite placement attempts per layout
    pub growth_attempts: u32,
    /// Whole-layout retries before giving up
    pub max_generation_attempts: u32,
    /// Chance of a door between rooms that touch without being parent and child
    pub extra_door_chance: f64,
    /// Maximum monsters placed in a room
    pub max_monsters_per_room: u32,
    /// Maximum loose items placed in a room
    pub max_items_per_room: u32,
    /// Last floor; it holds the sealed gate instead of a way down
    pub final_depth: i32,
    /// Floor where the rusty key lies
    pub key_depth: i32,
    /// Shallowest floor where the mysterious egg hatches
    pub hatch_depth: i32,
}

impl GenerationConfig {
    /// Creates a default generation configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercrawl::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.depth, 0);
    /// assert!(config.max_room_size >= config.min_room_size);
    /// assert!(config.final_depth < config.key_depth);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            width: DEFAULT_MAP_WIDTH,
            height: DEFAULT_MAP_HEIGHT,
            depth: SURFACE_FLOOR,
            hub_size: 7,
            corridor_height: 5,
            min_room_size: 5,
            max_room_size: 10,
            max_rooms: 24,
            growth_attempts: 400,
            max_generation_attempts: 20,
            extra_door_chance: 0.25,
            max_monsters_per_room: 2,
            max_items_per_room: 1,
            final_depth: -8,
            key_depth: -6,
            hatch_depth: -5,
        }
    }

    /// Creates a configuration for testing with smaller, simpler floors.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            width: 40,
            height: 25,
            max_rooms: 10,
            growth_attempts: 100,
            final_depth: -3,
            key_depth: -2,
            hatch_depth: -1,
            ..Self::new(seed)
        }
    }

    /// Settings for one floor of this run, with its own derived seed.
    pub fn for_depth(&self, depth: i32) -> Self {
        let mix = (depth as i64 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        Self {
            seed: self.seed ^ mix,
            depth,
            ..self.clone()
        }
    }

    /// Loads a configuration from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> UndercrawlResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Rejects settings the layout cannot fit.
    pub fn check(&self) -> UndercrawlResult<()> {
        if self.hub_size < 5 || self.corridor_height < 3 || self.corridor_height > self.hub_size {
            return Err(UndercrawlError::GenerationFailed(format!(
                "Hub size {} and corridor height {} cannot be joined",
                self.hub_size, self.corridor_height
            )));
        }
        if self.width < self.hub_size * 2 + 3 || self.height < self.hub_size + 2 {
            return Err(UndercrawlError::GenerationFailed(format!(
                "A {}x{} map is too small for the hubs",
                self.width, self.height
            )));
        }
        if self.min_room_size < 3 || self.max_room_size < self.min_room_size {
            return Err(UndercrawlError::GenerationFailed(format!(
                "Invalid room size range {}..={}",
                self.min_room_size, self.max_room_size
            )));
        }
        if self.final_depth > SURFACE_FLOOR {
            return Err(UndercrawlError::GenerationFailed(
                "The final floor must not be above the surface".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// A rectangular room, walls included.
///
/// Neighboring rooms share their wall line, so the right wall of one room can be
/// the left wall of the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Unique identifier for this room
    pub id: u32,
    /// Top-left corner of the room
    pub top_left: Position,
    /// Width of the room (including walls)
    pub width: i32,
    /// Height of the room (including walls)
    pub height: i32,
    /// Role of this room in the layout
    pub room_type: RoomType,
    /// Rooms reachable through a door of this room
    pub connections: Vec<u32>,
}

/// Role of a room in a floor layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomType {
    /// Where the player arrives after going down; holds the up staircase
    EntryHub,
    /// Holds the down staircase, or the sealed gate on the last floor
    ExitHub,
    /// Joins the two hubs
    Corridor,
    /// Grown off an existing room to the north or south
    Satellite,
}

impl Room {
    /// Creates a new room with the given parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercrawl::{Position, Room, RoomType};
    ///
    /// let room = Room::new(1, Position::new(5, 5), 10, 8, RoomType::Satellite);
    /// assert_eq!(room.id, 1);
    /// assert_eq!(room.bottom_right(), Position::new(14, 12));
    /// ```
    pub fn new(id: u32, top_left: Position, width: i32, height: i32, room_type: RoomType) -> Self {
        Self {
            id,
            top_left,
            width,
            height,
            room_type,
            connections: Vec::new(),
        }
    }

    /// Gets the bottom-right corner of the room.
    pub fn bottom_right(&self) -> Position {
        Position::new(self.top_left.x + self.width - 1, self.top_left.y + self.height - 1)
    }

    /// Gets the center position of the room.
    pub fn center(&self) -> Position {
        Position::new(self.top_left.x + self.width / 2, self.top_left.y + self.height / 2)
    }

    pub fn area(&self) -> i32 {
        self.width * self.height
    }

    /// Gets the inner area (excluding walls) of the room.
    pub fn inner_area(&self) -> i32 {
        (self.width - 2).max(0) * (self.height - 2).max(0)
    }

    /// Checks if a position is inside this room, walls included.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercrawl::{Position, Room, RoomType};
    ///
    /// let room = Room::new(1, Position::new(5, 5), 10, 8, RoomType::Satellite);
    /// assert!(room.contains(Position::new(7, 7)));
    /// assert!(!room.contains(Position::new(20, 20)));
    /// ```
    pub fn contains(&self, pos: Position) -> bool {
        let bottom_right = self.bottom_right();
        pos.x >= self.top_left.x && pos.y >= self.top_left.y && pos.x <= bottom_right.x && pos.y <= bottom_right.y
    }

    /// Checks if a position lies on the interior floor of this room.
    pub fn contains_floor(&self, pos: Position) -> bool {
        let bottom_right = self.bottom_right();
        pos.x > self.top_left.x && pos.y > self.top_left.y && pos.x < bottom_right.x && pos.y < bottom_right.y
    }

    /// Checks if a position is on the border of this room.
    pub fn is_border(&self, pos: Position) -> bool {
        self.contains(pos) && !self.contains_floor(pos)
    }

    /// Checks if the two rectangles share any tile, walls included.
    pub fn overlaps(&self, other: &Room) -> bool {
        let (a, b) = (self.bottom_right(), other.bottom_right());
        self.top_left.x <= b.x && other.top_left.x <= a.x && self.top_left.y <= b.y && other.top_left.y <= a.y
    }

    /// True if either room reaches into the other's floor. Sharing a wall line
    /// is not an intrusion.
    pub fn intrudes(&self, other: &Room) -> bool {
        self.overlaps_floor_of(other) || other.overlaps_floor_of(self)
    }

    fn overlaps_floor_of(&self, other: &Room) -> bool {
        let (a, b) = (self.bottom_right(), other.bottom_right());
        self.top_left.x < b.x && other.top_left.x < a.x && self.top_left.y < b.y && other.top_left.y < a.y
    }

    /// Inclusive end points of the wall segment both rooms share, if any.
    pub fn shared_border(&self, other: &Room) -> Option<(Position, Position)> {
        let (a, b) = (self.bottom_right(), other.bottom_right());
        let vertical = if a.x == other.top_left.x {
            Some(a.x)
        } else if b.x == self.top_left.x {
            Some(self.top_left.x)
        } else {
            None
        };
        if let Some(x) = vertical {
            let lo = self.top_left.y.max(other.top_left.y);
            let hi = a.y.min(b.y);
            if lo <= hi {
                return Some((Position::new(x, lo), Position::new(x, hi)));
            }
        }

        let horizontal = if a.y == other.top_left.y {
            Some(a.y)
        } else if b.y == self.top_left.y {
            Some(self.top_left.y)
        } else {
            None
        };
        if let Some(y) = horizontal {
            let lo = self.top_left.x.max(other.top_left.x);
            let hi = a.x.min(b.x);
            if lo <= hi {
                return Some((Position::new(lo, y), Position::new(hi, y)));
            }
        }
        None
    }

    /// Midpoint of the shared wall, if it is long enough to hold a door between
    /// two floor tiles.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercrawl::{Position, Room, RoomType};
    ///
    /// let west = Room::new(0, Position::new(0, 0), 7, 7, RoomType::EntryHub);
    /// let east = Room::new(1, Position::new(6, 1), 10, 5, RoomType::Corridor);
    /// assert_eq!(west.door_position(&east), Some(Position::new(6, 3)));
    /// ```
    pub fn door_position(&self, other: &Room) -> Option<Position> {
        let (start, end) = self.shared_border(other)?;
        let span = (end.x - start.x) + (end.y - start.y);
        if span < 2 {
            return None;
        }
        Some(Position::new((start.x + end.x) / 2, (start.y + end.y) / 2))
    }

    /// Gets all floor positions within this room.
    pub fn floor_positions(&self) -> Vec<Position> {
        let bottom_right = self.bottom_right();
        let mut positions = Vec::new();
        for y in (self.top_left.y + 1)..bottom_right.y {
            for x in (self.top_left.x + 1)..bottom_right.x {
                positions.push(Position::new(x, y));
            }
        }
        positions
    }

    /// Adds a connection to another room.
    pub fn add_connection(&mut self, room_id: u32) {
        if !self.connections.contains(&room_id) {
            self.connections.push(room_id);
        }
    }
}

/// Trait for procedural generators.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> UndercrawlResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> UndercrawlResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}
