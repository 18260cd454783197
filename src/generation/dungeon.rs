//! # Dungeon Generation
//!
//! Hub-and-satellite floor layouts.
//!
//! A floor starts as two square hubs, west and east, joined by a corridor room.
//! Satellites then grow off the nearest existing room into the north and south
//! bands. Neighbors share a wall line and connect through a door at the middle of
//! the shared segment, so the room graph is a tree plus a few extra doors.

use crate::config::SURFACE_FLOOR;
use crate::game::{GameMap, Position, Tile, TileKind};
use crate::generation::{GenerationConfig, Generator, Room, RoomType};
use crate::{UndercrawlError, UndercrawlResult};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::{HashSet, VecDeque};

/// A generated floor before anything is placed on it.
#[derive(Debug, Clone)]
pub struct FloorLayout {
    pub map: GameMap,
    pub rooms: Vec<Room>,
    pub doors: Vec<Position>,
    pub depth: i32,
    entry: Position,
    exit: Position,
}

impl FloorLayout {
    /// Center of the entry hub; where the player arrives from above.
    pub fn entry_point(&self) -> Position {
        self.entry
    }

    /// Center of the exit hub; where the player arrives from below.
    pub fn exit_point(&self) -> Position {
        self.exit
    }

    pub fn rooms_of(&self, room_type: RoomType) -> impl Iterator<Item = &Room> {
        self.rooms.iter().filter(move |r| r.room_type == room_type)
    }

    /// Room whose floor holds `pos`.
    pub fn room_at(&self, pos: Position) -> Option<&Room> {
        self.rooms.iter().find(|r| r.contains_floor(pos))
    }
}

/// Builds [`FloorLayout`]s.
#[derive(Debug, Clone)]
pub struct DungeonGenerator {
    /// Whether layouts with unreachable tiles are rejected and retried
    pub ensure_connectivity: bool,
}

impl DungeonGenerator {
    /// Creates a new dungeon generator with default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercrawl::{DungeonGenerator, GenerationConfig, Generator};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let config = GenerationConfig::new(3);
    /// let mut rng = StdRng::seed_from_u64(config.seed);
    /// let layout = DungeonGenerator::new().generate(&config, &mut rng).unwrap();
    /// assert!(layout.map.is_walkable(layout.entry_point()));
    /// ```
    pub fn new() -> Self {
        Self {
            ensure_connectivity: true,
        }
    }

    fn place_hubs(&self, config: &GenerationConfig) -> Vec<Room> {
        let hub = config.hub_size;
        let middle = config.height / 2;
        let hub_top = middle - hub / 2;

        let mut entry = Room::new(0, Position::new(1, hub_top), hub, hub, RoomType::EntryHub);
        let mut exit = Room::new(
            1,
            Position::new(config.width - 1 - hub, hub_top),
            hub,
            hub,
            RoomType::ExitHub,
        );
        let left = entry.bottom_right().x;
        let mut corridor = Room::new(
            2,
            Position::new(left, middle - config.corridor_height / 2),
            exit.top_left.x - left + 1,
            config.corridor_height,
            RoomType::Corridor,
        );

        entry.add_connection(corridor.id);
        exit.add_connection(corridor.id);
        corridor.add_connection(entry.id);
        corridor.add_connection(exit.id);
        vec![entry, exit, corridor]
    }

    fn grow_satellites(&self, rooms: &mut Vec<Room>, config: &GenerationConfig, rng: &mut StdRng) {
        for _ in 0..config.growth_attempts {
            if rooms.len() >= config.max_rooms {
                break;
            }
            let width = rng.gen_range(config.min_room_size..=config.max_room_size);
            let height = rng.gen_range(config.min_room_size..=config.max_room_size);
            let seed = Position::new(rng.gen_range(0..config.width), rng.gen_range(0..config.height));

            let Some(parent) = rooms
                .iter()
                .min_by_key(|r| r.center().distance_squared(seed))
                .cloned()
            else {
                continue;
            };
            let Some(mut candidate) = self.attach(&parent, seed, width, height, config, rooms.len() as u32) else {
                continue;
            };
            if rooms.iter().any(|r| r.intrudes(&candidate)) || candidate.door_position(&parent).is_none() {
                continue;
            }

            candidate.add_connection(parent.id);
            if let Some(p) = rooms.iter_mut().find(|r| r.id == parent.id) {
                p.add_connection(candidate.id);
            }
            rooms.push(candidate);
        }
    }

    /// Shapes a satellite that shares the north or south wall of `parent`,
    /// clipped to the map. Returns `None` if clipping leaves it too small.
    fn attach(
        &self,
        parent: &Room,
        seed: Position,
        width: i32,
        height: i32,
        config: &GenerationConfig,
        id: u32,
    ) -> Option<Room> {
        let (top, bottom) = if seed.y < parent.center().y {
            let bottom = parent.top_left.y;
            (bottom - height + 1, bottom)
        } else {
            let top = parent.bottom_right().y;
            (top, top + height - 1)
        };
        let left = seed.x - width / 2;
        let right = left + width - 1;

        let (left, right) = (left.max(0), right.min(config.width - 1));
        let (top, bottom) = (top.max(0), bottom.min(config.height - 1));
        let (width, height) = (right - left + 1, bottom - top + 1);
        if width < config.min_room_size || height < config.min_room_size {
            return None;
        }
        Some(Room::new(id, Position::new(left, top), width, height, RoomType::Satellite))
    }

    fn place_doors(&self, rooms: &mut [Room], config: &GenerationConfig, rng: &mut StdRng) -> Vec<Position> {
        let mut doors = Vec::new();
        for i in 0..rooms.len() {
            for j in (i + 1)..rooms.len() {
                let Some(door) = rooms[i].door_position(&rooms[j]) else {
                    continue;
                };
                let linked = rooms[i].connections.contains(&rooms[j].id);
                if !linked {
                    if !rng.gen_bool(config.extra_door_chance.clamp(0.0, 1.0)) {
                        continue;
                    }
                    let (a, b) = (rooms[i].id, rooms[j].id);
                    rooms[i].add_connection(b);
                    rooms[j].add_connection(a);
                }
                doors.push(door);
            }
        }
        doors
    }

    fn build(&self, config: &GenerationConfig, rng: &mut StdRng) -> FloorLayout {
        let mut rooms = self.place_hubs(config);
        self.grow_satellites(&mut rooms, config, rng);

        let mut map = GameMap::new(config.width, config.height);
        for room in &rooms {
            map.carve(
                room.top_left + Position::new(1, 1),
                room.bottom_right() - Position::new(1, 1),
            );
        }
        let doors = self.place_doors(&mut rooms, config, rng);
        for &door in &doors {
            map.set_tile(door, Tile::door());
        }

        let entry = rooms[0].center();
        let exit = rooms[1].center();
        if config.depth < SURFACE_FLOOR {
            map.set_tile(entry, Tile::new(TileKind::UpStairs));
            map.upstairs = Some(entry);
        }
        if config.depth > config.final_depth {
            map.set_tile(exit, Tile::new(TileKind::DownStairs));
            map.downstairs = Some(exit);
        }

        FloorLayout {
            map,
            rooms,
            doors,
            depth: config.depth,
            entry,
            exit,
        }
    }
}

impl Default for DungeonGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Tiles reachable from `start` by 8-directional steps over walkable tiles.
pub fn flood_fill(map: &GameMap, start: Position) -> HashSet<Position> {
    let mut visited = HashSet::new();
    if !map.is_walkable(start) {
        return visited;
    }
    let mut queue = VecDeque::from([start]);
    visited.insert(start);
    while let Some(pos) = queue.pop_front() {
        for next in pos.adjacent_positions() {
            if map.is_walkable(next) && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    visited
}

impl Generator<FloorLayout> for DungeonGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> UndercrawlResult<FloorLayout> {
        config.check()?;
        for attempt in 1..=config.max_generation_attempts.max(1) {
            let layout = self.build(config, rng);
            match self.validate(&layout, config) {
                Ok(()) => {
                    log::debug!(
                        "Generated floor {} with {} rooms and {} doors (attempt {})",
                        config.depth,
                        layout.rooms.len(),
                        layout.doors.len(),
                        attempt
                    );
                    return Ok(layout);
                }
                Err(err) => log::debug!("Floor {} attempt {} rejected: {}", config.depth, attempt, err),
            }
        }
        Err(UndercrawlError::GenerationFailed(format!(
            "No connected layout for floor {} after {} attempts",
            config.depth, config.max_generation_attempts
        )))
    }

    fn validate(&self, layout: &FloorLayout, _config: &GenerationConfig) -> UndercrawlResult<()> {
        if !layout.map.is_walkable(layout.entry) || !layout.map.is_walkable(layout.exit) {
            return Err(UndercrawlError::GenerationFailed(
                "Hub centers must be walkable".to_string(),
            ));
        }
        if !self.ensure_connectivity {
            return Ok(());
        }
        let reachable = flood_fill(&layout.map, layout.entry);
        if !reachable.contains(&layout.exit) {
            return Err(UndercrawlError::GenerationFailed(
                "Exit hub is not reachable from the entry hub".to_string(),
            ));
        }
        let walkable = layout.map.walkable_count();
        if reachable.len() != walkable {
            return Err(UndercrawlError::GenerationFailed(format!(
                "{} of {} walkable tiles are unreachable",
                walkable - reachable.len(),
                walkable
            )));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "DungeonGenerator"
    }
}
