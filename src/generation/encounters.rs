//! # Encounter Generation
//!
//! Weighted spawn tables and floor population.
//!
//! Tables are picked by depth band. Besides the random rolls, some floors carry
//! fixed content: the old man and the egg on the surface, a staircase prop on
//! each staircase tile, an equipment tier on each of the first floors down, the
//! key on its floor and the sealed gate on the last one.
//!
//! Floors are regenerated on every visit, so the one-off pieces (the surface
//! guide, the key and the equipment tiers) are tracked in [`FixedContent`] and
//! only placed the first time their floor is built.

use crate::config::SURFACE_FLOOR;
use crate::game::{prototypes, Container, Entity, Position, TileKind, World};
use crate::generation::{equipment_for_depth, item_table, FloorLayout, GenerationConfig, Room, RoomType};
use crate::UndercrawlResult;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Minimum distance between a freshly placed monster and the arrival point.
const SAFE_RADIUS: i32 = 4;

/// Coarse grouping of floors for spawn tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthBand {
    Surface,
    /// One to three floors down
    Shallow,
    Deep,
}

impl DepthBand {
    /// # Examples
    ///
    /// ```
    /// use undercrawl::DepthBand;
    ///
    /// assert_eq!(DepthBand::of(0), DepthBand::Surface);
    /// assert_eq!(DepthBand::of(-3), DepthBand::Shallow);
    /// assert_eq!(DepthBand::of(-4), DepthBand::Deep);
    /// ```
    pub fn of(depth: i32) -> Self {
        match depth {
            d if d >= SURFACE_FLOOR => DepthBand::Surface,
            -3..=-1 => DepthBand::Shallow,
            _ => DepthBand::Deep,
        }
    }
}

/// One-off content already placed during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedContent {
    /// Depths whose key and equipment tier have been handed out
    pub stocked_depths: BTreeSet<i32>,
    /// Whether the old man and the egg have been placed on the surface
    pub guide_placed: bool,
}

impl FixedContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stocked(&self, depth: i32) -> bool {
        self.stocked_depths.contains(&depth)
    }
}

/// One weighted row of a [`SpawnTable`].
#[derive(Debug, Clone, Copy)]
pub struct SpawnEntry {
    pub name: &'static str,
    factory: fn() -> Entity,
    pub weight: u32,
}

impl SpawnEntry {
    pub fn new(name: &'static str, factory: fn() -> Entity, weight: u32) -> Self {
        Self { name, factory, weight }
    }
}

/// Weighted choice over entity constructors.
#[derive(Debug, Clone)]
pub struct SpawnTable {
    entries: Vec<SpawnEntry>,
    weights: Option<WeightedIndex<u32>>,
}

impl SpawnTable {
    pub fn new(entries: Vec<SpawnEntry>) -> Self {
        let weights = WeightedIndex::new(entries.iter().map(|e| e.weight)).ok();
        Self { entries, weights }
    }

    /// A fresh entity drawn by weight; `None` for an empty or all-zero table.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Entity> {
        let index = self.weights.as_ref()?.sample(rng);
        self.entries.get(index).map(|entry| (entry.factory)())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.name)
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_none()
    }
}

/// Monsters and critters that roam rooms of the given band.
pub fn monster_table(band: DepthBand) -> SpawnTable {
    match band {
        DepthBand::Surface => SpawnTable::new(vec![
            SpawnEntry::new("rat", prototypes::rat, 4),
            SpawnEntry::new("shroom", prototypes::shroom, 2),
        ]),
        DepthBand::Shallow => SpawnTable::new(vec![
            SpawnEntry::new("rat", prototypes::rat, 3),
            SpawnEntry::new("shroom", prototypes::shroom, 2),
            SpawnEntry::new("walking skull", prototypes::walking_skull, 2),
            SpawnEntry::new("lost warrior", prototypes::lost_warrior, 2),
            SpawnEntry::new("cave orc", prototypes::cave_orc, 3),
            SpawnEntry::new("hungry", prototypes::hungry, 1),
        ]),
        DepthBand::Deep => SpawnTable::new(vec![
            SpawnEntry::new("cave orc", prototypes::cave_orc, 4),
            SpawnEntry::new("troll", prototypes::troll, 2),
            SpawnEntry::new("wizzo", prototypes::wizzo, 2),
            SpawnEntry::new("hungry", prototypes::hungry, 2),
            SpawnEntry::new("lost warrior", prototypes::lost_warrior, 1),
            SpawnEntry::new("walking skull", prototypes::walking_skull, 1),
        ]),
    }
}

/// Fills a freshly generated floor with its props, fixed content and random
/// rolls. The player must already stand on the map.
///
/// One-off content recorded in `fixed` is skipped, and whatever gets placed is
/// recorded there.
pub fn populate_floor<R: Rng + ?Sized>(
    world: &mut World,
    layout: &FloorLayout,
    config: &GenerationConfig,
    fixed: &mut FixedContent,
    rng: &mut R,
) -> UndercrawlResult<()> {
    let depth = layout.depth;
    let before = world.entities.len();

    if let Some(stairs) = world.map.downstairs {
        world.entities.spawn(prototypes::down_staircase(), Container::Map, stairs)?;
    }
    if let Some(stairs) = world.map.upstairs {
        world.entities.spawn(prototypes::up_staircase(), Container::Map, stairs)?;
    }
    if depth <= config.final_depth {
        world.entities.spawn(prototypes::sealed_gate(), Container::Map, layout.exit_point())?;
    }

    if depth == SURFACE_FLOOR && !fixed.guide_placed {
        place_surface_guide(world, layout)?;
        fixed.guide_placed = true;
    }

    if fixed.stocked_depths.insert(depth) {
        let side_rooms: Vec<&Room> = layout
            .rooms_of(RoomType::Satellite)
            .chain(layout.rooms_of(RoomType::Corridor))
            .collect();
        if depth == config.key_depth {
            place_in_rooms(world, &side_rooms, prototypes::rusty_key(), rng)?;
        }
        if let Some(tier) = equipment_for_depth(depth) {
            place_in_rooms(world, &side_rooms, tier, rng)?;
        }
    }

    let band = DepthBand::of(depth);
    let monsters = monster_table(band);
    let items = item_table(band);
    let arrivals = [layout.entry_point(), layout.exit_point()];
    for room in layout.rooms.iter().filter(|r| r.room_type != RoomType::EntryHub) {
        for _ in 0..rng.gen_range(0..=config.max_monsters_per_room) {
            let spot = open_spot(world, room, rng, |p| {
                arrivals.iter().all(|a| a.chebyshev_distance(p) > SAFE_RADIUS)
            });
            if let (Some(spot), Some(monster)) = (spot, monsters.roll(rng)) {
                world.entities.spawn(monster, Container::Map, spot)?;
            }
        }
        for _ in 0..rng.gen_range(0..=config.max_items_per_room) {
            if let (Some(spot), Some(item)) = (open_spot(world, room, rng, |_| true), items.roll(rng)) {
                world.entities.spawn(item, Container::Map, spot)?;
            }
        }
    }

    log::debug!(
        "Populated floor {} with {} entities",
        depth,
        world.entities.len() - before
    );
    Ok(())
}

fn place_surface_guide(world: &mut World, layout: &FloorLayout) -> UndercrawlResult<()> {
    let entry = layout.entry_point();
    if let Some(spot) = world.free_tile_near(entry + Position::new(2, -1), 2) {
        let old_man = world.entities.spawn(prototypes::old_man(), Container::Map, spot)?;
        world
            .entities
            .spawn(prototypes::lightning_scroll(), Container::Inventory(old_man), spot)?;
    }
    if let Some(spot) = world.free_tile_near(entry + Position::new(-1, 2), 2) {
        world.entities.spawn(prototypes::mystery_egg(), Container::Map, spot)?;
    }
    Ok(())
}

fn place_in_rooms<R: Rng + ?Sized>(
    world: &mut World,
    rooms: &[&Room],
    entity: Entity,
    rng: &mut R,
) -> UndercrawlResult<()> {
    let mut order: Vec<&Room> = rooms.to_vec();
    order.shuffle(rng);
    for room in order {
        if let Some(spot) = open_spot(world, room, rng, |_| true) {
            world.entities.spawn(entity, Container::Map, spot)?;
            return Ok(());
        }
    }
    log::warn!("No room left for {} on floor {}", entity.name, world.floor);
    Ok(())
}

/// A random plain floor tile of `room` with nothing on it.
fn open_spot<R, F>(world: &World, room: &Room, rng: &mut R, accept: F) -> Option<Position>
where
    R: Rng + ?Sized,
    F: Fn(Position) -> bool,
{
    let spots: Vec<Position> = room
        .floor_positions()
        .into_iter()
        .filter(|&p| world.map.tile(p).map(|t| t.kind == TileKind::Floor).unwrap_or(false))
        .filter(|&p| world.entities_at(p).is_empty() && accept(p))
        .collect();
    spots.choose(rng).copied()
}
