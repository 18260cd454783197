//! # World
//!
//! The current floor paired with the entity arena.
//!
//! `World` answers spatial and relational questions ("who blocks this tile",
//! "what can this entity do to that one") without mutating anything beyond the
//! field of view, so AI planning can borrow it immutably while the session keeps
//! the random number generator in a separate field.

use crate::game::{Container, Entity, EntityArena, EntityId, GameMap, Interactable, Position, StatusEffect};
use crate::utils::CostField;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Map, entities and the player handle of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub map: GameMap,
    pub entities: EntityArena,
    pub player: EntityId,
    /// Current depth; 0 is the surface and deeper floors are negative
    pub floor: i32,
}

impl World {
    pub fn new(map: GameMap, entities: EntityArena, player: EntityId, floor: i32) -> Self {
        Self {
            map,
            entities,
            player,
            floor,
        }
    }

    /// The player's id if the player entity still exists.
    pub fn player_id(&self) -> Option<EntityId> {
        self.entities.contains(self.player).then_some(self.player)
    }

    pub fn player_entity(&self) -> Option<&Entity> {
        self.entities.get(self.player)
    }

    pub fn player_position(&self) -> Option<Position> {
        self.player_entity().map(|e| e.position)
    }

    /// Recomputes the player's field of view.
    pub fn update_fov(&mut self, radius: i32) {
        match self.player_position() {
            Some(origin) => self.map.compute_fov(origin, radius),
            None => self.map.clear_visible(),
        }
    }

    /// Whether an actor standing on `pos` can currently see a visible player.
    ///
    /// Sight is symmetric, so this is the player's field of view at `pos`.
    pub fn player_in_sight_of(&self, pos: Position) -> bool {
        self.map.is_visible(pos) && !self.has_status(self.player, StatusEffect::Invisible)
    }

    pub fn has_status(&self, id: EntityId, status: StatusEffect) -> bool {
        self.entities
            .actor(id)
            .map(|a| a.fighter.has_status(status))
            .unwrap_or(false)
    }

    /// First movement-blocking entity on a tile.
    pub fn get_blocking_entity_at(&self, pos: Position) -> Option<EntityId> {
        self.entities
            .on_map()
            .find(|e| e.blocks_movement && e.position == pos)
            .map(|e| e.id)
    }

    /// Living actor on a tile.
    pub fn get_actor_at(&self, pos: Position) -> Option<EntityId> {
        self.entities
            .on_map()
            .find(|e| e.position == pos && e.is_alive_actor())
            .map(|e| e.id)
    }

    /// Items lying on a tile, in arena order.
    pub fn items_at(&self, pos: Position) -> Vec<EntityId> {
        self.entities
            .on_map()
            .filter(|e| e.position == pos && e.item().is_some())
            .map(|e| e.id)
            .collect()
    }

    /// Every entity lying on a tile.
    pub fn entities_at(&self, pos: Position) -> Vec<EntityId> {
        self.entities
            .on_map()
            .filter(|e| e.position == pos)
            .map(|e| e.id)
            .collect()
    }

    /// Actors on the current floor, corpses included.
    pub fn actors(&self) -> impl Iterator<Item = &Entity> {
        self.entities.on_map().filter(|e| e.actor().is_some())
    }

    /// Items lying on the current floor.
    pub fn items(&self) -> impl Iterator<Item = &Entity> {
        self.entities.on_map().filter(|e| e.item().is_some())
    }

    /// Nearest entity on a visible tile within `range` of `from` matching `filter`.
    ///
    /// Ties are broken by id so the answer is stable.
    pub fn closest_visible_entity<F>(&self, from: Position, range: i32, filter: F) -> Option<EntityId>
    where
        F: Fn(&Entity) -> bool,
    {
        self.entities
            .on_map()
            .filter(|e| self.map.is_visible(e.position) && e.position.chebyshev_distance(from) <= range)
            .filter(|e| filter(e))
            .min_by_key(|e| (e.position.distance_squared(from), e.id))
            .map(|e| e.id)
    }

    /// Ids of living actors on the current floor, in arena order.
    pub fn living_actors(&self) -> Vec<EntityId> {
        self.entities
            .on_map()
            .filter(|e| e.is_alive_actor())
            .map(|e| e.id)
            .collect()
    }

    /// Living actors within Chebyshev `radius` of `center`.
    pub fn actors_within(&self, center: Position, radius: i32) -> Vec<EntityId> {
        self.entities
            .on_map()
            .filter(|e| e.is_alive_actor() && e.position.chebyshev_distance(center) <= radius)
            .map(|e| e.id)
            .collect()
    }

    /// Whether `a` and `b` stand on opposite sides.
    pub fn is_hostile_to(&self, a: EntityId, b: EntityId) -> bool {
        match (self.entities.actor(a), self.entities.actor(b)) {
            (Some(first), Some(second)) => first.hostile != second.hostile,
            _ => false,
        }
    }

    /// A tile an entity can step onto.
    pub fn is_free(&self, pos: Position) -> bool {
        self.map.is_walkable(pos) && self.get_blocking_entity_at(pos).is_none()
    }

    /// Nearest free tile to `pos`, searching outward breadth-first over walkable tiles.
    pub fn free_tile_near(&self, pos: Position, max_distance: i32) -> Option<Position> {
        let mut queue = VecDeque::from([pos]);
        let mut seen: HashSet<Position> = HashSet::from([pos]);
        while let Some(current) = queue.pop_front() {
            if self.is_free(current) {
                return Some(current);
            }
            for next in current.adjacent_positions() {
                if next.chebyshev_distance(pos) <= max_distance
                    && self.map.is_walkable(next)
                    && seen.insert(next)
                {
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Path from `from` to `to`, excluding `from`. Empty when unreachable.
    pub fn path_to(&self, from: Position, to: Position) -> Vec<Position> {
        CostField::from_world(self).path(from, to)
    }

    /// Closest living actor within `range` matching `filter`.
    pub fn closest_actor<F>(&self, from: Position, range: i32, filter: F) -> Option<EntityId>
    where
        F: Fn(&Entity) -> bool,
    {
        self.closest_actor_any(from, range, |e| e.is_alive_actor() && filter(e))
    }

    /// Closest actor (living or dead) within `range` matching `filter`.
    pub fn closest_actor_any<F>(&self, from: Position, range: i32, filter: F) -> Option<EntityId>
    where
        F: Fn(&Entity) -> bool,
    {
        self.entities
            .on_map()
            .filter(|e| e.actor().is_some() && e.position.chebyshev_distance(from) <= range)
            .filter(|e| filter(e))
            .min_by_key(|e| (e.position.distance_squared(from), e.id))
            .map(|e| e.id)
    }

    /// Ids carried by `owner` and, recursively, by anything it carries.
    pub fn carried_by(&self, owner: EntityId) -> Vec<EntityId> {
        let mut found = Vec::new();
        let mut pending = vec![owner];
        while let Some(current) = pending.pop() {
            if let Some(actor) = self.entities.actor(current) {
                for &item in actor.inventory.items() {
                    found.push(item);
                    pending.push(item);
                }
            }
        }
        found
    }

    /// First item of a given type in an actor's inventory.
    pub fn find_in_inventory(&self, owner: EntityId, item_type: crate::game::ItemType) -> Option<EntityId> {
        let actor = self.entities.actor(owner)?;
        actor
            .inventory
            .items()
            .iter()
            .copied()
            .find(|&id| self.entities.item(id).map(|i| i.item_type) == Some(item_type))
    }

    /// Interactables `owner` offers to `activator` right now.
    ///
    /// Items additionally expose pick up, drop, equip and unequip depending on
    /// where they are and whether they are worn. Entries that fail their
    /// applicability check are left out.
    pub fn available_interactables(&self, owner: EntityId, activator: EntityId) -> Vec<Interactable> {
        let Some(entity) = self.entities.get(owner) else {
            return Vec::new();
        };
        let mut offered = Vec::new();
        if let Some(item) = entity.item() {
            match entity.container() {
                Container::Map => offered.push(Interactable::PickUp),
                Container::Inventory(holder) if holder == activator => offered.push(Interactable::Drop),
                Container::Inventory(_) => {}
            }
            if let Some(equippable) = item.equippable {
                offered.push(if equippable.equipped {
                    Interactable::Unequip
                } else {
                    Interactable::Equip
                });
            }
            offered.extend(item.interactables.iter().cloned());
        } else if let Some(actor) = entity.actor() {
            offered.extend(actor.interactables.iter().cloned());
        } else if let Some(prop) = entity.prop() {
            offered.extend(prop.interactables.iter().cloned());
        }
        offered.retain(|i| i.check_applicable(self, activator, owner));
        offered
    }

    /// Entities on the map within `range` of `activator` that offer it something.
    pub fn interactable_entities_near(&self, activator: EntityId, range: i32) -> Vec<EntityId> {
        let Some(center) = self.entities.get(activator).map(|e| e.position) else {
            return Vec::new();
        };
        self.entities
            .on_map()
            .filter(|e| e.id != activator && e.position.chebyshev_distance(center) <= range)
            .map(|e| e.id)
            .filter(|&id| !self.available_interactables(id, activator).is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::prototypes;

    fn small_world() -> World {
        let mut map = GameMap::new(12, 8);
        map.carve(Position::new(1, 1), Position::new(10, 6));
        let mut entities = EntityArena::new();
        let player = entities
            .spawn(prototypes::player(), Container::Map, Position::new(2, 2))
            .unwrap();
        World::new(map, entities, player, 0)
    }

    #[test]
    fn test_blocking_and_actor_queries() {
        let mut world = small_world();
        let rat = world
            .entities
            .spawn(prototypes::rat(), Container::Map, Position::new(4, 4))
            .unwrap();
        let food = world
            .entities
            .spawn(prototypes::food_ration(), Container::Map, Position::new(4, 4))
            .unwrap();

        assert_eq!(world.get_blocking_entity_at(Position::new(4, 4)), Some(rat));
        assert_eq!(world.get_actor_at(Position::new(4, 4)), Some(rat));
        assert_eq!(world.items_at(Position::new(4, 4)), vec![food]);
        assert!(!world.is_free(Position::new(4, 4)));
        assert!(world.is_free(Position::new(5, 4)));
        assert!(!world.is_free(Position::new(0, 0)));
    }

    #[test]
    fn test_closest_visible_entity() {
        let mut world = small_world();
        let player = world.player;
        let rat = world
            .entities
            .spawn(prototypes::rat(), Container::Map, Position::new(4, 4))
            .unwrap();
        let food = world
            .entities
            .spawn(prototypes::food_ration(), Container::Map, Position::new(3, 3))
            .unwrap();
        let from = Position::new(2, 2);
        assert_eq!(world.closest_visible_entity(from, 8, |e| e.id != player), None);

        world.update_fov(8);
        assert_eq!(world.closest_visible_entity(from, 8, |e| e.id != player), Some(food));
        assert_eq!(
            world.closest_visible_entity(from, 8, |e| e.id != player && e.actor().is_some()),
            Some(rat)
        );
        assert_eq!(world.closest_visible_entity(from, 1, |e| e.id == rat), None);
        assert_eq!(world.actors().count(), 2);
        assert_eq!(world.items().count(), 1);
    }

    #[test]
    fn test_free_tile_near_skips_blockers() {
        let mut world = small_world();
        world
            .entities
            .spawn(prototypes::rat(), Container::Map, Position::new(4, 4))
            .unwrap();
        let found = world.free_tile_near(Position::new(4, 4), 2).unwrap();
        assert_eq!(found.chebyshev_distance(Position::new(4, 4)), 1);
    }

    #[test]
    fn test_item_interactables_follow_location() {
        let mut world = small_world();
        let player = world.player;
        let sword = world
            .entities
            .spawn(prototypes::broken_sword(), Container::Map, Position::new(3, 2))
            .unwrap();

        let offered = world.available_interactables(sword, player);
        assert!(offered.contains(&Interactable::PickUp));
        assert!(offered.contains(&Interactable::Equip));
        assert!(!offered.contains(&Interactable::Drop));

        world
            .entities
            .place(sword, Container::Inventory(player), Position::new(2, 2))
            .unwrap();
        let offered = world.available_interactables(sword, player);
        assert!(offered.contains(&Interactable::Drop));
        assert!(!offered.contains(&Interactable::PickUp));
    }

    #[test]
    fn test_out_of_reach_item_offers_nothing() {
        let mut world = small_world();
        let player = world.player;
        let food = world
            .entities
            .spawn(prototypes::food_ration(), Container::Map, Position::new(8, 5))
            .unwrap();
        assert!(world.available_interactables(food, player).is_empty());
    }

    #[test]
    fn test_hostility_is_relative() {
        let mut world = small_world();
        let player = world.player;
        let rat = world
            .entities
            .spawn(prototypes::rat(), Container::Map, Position::new(4, 4))
            .unwrap();
        assert!(!world.is_hostile_to(player, rat));
        world.entities.actor_mut(rat).unwrap().turn_hostile();
        assert!(world.is_hostile_to(player, rat));
        assert!(world.is_hostile_to(rat, player));
    }

    #[test]
    fn test_carried_by_collects_inventory() {
        let mut world = small_world();
        let player = world.player;
        let scroll = world
            .entities
            .spawn(prototypes::lightning_scroll(), Container::Inventory(player), Position::origin())
            .unwrap();
        assert_eq!(world.carried_by(player), vec![scroll]);
        assert_eq!(
            world.find_in_inventory(player, crate::game::ItemType::Scroll),
            Some(scroll)
        );
    }
}
