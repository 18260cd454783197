//! # Entities
//!
//! Actors, items and props stored in an arena and addressed by [`EntityId`].
//!
//! Every entity lives in exactly one container: the current floor's map or an
//! actor's inventory. The container is private to the entity and only
//! [`EntityArena::spawn`] and [`EntityArena::place`] change it, updating both the
//! entity and the owning inventory in the same call.

use crate::game::{Actor, Color, EntityId, Item, Position, Prop, StatBonus};
use crate::{UndercrawlError, UndercrawlResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where an entity currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Container {
    /// On the current floor at the entity's position
    Map,
    /// Carried by the actor with this id
    Inventory(EntityId),
}

/// Draw order; later variants are drawn on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RenderOrder {
    Corpse,
    Prop,
    Item,
    Actor,
}

/// Rendering metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    pub glyph: char,
    pub fg: Color,
    pub bg: Option<Color>,
    /// Optional sprite name for graphical front ends
    pub icon: Option<String>,
}

/// Capability payload of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Actor(Box<Actor>),
    Item(Item),
    Prop(Prop),
}

/// Anything that occupies the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub position: Position,
    container: Container,
    pub appearance: Appearance,
    pub blocks_movement: bool,
    pub render_order: RenderOrder,
    pub kind: EntityKind,
}

impl Entity {
    /// Builds an unplaced entity. Ids and containers are assigned by
    /// [`EntityArena::spawn`].
    pub fn new(name: impl Into<String>, glyph: char, fg: Color, kind: EntityKind) -> Self {
        let (blocks_movement, render_order) = match &kind {
            EntityKind::Actor(_) => (true, RenderOrder::Actor),
            EntityKind::Item(_) => (false, RenderOrder::Item),
            EntityKind::Prop(_) => (false, RenderOrder::Prop),
        };
        Self {
            id: EntityId(0),
            name: name.into(),
            description: String::new(),
            position: Position::origin(),
            container: Container::Map,
            appearance: Appearance {
                glyph,
                fg,
                bg: None,
                icon: None,
            },
            blocks_movement,
            render_order,
            kind,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.appearance.icon = Some(icon.into());
        self
    }

    pub fn container(&self) -> Container {
        self.container
    }

    pub fn is_on_map(&self) -> bool {
        self.container == Container::Map
    }

    pub fn actor(&self) -> Option<&Actor> {
        match &self.kind {
            EntityKind::Actor(actor) => Some(actor.as_ref()),
            _ => None,
        }
    }

    pub fn actor_mut(&mut self) -> Option<&mut Actor> {
        match &mut self.kind {
            EntityKind::Actor(actor) => Some(actor.as_mut()),
            _ => None,
        }
    }

    pub fn item(&self) -> Option<&Item> {
        match &self.kind {
            EntityKind::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn item_mut(&mut self) -> Option<&mut Item> {
        match &mut self.kind {
            EntityKind::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn prop(&self) -> Option<&Prop> {
        match &self.kind {
            EntityKind::Prop(prop) => Some(prop),
            _ => None,
        }
    }

    /// True for actors with hp left.
    pub fn is_alive_actor(&self) -> bool {
        self.actor().map(|a| a.is_alive()).unwrap_or(false)
    }
}

/// Owner of every entity in the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityArena {
    entities: BTreeMap<u32, Entity>,
    next_id: u32,
}

impl EntityArena {
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id.0)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id.0)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id.0)
    }

    pub fn actor(&self, id: EntityId) -> Option<&Actor> {
        self.get(id).and_then(Entity::actor)
    }

    pub fn actor_mut(&mut self, id: EntityId) -> Option<&mut Actor> {
        self.get_mut(id).and_then(Entity::actor_mut)
    }

    pub fn item(&self, id: EntityId) -> Option<&Item> {
        self.get(id).and_then(Entity::item)
    }

    pub fn item_mut(&mut self, id: EntityId) -> Option<&mut Item> {
        self.get_mut(id).and_then(Entity::item_mut)
    }

    /// Looks up an entity or reports a stale handle.
    pub fn require(&self, id: EntityId) -> UndercrawlResult<&Entity> {
        self.get(id)
            .ok_or_else(|| UndercrawlError::InvalidState(format!("Entity {} does not exist", id)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Snapshot of every id, safe to iterate while mutating the arena.
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.values().map(|e| e.id).collect()
    }

    /// Entities lying on the current floor.
    pub fn on_map(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(|e| e.is_on_map())
    }

    /// Assigns a fresh id to `entity` and places it.
    pub fn spawn(&mut self, mut entity: Entity, container: Container, position: Position) -> UndercrawlResult<EntityId> {
        if self.next_id == 0 {
            self.next_id = 1;
        }
        let id = EntityId(self.next_id);
        if let Container::Inventory(owner) = container {
            self.check_capacity(owner)?;
        }
        self.next_id += 1;
        entity.id = id;
        entity.container = Container::Map;
        entity.position = position;
        self.entities.insert(id.0, entity);
        self.place(id, container, position)?;
        Ok(id)
    }

    /// Moves an entity into `container`.
    ///
    /// Leaving an inventory also unequips the item from its former owner. Placing
    /// into a full inventory fails with `Impossible` and changes nothing.
    pub fn place(&mut self, id: EntityId, container: Container, position: Position) -> UndercrawlResult<()> {
        let old = self.require(id)?.container;
        if let Container::Inventory(owner) = container {
            if owner == id {
                return Err(UndercrawlError::InvalidState(format!(
                    "Entity {} cannot contain itself",
                    id
                )));
            }
            if old != container {
                self.check_capacity(owner)?;
            }
        }

        if old != container {
            if let Container::Inventory(previous_owner) = old {
                self.detach_from_owner(id, previous_owner);
            }
            if let Container::Inventory(owner) = container {
                if let Some(actor) = self.actor_mut(owner) {
                    actor.inventory.add(id)?;
                }
            }
        }

        let position = match container {
            Container::Map => position,
            Container::Inventory(owner) => self.get(owner).map(|o| o.position).unwrap_or(position),
        };
        if let Some(entity) = self.get_mut(id) {
            entity.container = container;
            entity.position = position;
        }
        Ok(())
    }

    /// Removes an entity from the arena and from whatever inventory held it.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        if let Some(Container::Inventory(owner)) = self.get(id).map(|e| e.container) {
            self.detach_from_owner(id, owner);
        }
        self.entities.remove(&id.0)
    }

    fn check_capacity(&self, owner: EntityId) -> UndercrawlResult<()> {
        let actor = self.actor(owner).ok_or_else(|| {
            UndercrawlError::InvalidState(format!("Entity {} has no inventory", owner))
        })?;
        if actor.inventory.is_full() {
            return Err(UndercrawlError::impossible("Your inventory is full."));
        }
        Ok(())
    }

    fn detach_from_owner(&mut self, item: EntityId, owner: EntityId) {
        let was_equipped = match self.actor_mut(owner) {
            Some(actor) => {
                actor.inventory.remove(item);
                match actor.equipment.slot_of(item) {
                    Some(slot) => {
                        actor.equipment.clear(slot);
                        true
                    }
                    None => false,
                }
            }
            None => false,
        };
        if was_equipped {
            if let Some(equippable) = self.item_mut(item).and_then(|i| i.equippable.as_mut()) {
                equippable.equipped = false;
            }
            self.refresh_bonus(owner);
        }
    }

    /// Recomputes an actor's equipment bonus from its equipped items.
    pub fn refresh_bonus(&mut self, owner: EntityId) {
        let bonus = match self.actor(owner) {
            Some(actor) => actor
                .equipment
                .equipped_items()
                .filter_map(|id| self.item(id).and_then(|i| i.equippable))
                .fold(StatBonus::default(), |acc, e| acc + e.bonus),
            None => return,
        };
        if let Some(actor) = self.actor_mut(owner) {
            actor.fighter.set_bonus(bonus);
        }
    }

    /// Moves an entity to a new tile on the map without changing its container.
    pub fn set_position(&mut self, id: EntityId, position: Position) {
        if let Some(entity) = self.get_mut(id) {
            entity.position = position;
        }
        let carried: Vec<EntityId> = self
            .actor(id)
            .map(|a| a.inventory.items().to_vec())
            .unwrap_or_default();
        for item in carried {
            if let Some(entity) = self.get_mut(item) {
                entity.position = position;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::prototypes;

    fn arena_with_player() -> (EntityArena, EntityId) {
        let mut arena = EntityArena::new();
        let player = arena
            .spawn(prototypes::player(), Container::Map, Position::new(2, 2))
            .unwrap();
        (arena, player)
    }

    #[test]
    fn test_spawn_assigns_unique_ids() {
        let (mut arena, player) = arena_with_player();
        let rat = arena
            .spawn(prototypes::rat(), Container::Map, Position::new(3, 3))
            .unwrap();
        assert_ne!(player, rat);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(rat).unwrap().position, Position::new(3, 3));
    }

    #[test]
    fn test_place_moves_between_containers() {
        let (mut arena, player) = arena_with_player();
        let food = arena
            .spawn(prototypes::food_ration(), Container::Map, Position::new(4, 4))
            .unwrap();

        arena.place(food, Container::Inventory(player), Position::new(4, 4)).unwrap();
        assert_eq!(arena.get(food).unwrap().container(), Container::Inventory(player));
        assert!(arena.actor(player).unwrap().inventory.contains(food));
        assert_eq!(arena.get(food).unwrap().position, Position::new(2, 2));

        arena.place(food, Container::Map, Position::new(2, 2)).unwrap();
        assert!(arena.get(food).unwrap().is_on_map());
        assert!(!arena.actor(player).unwrap().inventory.contains(food));
    }

    #[test]
    fn test_place_into_full_inventory_changes_nothing() {
        let mut arena = EntityArena::new();
        let old_man = arena
            .spawn(prototypes::old_man(), Container::Map, Position::new(1, 1))
            .unwrap();
        arena
            .spawn(prototypes::lightning_scroll(), Container::Inventory(old_man), Position::origin())
            .unwrap();
        assert!(arena.actor(old_man).unwrap().inventory.is_full());

        let food = arena
            .spawn(prototypes::food_ration(), Container::Map, Position::new(1, 2))
            .unwrap();
        let err = arena
            .place(food, Container::Inventory(old_man), Position::new(1, 2))
            .unwrap_err();
        assert!(err.is_impossible());
        assert!(arena.get(food).unwrap().is_on_map());
        assert_eq!(arena.get(food).unwrap().position, Position::new(1, 2));
    }

    #[test]
    fn test_leaving_inventory_unequips() {
        let (mut arena, player) = arena_with_player();
        let sword = arena
            .spawn(prototypes::broken_sword(), Container::Inventory(player), Position::origin())
            .unwrap();
        {
            let actor = arena.actor_mut(player).unwrap();
            actor.equipment.set(crate::EquipSlot::Weapon, sword);
        }
        arena.item_mut(sword).unwrap().equippable.as_mut().unwrap().equipped = true;
        arena.refresh_bonus(player);
        assert_eq!(arena.actor(player).unwrap().fighter.power(), 2);

        arena.place(sword, Container::Map, Position::new(2, 2)).unwrap();
        assert_eq!(arena.actor(player).unwrap().fighter.power(), 1);
        assert!(!arena.item(sword).unwrap().is_equipped());
    }

    #[test]
    fn test_remove_detaches_from_inventory() {
        let (mut arena, player) = arena_with_player();
        let scroll = arena
            .spawn(prototypes::lightning_scroll(), Container::Inventory(player), Position::origin())
            .unwrap();
        assert!(arena.remove(scroll).is_some());
        assert!(arena.actor(player).unwrap().inventory.is_empty());
        assert!(arena.remove(scroll).is_none());
    }
}
