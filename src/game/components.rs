//! # Components
//!
//! Capability components attached to entities: combat stats, status effects,
//! inventories and equipment slots, plus the per-kind payloads of actors, items
//! and props.

use crate::game::{Ai, Color, Dialogue, EntityId, Interactable};
use crate::{UndercrawlError, UndercrawlResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Transient flags on a [`Fighter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatusEffect {
    Confused,
    Stunned,
    Frozen,
    Invisible,
}

impl fmt::Display for StatusEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StatusEffect::Confused => "confused",
            StatusEffect::Stunned => "stunned",
            StatusEffect::Frozen => "frozen",
            StatusEffect::Invisible => "invisible",
        };
        f.write_str(label)
    }
}

/// Additive stat modifiers granted by equipment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBonus {
    pub hp: i32,
    pub power: i32,
    pub defense: i32,
    pub magic: i32,
}

impl StatBonus {
    pub fn power(power: i32) -> Self {
        Self { power, ..Self::default() }
    }

    pub fn defense(defense: i32) -> Self {
        Self { defense, ..Self::default() }
    }

    pub fn hp(hp: i32) -> Self {
        Self { hp, ..Self::default() }
    }

    pub fn magic(magic: i32) -> Self {
        Self { magic, ..Self::default() }
    }
}

impl std::ops::Add for StatBonus {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            hp: self.hp + other.hp,
            power: self.power + other.power,
            defense: self.defense + other.defense,
            magic: self.magic + other.magic,
        }
    }
}

/// Combat stats of an actor.
///
/// `hp` is private so every write goes through the clamp into `[0, max_hp]`.
///
/// # Examples
///
/// ```
/// use undercrawl::Fighter;
///
/// let mut fighter = Fighter::new(10, 0, 5, 0);
/// fighter.take_damage(25);
/// assert_eq!(fighter.hp(), 0);
/// assert!(!fighter.is_alive());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fighter {
    pub base_max_hp: i32,
    hp: i32,
    pub base_defense: i32,
    pub base_power: i32,
    pub base_magic: i32,
    /// Sum of the bonuses of equipped items
    pub bonus: StatBonus,
    pub status: BTreeSet<StatusEffect>,
}

impl Fighter {
    /// Creates a fighter at full health.
    pub fn new(hp: i32, defense: i32, power: i32, magic: i32) -> Self {
        let hp = hp.max(1);
        Self {
            base_max_hp: hp,
            hp,
            base_defense: defense,
            base_power: power,
            base_magic: magic,
            bonus: StatBonus::default(),
            status: BTreeSet::new(),
        }
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn max_hp(&self) -> i32 {
        (self.base_max_hp + self.bonus.hp).max(1)
    }

    pub fn power(&self) -> i32 {
        self.base_power + self.bonus.power
    }

    pub fn defense(&self) -> i32 {
        self.base_defense + self.bonus.defense
    }

    pub fn magic(&self) -> i32 {
        self.base_magic + self.bonus.magic
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Writes hp clamped into `[0, max_hp]`.
    pub fn set_hp(&mut self, value: i32) {
        self.hp = value.clamp(0, self.max_hp());
    }

    /// Subtracts damage and returns how much hp was actually lost.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.set_hp(self.hp - amount.max(0));
        before - self.hp
    }

    /// Heals up to `amount` and returns the hp recovered.
    ///
    /// Returns 0 without touching anything when already at full health. The dead
    /// stay dead.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if !self.is_alive() || self.hp >= self.max_hp() || amount <= 0 {
            return 0;
        }
        let before = self.hp;
        self.set_hp(self.hp + amount);
        self.hp - before
    }

    /// Replaces the equipment bonus, clamping hp to the new maximum.
    pub fn set_bonus(&mut self, bonus: StatBonus) {
        self.bonus = bonus;
        self.set_hp(self.hp);
    }

    pub fn has_status(&self, status: StatusEffect) -> bool {
        self.status.contains(&status)
    }

    /// Adds a status; returns false if it was already present.
    pub fn add_status(&mut self, status: StatusEffect) -> bool {
        self.status.insert(status)
    }

    pub fn remove_status(&mut self, status: StatusEffect) -> bool {
        self.status.remove(&status)
    }

    pub fn has_any_status(&self) -> bool {
        !self.status.is_empty()
    }
}

/// Bounded, ordered list of carried items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub capacity: usize,
    items: Vec<EntityId>,
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[EntityId] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn contains(&self, item: EntityId) -> bool {
        self.items.contains(&item)
    }

    /// Appends an item, failing without changes when full.
    ///
    /// Prefer [`crate::EntityArena::place`], which keeps the item's container in
    /// sync; this is the raw list operation it uses.
    pub fn add(&mut self, item: EntityId) -> UndercrawlResult<()> {
        if self.is_full() {
            return Err(UndercrawlError::impossible("Your inventory is full."));
        }
        if !self.items.contains(&item) {
            self.items.push(item);
        }
        Ok(())
    }

    pub fn remove(&mut self, item: EntityId) -> bool {
        let before = self.items.len();
        self.items.retain(|&id| id != item);
        before != self.items.len()
    }
}

/// Equipment slot kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EquipSlot {
    Weapon,
    Armor,
    Amulet,
    Staff,
}

/// Mapping from slot to at most one equipped item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    slots: BTreeMap<EquipSlot, EntityId>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item_in(&self, slot: EquipSlot) -> Option<EntityId> {
        self.slots.get(&slot).copied()
    }

    /// Puts `item` in `slot`, returning the previous occupant.
    pub fn set(&mut self, slot: EquipSlot, item: EntityId) -> Option<EntityId> {
        self.slots.insert(slot, item)
    }

    pub fn clear(&mut self, slot: EquipSlot) -> Option<EntityId> {
        self.slots.remove(&slot)
    }

    pub fn slot_of(&self, item: EntityId) -> Option<EquipSlot> {
        self.slots
            .iter()
            .find(|(_, &id)| id == item)
            .map(|(&slot, _)| slot)
    }

    pub fn is_equipped(&self, item: EntityId) -> bool {
        self.slot_of(item).is_some()
    }

    pub fn equipped_items(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots.values().copied()
    }
}

/// Faction-like grouping used by taunts, pets and hostility spreading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorType {
    Player,
    Npc,
    Monster,
    Critter,
}

/// Payload of an actor entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub fighter: Fighter,
    pub inventory: Inventory,
    pub equipment: Equipment,
    /// Active behavior; `None` for the player and for corpses
    pub ai: Option<Ai>,
    /// Behavior restored by [`Actor::turn_friendly`]
    pub friendly_ai: Ai,
    /// Behavior installed by [`Actor::turn_hostile`]
    pub hostile_ai: Ai,
    pub hostile: bool,
    pub actor_type: ActorType,
    pub interactables: Vec<Interactable>,
    pub dialogue: Option<Dialogue>,
    /// Carried across floor transitions with the player
    pub companion: bool,
    pub blood: Color,
}

impl Actor {
    /// Creates a non-hostile actor running `friendly_ai`.
    pub fn new(fighter: Fighter, inventory_capacity: usize, actor_type: ActorType, friendly_ai: Ai, hostile_ai: Ai) -> Self {
        Self {
            fighter,
            inventory: Inventory::new(inventory_capacity),
            equipment: Equipment::new(),
            ai: Some(friendly_ai.clone()),
            friendly_ai,
            hostile_ai,
            hostile: false,
            actor_type,
            interactables: Vec::new(),
            dialogue: None,
            companion: false,
            blood: Color::RED,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.fighter.is_alive()
    }

    /// Switches to the hostile behavior.
    ///
    /// If a transient override is active, the hostile behavior becomes the one it
    /// restores to instead of cancelling it.
    pub fn turn_hostile(&mut self) {
        if !self.is_alive() {
            return;
        }
        self.hostile = true;
        let next = self.hostile_ai.clone();
        self.replace_base_ai(next);
    }

    /// Switches to the friendly behavior, respecting an active override.
    pub fn turn_friendly(&mut self) {
        if !self.is_alive() {
            return;
        }
        self.hostile = false;
        let next = self.friendly_ai.clone();
        self.replace_base_ai(next);
    }

    fn replace_base_ai(&mut self, next: Ai) {
        match self.ai.as_mut() {
            Some(current) if current.is_override() => current.set_previous(next),
            Some(_) => self.ai = Some(next),
            None => {}
        }
    }
}

/// Broad item categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Food,
    Scroll,
    Equipment,
    Throwable,
    Key,
    Egg,
}

/// Equipment data of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equippable {
    pub slot: EquipSlot,
    pub bonus: StatBonus,
    pub equipped: bool,
}

impl Equippable {
    pub fn new(slot: EquipSlot, bonus: StatBonus) -> Self {
        Self {
            slot,
            bonus,
            equipped: false,
        }
    }
}

/// Payload of an item entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub item_type: ItemType,
    /// Abilities specific to this item; pick up, drop, equip and unequip are
    /// derived from the item's state instead of being stored here
    pub interactables: Vec<Interactable>,
    pub equippable: Option<Equippable>,
}

impl Item {
    pub fn new(item_type: ItemType, interactables: Vec<Interactable>) -> Self {
        Self {
            item_type,
            interactables,
            equippable: None,
        }
    }

    pub fn equipment(slot: EquipSlot, bonus: StatBonus) -> Self {
        Self {
            item_type: ItemType::Equipment,
            interactables: Vec::new(),
            equippable: Some(Equippable::new(slot, bonus)),
        }
    }

    pub fn is_equipped(&self) -> bool {
        self.equippable.map(|e| e.equipped).unwrap_or(false)
    }
}

/// Payload of a static, interact-only entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    pub interactables: Vec<Interactable>,
}

impl Prop {
    pub fn new(interactables: Vec<Interactable>) -> Self {
        Self { interactables }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_heal_at_full_health_is_noop() {
        let mut fighter = Fighter::new(10, 0, 1, 0);
        let before = fighter.clone();
        assert_eq!(fighter.heal(5), 0);
        assert_eq!(fighter, before);
    }

    #[test]
    fn test_heal_reports_recovered_amount() {
        let mut fighter = Fighter::new(10, 0, 1, 0);
        fighter.take_damage(6);
        assert_eq!(fighter.heal(4), 4);
        assert_eq!(fighter.heal(4), 2);
        assert_eq!(fighter.hp(), 10);
    }

    #[test]
    fn test_bonus_changes_clamp_hp() {
        let mut fighter = Fighter::new(10, 0, 1, 0);
        fighter.set_bonus(StatBonus::hp(5));
        assert_eq!(fighter.max_hp(), 15);
        fighter.heal(5);
        assert_eq!(fighter.hp(), 15);

        fighter.set_bonus(StatBonus::default());
        assert_eq!(fighter.hp(), 10);
    }

    #[test]
    fn test_totals_include_bonus() {
        let mut fighter = Fighter::new(10, 1, 2, 1);
        fighter.set_bonus(StatBonus::power(1) + StatBonus::defense(2) + StatBonus::magic(3));
        assert_eq!(fighter.power(), 3);
        assert_eq!(fighter.defense(), 3);
        assert_eq!(fighter.magic(), 4);
    }

    #[test]
    fn test_status_membership_is_idempotent() {
        let mut fighter = Fighter::new(10, 0, 1, 0);
        assert!(fighter.add_status(StatusEffect::Confused));
        assert!(!fighter.add_status(StatusEffect::Confused));
        assert_eq!(fighter.status.len(), 1);
        assert!(fighter.add_status(StatusEffect::Invisible));
        assert!(fighter.remove_status(StatusEffect::Confused));
        assert!(!fighter.has_status(StatusEffect::Confused));
    }

    #[test]
    fn test_inventory_full_rejects_and_keeps_contents() {
        let mut inventory = Inventory::new(1);
        inventory.add(EntityId(1)).unwrap();

        let err = inventory.add(EntityId(2)).unwrap_err();
        assert!(err.is_impossible());
        assert_eq!(err.to_string(), "Your inventory is full.");
        assert_eq!(inventory.items(), &[EntityId(1)]);
    }

    #[test]
    fn test_equipment_slot_replacement() {
        let mut equipment = Equipment::new();
        assert_eq!(equipment.set(EquipSlot::Weapon, EntityId(3)), None);
        assert_eq!(equipment.set(EquipSlot::Weapon, EntityId(4)), Some(EntityId(3)));
        assert_eq!(equipment.item_in(EquipSlot::Weapon), Some(EntityId(4)));
        assert_eq!(equipment.slot_of(EntityId(4)), Some(EquipSlot::Weapon));
        assert!(!equipment.is_equipped(EntityId(3)));
    }

    #[test]
    fn test_turn_hostile_swaps_ai() {
        let mut actor = Actor::new(Fighter::new(5, 0, 1, 0), 0, ActorType::Monster, Ai::Idle, Ai::hostile_chase());
        actor.turn_hostile();
        assert!(actor.hostile);
        assert!(matches!(actor.ai, Some(Ai::HostileChase { .. })));

        actor.turn_friendly();
        assert!(!actor.hostile);
        assert_eq!(actor.ai, Some(Ai::Idle));
    }

    #[test]
    fn test_turn_hostile_under_override_changes_restore_target() {
        let mut actor = Actor::new(Fighter::new(5, 0, 1, 0), 0, ActorType::Monster, Ai::Idle, Ai::hostile_chase());
        actor.ai = Some(Ai::Stunned {
            previous: Box::new(Ai::Idle),
            turns_remaining: 2,
        });
        actor.turn_hostile();
        match &actor.ai {
            Some(Ai::Stunned { previous, .. }) => {
                assert!(matches!(**previous, Ai::HostileChase { .. }))
            }
            other => panic!("override should stay active, got {:?}", other),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_hp_stays_clamped(
            max_hp in 1i32..200,
            ops in prop::collection::vec((any::<bool>(), -50i32..300), 0..40),
        ) {
            let mut fighter = Fighter::new(max_hp, 0, 1, 0);
            for (is_heal, amount) in ops {
                if is_heal {
                    fighter.heal(amount);
                } else {
                    fighter.take_damage(amount);
                }
                prop_assert!(fighter.hp() >= 0);
                prop_assert!(fighter.hp() <= fighter.max_hp());
            }
        }
    }
}
