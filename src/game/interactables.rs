//! # Interactables
//!
//! Abilities an entity offers to whoever activates it: food and scrolls on items,
//! social moves on actors, and stairs or gates on props.
//!
//! Resolution follows one rule: every precondition is checked before anything
//! changes. A failed check returns `Impossible` and leaves the world untouched;
//! a successful one applies the effect and consumes a single-use item exactly
//! once.

use crate::game::{
    override_outcome, Ai, Container, DialogueTrigger, EntityId, GameEvent, GameState, ItemType,
    MessageTag, OverrideKind, OverrideOutcome, Position, StatusEffect, World,
};
use crate::{UndercrawlError, UndercrawlResult};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Reach of item abilities used from the floor and of most social moves.
const TOUCH_RANGE: i32 = 2;
/// Reach of talking and the other ranged social moves.
const TALK_RANGE: i32 = 5;
/// Reach of feeding.
const FEED_RANGE: i32 = 4;

/// One ability. Parameters are fixed when the owning prototype is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Interactable {
    // Inventory handling, derived from item state
    PickUp,
    Drop,
    Equip,
    Unequip,
    // Consumables
    Eat { amount: i32 },
    Hatch,
    Lightning { damage: i32, range: i32 },
    Fireball { damage: i32, radius: i32 },
    Confusion { turns: i32, radius: i32 },
    Freeze { turns: i32 },
    Teleport,
    Invisibility { turns: i32 },
    Throw { damage: i32 },
    // Social
    Talk,
    Feed { turns: i32, heal: i32 },
    Assault { cry: String },
    Scare { turns: i32 },
    Bite,
    Taunt { cry: String },
    Pet { cry: String },
    // Props
    Descend,
    Ascend,
    Open,
}

/// How an ability wants to be aimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Targeting {
    None,
    Tile,
    Area { radius: i32 },
}

/// What biting a shroom does to the biter, drawn from a percentile roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BiteEffect {
    Vanish,
    Daze,
    Sicken,
    Refresh,
}

impl BiteEffect {
    fn from_roll(roll: u32) -> Self {
        match roll {
            0..=9 => BiteEffect::Vanish,
            10..=34 => BiteEffect::Daze,
            35..=59 => BiteEffect::Sicken,
            _ => BiteEffect::Refresh,
        }
    }
}

/// Everything needed to resolve one activation.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionContext {
    pub activator: EntityId,
    pub owner: EntityId,
    pub interactable: Interactable,
    pub target: Option<Position>,
}

enum Family {
    ItemHandling,
    Consumable,
    Social,
    Prop,
}

impl Interactable {
    /// Menu label.
    pub fn name(&self) -> &'static str {
        match self {
            Interactable::PickUp => "Pick up",
            Interactable::Drop => "Drop",
            Interactable::Equip => "Equip",
            Interactable::Unequip => "Unequip",
            Interactable::Eat { .. } => "Eat",
            Interactable::Hatch => "Hatch",
            Interactable::Lightning { .. }
            | Interactable::Fireball { .. }
            | Interactable::Confusion { .. }
            | Interactable::Freeze { .. }
            | Interactable::Teleport
            | Interactable::Invisibility { .. } => "Read",
            Interactable::Throw { .. } => "Throw",
            Interactable::Talk => "Talk",
            Interactable::Feed { .. } => "Feed",
            Interactable::Assault { .. } => "Assault",
            Interactable::Scare { .. } => "Scare",
            Interactable::Bite => "Bite",
            Interactable::Taunt { .. } => "Taunt",
            Interactable::Pet { .. } => "Pet",
            Interactable::Descend => "Go down",
            Interactable::Ascend => "Go up",
            Interactable::Open => "Open",
        }
    }

    fn family(&self) -> Family {
        match self {
            Interactable::PickUp | Interactable::Drop | Interactable::Equip | Interactable::Unequip => {
                Family::ItemHandling
            }
            Interactable::Eat { .. }
            | Interactable::Hatch
            | Interactable::Lightning { .. }
            | Interactable::Fireball { .. }
            | Interactable::Confusion { .. }
            | Interactable::Freeze { .. }
            | Interactable::Teleport
            | Interactable::Invisibility { .. }
            | Interactable::Throw { .. } => Family::Consumable,
            Interactable::Talk
            | Interactable::Feed { .. }
            | Interactable::Assault { .. }
            | Interactable::Scare { .. }
            | Interactable::Bite
            | Interactable::Taunt { .. }
            | Interactable::Pet { .. } => Family::Social,
            Interactable::Descend | Interactable::Ascend | Interactable::Open => Family::Prop,
        }
    }

    /// Aiming mode given the activator's magic stat.
    ///
    /// Magic widens a confusion cloud. A fireball keeps its printed radius and
    /// grows its damage instead.
    pub fn targeting(&self, magic: i32) -> Targeting {
        match self {
            Interactable::Fireball { radius, .. } => Targeting::Area { radius: *radius },
            Interactable::Confusion { radius, .. } => Targeting::Area {
                radius: radius * magic.max(1),
            },
            Interactable::Freeze { .. } | Interactable::Teleport | Interactable::Throw { .. } => Targeting::Tile,
            _ => Targeting::None,
        }
    }

    /// Whether using this ends the activator's invisibility.
    pub fn breaks_invisibility(&self) -> bool {
        matches!(
            self,
            Interactable::Lightning { .. }
                | Interactable::Fireball { .. }
                | Interactable::Confusion { .. }
                | Interactable::Freeze { .. }
                | Interactable::Throw { .. }
                | Interactable::Talk
                | Interactable::Feed { .. }
                | Interactable::Assault { .. }
                | Interactable::Scare { .. }
                | Interactable::Taunt { .. }
                | Interactable::Pet { .. }
        )
    }

    /// Cheap availability check used to build menus.
    ///
    /// Passing this does not guarantee success; resolution may still fail with
    /// `Impossible` (a missing target, a full inventory, an unready egg).
    pub fn check_applicable(&self, world: &World, activator: EntityId, owner: EntityId) -> bool {
        let (Some(owner_entity), Some(activator_entity)) = (world.entities.get(owner), world.entities.get(activator))
        else {
            return false;
        };
        if owner == activator {
            return false;
        }
        let carried = owner_entity.container() == Container::Inventory(activator);
        let reach = |max: i32| {
            owner_entity.is_on_map() && owner_entity.position.chebyshev_distance(activator_entity.position) < max
        };

        match self.family() {
            Family::ItemHandling => {
                let Some(item) = owner_entity.item() else {
                    return false;
                };
                match self {
                    Interactable::PickUp => reach(TOUCH_RANGE),
                    Interactable::Drop => carried,
                    Interactable::Equip => {
                        item.equippable.map(|e| !e.equipped).unwrap_or(false) && (carried || reach(TOUCH_RANGE))
                    }
                    _ => item.is_equipped() && carried,
                }
            }
            Family::Consumable => owner_entity.item().is_some() && (carried || reach(TOUCH_RANGE)),
            Family::Social => {
                let Some(actor) = owner_entity.actor() else {
                    return false;
                };
                if !actor.is_alive() || actor.fighter.has_any_status() {
                    return false;
                }
                match self {
                    Interactable::Talk => !actor.hostile && actor.dialogue.is_some() && reach(TALK_RANGE),
                    Interactable::Feed { .. } => reach(FEED_RANGE),
                    _ => reach(TOUCH_RANGE),
                }
            }
            Family::Prop => owner_entity.prop().is_some() && reach(TOUCH_RANGE),
        }
    }
}

impl GameState {
    /// Applies a validated activation.
    ///
    /// Stale handles fail with `InvalidState`; a consumed item cannot be resolved twice.
    pub fn resolve_interaction(&mut self, context: &InteractionContext) -> UndercrawlResult<()> {
        let InteractionContext {
            activator,
            owner,
            ref interactable,
            target,
        } = *context;
        self.world.entities.require(owner)?;
        self.world.entities.require(activator)?;

        match interactable {
            Interactable::PickUp => self.pick_up(activator, owner)?,
            Interactable::Drop => self.drop_item(activator, owner)?,
            Interactable::Equip => self.equip(activator, owner)?,
            Interactable::Unequip => self.unequip(activator, owner)?,
            Interactable::Eat { amount } => self.eat(activator, owner, *amount)?,
            Interactable::Hatch => self.hatch(activator, owner)?,
            Interactable::Lightning { damage, range } => self.cast_lightning(activator, owner, *damage, *range)?,
            Interactable::Fireball { damage, radius } => {
                self.cast_fireball(activator, owner, target, *damage, *radius)?
            }
            Interactable::Confusion { turns, radius } => {
                self.cast_confusion(activator, owner, target, *turns, *radius)?
            }
            Interactable::Freeze { turns } => self.cast_freeze(activator, owner, target, *turns)?,
            Interactable::Teleport => self.cast_teleport(activator, owner, target)?,
            Interactable::Invisibility { turns } => self.cast_invisibility(activator, owner, *turns)?,
            Interactable::Throw { damage } => self.throw(activator, owner, target, *damage)?,
            Interactable::Talk => self.talk(activator, owner)?,
            Interactable::Feed { turns, heal } => self.feed(activator, owner, *turns, *heal)?,
            Interactable::Assault { cry } => self.assault(activator, owner, cry)?,
            Interactable::Scare { turns } => self.scare(owner, *turns)?,
            Interactable::Bite => self.bite(activator, owner)?,
            Interactable::Taunt { cry } => self.taunt(owner, cry)?,
            Interactable::Pet { cry } => self.pet(activator, owner, cry)?,
            Interactable::Descend => self.descend()?,
            Interactable::Ascend => self.ascend()?,
            Interactable::Open => self.open_gate(activator)?,
        }

        if matches!(interactable.family(), Family::Social) {
            self.record(GameEvent::Interaction {
                name: interactable.name().to_string(),
            });
        }
        if interactable.breaks_invisibility() && activator == self.world.player {
            self.reveal_player();
        }
        Ok(())
    }

    fn name_of(&self, id: EntityId) -> String {
        self.world.entities.get(id).map(|e| e.name.clone()).unwrap_or_default()
    }

    fn magic_of(&self, id: EntityId) -> i32 {
        self.world
            .entities
            .actor(id)
            .map(|a| a.fighter.magic().max(1))
            .unwrap_or(1)
    }

    /// Removes a used-up item from the world.
    fn consume(&mut self, item: EntityId) {
        if let Some(removed) = self.world.entities.remove(item) {
            if let Some(item_type) = removed.item().map(|i| i.item_type) {
                self.record(GameEvent::ItemConsumed { item_type });
            }
        }
    }

    /// Target tile of an aimed ability, which must be in view.
    fn visible_target(target: Option<Position>, world: &World) -> UndercrawlResult<Position> {
        let pos = target.ok_or_else(|| UndercrawlError::impossible("You must select a target."))?;
        if !world.map.is_visible(pos) {
            return Err(UndercrawlError::impossible(
                "You cannot target an area that you cannot see.",
            ));
        }
        Ok(pos)
    }

    fn pick_up(&mut self, activator: EntityId, item: EntityId) -> UndercrawlResult<()> {
        let position = self.world.entities.require(activator)?.position;
        self.world.entities.place(item, Container::Inventory(activator), position)?;
        let name = self.name_of(item);
        if activator == self.world.player {
            self.log(format!("You picked up the {}!", name), MessageTag::Info);
            self.record(GameEvent::ItemPickedUp);
        }
        Ok(())
    }

    fn drop_item(&mut self, activator: EntityId, item: EntityId) -> UndercrawlResult<()> {
        if self.world.entities.require(item)?.container() != Container::Inventory(activator) {
            return Err(UndercrawlError::impossible("You are not carrying that."));
        }
        let position = self.world.entities.require(activator)?.position;
        self.world.entities.place(item, Container::Map, position)?;
        let name = self.name_of(item);
        self.log(format!("You dropped the {}.", name), MessageTag::Info);
        Ok(())
    }

    fn equip(&mut self, activator: EntityId, item: EntityId) -> UndercrawlResult<()> {
        let slot = self
            .world
            .entities
            .item(item)
            .and_then(|i| i.equippable)
            .map(|e| e.slot)
            .ok_or_else(|| UndercrawlError::impossible("That cannot be equipped."))?;
        if self.world.entities.require(item)?.container() != Container::Inventory(activator) {
            let position = self.world.entities.require(activator)?.position;
            self.world.entities.place(item, Container::Inventory(activator), position)?;
        }

        let previous = self
            .world
            .entities
            .actor_mut(activator)
            .and_then(|a| a.equipment.set(slot, item));
        if let Some(previous) = previous.filter(|&p| p != item) {
            if let Some(equippable) = self.world.entities.item_mut(previous).and_then(|i| i.equippable.as_mut()) {
                equippable.equipped = false;
            }
            let removed = self.name_of(previous);
            self.log(format!("You remove the {}.", removed), MessageTag::Info);
        }
        if let Some(equippable) = self.world.entities.item_mut(item).and_then(|i| i.equippable.as_mut()) {
            equippable.equipped = true;
        }
        self.world.entities.refresh_bonus(activator);
        let name = self.name_of(item);
        self.log(format!("You equip the {}!", name), MessageTag::Info);
        Ok(())
    }

    fn unequip(&mut self, activator: EntityId, item: EntityId) -> UndercrawlResult<()> {
        if self.world.entities.require(item)?.container() != Container::Inventory(activator) {
            return Err(UndercrawlError::impossible(
                "How did you manage to unequip an object on the ground?",
            ));
        }
        if let Some(actor) = self.world.entities.actor_mut(activator) {
            if let Some(slot) = actor.equipment.slot_of(item) {
                actor.equipment.clear(slot);
            }
        }
        if let Some(equippable) = self.world.entities.item_mut(item).and_then(|i| i.equippable.as_mut()) {
            equippable.equipped = false;
        }
        self.world.entities.refresh_bonus(activator);
        let name = self.name_of(item);
        self.log(format!("You unequip the {}.", name), MessageTag::Info);
        Ok(())
    }

    fn eat(&mut self, activator: EntityId, item: EntityId, amount: i32) -> UndercrawlResult<()> {
        let recovered = self
            .world
            .entities
            .actor_mut(activator)
            .map(|a| a.fighter.heal(amount))
            .unwrap_or(0);
        if recovered == 0 {
            return Err(UndercrawlError::impossible("Your health is already full."));
        }
        let name = self.name_of(item);
        self.log(
            format!("You consume the {}, and recover {} HP!", name, recovered),
            MessageTag::HealthRecovered,
        );
        self.consume(item);
        Ok(())
    }

    fn hatch(&mut self, activator: EntityId, egg: EntityId) -> UndercrawlResult<()> {
        if self.world.floor > self.config.hatch_depth {
            return Err(UndercrawlError::impossible("It doesn't look ready to hatch yet."));
        }
        let near = self.world.entities.require(activator)?.position;
        let spot = self
            .world
            .free_tile_near(near, 3)
            .ok_or_else(|| UndercrawlError::impossible("There is no room for it to hatch here."))?;

        self.consume(egg);
        let mut frog = crate::game::prototypes::microfrog();
        if let Some(actor) = frog.actor_mut() {
            actor.friendly_ai = Ai::follower(Some(activator), 2);
            actor.ai = Some(actor.friendly_ai.clone());
        }
        self.world.entities.spawn(frog, Container::Map, spot)?;
        self.log("The egg hatched!! A tiny frog hops out and looks up at you.", MessageTag::Info);
        Ok(())
    }

    fn cast_lightning(&mut self, activator: EntityId, scroll: EntityId, damage: i32, range: i32) -> UndercrawlResult<()> {
        let origin = self.world.entities.require(activator)?.position;
        let world = &self.world;
        let target = world
            .closest_actor(origin, range, |e| {
                e.id != activator
                    && world.map.is_visible(e.position)
                    && e.actor().map(|a| !a.companion).unwrap_or(false)
            })
            .ok_or_else(|| UndercrawlError::impossible("No enemy is close enough to strike."))?;

        let total = damage * self.magic_of(activator);
        let name = self.name_of(target);
        self.log(
            format!(
                "A lightning bolt strikes the {} with a loud thunder, for {} damage!",
                name, total
            ),
            MessageTag::PlayerAttack,
        );
        self.consume(scroll);
        self.provoke(target);
        self.apply_damage(target, total, Some(activator));
        Ok(())
    }

    fn cast_fireball(
        &mut self,
        activator: EntityId,
        scroll: EntityId,
        target: Option<Position>,
        damage: i32,
        radius: i32,
    ) -> UndercrawlResult<()> {
        let center = Self::visible_target(target, &self.world)?;
        let victims = self.world.actors_within(center, radius);
        if victims.is_empty() {
            return Err(UndercrawlError::impossible("There are no targets in the radius."));
        }

        self.consume(scroll);
        let total = damage * self.magic_of(activator);
        for victim in victims {
            let name = self.name_of(victim);
            self.log(
                format!("The {} is engulfed in a fiery explosion, taking {} damage!", name, total),
                MessageTag::PlayerAttack,
            );
            if victim != activator {
                self.provoke(victim);
            }
            self.apply_damage(victim, total, Some(activator));
        }
        Ok(())
    }

    fn cast_confusion(
        &mut self,
        activator: EntityId,
        scroll: EntityId,
        target: Option<Position>,
        turns: i32,
        radius: i32,
    ) -> UndercrawlResult<()> {
        let center = Self::visible_target(target, &self.world)?;
        let radius = radius * self.magic_of(activator);
        let victims: Vec<EntityId> = self
            .world
            .actors_within(center, radius)
            .into_iter()
            .filter(|&id| id != activator)
            .filter(|&id| {
                self.world
                    .entities
                    .actor(id)
                    .map(|a| override_outcome(a, OverrideKind::Confused) != OverrideOutcome::Rejected)
                    .unwrap_or(false)
            })
            .collect();
        if victims.is_empty() {
            return Err(UndercrawlError::impossible("There are no valid targets in the radius."));
        }

        self.consume(scroll);
        for victim in victims {
            self.apply_override_to(victim, OverrideKind::Confused, turns);
            let name = self.name_of(victim);
            self.log(
                format!(
                    "The eyes of the {} look vacant, as it starts to stumble around!",
                    name
                ),
                MessageTag::StatusEffect,
            );
        }
        Ok(())
    }

    fn cast_freeze(&mut self, activator: EntityId, scroll: EntityId, target: Option<Position>, turns: i32) -> UndercrawlResult<()> {
        let pos = Self::visible_target(target, &self.world)?;
        let victim = self
            .world
            .get_actor_at(pos)
            .ok_or_else(|| UndercrawlError::impossible("You must select an enemy to target."))?;
        if victim == activator {
            return Err(UndercrawlError::impossible("You cannot freeze yourself!"));
        }
        let name = self.name_of(victim);
        let outcome = self
            .world
            .entities
            .actor(victim)
            .map(|a| override_outcome(a, OverrideKind::Frozen))
            .unwrap_or(OverrideOutcome::Rejected);
        if outcome == OverrideOutcome::Rejected {
            return Err(UndercrawlError::impossible(format!(
                "The {} is already under another effect.",
                name
            )));
        }

        self.consume(scroll);
        self.apply_override_to(victim, OverrideKind::Frozen, turns);
        self.log(format!("The {} is frozen solid!", name), MessageTag::StatusEffect);
        Ok(())
    }

    fn cast_teleport(&mut self, activator: EntityId, scroll: EntityId, target: Option<Position>) -> UndercrawlResult<()> {
        let pos = target.ok_or_else(|| UndercrawlError::impossible("You must select a destination."))?;
        if !self.world.map.is_explored(pos) || !self.world.is_free(pos) {
            return Err(UndercrawlError::impossible("You can't teleport there."));
        }
        self.consume(scroll);
        self.world.entities.set_position(activator, pos);
        self.log("You vanish and reappear elsewhere!", MessageTag::StatusEffect);
        Ok(())
    }

    fn cast_invisibility(&mut self, activator: EntityId, scroll: EntityId, turns: i32) -> UndercrawlResult<()> {
        let total = turns * self.magic_of(activator);
        self.consume(scroll);
        self.apply_status(activator, StatusEffect::Invisible, total);
        if activator == self.world.player {
            self.log("Your body fades from view!", MessageTag::StatusEffect);
        }
        Ok(())
    }

    fn throw(&mut self, activator: EntityId, item: EntityId, target: Option<Position>, damage: i32) -> UndercrawlResult<()> {
        let pos = Self::visible_target(target, &self.world)?;
        let victim = self
            .world
            .get_actor_at(pos)
            .ok_or_else(|| UndercrawlError::impossible("You must select an enemy to target."))?;
        if victim == activator {
            return Err(UndercrawlError::impossible("You cannot throw it at yourself!"));
        }

        let power = self.world.entities.actor(activator).map(|a| a.fighter.power()).unwrap_or(0);
        let defense = self.world.entities.actor(victim).map(|a| a.fighter.defense()).unwrap_or(0);
        let mut total = power - defense + damage;
        let item_name = self.name_of(item);
        let victim_name = self.name_of(victim);

        self.world.entities.place(item, Container::Map, pos)?;
        if self.world.has_status(victim, StatusEffect::Frozen) {
            total *= self.magic_of(activator) + 1;
            if let Some(actor) = self.world.entities.actor_mut(victim) {
                crate::game::clear_override(actor);
                actor.fighter.remove_status(StatusEffect::Frozen);
            }
            self.log(
                format!("The frozen {} shatters under the blow!", victim_name),
                MessageTag::PlayerAttack,
            );
        }

        self.provoke(victim);
        if total > 0 {
            self.log(
                format!("The {} hits the {} for {} damage!", item_name, victim_name, total),
                MessageTag::PlayerAttack,
            );
            self.apply_damage(victim, total, Some(activator));
        } else {
            self.log(
                format!("The {} bounces off the {}.", item_name, victim_name),
                MessageTag::PlayerAttack,
            );
        }
        Ok(())
    }

    fn talk(&mut self, activator: EntityId, speaker: EntityId) -> UndercrawlResult<()> {
        let line = self
            .world
            .entities
            .actor_mut(speaker)
            .and_then(|a| a.dialogue.as_mut())
            .and_then(|d| d.advance())
            .ok_or_else(|| UndercrawlError::impossible("They have nothing to say."))?;
        let name = self.name_of(speaker);
        self.log(format!("The {} says: {}", name, line.text), MessageTag::Dialogue);

        if line.trigger == Some(DialogueTrigger::DropGift) {
            let gift = self
                .world
                .entities
                .actor(speaker)
                .and_then(|a| a.inventory.items().first().copied());
            if let Some(gift) = gift {
                let at = self.world.entities.require(activator)?.position;
                self.world.entities.place(gift, Container::Map, at)?;
                let name = self.name_of(speaker);
                self.log(format!("The {} drops something at your feet.", name), MessageTag::Info);
            }
        }
        Ok(())
    }

    fn feed(&mut self, activator: EntityId, eater: EntityId, turns: i32, heal: i32) -> UndercrawlResult<()> {
        let food = self
            .world
            .find_in_inventory(activator, ItemType::Food)
            .ok_or_else(|| UndercrawlError::impossible("You have nothing to feed it."))?;
        let kind = OverrideKind::Feasting { heal };
        let outcome = self
            .world
            .entities
            .actor(eater)
            .map(|a| override_outcome(a, kind))
            .unwrap_or(OverrideOutcome::Rejected);
        if outcome == OverrideOutcome::Rejected {
            return Err(UndercrawlError::impossible("It is busy with something else."));
        }

        let food_name = self.name_of(food);
        let name = self.name_of(eater);
        self.consume(food);
        self.apply_override_to(eater, kind, turns);
        self.log(
            format!("The {} gobbles up the {} and sits down to digest.", name, food_name),
            MessageTag::Info,
        );
        Ok(())
    }

    fn assault(&mut self, activator: EntityId, victim: EntityId, cry: &str) -> UndercrawlResult<()> {
        let from = self.world.entities.require(activator)?.position;
        let to = self.world.entities.require(victim)?.position;
        self.perform(activator, &crate::game::Action::melee(to - from))?;
        if let Some(actor) = self.world.entities.actor_mut(victim) {
            actor.turn_hostile();
        }
        if self.world.entities.actor(victim).map(|a| a.is_alive()).unwrap_or(false) {
            let name = self.name_of(victim);
            self.log(format!("The {} says: {}", name, cry), MessageTag::Dialogue);
        }
        Ok(())
    }

    fn scare(&mut self, victim: EntityId, turns: i32) -> UndercrawlResult<()> {
        let name = self.name_of(victim);
        if self.apply_override_to(victim, OverrideKind::Stunned, turns) == OverrideOutcome::Rejected {
            return Err(UndercrawlError::impossible(format!(
                "The {} is too distracted to notice you.",
                name
            )));
        }
        self.log(
            format!("The {} was so spooked it froze in place!", name),
            MessageTag::StatusEffect,
        );
        Ok(())
    }

    /// Biting a mushroom is a gamble: a roll picks one of four outcomes.
    fn bite(&mut self, activator: EntityId, shroom: EntityId) -> UndercrawlResult<()> {
        if activator == self.world.player {
            self.reveal_player();
        }
        let name = self.name_of(shroom);
        self.log(format!("You bite the {}!", name), MessageTag::PlayerAttack);

        let effect = BiteEffect::from_roll(self.rng.gen_range(0..100));
        self.suffer_bite(activator, shroom, effect);

        if let Some(actor) = self.world.entities.actor_mut(shroom) {
            actor.turn_hostile();
        }
        self.apply_damage(shroom, 1, Some(activator));
        Ok(())
    }

    fn suffer_bite(&mut self, activator: EntityId, shroom: EntityId, effect: BiteEffect) {
        match effect {
            BiteEffect::Vanish => {
                self.apply_status(activator, StatusEffect::Invisible, 50);
                self.log("Your body fades from view!", MessageTag::StatusEffect);
            }
            BiteEffect::Daze => {
                self.apply_status(activator, StatusEffect::Confused, 10);
                self.log("Your vision swims...", MessageTag::StatusEffect);
            }
            BiteEffect::Sicken => {
                self.log("You feel sick...", MessageTag::EnemyAttack);
                self.apply_damage(activator, 2, Some(shroom));
            }
            BiteEffect::Refresh => {
                let recovered = self
                    .world
                    .entities
                    .actor_mut(activator)
                    .map(|a| a.fighter.heal(5))
                    .unwrap_or(0);
                self.log(
                    format!("You feel refreshed! You recover {} HP.", recovered),
                    MessageTag::HealthRecovered,
                );
            }
        }
    }

    fn taunt(&mut self, victim: EntityId, cry: &str) -> UndercrawlResult<()> {
        if let Some(actor) = self.world.entities.actor_mut(victim) {
            actor.actor_type = crate::game::ActorType::Critter;
            actor.turn_hostile();
        }
        let name = self.name_of(victim);
        self.log(format!("The {} says: {}", name, cry), MessageTag::Dialogue);
        Ok(())
    }

    fn pet(&mut self, activator: EntityId, pet: EntityId, cry: &str) -> UndercrawlResult<()> {
        let activator_type = self
            .world
            .entities
            .actor(activator)
            .map(|a| a.actor_type)
            .ok_or_else(|| UndercrawlError::InvalidState(format!("Entity {} is not an actor", activator)))?;
        if let Some(actor) = self.world.entities.actor_mut(pet) {
            actor.friendly_ai = Ai::follower(Some(activator), 2);
            actor.actor_type = activator_type;
            actor.companion = true;
            actor.turn_friendly();
        }
        let name = self.name_of(pet);
        self.log(format!("The {} says: {}", name, cry), MessageTag::Dialogue);
        Ok(())
    }

    fn open_gate(&mut self, activator: EntityId) -> UndercrawlResult<()> {
        let key = self
            .world
            .find_in_inventory(activator, ItemType::Key)
            .ok_or_else(|| UndercrawlError::impossible("You need a key to open this."))?;
        self.consume(key);
        self.log(
            "The gate grinds open and daylight pours in. You escaped the mountain!",
            MessageTag::Descend,
        );
        self.win();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{prototypes, EntityArena, GameMap};
    use crate::GameCompletionState;

    fn lab(player_at: Position) -> GameState {
        let mut map = GameMap::new(20, 12);
        map.carve(Position::new(1, 1), Position::new(18, 10));
        let mut entities = EntityArena::new();
        let player = entities
            .spawn(prototypes::player(), Container::Map, player_at)
            .unwrap();
        let mut state = GameState::from_world(World::new(map, entities, player, -1), 11);
        state.refresh_fov();
        state
    }

    fn give(state: &mut GameState, entity: crate::Entity) -> EntityId {
        let player = state.world.player;
        state
            .world
            .entities
            .spawn(entity, Container::Inventory(player), Position::origin())
            .unwrap()
    }

    fn put(state: &mut GameState, entity: crate::Entity, at: Position) -> EntityId {
        state.world.entities.spawn(entity, Container::Map, at).unwrap()
    }

    fn use_it(state: &mut GameState, owner: EntityId, interactable: Interactable, target: Option<Position>) -> UndercrawlResult<()> {
        let player = state.world.player;
        state.interact(player, owner, interactable, target)
    }

    #[test]
    fn test_eat_at_full_health_changes_nothing() {
        let mut state = lab(Position::new(5, 5));
        let food = give(&mut state, prototypes::food_ration());
        let err = use_it(&mut state, food, Interactable::Eat { amount: 4 }, None).unwrap_err();
        assert!(err.is_impossible());
        assert!(state.world.entities.contains(food));
    }

    #[test]
    fn test_eat_heals_and_consumes() {
        let mut state = lab(Position::new(5, 5));
        let player = state.world.player;
        state.world.entities.actor_mut(player).unwrap().fighter.take_damage(10);
        let food = give(&mut state, prototypes::food_ration());
        use_it(&mut state, food, Interactable::Eat { amount: 4 }, None).unwrap();
        assert_eq!(state.world.entities.actor(player).unwrap().fighter.hp(), 19);
        assert!(!state.world.entities.contains(food));
        assert!(state.message_log.contains("You consume the food ration, and recover 4 HP!"));

        let again = InteractionContext {
            activator: player,
            owner: food,
            interactable: Interactable::Eat { amount: 4 },
            target: None,
        };
        let err = state.resolve_interaction(&again).unwrap_err();
        assert!(matches!(err, UndercrawlError::InvalidState(_)));
    }

    #[test]
    fn test_lightning_without_targets_keeps_scroll() {
        let mut state = lab(Position::new(5, 5));
        let scroll = give(&mut state, prototypes::lightning_scroll());
        let err = use_it(&mut state, scroll, Interactable::Lightning { damage: 20, range: 5 }, None).unwrap_err();
        assert_eq!(err.to_string(), "No enemy is close enough to strike.");
        assert!(state.world.entities.contains(scroll));
    }

    #[test]
    fn test_lightning_hits_nearest_and_consumes() {
        let mut state = lab(Position::new(5, 5));
        let near = put(&mut state, prototypes::troll(), Position::new(7, 5));
        let far = put(&mut state, prototypes::troll(), Position::new(9, 5));
        let scroll = give(&mut state, prototypes::lightning_scroll());
        use_it(&mut state, scroll, Interactable::Lightning { damage: 10, range: 5 }, None).unwrap();

        assert!(!state.world.entities.contains(scroll));
        assert_eq!(state.world.entities.actor(near).unwrap().fighter.hp(), 6);
        assert_eq!(state.world.entities.actor(far).unwrap().fighter.hp(), 16);
        assert!(state.world.entities.actor(near).unwrap().hostile);
    }

    #[test]
    fn test_fireball_needs_visible_target_with_victims() {
        let mut state = lab(Position::new(5, 5));
        let scroll = give(&mut state, prototypes::fireball_scroll());
        let fireball = Interactable::Fireball { damage: 12, radius: 3 };

        let err = use_it(&mut state, scroll, fireball.clone(), None).unwrap_err();
        assert!(err.is_impossible());
        let err = use_it(&mut state, scroll, fireball.clone(), Some(Position::new(12, 5))).unwrap_err();
        assert_eq!(err.to_string(), "There are no targets in the radius.");
        assert!(state.world.entities.contains(scroll));

        let orc = put(&mut state, prototypes::cave_orc(), Position::new(12, 5));
        use_it(&mut state, scroll, fireball, Some(Position::new(11, 5))).unwrap();
        assert!(!state.world.entities.actor(orc).unwrap().is_alive());
        assert!(!state.world.entities.contains(scroll));
    }

    #[test]
    fn test_fireball_damage_scales_with_magic() {
        let mut state = lab(Position::new(5, 5));
        let player = state.world.player;
        state.world.entities.actor_mut(player).unwrap().fighter.base_magic = 2;
        let troll = put(&mut state, prototypes::troll(), Position::new(11, 5));
        let scroll = give(&mut state, prototypes::fireball_scroll());
        use_it(&mut state, scroll, Interactable::Fireball { damage: 12, radius: 3 }, Some(Position::new(11, 5))).unwrap();

        assert!(state.message_log.contains("The troll is engulfed in a fiery explosion, taking 24 damage!"));
        assert!(!state.world.entities.actor(troll).unwrap().is_alive());
    }

    #[test]
    fn test_fireball_radius_ignores_magic() {
        let fireball = Interactable::Fireball { damage: 12, radius: 3 };
        assert_eq!(fireball.targeting(3), Targeting::Area { radius: 3 });
        let confusion = Interactable::Confusion { turns: 10, radius: 2 };
        assert_eq!(confusion.targeting(3), Targeting::Area { radius: 6 });
    }

    #[test]
    fn test_confusion_scroll_overrides_ai() {
        let mut state = lab(Position::new(5, 5));
        let orc = put(&mut state, prototypes::cave_orc(), Position::new(8, 5));
        let scroll = give(&mut state, prototypes::confusion_scroll());
        use_it(
            &mut state,
            scroll,
            Interactable::Confusion { turns: 10, radius: 2 },
            Some(Position::new(8, 5)),
        )
        .unwrap();
        let actor = state.world.entities.actor(orc).unwrap();
        assert!(matches!(actor.ai, Some(Ai::Confused { turns_remaining: 10, .. })));
        assert!(actor.fighter.has_status(StatusEffect::Confused));
    }

    #[test]
    fn test_freeze_then_throw_shatters() {
        let mut state = lab(Position::new(5, 5));
        let troll = put(&mut state, prototypes::troll(), Position::new(8, 5));
        let scroll = give(&mut state, prototypes::freeze_scroll());
        let dagger = give(&mut state, prototypes::throwing_dagger());

        let err = use_it(&mut state, scroll, Interactable::Freeze { turns: 8 }, Some(Position::new(9, 5))).unwrap_err();
        assert_eq!(err.to_string(), "You must select an enemy to target.");

        use_it(&mut state, scroll, Interactable::Freeze { turns: 8 }, Some(Position::new(8, 5))).unwrap();
        assert!(state.world.has_status(troll, StatusEffect::Frozen));

        use_it(&mut state, dagger, Interactable::Throw { damage: 3 }, Some(Position::new(8, 5))).unwrap();
        // (power 1 - defense 1 + 3) * (magic 1 + 1)
        assert_eq!(state.world.entities.actor(troll).unwrap().fighter.hp(), 10);
        assert!(!state.world.has_status(troll, StatusEffect::Frozen));
        let dagger_entity = state.world.entities.get(dagger).unwrap();
        assert!(dagger_entity.is_on_map());
        assert_eq!(dagger_entity.position, Position::new(8, 5));
    }

    #[test]
    fn test_teleport_requires_explored_free_tile() {
        let mut state = lab(Position::new(5, 5));
        let scroll = give(&mut state, prototypes::teleport_scroll());
        let err = use_it(&mut state, scroll, Interactable::Teleport, Some(Position::new(0, 0))).unwrap_err();
        assert!(err.is_impossible());
        use_it(&mut state, scroll, Interactable::Teleport, Some(Position::new(9, 7))).unwrap();
        assert_eq!(state.world.player_position(), Some(Position::new(9, 7)));
    }

    #[test]
    fn test_invisibility_sets_player_timer() {
        let mut state = lab(Position::new(5, 5));
        let scroll = give(&mut state, prototypes::invisibility_scroll());
        use_it(&mut state, scroll, Interactable::Invisibility { turns: 10 }, None).unwrap();
        let player = state.world.player;
        assert!(state.world.has_status(player, StatusEffect::Invisible));
        assert_eq!(state.controller.turns_invisible, 10);
    }

    #[test]
    fn test_equip_swaps_slot_occupant() {
        let mut state = lab(Position::new(5, 5));
        let player = state.world.player;
        let sword = give(&mut state, prototypes::broken_sword());
        let blade = put(&mut state, prototypes::knights_blade(), Position::new(5, 6));

        use_it(&mut state, sword, Interactable::Equip, None).unwrap();
        assert_eq!(state.world.entities.actor(player).unwrap().fighter.power(), 2);

        use_it(&mut state, blade, Interactable::Equip, None).unwrap();
        assert_eq!(state.world.entities.actor(player).unwrap().fighter.power(), 4);
        assert!(!state.world.entities.item(sword).unwrap().is_equipped());
        assert!(state.world.entities.actor(player).unwrap().inventory.contains(blade));

        use_it(&mut state, blade, Interactable::Unequip, None).unwrap();
        assert_eq!(state.world.entities.actor(player).unwrap().fighter.power(), 1);
    }

    #[test]
    fn test_talk_advances_and_drops_gift_once() {
        let mut state = lab(Position::new(5, 5));
        let old_man = put(&mut state, prototypes::old_man(), Position::new(7, 5));
        state
            .world
            .entities
            .spawn(prototypes::lightning_scroll(), Container::Inventory(old_man), Position::origin())
            .unwrap();

        use_it(&mut state, old_man, Interactable::Talk, None).unwrap();
        assert!(state.world.items_at(Position::new(5, 5)).is_empty());
        use_it(&mut state, old_man, Interactable::Talk, None).unwrap();
        assert_eq!(state.world.items_at(Position::new(5, 5)).len(), 1);
        use_it(&mut state, old_man, Interactable::Talk, None).unwrap();
        use_it(&mut state, old_man, Interactable::Talk, None).unwrap();
        assert_eq!(state.world.items_at(Position::new(5, 5)).len(), 1);
    }

    #[test]
    fn test_feed_requires_food_and_stuns() {
        let mut state = lab(Position::new(5, 5));
        let hungry = put(&mut state, prototypes::hungry(), Position::new(7, 5));
        let feed = Interactable::Feed { turns: 5, heal: 3 };
        let err = use_it(&mut state, hungry, feed.clone(), None).unwrap_err();
        assert_eq!(err.to_string(), "You have nothing to feed it.");

        let food = give(&mut state, prototypes::food_ration());
        use_it(&mut state, hungry, feed, None).unwrap();
        assert!(!state.world.entities.contains(food));
        assert!(matches!(
            state.world.entities.actor(hungry).unwrap().ai,
            Some(Ai::Feasting { .. })
        ));
    }

    #[test]
    fn test_taunt_turns_rat_hostile() {
        let mut state = lab(Position::new(5, 5));
        let rat = put(&mut state, prototypes::rat(), Position::new(6, 5));
        use_it(&mut state, rat, Interactable::Taunt { cry: "= ò · ó =".into() }, None).unwrap();
        assert!(state.world.entities.actor(rat).unwrap().hostile);
        assert!(state.message_log.contains("The rat says: = ò · ó ="));
    }

    #[test]
    fn test_pet_makes_companion() {
        let mut state = lab(Position::new(5, 5));
        let rat = put(&mut state, prototypes::rat(), Position::new(6, 5));
        use_it(&mut state, rat, Interactable::Pet { cry: "= ^ · ^ =".into() }, None).unwrap();
        let actor = state.world.entities.actor(rat).unwrap();
        assert!(actor.companion);
        assert!(!actor.hostile);
        assert!(matches!(actor.ai, Some(Ai::NeutralFollower { .. })));
    }

    #[test]
    fn test_bite_hurts_shroom_and_provokes() {
        let mut state = lab(Position::new(5, 5));
        let shroom = put(&mut state, prototypes::shroom(), Position::new(6, 5));
        use_it(&mut state, shroom, Interactable::Bite, None).unwrap();
        let actor = state.world.entities.actor(shroom).unwrap();
        assert!(actor.hostile);
        assert_eq!(actor.fighter.hp(), actor.fighter.max_hp() - 1);
    }

    #[test]
    fn test_bite_roll_bands() {
        let bands: Vec<BiteEffect> = (0..100).map(BiteEffect::from_roll).collect();
        let count = |effect| bands.iter().filter(|&&e| e == effect).count();
        assert_eq!(count(BiteEffect::Vanish), 10);
        assert_eq!(count(BiteEffect::Daze), 25);
        assert_eq!(count(BiteEffect::Sicken), 25);
        assert_eq!(count(BiteEffect::Refresh), 40);

        assert_eq!(BiteEffect::from_roll(9), BiteEffect::Vanish);
        assert_eq!(BiteEffect::from_roll(10), BiteEffect::Daze);
        assert_eq!(BiteEffect::from_roll(34), BiteEffect::Daze);
        assert_eq!(BiteEffect::from_roll(35), BiteEffect::Sicken);
        assert_eq!(BiteEffect::from_roll(59), BiteEffect::Sicken);
        assert_eq!(BiteEffect::from_roll(60), BiteEffect::Refresh);
        assert_eq!(BiteEffect::from_roll(99), BiteEffect::Refresh);
    }

    #[test]
    fn test_bite_vanish_only_hides() {
        let mut state = lab(Position::new(5, 5));
        let player = state.world.player;
        let shroom = put(&mut state, prototypes::shroom(), Position::new(6, 5));
        state.suffer_bite(player, shroom, BiteEffect::Vanish);
        let fighter = &state.world.entities.actor(player).unwrap().fighter;
        assert!(fighter.has_status(StatusEffect::Invisible));
        assert!(!fighter.has_status(StatusEffect::Confused));
        assert_eq!(fighter.hp(), fighter.max_hp());
        assert_eq!(state.controller.turns_invisible, 50);
    }

    #[test]
    fn test_bite_daze_only_confuses() {
        let mut state = lab(Position::new(5, 5));
        let player = state.world.player;
        let shroom = put(&mut state, prototypes::shroom(), Position::new(6, 5));
        state.suffer_bite(player, shroom, BiteEffect::Daze);
        let fighter = &state.world.entities.actor(player).unwrap().fighter;
        assert!(fighter.has_status(StatusEffect::Confused));
        assert!(!fighter.has_status(StatusEffect::Invisible));
        assert_eq!(fighter.hp(), fighter.max_hp());
        assert!(state.message_log.contains("Your vision swims..."));
    }

    #[test]
    fn test_bite_sicken_only_hurts() {
        let mut state = lab(Position::new(5, 5));
        let player = state.world.player;
        let shroom = put(&mut state, prototypes::shroom(), Position::new(6, 5));
        state.suffer_bite(player, shroom, BiteEffect::Sicken);
        let fighter = &state.world.entities.actor(player).unwrap().fighter;
        assert_eq!(fighter.hp(), fighter.max_hp() - 2);
        assert!(fighter.status.is_empty());
        assert!(state.message_log.contains("You feel sick..."));
    }

    #[test]
    fn test_bite_refresh_only_heals() {
        let mut state = lab(Position::new(5, 5));
        let player = state.world.player;
        state.world.entities.actor_mut(player).unwrap().fighter.take_damage(8);
        let shroom = put(&mut state, prototypes::shroom(), Position::new(6, 5));
        state.suffer_bite(player, shroom, BiteEffect::Refresh);
        let fighter = &state.world.entities.actor(player).unwrap().fighter;
        assert_eq!(fighter.hp(), fighter.max_hp() - 3);
        assert!(fighter.status.is_empty());
        assert!(state.message_log.contains("You feel refreshed! You recover 5 HP."));
    }

    #[test]
    fn test_social_out_of_reach_is_rejected() {
        let mut state = lab(Position::new(5, 5));
        let rat = put(&mut state, prototypes::rat(), Position::new(9, 5));
        let err = use_it(&mut state, rat, Interactable::Pet { cry: "= ^ · ^ =".into() }, None).unwrap_err();
        assert!(err.is_impossible());
    }

    #[test]
    fn test_open_gate_needs_key() {
        let mut state = lab(Position::new(5, 5));
        let gate = put(&mut state, prototypes::sealed_gate(), Position::new(6, 5));
        let err = use_it(&mut state, gate, Interactable::Open, None).unwrap_err();
        assert_eq!(err.to_string(), "You need a key to open this.");
        assert_eq!(state.completion_state, GameCompletionState::Playing);

        give(&mut state, prototypes::rusty_key());
        use_it(&mut state, gate, Interactable::Open, None).unwrap();
        assert_eq!(state.completion_state, GameCompletionState::Won);
    }

    #[test]
    fn test_hatch_waits_for_depth() {
        let mut state = lab(Position::new(5, 5));
        let egg = give(&mut state, prototypes::mystery_egg());
        let err = use_it(&mut state, egg, Interactable::Hatch, None).unwrap_err();
        assert!(err.is_impossible());

        state.world.floor = state.config.hatch_depth;
        use_it(&mut state, egg, Interactable::Hatch, None).unwrap();
        assert!(!state.world.entities.contains(egg));
        let frog = state
            .world
            .entities
            .on_map()
            .find(|e| e.name == "microfrog")
            .map(|e| e.id)
            .unwrap();
        assert!(matches!(
            state.world.entities.actor(frog).unwrap().ai,
            Some(Ai::NeutralFollower { .. })
        ));
    }
}
