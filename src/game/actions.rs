//! # Action System
//!
//! One closed enum for every unit of behavior an actor can spend a turn on.
//!
//! Actions are values; [`GameState::perform`] validates and applies them.
//! Failed preconditions come back as [`UndercrawlError::Impossible`], in which
//! case nothing was changed and no turn is consumed.

use crate::game::{GameEvent, GameState, Interactable, InteractionContext, MessageTag, Position};
use crate::utils::capitalize;
use crate::{UndercrawlError, UndercrawlResult};
use serde::{Deserialize, Serialize};

/// Something an actor does with its turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Step onto an adjacent free tile.
    Move { dx: i32, dy: i32 },
    /// Attack the living actor on an adjacent tile.
    Melee { dx: i32, dy: i32 },
    /// Melee a hostile actor in that direction, otherwise move.
    Bump { dx: i32, dy: i32 },
    Wait,
    /// Pick up the first item lying underfoot.
    PickUp,
    /// Use the staircase underfoot.
    TakeStairs,
    /// Use an ability offered by `owner`, optionally aimed at a tile.
    Interact {
        owner: crate::game::EntityId,
        interactable: Interactable,
        target: Option<Position>,
    },
}

impl Action {
    pub fn movement(delta: Position) -> Self {
        Action::Move {
            dx: delta.x,
            dy: delta.y,
        }
    }

    pub fn melee(delta: Position) -> Self {
        Action::Melee {
            dx: delta.x,
            dy: delta.y,
        }
    }

    pub fn bump(delta: Position) -> Self {
        Action::Bump {
            dx: delta.x,
            dy: delta.y,
        }
    }

    /// Direction of a directional action.
    pub fn delta(&self) -> Option<Position> {
        match *self {
            Action::Move { dx, dy } | Action::Melee { dx, dy } | Action::Bump { dx, dy } => {
                Some(Position::new(dx, dy))
            }
            _ => None,
        }
    }

    /// Same action pointed another way. Non-directional actions are returned unchanged.
    pub fn redirected(&self, delta: Position) -> Self {
        match self {
            Action::Move { .. } => Action::movement(delta),
            Action::Melee { .. } => Action::melee(delta),
            Action::Bump { .. } => Action::bump(delta),
            other => other.clone(),
        }
    }
}

impl GameState {
    /// Validates and applies `action` on behalf of `actor`.
    pub fn perform(&mut self, actor: crate::game::EntityId, action: &Action) -> UndercrawlResult<()> {
        let origin = self.world.entities.require(actor)?.position;
        match *action {
            Action::Wait => Ok(()),
            Action::Move { dx, dy } => self.perform_move(actor, origin, origin + Position::new(dx, dy)),
            Action::Melee { dx, dy } => self.perform_melee(actor, origin + Position::new(dx, dy)),
            Action::Bump { dx, dy } => {
                let destination = origin + Position::new(dx, dy);
                match self.world.get_actor_at(destination) {
                    Some(target) if self.world.is_hostile_to(actor, target) => {
                        self.perform_melee(actor, destination)
                    }
                    _ => self.perform_move(actor, origin, destination),
                }
            }
            Action::PickUp => {
                let item = self
                    .world
                    .items_at(origin)
                    .into_iter()
                    .next()
                    .ok_or_else(|| UndercrawlError::impossible("There is nothing here to pick up."))?;
                self.interact(actor, item, Interactable::PickUp, None)
            }
            Action::TakeStairs => {
                if actor != self.world.player {
                    return Err(UndercrawlError::impossible("Only you can use the stairs."));
                }
                if self.world.map.downstairs == Some(origin) {
                    self.descend()
                } else if self.world.map.upstairs == Some(origin) {
                    self.ascend()
                } else {
                    Err(UndercrawlError::impossible("There are no stairs here."))
                }
            }
            Action::Interact {
                owner,
                ref interactable,
                target,
            } => self.interact(actor, owner, interactable.clone(), target),
        }
    }

    fn perform_move(&mut self, actor: crate::game::EntityId, from: Position, to: Position) -> UndercrawlResult<()> {
        if from.chebyshev_distance(to) != 1 {
            return Err(UndercrawlError::impossible("That way is blocked."));
        }
        if !self.world.map.is_walkable(to) || self.world.get_blocking_entity_at(to).is_some() {
            return Err(UndercrawlError::impossible("That way is blocked."));
        }
        self.world.entities.set_position(actor, to);
        if actor == self.world.player {
            self.record(GameEvent::PlayerMoved { from, to });
        }
        Ok(())
    }

    fn perform_melee(&mut self, actor: crate::game::EntityId, at: Position) -> UndercrawlResult<()> {
        let target = self
            .world
            .get_actor_at(at)
            .filter(|&t| t != actor)
            .ok_or_else(|| UndercrawlError::impossible("Nothing to attack."))?;

        let attacker = self.world.entities.require(actor)?;
        let defender = self.world.entities.require(target)?;
        let power = attacker.actor().map(|a| a.fighter.power()).unwrap_or(0);
        let defense = defender.actor().map(|a| a.fighter.defense()).unwrap_or(0);
        let description = format!("{} attacks {}", capitalize(&attacker.name), defender.name);
        let damage = power - defense;

        let player = self.world.player;
        let tag = if actor == player {
            MessageTag::PlayerAttack
        } else {
            MessageTag::EnemyAttack
        };

        if actor == player {
            self.provoke(target);
            self.reveal_player();
        }

        if damage > 0 {
            self.log(format!("{} for {} hit points.", description, damage), tag);
            self.apply_damage(target, damage, Some(actor));
        } else {
            self.log(format!("{} but does no damage.", description), tag);
        }
        Ok(())
    }

    /// Validates that `owner` offers `interactable` to `activator` and resolves it.
    pub fn interact(
        &mut self,
        activator: crate::game::EntityId,
        owner: crate::game::EntityId,
        interactable: Interactable,
        target: Option<Position>,
    ) -> UndercrawlResult<()> {
        let owner_entity = self.world.entities.require(owner)?;
        let owner_name = owner_entity.name.clone();
        self.world.entities.require(activator)?;

        let offered = self.world.available_interactables(owner, activator);
        if !offered.contains(&interactable) {
            return Err(UndercrawlError::impossible(format!(
                "You can't {} the {} right now.",
                interactable.name().to_lowercase(),
                owner_name
            )));
        }

        let context = InteractionContext {
            activator,
            owner,
            interactable,
            target,
        };
        self.resolve_interaction(&context)
    }
}
