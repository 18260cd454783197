//! # AI State Machine
//!
//! Every non-player behavior is one variant of [`Ai`]. Planning is pure with
//! respect to the world: [`Ai::plan`] reads the [`World`], updates only the
//! behavior's own bookkeeping (cached paths, counters, targets) and returns an
//! [`AiStep`] that the turn loop then applies.
//!
//! Transient overrides (`Confused`, `Stunned`, `Frozen`, `Feasting`) wrap the
//! behavior they replace and hand it back when their countdown runs out. Overrides
//! never nest: [`apply_override`] refuses to wrap an override in a different one.
//!
//! The player-directed tasks `PlayerPathTo` and `PlayerInteractWith` are planned
//! the same way but are driven by the [`crate::PlayerController`] queue.

use crate::game::{Action, Actor, ActorType, EntityId, Interactable, Position, StatusEffect, World};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Range within which scavengers and critters notice other actors.
const NOTICE_RANGE: i32 = 8;
/// Range within which a same-type hostile provokes a neutral follower.
const PROVOKE_RANGE: i32 = 3;
/// Range within which a curious critter picks something to follow.
const CURIOSITY_RANGE: i32 = 4;

/// Behavior of an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ai {
    /// Never acts.
    Idle,
    /// Chases and melees the player while it is in sight.
    HostileChase { path: Vec<Position> },
    /// Steps away from the player while it is in sight.
    Fleeing,
    /// Zaps the player with magic from range, closing in when too far.
    RangedCaster { range: i32, hit_chance: u32 },
    /// Hunts actors of other types and devours their remains.
    Scavenger { target: Option<EntityId> },
    /// Trails a leader (the player when `target` is `None`) at a fixed distance.
    NeutralFollower {
        target: Option<EntityId>,
        follow_distance: i32,
    },
    /// Bumps in a random direction every `period` turns.
    RandomGait { period: u32, counter: u32 },
    /// Wanders until something catches its interest, then tags along for a while.
    CuriousCritter {
        interest: u32,
        max_interest: u32,
        target: Option<EntityId>,
    },
    Confused {
        previous: Box<Ai>,
        turns_remaining: i32,
    },
    Stunned {
        previous: Box<Ai>,
        turns_remaining: i32,
    },
    Frozen {
        previous: Box<Ai>,
        turns_remaining: i32,
    },
    Feasting {
        previous: Box<Ai>,
        turns_remaining: i32,
        heal: i32,
    },
    /// Player task: walk to a tile. `target` becomes `None` once finished.
    PlayerPathTo { target: Option<Position> },
    /// Player task: walk up to an entity and pick it up or attack it.
    PlayerInteractWith { target: EntityId, done: bool },
}

/// What an actor does with its turn.
#[derive(Debug, Clone, PartialEq)]
pub enum AiStep {
    /// Perform an action.
    Act(Action),
    /// Drop the override and restore the wrapped behavior.
    Revert {
        status: StatusEffect,
        heal: i32,
        message: Option<String>,
    },
    /// Consume a corpse, then rest.
    Devour(EntityId),
    /// Hit a target with magic directly, bypassing melee.
    Zap { target: EntityId, damage: i32 },
    /// Become hostile.
    TurnHostile,
    /// A player task has nothing left to do; no turn is spent.
    Finished,
}

impl AiStep {
    fn wait() -> Self {
        AiStep::Act(Action::Wait)
    }
}

/// Which transient override to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideKind {
    Confused,
    Stunned,
    Frozen,
    Feasting { heal: i32 },
}

impl OverrideKind {
    /// Status flag mirrored on the fighter while the override is active.
    pub fn status(self) -> StatusEffect {
        match self {
            OverrideKind::Confused => StatusEffect::Confused,
            OverrideKind::Stunned | OverrideKind::Feasting { .. } => StatusEffect::Stunned,
            OverrideKind::Frozen => StatusEffect::Frozen,
        }
    }

    fn wrap(self, previous: Ai, turns_remaining: i32) -> Ai {
        let previous = Box::new(previous);
        match self {
            OverrideKind::Confused => Ai::Confused { previous, turns_remaining },
            OverrideKind::Stunned => Ai::Stunned { previous, turns_remaining },
            OverrideKind::Frozen => Ai::Frozen { previous, turns_remaining },
            OverrideKind::Feasting { heal } => Ai::Feasting {
                previous,
                turns_remaining,
                heal,
            },
        }
    }
}

/// Result of trying to install an override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideOutcome {
    Applied,
    /// The same override was already active; its countdown was refreshed.
    Refreshed,
    /// A different override is active, or the actor has no behavior to wrap.
    Rejected,
}

/// Returns what [`apply_override`] would do without changing anything.
pub fn override_outcome(actor: &Actor, kind: OverrideKind) -> OverrideOutcome {
    if !actor.is_alive() {
        return OverrideOutcome::Rejected;
    }
    match &actor.ai {
        None => OverrideOutcome::Rejected,
        Some(current) if current.is_override() => {
            if current.override_kind_matches(kind) {
                OverrideOutcome::Refreshed
            } else {
                OverrideOutcome::Rejected
            }
        }
        Some(_) => OverrideOutcome::Applied,
    }
}

/// Installs a transient override on an actor.
///
/// Re-applying the active override refreshes its countdown to the larger of the
/// remaining and the new duration; timers never add up.
pub fn apply_override(actor: &mut Actor, kind: OverrideKind, turns: i32) -> OverrideOutcome {
    let outcome = override_outcome(actor, kind);
    match outcome {
        OverrideOutcome::Applied => {
            if let Some(current) = actor.ai.take() {
                actor.ai = Some(kind.wrap(current, turns));
                actor.fighter.add_status(kind.status());
            }
        }
        OverrideOutcome::Refreshed => {
            if let Some(remaining) = actor.ai.as_mut().and_then(Ai::turns_remaining_mut) {
                *remaining = (*remaining).max(turns);
            }
            actor.fighter.add_status(kind.status());
        }
        OverrideOutcome::Rejected => {}
    }
    outcome
}

/// Ends an active override early, restoring the wrapped behavior.
pub fn clear_override(actor: &mut Actor) -> bool {
    let Some(current) = actor.ai.take() else {
        return false;
    };
    if let Some(status) = current.override_status() {
        actor.fighter.remove_status(status);
    }
    match current.into_previous() {
        Ok(previous) => {
            actor.ai = Some(previous);
            true
        }
        Err(current) => {
            actor.ai = Some(current);
            false
        }
    }
}

impl Ai {
    pub fn hostile_chase() -> Self {
        Ai::HostileChase { path: Vec::new() }
    }

    pub fn random_gait(period: u32) -> Self {
        Ai::RandomGait { period, counter: 0 }
    }

    pub fn curious_critter(max_interest: u32) -> Self {
        Ai::CuriousCritter {
            interest: 0,
            max_interest,
            target: None,
        }
    }

    pub fn follower(target: Option<EntityId>, follow_distance: i32) -> Self {
        Ai::NeutralFollower {
            target,
            follow_distance,
        }
    }

    pub fn path_to(target: Position) -> Self {
        Ai::PlayerPathTo {
            target: Some(target),
        }
    }

    pub fn interact_with(target: EntityId) -> Self {
        Ai::PlayerInteractWith { target, done: false }
    }

    /// True for the transient override variants.
    pub fn is_override(&self) -> bool {
        matches!(
            self,
            Ai::Confused { .. } | Ai::Stunned { .. } | Ai::Frozen { .. } | Ai::Feasting { .. }
        )
    }

    /// True for player-directed tasks.
    pub fn is_player_task(&self) -> bool {
        matches!(self, Ai::PlayerPathTo { .. } | Ai::PlayerInteractWith { .. })
    }

    /// Whether a player task has completed. Other behaviors never finish.
    pub fn finished(&self) -> bool {
        match self {
            Ai::PlayerPathTo { target } => target.is_none(),
            Ai::PlayerInteractWith { done, .. } => *done,
            _ => false,
        }
    }

    /// Status flag tied to an override variant.
    pub fn override_status(&self) -> Option<StatusEffect> {
        match self {
            Ai::Confused { .. } => Some(StatusEffect::Confused),
            Ai::Stunned { .. } | Ai::Feasting { .. } => Some(StatusEffect::Stunned),
            Ai::Frozen { .. } => Some(StatusEffect::Frozen),
            _ => None,
        }
    }

    fn override_kind_matches(&self, kind: OverrideKind) -> bool {
        matches!(
            (self, kind),
            (Ai::Confused { .. }, OverrideKind::Confused)
                | (Ai::Stunned { .. }, OverrideKind::Stunned)
                | (Ai::Frozen { .. }, OverrideKind::Frozen)
                | (Ai::Feasting { .. }, OverrideKind::Feasting { .. })
        )
    }

    fn turns_remaining_mut(&mut self) -> Option<&mut i32> {
        match self {
            Ai::Confused { turns_remaining, .. }
            | Ai::Stunned { turns_remaining, .. }
            | Ai::Frozen { turns_remaining, .. }
            | Ai::Feasting { turns_remaining, .. } => Some(turns_remaining),
            _ => None,
        }
    }

    /// Behavior wrapped by an override.
    pub fn previous(&self) -> Option<&Ai> {
        match self {
            Ai::Confused { previous, .. }
            | Ai::Stunned { previous, .. }
            | Ai::Frozen { previous, .. }
            | Ai::Feasting { previous, .. } => Some(previous),
            _ => None,
        }
    }

    /// Replaces the behavior an override will restore. No-op on other variants.
    pub fn set_previous(&mut self, next: Ai) {
        match self {
            Ai::Confused { previous, .. }
            | Ai::Stunned { previous, .. }
            | Ai::Frozen { previous, .. }
            | Ai::Feasting { previous, .. } => **previous = next,
            _ => {}
        }
    }

    /// Unwraps an override, or gives `self` back unchanged.
    pub fn into_previous(self) -> Result<Ai, Ai> {
        match self {
            Ai::Confused { previous, .. }
            | Ai::Stunned { previous, .. }
            | Ai::Frozen { previous, .. }
            | Ai::Feasting { previous, .. } => Ok(*previous),
            other => Err(other),
        }
    }

    /// Decides what `actor` does this turn.
    ///
    /// Only the behavior's own bookkeeping is updated here; the returned step is
    /// applied by the turn loop.
    pub fn plan(&mut self, actor: EntityId, world: &World, rng: &mut StdRng) -> AiStep {
        let Some(me) = world.entities.get(actor) else {
            return AiStep::wait();
        };
        let here = me.position;

        match self {
            Ai::Idle => AiStep::wait(),

            Ai::HostileChase { path } => {
                if let Some(target) = world.player_position() {
                    if world.player_in_sight_of(here) {
                        let offset = target - here;
                        if here.chebyshev_distance(target) <= 1 {
                            return AiStep::Act(Action::melee(offset));
                        }
                        *path = world.path_to(here, target);
                    }
                }
                follow_path(path, here)
            }

            Ai::Fleeing => {
                let Some(target) = world.player_position() else {
                    return AiStep::wait();
                };
                if !world.player_in_sight_of(here) {
                    return AiStep::wait();
                }
                match world.path_to(here, target).first() {
                    Some(&step) => AiStep::Act(Action::movement(-(step - here))),
                    None => AiStep::wait(),
                }
            }

            Ai::RangedCaster { range, hit_chance } => {
                let (Some(target), Some(player)) = (world.player_position(), world.player_id())
                else {
                    return AiStep::wait();
                };
                if !world.player_in_sight_of(here) {
                    return AiStep::wait();
                }
                if here.chebyshev_distance(target) <= *range {
                    if rng.gen_range(0..100) < *hit_chance {
                        let damage = me
                            .actor()
                            .map(|a| a.fighter.magic().max(1))
                            .unwrap_or(1);
                        return AiStep::Zap { target: player, damage };
                    }
                    return AiStep::wait();
                }
                step_along(world.path_to(here, target).first().copied(), here)
            }

            Ai::Scavenger { target } => {
                let still_valid = target
                    .and_then(|t| world.entities.get(t))
                    .map(|e| e.is_on_map() && e.actor().is_some())
                    .unwrap_or(false);
                if !still_valid {
                    *target = find_prey(actor, world);
                }
                let Some(prey_id) = *target else {
                    return AiStep::wait();
                };
                let Some(prey) = world.entities.get(prey_id) else {
                    return AiStep::wait();
                };
                let distance = here.chebyshev_distance(prey.position);
                if !prey.is_alive_actor() {
                    if distance <= 1 {
                        *target = None;
                        return AiStep::Devour(prey_id);
                    }
                } else if distance <= 1 {
                    return AiStep::Act(Action::melee(prey.position - here));
                }
                step_along(world.path_to(here, prey.position).first().copied(), here)
            }

            Ai::NeutralFollower {
                target,
                follow_distance,
            } => {
                if provoked(actor, world) {
                    return AiStep::TurnHostile;
                }
                let leader_id = target.or_else(|| world.player_id());
                let Some(leader) = leader_id
                    .and_then(|id| world.entities.get(id))
                    .filter(|e| e.is_alive_actor() && e.is_on_map())
                else {
                    return AiStep::wait();
                };
                let distance = here.chebyshev_distance(leader.position);
                let step = world.path_to(here, leader.position).first().copied();
                match distance.cmp(follow_distance) {
                    std::cmp::Ordering::Greater => step_along(step, here),
                    std::cmp::Ordering::Less => match step {
                        Some(next) => AiStep::Act(Action::movement(-(next - here))),
                        None => AiStep::wait(),
                    },
                    std::cmp::Ordering::Equal => AiStep::wait(),
                }
            }

            Ai::RandomGait { period, counter } => {
                *counter += 1;
                if *counter >= (*period).max(1) {
                    *counter = 0;
                    random_bump(rng)
                } else {
                    AiStep::wait()
                }
            }

            Ai::CuriousCritter {
                interest,
                max_interest,
                target,
            } => {
                let followed = target
                    .and_then(|t| world.entities.get(t))
                    .filter(|e| e.is_alive_actor() && e.is_on_map());
                match followed {
                    Some(other) if *interest > 0 => {
                        *interest -= 1;
                        if here.chebyshev_distance(other.position) > 1 {
                            step_along(world.path_to(here, other.position).first().copied(), here)
                        } else {
                            AiStep::wait()
                        }
                    }
                    Some(_) => {
                        *target = None;
                        random_bump(rng)
                    }
                    None => {
                        *target = None;
                        match world.closest_actor(here, CURIOSITY_RANGE, |e| e.id != actor) {
                            Some(found) => {
                                *target = Some(found);
                                *interest = *max_interest;
                                AiStep::wait()
                            }
                            None => random_bump(rng),
                        }
                    }
                }
            }

            Ai::Confused {
                turns_remaining, ..
            } => {
                if *turns_remaining <= 0 {
                    return AiStep::Revert {
                        status: StatusEffect::Confused,
                        heal: 0,
                        message: Some(format!("The {} is no longer confused.", me.name)),
                    };
                }
                *turns_remaining -= 1;
                random_bump(rng)
            }

            Ai::Stunned {
                turns_remaining, ..
            } => countdown(turns_remaining, StatusEffect::Stunned, 0, None),

            Ai::Frozen {
                turns_remaining, ..
            } => countdown(
                turns_remaining,
                StatusEffect::Frozen,
                0,
                Some(format!("The {} thaws out.", me.name)),
            ),

            Ai::Feasting {
                turns_remaining,
                heal,
                ..
            } => countdown(
                turns_remaining,
                StatusEffect::Stunned,
                *heal,
                Some(format!("The {} finishes its meal.", me.name)),
            ),

            Ai::PlayerPathTo { target } => {
                let Some(goal) = *target else {
                    return AiStep::Finished;
                };
                if here == goal {
                    *target = None;
                    return AiStep::Finished;
                }
                match world.path_to(here, goal).first().copied() {
                    Some(step) => {
                        if step == goal {
                            *target = None;
                        }
                        AiStep::Act(Action::movement(step - here))
                    }
                    None => {
                        *target = None;
                        AiStep::Finished
                    }
                }
            }

            Ai::PlayerInteractWith { target, done } => {
                let Some(other) = world.entities.get(*target).filter(|e| e.is_on_map()) else {
                    *done = true;
                    return AiStep::Finished;
                };
                if here.chebyshev_distance(other.position) <= 1 {
                    *done = true;
                    if other.item().is_some() {
                        return AiStep::Act(Action::Interact {
                            owner: *target,
                            interactable: Interactable::PickUp,
                            target: None,
                        });
                    }
                    if other.is_alive_actor() && world.is_hostile_to(actor, *target) {
                        return AiStep::Act(Action::melee(other.position - here));
                    }
                    return AiStep::Finished;
                }
                match world.path_to(here, other.position).first().copied() {
                    Some(step) => AiStep::Act(Action::movement(step - here)),
                    None => {
                        *done = true;
                        AiStep::Finished
                    }
                }
            }
        }
    }
}

fn countdown(turns_remaining: &mut i32, status: StatusEffect, heal: i32, message: Option<String>) -> AiStep {
    if *turns_remaining <= 0 {
        return AiStep::Revert {
            status,
            heal,
            message,
        };
    }
    *turns_remaining -= 1;
    AiStep::wait()
}

/// Pops the next step of a cached path.
fn follow_path(path: &mut Vec<Position>, here: Position) -> AiStep {
    if path.is_empty() {
        return AiStep::wait();
    }
    let next = path.remove(0);
    if next.chebyshev_distance(here) != 1 {
        path.clear();
        return AiStep::wait();
    }
    AiStep::Act(Action::movement(next - here))
}

fn step_along(step: Option<Position>, here: Position) -> AiStep {
    match step {
        Some(next) => AiStep::Act(Action::movement(next - here)),
        None => AiStep::wait(),
    }
}

fn random_bump(rng: &mut StdRng) -> AiStep {
    let directions = crate::game::Direction::all();
    let direction = directions[rng.gen_range(0..directions.len())];
    AiStep::Act(Action::bump(direction.to_delta()))
}

/// Nearest visible actor (living or dead) of another wild species.
fn find_prey(actor: EntityId, world: &World) -> Option<EntityId> {
    let me = world.entities.get(actor)?;
    let my_type = me.actor()?.actor_type;
    if !world.map.is_visible(me.position) {
        return None;
    }
    world.closest_actor_any(me.position, NOTICE_RANGE, |e| {
        e.id != actor
            && world.map.is_visible(e.position)
            && e.actor()
                .map(|a| {
                    a.actor_type != my_type && !matches!(a.actor_type, ActorType::Npc | ActorType::Player)
                })
                .unwrap_or(false)
    })
}

/// Whether a living hostile of the same type stands close by.
fn provoked(actor: EntityId, world: &World) -> bool {
    let Some(me) = world.entities.get(actor) else {
        return false;
    };
    let Some(my_type) = me.actor().map(|a| a.actor_type) else {
        return false;
    };
    world.entities.on_map().any(|e| {
        e.id != actor
            && e.position.chebyshev_distance(me.position) <= PROVOKE_RANGE
            && e.actor()
                .map(|a| a.is_alive() && a.hostile && a.actor_type == my_type)
                .unwrap_or(false)
    })
}
