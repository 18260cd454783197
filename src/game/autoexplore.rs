//! # Autoexplore Module
//!
//! A simple autopilot for headless runs and soak tests.
//!
//! Each call looks at the session and proposes one [`Action`]: fight what is
//! adjacent, eat when hurt, pick up what is underfoot, walk to the nearest
//! unexplored tile, then head for the stairs down.

use crate::game::{Action, EntityId, GameState, Interactable, ItemType, Position};
use std::collections::{HashSet, VecDeque};

/// Autopilot settings and memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoexploreState {
    /// Whether autoexplore is currently enabled
    pub enabled: bool,
    /// Take the stairs down once the floor is explored
    pub descend: bool,
    /// Fraction of max hp under which food is eaten, in percent
    pub eat_below_percent: i32,
    /// Current target position
    pub target: Option<Position>,
}

impl AutoexploreState {
    pub fn new() -> Self {
        Self {
            enabled: true,
            descend: true,
            eat_below_percent: 50,
            target: None,
        }
    }

    /// Toggles autoexplore on/off.
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        if !self.enabled {
            self.target = None;
        }
        self.enabled
    }

    /// Gets the next action to perform, or `None` when disabled or the run is over.
    pub fn next_action(&mut self, state: &GameState) -> Option<Action> {
        if !self.enabled || !state.is_running() {
            return None;
        }
        let world = &state.world;
        let player = world.player;
        let here = world.player_position()?;

        if let Some(foe) = self.adjacent_foe(state, here) {
            let foe_at = world.entities.get(foe)?.position;
            return Some(Action::bump(foe_at - here));
        }
        if let Some(action) = self.eat_if_hurt(state) {
            return Some(action);
        }
        let inventory_full = world
            .entities
            .actor(player)
            .map(|a| a.inventory.is_full())
            .unwrap_or(true);
        if !inventory_full && !world.items_at(here).is_empty() {
            return Some(Action::PickUp);
        }

        self.target = self.nearest_unexplored(state, here);
        if self.target.is_none() && self.descend {
            if world.map.downstairs == Some(here) {
                return Some(Action::TakeStairs);
            }
            self.target = world.map.downstairs.filter(|&p| world.map.is_explored(p));
        }

        let step = world.path_to(here, self.target?).first().copied()?;
        Some(Action::bump(step - here))
    }

    fn adjacent_foe(&self, state: &GameState, here: Position) -> Option<EntityId> {
        let world = &state.world;
        world
            .actors_within(here, 1)
            .into_iter()
            .find(|&id| id != world.player && world.is_hostile_to(world.player, id))
    }

    fn eat_if_hurt(&self, state: &GameState) -> Option<Action> {
        let world = &state.world;
        let fighter = &world.entities.actor(world.player)?.fighter;
        if fighter.hp() * 100 >= fighter.max_hp() * self.eat_below_percent {
            return None;
        }
        let food = world.find_in_inventory(world.player, ItemType::Food)?;
        let interactable = world
            .available_interactables(food, world.player)
            .into_iter()
            .find(|i| matches!(i, Interactable::Eat { .. }))?;
        Some(Action::Interact {
            owner: food,
            interactable,
            target: None,
        })
    }

    /// Closest unexplored walkable tile, by 8-directional breadth-first search
    /// over walkable tiles.
    fn nearest_unexplored(&self, state: &GameState, here: Position) -> Option<Position> {
        let map = &state.world.map;
        let mut queue = VecDeque::from([here]);
        let mut seen = HashSet::from([here]);
        while let Some(pos) = queue.pop_front() {
            if !map.is_explored(pos) {
                return Some(pos);
            }
            for next in pos.adjacent_positions() {
                if map.is_walkable(next) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        None
    }
}

impl Default for AutoexploreState {
    fn default() -> Self {
        Self::new()
    }
}
