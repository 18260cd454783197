//! # Game State Module
//!
//! The session object and the turn loop.
//!
//! `GameState` owns the world, the player controller, the message log, run
//! statistics and the session's random number generator. There is no global
//! state: every operation takes the session explicitly.
//!
//! A turn is: the player's action, then every other living actor in arena
//! order, then a field-of-view refresh, then the player's status timers. A
//! player action that fails with `Impossible` is logged and consumes nothing.

use crate::config::{FOV_RADIUS, SURFACE_FLOOR};
use crate::game::{
    apply_override, prototypes, Action, Ai, AiStep, Color, Container, Direction, EntityArena, EntityId, ItemType,
    MessageLog, MessageTag, OverrideKind, OverrideOutcome, PlayerController, Position, RenderOrder, StatusEffect,
    World,
};
use crate::generation::{populate_floor, DungeonGenerator, FixedContent, FloorLayout, GenerationConfig, Generator};
use crate::utils::capitalize;
use crate::{UndercrawlError, UndercrawlResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Message greeting a new run.
pub const WELCOME_MESSAGE: &str = "Hello and welcome, wanderer, to the lost city under the mountain!";

/// Where a run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameCompletionState {
    Playing,
    PlayerDied,
    /// The sealed gate on the last floor was opened
    Won,
}

/// Notable things that happened during a turn, folded into [`GameStatistics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    TurnEnded,
    PlayerMoved { from: Position, to: Position },
    DamageDealt { amount: i32 },
    DamageTaken { amount: i32 },
    ActorKilled { species: String, by_player: bool },
    ItemPickedUp,
    ItemConsumed { item_type: ItemType },
    FloorReached { depth: i32 },
    Interaction { name: String },
}

/// Counters describing a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    pub turns_taken: u64,
    pub steps_taken: u64,
    pub damage_dealt: u64,
    pub damage_taken: u64,
    /// Deaths caused by the player, keyed by species name
    pub kills_by_species: BTreeMap<String, u32>,
    pub items_picked_up: u32,
    pub food_eaten: u32,
    pub scrolls_cast: u32,
    /// Lowest floor reached; floors below the surface are negative
    pub deepest_floor: i32,
    /// Social interactions performed, keyed by name
    pub interactions: BTreeMap<String, u32>,
}

impl GameStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates statistics based on a game event.
    pub fn update_from_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::TurnEnded => self.turns_taken += 1,
            GameEvent::PlayerMoved { .. } => self.steps_taken += 1,
            GameEvent::DamageDealt { amount } => self.damage_dealt += (*amount).max(0) as u64,
            GameEvent::DamageTaken { amount } => self.damage_taken += (*amount).max(0) as u64,
            GameEvent::ActorKilled { species, by_player } => {
                if *by_player {
                    *self.kills_by_species.entry(species.clone()).or_insert(0) += 1;
                }
            }
            GameEvent::ItemPickedUp => self.items_picked_up += 1,
            GameEvent::ItemConsumed { item_type } => match item_type {
                ItemType::Food => self.food_eaten += 1,
                ItemType::Scroll => self.scrolls_cast += 1,
                _ => {}
            },
            GameEvent::FloorReached { depth } => self.deepest_floor = self.deepest_floor.min(*depth),
            GameEvent::Interaction { name } => {
                *self.interactions.entry(name.clone()).or_insert(0) += 1;
            }
        }
    }

    pub fn total_kills(&self) -> u32 {
        self.kills_by_species.values().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arrival {
    /// On the up staircase side, after going down
    EntryHub,
    /// On the down staircase side, after going up
    ExitHub,
}

fn fresh_rng() -> StdRng {
    StdRng::seed_from_u64(0)
}

/// Central session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub world: World,
    pub controller: PlayerController,
    pub message_log: MessageLog,
    pub statistics: GameStatistics,
    /// Generation settings of the run; each floor derives its own from these
    pub config: GenerationConfig,
    pub turn_number: u64,
    pub rng_seed: u64,
    pub completion_state: GameCompletionState,
    /// One-off floor content handed out so far
    #[serde(default)]
    pub fixed_content: FixedContent,
    /// Reseeded from `rng_seed` and `turn_number` on load
    #[serde(skip, default = "fresh_rng")]
    pub rng: StdRng,
}

impl GameState {
    /// Starts a new run on the surface floor.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercrawl::{GameCompletionState, GameState};
    ///
    /// let state = GameState::new(12345).unwrap();
    /// assert_eq!(state.turn_number, 0);
    /// assert_eq!(state.world.floor, 0);
    /// assert_eq!(state.completion_state, GameCompletionState::Playing);
    /// ```
    pub fn new(seed: u64) -> UndercrawlResult<Self> {
        Self::with_config(GenerationConfig::new(seed))
    }

    /// Starts a new run with explicit generation settings.
    pub fn with_config(config: GenerationConfig) -> UndercrawlResult<Self> {
        let depth = config.depth;
        let floor_config = config.for_depth(depth);
        let mut floor_rng = StdRng::seed_from_u64(floor_config.seed);
        let layout = DungeonGenerator::new().generate(&floor_config, &mut floor_rng)?;

        let mut entities = EntityArena::new();
        let player = entities.spawn(prototypes::player(), Container::Map, layout.entry_point())?;
        let mut world = World::new(layout.map.clone(), entities, player, depth);
        let mut fixed_content = FixedContent::new();
        populate_floor(&mut world, &layout, &floor_config, &mut fixed_content, &mut floor_rng)?;

        let seed = config.seed;
        let mut state = Self::assemble(world, seed, config);
        state.fixed_content = fixed_content;
        state.refresh_fov();
        state.log(WELCOME_MESSAGE, MessageTag::Welcome);
        state.record(GameEvent::FloorReached { depth });
        log::info!("Started run with seed {} on floor {}", seed, depth);
        Ok(state)
    }

    /// Wraps an already built world, for scripted scenarios and tests.
    pub fn from_world(world: World, seed: u64) -> Self {
        let mut config = GenerationConfig::new(seed);
        config.depth = world.floor;
        let mut state = Self::assemble(world, seed, config);
        state.refresh_fov();
        state
    }

    fn assemble(world: World, seed: u64, config: GenerationConfig) -> Self {
        let deepest_floor = world.floor.min(SURFACE_FLOOR);
        Self {
            world,
            controller: PlayerController::new(),
            message_log: MessageLog::default(),
            statistics: GameStatistics {
                deepest_floor,
                ..GameStatistics::default()
            },
            config,
            turn_number: 0,
            rng_seed: seed,
            completion_state: GameCompletionState::Playing,
            fixed_content: FixedContent::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn is_running(&self) -> bool {
        self.completion_state == GameCompletionState::Playing
    }

    pub fn player(&self) -> EntityId {
        self.world.player
    }

    /// Adds a message to the log.
    pub fn log(&mut self, text: impl Into<String>, tag: MessageTag) {
        let text = text.into();
        log::debug!("[{:?}] {}", tag, text);
        self.message_log.add(text, tag);
    }

    pub(crate) fn record(&mut self, event: GameEvent) {
        log::trace!("Event: {:?}", event);
        self.statistics.update_from_event(&event);
    }

    pub fn refresh_fov(&mut self) {
        self.world.update_fov(FOV_RADIUS);
    }

    /// Runs one player action and, if it took effect, the rest of the turn.
    ///
    /// Returns true if a turn was consumed.
    pub fn handle_action(&mut self, action: Action) -> bool {
        if !self.is_running() {
            return false;
        }
        let player = self.world.player;
        let confused = self.world.has_status(player, StatusEffect::Confused) && action.delta().is_some();
        let action = if confused {
            let directions = Direction::all();
            let stumble = directions[self.rng.gen_range(0..directions.len())];
            Action::bump(stumble.to_delta())
        } else {
            action
        };

        match self.perform(player, &action) {
            Ok(()) => {}
            Err(err) if err.is_impossible() && confused => {
                log::debug!("Confused move failed: {}", err);
                self.log("You stumble around in confusion.", MessageTag::StatusEffect);
            }
            Err(err) if err.is_impossible() => {
                self.log(err.to_string(), MessageTag::Impossible);
                return false;
            }
            Err(err) => {
                log::error!("Player action {:?} failed: {}", action, err);
                self.log(err.to_string(), MessageTag::Error);
                return false;
            }
        }

        self.end_turn();
        true
    }

    /// Runs the next step of the player's task queue as a full turn.
    ///
    /// Returns false when there is nothing to do or the step failed; a failed
    /// step also clears the queue.
    pub fn advance_player_task(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        let player = self.world.player;
        let Some(action) = self.controller.next_action(player, &self.world, &mut self.rng) else {
            return false;
        };
        let advanced = self.handle_action(action);
        if !advanced {
            self.controller.interrupt();
        }
        advanced
    }

    fn end_turn(&mut self) {
        self.turn_number += 1;
        self.record(GameEvent::TurnEnded);
        if self.is_running() {
            self.handle_enemy_turns();
        }
        self.refresh_fov();
        self.tick_player_statuses();
    }

    /// Gives every other living actor on the floor one step, in arena order.
    pub fn handle_enemy_turns(&mut self) {
        let player = self.world.player;
        let acting: Vec<EntityId> = self
            .world
            .entities
            .on_map()
            .filter(|e| e.id != player)
            .filter(|e| e.actor().map(|a| a.is_alive() && a.ai.is_some()).unwrap_or(false))
            .map(|e| e.id)
            .collect();

        for id in acting {
            if !self.is_running() {
                break;
            }
            let ai = self
                .world
                .entities
                .get(id)
                .filter(|e| e.is_on_map())
                .and_then(|e| e.actor())
                .filter(|a| a.is_alive())
                .and_then(|a| a.ai.clone());
            let Some(mut ai) = ai else {
                continue;
            };
            let step = ai.plan(id, &self.world, &mut self.rng);
            if let Err(err) = self.apply_ai_step(id, ai, step) {
                if err.is_impossible() {
                    log::debug!("Actor {} wasted its turn: {}", id, err);
                } else {
                    log::error!("Actor {} failed to act: {}", id, err);
                }
            }
        }
    }

    fn apply_ai_step(&mut self, id: EntityId, ai: Ai, step: AiStep) -> UndercrawlResult<()> {
        if let AiStep::Revert { status, heal, message } = step {
            let restored = ai.into_previous().unwrap_or_else(|unchanged| unchanged);
            if let Some(actor) = self.world.entities.actor_mut(id) {
                actor.ai = Some(restored);
                actor.fighter.remove_status(status);
                actor.fighter.heal(heal);
            }
            if let Some(message) = message {
                self.log(message, MessageTag::StatusEffect);
            }
            return Ok(());
        }

        if let Some(actor) = self.world.entities.actor_mut(id) {
            actor.ai = Some(ai);
        }
        match step {
            AiStep::Act(action) => self.perform(id, &action),
            AiStep::Devour(corpse) => self.devour(id, corpse),
            AiStep::Zap { target, damage } => self.zap(id, target, damage),
            AiStep::TurnHostile => {
                if let Some(actor) = self.world.entities.actor_mut(id) {
                    actor.turn_hostile();
                }
                let name = self.world.entities.require(id)?.name.clone();
                self.log(format!("The {} turns hostile!", name), MessageTag::EnemyAttack);
                Ok(())
            }
            AiStep::Finished | AiStep::Revert { .. } => Ok(()),
        }
    }

    fn devour(&mut self, eater: EntityId, corpse: EntityId) -> UndercrawlResult<()> {
        let eater_position = self.world.entities.require(eater)?.position;
        let remains = self.world.entities.require(corpse)?;
        if remains.is_alive_actor() || !remains.is_on_map() || remains.position.chebyshev_distance(eater_position) > 1 {
            return Err(UndercrawlError::impossible("There is nothing to eat here."));
        }
        let remains_name = remains.name.clone();
        let eater_name = self.world.entities.require(eater)?.name.clone();
        self.world.entities.remove(corpse);
        self.apply_override_to(eater, OverrideKind::Feasting { heal: 2 }, 2);
        if self.world.map.is_visible(eater_position) {
            self.log(
                format!("The {} devours the {}.", eater_name, remains_name),
                MessageTag::Info,
            );
        }
        Ok(())
    }

    fn zap(&mut self, caster: EntityId, target: EntityId, damage: i32) -> UndercrawlResult<()> {
        let caster_name = capitalize(&self.world.entities.require(caster)?.name);
        let target_name = if target == self.world.player {
            "you".to_string()
        } else {
            self.world.entities.require(target)?.name.clone()
        };
        self.log(
            format!(
                "{} hurls a bolt of magic at {} for {} hit points.",
                caster_name, target_name, damage
            ),
            MessageTag::EnemyAttack,
        );
        self.apply_damage(target, damage, Some(caster));
        Ok(())
    }

    /// Deals damage, handling death and bookkeeping. Returns the hp actually lost.
    pub fn apply_damage(&mut self, target: EntityId, amount: i32, source: Option<EntityId>) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let Some(actor) = self.world.entities.actor_mut(target) else {
            return 0;
        };
        if !actor.is_alive() {
            return 0;
        }
        let lost = actor.fighter.take_damage(amount);
        let died = !actor.is_alive();

        let player = self.world.player;
        if target == player {
            self.record(GameEvent::DamageTaken { amount: lost });
            if lost > 0 {
                self.controller.interrupt();
            }
        }
        if source == Some(player) {
            self.record(GameEvent::DamageDealt { amount: lost });
        }
        if died {
            self.kill(target, source);
        }
        lost
    }

    /// Turns a freshly dead actor into a corpse. Runs once per death.
    fn kill(&mut self, target: EntityId, source: Option<EntityId>) {
        let player = self.world.player;
        let Some(entity) = self.world.entities.get_mut(target) else {
            return;
        };
        let species = entity.name.clone();
        let position = entity.position;
        let blood = entity.actor().map(|a| a.blood);

        entity.name = format!("remains of {}", species);
        entity.appearance.glyph = '%';
        entity.appearance.fg = Color::DARK_RED;
        entity.appearance.bg = blood;
        entity.blocks_movement = false;
        entity.render_order = RenderOrder::Corpse;
        let loot = match entity.actor_mut() {
            Some(actor) => {
                actor.ai = None;
                actor.fighter.status.clear();
                actor.inventory.items().to_vec()
            }
            None => Vec::new(),
        };

        for item in loot {
            if let Err(err) = self.world.entities.place(item, Container::Map, position) {
                log::warn!("Could not drop {} from {}: {}", item, target, err);
            }
        }

        if target == player {
            self.log("You died!", MessageTag::PlayerDie);
            self.completion_state = GameCompletionState::PlayerDied;
            log::info!("Player died on floor {} at turn {}", self.world.floor, self.turn_number);
        } else {
            self.log(format!("{} is dead!", capitalize(&species)), MessageTag::EnemyDie);
        }
        self.record(GameEvent::ActorKilled {
            species,
            by_player: source == Some(player),
        });
    }

    /// Makes a non-player actor hostile, along with visible calm actors of its type.
    pub(crate) fn provoke(&mut self, target: EntityId) {
        let player = self.world.player;
        if target == player {
            return;
        }
        let Some(actor) = self.world.entities.actor(target) else {
            return;
        };
        if !actor.is_alive() {
            return;
        }
        let kind = actor.actor_type;
        let mut provoked = vec![target];
        provoked.extend(
            self.world
                .entities
                .on_map()
                .filter(|e| e.id != target && e.id != player && self.world.map.is_visible(e.position))
                .filter(|e| {
                    e.actor()
                        .map(|a| a.is_alive() && !a.hostile && !a.companion && a.actor_type == kind)
                        .unwrap_or(false)
                })
                .map(|e| e.id),
        );
        for id in provoked {
            if let Some(actor) = self.world.entities.actor_mut(id) {
                if !actor.hostile {
                    actor.turn_hostile();
                }
            }
        }
    }

    /// Ends the player's invisibility early.
    pub(crate) fn reveal_player(&mut self) {
        let player = self.world.player;
        let was_invisible = self
            .world
            .entities
            .actor_mut(player)
            .map(|a| a.fighter.remove_status(StatusEffect::Invisible))
            .unwrap_or(false);
        self.controller.turns_invisible = 0;
        if was_invisible {
            self.log("You are visible again.", MessageTag::StatusEffect);
        }
    }

    /// Applies a timed status. The player's statuses run on controller timers;
    /// other actors get the matching behavior override.
    pub fn apply_status(&mut self, target: EntityId, status: StatusEffect, turns: i32) {
        if target == self.world.player {
            match status {
                StatusEffect::Confused => {
                    self.controller.turns_confused = self.controller.turns_confused.max(turns)
                }
                StatusEffect::Invisible => {
                    self.controller.turns_invisible = self.controller.turns_invisible.max(turns)
                }
                StatusEffect::Stunned | StatusEffect::Frozen => {
                    log::debug!("Ignoring {} on the player", status);
                    return;
                }
            }
            if let Some(actor) = self.world.entities.actor_mut(target) {
                actor.fighter.add_status(status);
            }
            return;
        }

        match status {
            StatusEffect::Confused => {
                self.apply_override_to(target, OverrideKind::Confused, turns);
            }
            StatusEffect::Stunned => {
                self.apply_override_to(target, OverrideKind::Stunned, turns);
            }
            StatusEffect::Frozen => {
                self.apply_override_to(target, OverrideKind::Frozen, turns);
            }
            StatusEffect::Invisible => {
                if let Some(actor) = self.world.entities.actor_mut(target) {
                    actor.fighter.add_status(status);
                }
            }
        }
    }

    /// Installs a behavior override on a non-player actor.
    pub fn apply_override_to(&mut self, target: EntityId, kind: OverrideKind, turns: i32) -> OverrideOutcome {
        match self.world.entities.actor_mut(target) {
            Some(actor) => apply_override(actor, kind, turns),
            None => OverrideOutcome::Rejected,
        }
    }

    fn tick_player_statuses(&mut self) {
        let player = self.world.player;
        if self.controller.turns_confused > 0 {
            self.controller.turns_confused -= 1;
            if self.controller.turns_confused == 0 {
                if let Some(actor) = self.world.entities.actor_mut(player) {
                    actor.fighter.remove_status(StatusEffect::Confused);
                }
                self.log("You are no longer confused.", MessageTag::StatusEffect);
            }
        }
        if self.controller.turns_invisible > 0 {
            self.controller.turns_invisible -= 1;
            if self.controller.turns_invisible == 0 {
                self.reveal_player();
            }
        }
    }

    /// Takes the player one floor down, arriving in the entry hub.
    pub fn descend(&mut self) -> UndercrawlResult<()> {
        if self.world.floor <= self.config.final_depth {
            return Err(UndercrawlError::impossible("There is no way further down."));
        }
        self.change_floor(self.world.floor - 1, Arrival::EntryHub)?;
        self.log("You descend the staircase.", MessageTag::Descend);
        Ok(())
    }

    /// Takes the player one floor up, arriving in the exit hub.
    pub fn ascend(&mut self) -> UndercrawlResult<()> {
        if self.world.floor >= SURFACE_FLOOR {
            return Err(UndercrawlError::impossible("The way up has collapsed."));
        }
        self.change_floor(self.world.floor + 1, Arrival::ExitHub)?;
        self.log("You ascend the staircase.", MessageTag::Descend);
        Ok(())
    }

    /// Replaces the floor. Only the player, its companions and what they carry
    /// survive the transition.
    fn change_floor(&mut self, depth: i32, arrival: Arrival) -> UndercrawlResult<()> {
        let floor_config = self.config.for_depth(depth);
        let mut floor_rng = StdRng::seed_from_u64(floor_config.seed);
        let layout: FloorLayout = DungeonGenerator::new().generate(&floor_config, &mut floor_rng)?;

        let player = self.world.player;
        let companions: Vec<EntityId> = self
            .world
            .entities
            .on_map()
            .filter(|e| e.id != player)
            .filter(|e| e.actor().map(|a| a.is_alive() && a.companion).unwrap_or(false))
            .map(|e| e.id)
            .collect();
        let mut travellers: HashSet<EntityId> = HashSet::from([player]);
        travellers.extend(self.world.carried_by(player));
        for &companion in &companions {
            travellers.insert(companion);
            travellers.extend(self.world.carried_by(companion));
        }
        for id in self.world.entities.ids() {
            if !travellers.contains(&id) {
                self.world.entities.remove(id);
            }
        }

        let from = self.world.floor;
        self.world.map = layout.map.clone();
        self.world.floor = depth;
        let landing = match arrival {
            Arrival::EntryHub => layout.entry_point(),
            Arrival::ExitHub => layout.exit_point(),
        };
        self.world.entities.set_position(player, landing);
        for companion in companions {
            match self.world.free_tile_near(landing, 4) {
                Some(spot) => self.world.entities.set_position(companion, spot),
                None => {
                    log::warn!("No room near {} for companion {}; leaving it behind", landing, companion);
                    for item in self.world.carried_by(companion) {
                        self.world.entities.remove(item);
                    }
                    self.world.entities.remove(companion);
                }
            }
        }

        populate_floor(
            &mut self.world,
            &layout,
            &floor_config,
            &mut self.fixed_content,
            &mut floor_rng,
        )?;
        self.controller.interrupt();
        self.refresh_fov();
        self.record(GameEvent::FloorReached { depth });
        log::info!("Player moved from floor {} to floor {}", from, depth);
        Ok(())
    }

    pub(crate) fn win(&mut self) {
        self.completion_state = GameCompletionState::Won;
        log::info!("Run won at turn {}", self.turn_number);
    }

    /// Saves the game state to JSON.
    pub fn save_to_json(&self) -> UndercrawlResult<String> {
        serde_json::to_string_pretty(self).map_err(UndercrawlError::from)
    }

    /// Loads game state from JSON, reseeding the random number generator.
    pub fn load_from_json(json: &str) -> UndercrawlResult<Self> {
        let mut state: Self = serde_json::from_str(json)?;
        state.rng = StdRng::seed_from_u64(state.rng_seed ^ state.turn_number.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Ok(state)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> UndercrawlResult<()> {
        std::fs::write(path.as_ref(), self.save_to_json()?)?;
        log::info!("Saved game to {}", path.as_ref().display());
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> UndercrawlResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::load_from_json(&json)
    }
}
