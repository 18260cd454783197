//! # Input Module
//!
//! Input handling and command parsing for player interactions.
//!
//! Front ends translate their key presses and clicks into [`PlayerInput`]
//! values; [`InputHandler::handle`] turns those into actions or queued tasks.
//! Any direct command interrupts the task queue first.

pub mod commands;

pub use commands::*;

use crate::game::{Action, Ai, EntityId, GameState, Interactable, Position};

/// Input handler for processing player commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputHandler {
    /// Whether to enable Vi-style movement keys (hjkl yubn)
    pub vi_keys_enabled: bool,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// What handling one input did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// A turn was played
    TurnTaken,
    /// Nothing happened; no turn was spent
    NoTurn,
    /// A task was queued; drive it with [`GameState::advance_player_task`]
    TaskQueued,
    Quit,
    Help,
    ToggleAutoexplore,
}

impl InputHandler {
    /// Creates a new input handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercrawl::{InputHandler, PlayerInput, Position};
    ///
    /// let input_handler = InputHandler::new();
    /// assert_eq!(input_handler.key_to_input('l'), Some(PlayerInput::Move(Position::new(1, 0))));
    /// ```
    pub fn new() -> Self {
        Self {
            vi_keys_enabled: true,
        }
    }

    /// Maps a key to an input, the way a terminal front end would.
    pub fn key_to_input(&self, key: char) -> Option<PlayerInput> {
        let movement = |dx, dy| Some(PlayerInput::Move(Position::new(dx, dy)));
        match key {
            'w' => movement(0, -1),
            's' => movement(0, 1),
            'a' => movement(-1, 0),
            'd' => movement(1, 0),
            'h' if self.vi_keys_enabled => movement(-1, 0),
            'j' if self.vi_keys_enabled => movement(0, 1),
            'k' if self.vi_keys_enabled => movement(0, -1),
            'l' if self.vi_keys_enabled => movement(1, 0),
            'y' if self.vi_keys_enabled => movement(-1, -1),
            'u' if self.vi_keys_enabled => movement(1, -1),
            'b' if self.vi_keys_enabled => movement(-1, 1),
            'n' if self.vi_keys_enabled => movement(1, 1),
            '.' | ' ' => Some(PlayerInput::Wait),
            ',' | 'g' => Some(PlayerInput::PickUp),
            '>' | '<' => Some(PlayerInput::UseStairs),
            'q' => Some(PlayerInput::Quit),
            '?' => Some(PlayerInput::Help),
            'x' => Some(PlayerInput::ToggleAutoexplore),
            _ => None,
        }
    }

    /// Applies one input to the session.
    pub fn handle(&self, input: PlayerInput, state: &mut GameState) -> InputOutcome {
        let action = match input {
            PlayerInput::Quit => return InputOutcome::Quit,
            PlayerInput::Help => return InputOutcome::Help,
            PlayerInput::ToggleAutoexplore => return InputOutcome::ToggleAutoexplore,
            PlayerInput::Cancel => {
                state.controller.interrupt();
                return InputOutcome::NoTurn;
            }
            PlayerInput::ClickTile(pos) => {
                state.controller.interrupt();
                return self.queue_click(pos, state);
            }
            PlayerInput::QueueClick(pos) => return self.queue_click(pos, state),
            PlayerInput::Move(delta) => Action::bump(delta),
            PlayerInput::Wait => Action::Wait,
            PlayerInput::PickUp => Action::PickUp,
            PlayerInput::UseStairs => Action::TakeStairs,
            PlayerInput::Activate {
                owner,
                interactable,
                target,
            } => Action::Interact {
                owner,
                interactable,
                target,
            },
        };

        state.controller.interrupt();
        if state.handle_action(action) {
            InputOutcome::TurnTaken
        } else {
            InputOutcome::NoTurn
        }
    }

    /// Queues a walk to an explored tile, or a walk-and-use task when
    /// something there can be picked up or fought.
    fn queue_click(&self, pos: Position, state: &mut GameState) -> InputOutcome {
        let world = &state.world;
        if !world.map.is_explored(pos) || !world.map.is_walkable(pos) {
            return InputOutcome::NoTurn;
        }
        let task = match self.click_target(state, pos) {
            Some(id) => Ai::interact_with(id),
            None => Ai::path_to(pos),
        };
        log::debug!("Queued {:?}", task);
        state.controller.enqueue(task);
        InputOutcome::TaskQueued
    }

    fn click_target(&self, state: &GameState, pos: Position) -> Option<EntityId> {
        let world = &state.world;
        if !world.map.is_visible(pos) {
            return None;
        }
        let player = world.player;
        world
            .get_actor_at(pos)
            .filter(|&id| id != player && world.is_hostile_to(player, id))
            .or_else(|| world.items_at(pos).into_iter().next())
    }
}

/// Player input types that can be processed by the input handler.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerInput {
    /// Move or attack in a given direction (relative position)
    Move(Position),
    /// Wait/rest for one turn
    Wait,
    /// Pick up item at current position
    PickUp,
    /// Use the staircase underfoot
    UseStairs,
    /// Use an ability of an entity, optionally aimed at a tile
    Activate {
        owner: EntityId,
        interactable: Interactable,
        target: Option<Position>,
    },
    /// Replace the task queue with a walk to this tile
    ClickTile(Position),
    /// Append a walk to this tile to the task queue
    QueueClick(Position),
    /// Drop all queued tasks
    Cancel,
    /// Quit the game
    Quit,
    /// Show help information
    Help,
    ToggleAutoexplore,
}
