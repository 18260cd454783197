//! # Player Controller
//!
//! Queue of multi-turn player tasks (walk somewhere, walk up to something and
//! use it) plus the player's status timers.
//!
//! Tasks are [`Ai`] values planned exactly like monster behaviors. Any keyboard
//! input or incoming damage interrupts the queue.

use crate::game::{Action, Ai, AiStep, EntityId, World};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerController {
    tasks: VecDeque<Ai>,
    current: Option<Ai>,
    /// Turns of confusion left
    pub turns_confused: i32,
    /// Turns of invisibility left
    pub turns_invisible: i32,
}

impl PlayerController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a task. Non-task behaviors are ignored.
    pub fn enqueue(&mut self, task: Ai) {
        if task.is_player_task() {
            self.tasks.push_back(task);
        } else {
            log::warn!("Ignoring non-task behavior for the player: {:?}", task);
        }
    }

    /// Drops every queued task.
    pub fn interrupt(&mut self) {
        if self.has_pending_tasks() {
            log::debug!("Player tasks interrupted");
        }
        self.tasks.clear();
        self.current = None;
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.current.as_ref().map(|t| !t.finished()).unwrap_or(false) || !self.tasks.is_empty()
    }

    pub fn current_task(&self) -> Option<&Ai> {
        self.current.as_ref()
    }

    /// Plans the next step of the task queue.
    ///
    /// Finished tasks are discarded until one produces an action. Returns `None`
    /// once the queue is exhausted.
    pub fn next_action(&mut self, player: EntityId, world: &World, rng: &mut StdRng) -> Option<Action> {
        loop {
            if self.current.as_ref().map(|t| t.finished()).unwrap_or(true) {
                self.current = Some(self.tasks.pop_front()?);
            }
            let task = self.current.as_mut()?;
            match task.plan(player, world, rng) {
                AiStep::Act(action) => return Some(action),
                _ => self.current = None,
            }
        }
    }
}
