//! # User Interface Elements
//!
//! Text panels for the status bar, message log and inventory.

use crate::game::{GameCompletionState, GameState, MessageLog};

/// One-line summary of the player's condition.
///
/// # Examples
///
/// ```
/// use undercrawl::{status_line, GameState};
///
/// let state = GameState::new(1).unwrap();
/// assert_eq!(status_line(&state), "HP: 25/25  Floor: 0  Turn: 0");
/// ```
pub fn status_line(state: &GameState) -> String {
    let (hp, max_hp) = state
        .world
        .entities
        .actor(state.world.player)
        .map(|a| (a.fighter.hp(), a.fighter.max_hp()))
        .unwrap_or((0, 0));
    let mut line = format!(
        "HP: {}/{}  Floor: {}  Turn: {}",
        hp, max_hp, state.world.floor, state.turn_number
    );
    for status in state
        .world
        .entities
        .actor(state.world.player)
        .into_iter()
        .flat_map(|a| a.fighter.status.iter())
    {
        line.push_str(&format!("  [{}]", status));
    }
    match state.completion_state {
        GameCompletionState::Playing => {}
        GameCompletionState::PlayerDied => line.push_str("  -- DEAD --"),
        GameCompletionState::Won => line.push_str("  -- ESCAPED --"),
    }
    line
}

/// The newest `count` messages, oldest first.
pub fn message_lines(log: &MessageLog, count: usize) -> Vec<String> {
    log.recent(count).into_iter().map(|m| m.to_string()).collect()
}

/// Inventory listing with letters, marking equipped items.
pub fn inventory_lines(state: &GameState) -> Vec<String> {
    let world = &state.world;
    let Some(actor) = world.entities.actor(world.player) else {
        return Vec::new();
    };
    actor
        .inventory
        .items()
        .iter()
        .zip('a'..='z')
        .filter_map(|(&id, letter)| {
            let entity = world.entities.get(id)?;
            let worn = entity.item().map(|i| i.is_equipped()).unwrap_or(false);
            Some(format!(
                "({}) {}{}",
                letter,
                entity.name,
                if worn { " (equipped)" } else { "" }
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{prototypes, Container, MessageTag, Position, StatusEffect};

    #[test]
    fn test_status_line_shows_statuses() {
        let mut state = GameState::new(3).unwrap();
        let player = state.world.player;
        state.apply_status(player, StatusEffect::Invisible, 3);
        assert!(status_line(&state).ends_with("[invisible]"));
    }

    #[test]
    fn test_inventory_lines() {
        let mut state = GameState::new(3).unwrap();
        let player = state.world.player;
        for item in [prototypes::food_ration(), prototypes::broken_sword()] {
            state
                .world
                .entities
                .spawn(item, Container::Inventory(player), Position::origin())
                .unwrap();
        }
        assert_eq!(
            inventory_lines(&state),
            vec!["(a) food ration".to_string(), "(b) broken sword".to_string()]
        );
    }

    #[test]
    fn test_message_lines_keep_order() {
        let mut log = MessageLog::new(10);
        log.add("first", MessageTag::Info);
        log.add("second", MessageTag::Info);
        log.add("second", MessageTag::Info);
        assert_eq!(message_lines(&log, 5), vec!["first".to_string(), "second (x2)".to_string()]);
    }
}
