//! # Command Definitions
//!
//! Parser for scripted key sequences used by headless runs and tests.
//!
//! A script is a string of keys as understood by [`InputHandler::key_to_input`],
//! each optionally preceded by a repeat count: `"3l2j.g>"` walks three steps
//! east, two south, waits, picks up and takes the stairs. Whitespace separates
//! nothing and is ignored; `#` starts a comment running to the end of the line.

use crate::input::{InputHandler, PlayerInput};
use crate::{UndercrawlError, UndercrawlResult};

/// One scripted input and how many times to repeat it.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub input: PlayerInput,
    pub count: u32,
}

impl Command {
    pub fn new(input: PlayerInput, count: u32) -> Self {
        Self { input, count }
    }

    /// The input repeated `count` times.
    pub fn expand(&self) -> impl Iterator<Item = PlayerInput> + '_ {
        std::iter::repeat(self.input.clone()).take(self.count as usize)
    }
}

/// Parses a key script into commands.
///
/// # Examples
///
/// ```
/// use undercrawl::{parse_commands, InputHandler, PlayerInput, Position};
///
/// let commands = parse_commands("3l.", &InputHandler::new()).unwrap();
/// assert_eq!(commands.len(), 2);
/// assert_eq!(commands[0].count, 3);
/// assert_eq!(commands[0].input, PlayerInput::Move(Position::new(1, 0)));
/// assert_eq!(commands[1].input, PlayerInput::Wait);
/// ```
pub fn parse_commands(script: &str, handler: &InputHandler) -> UndercrawlResult<Vec<Command>> {
    let mut commands = Vec::new();
    for (line_number, line) in script.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default();
        let mut count: Option<u32> = None;
        for (column, key) in line.chars().enumerate() {
            if key.is_whitespace() {
                continue;
            }
            if let Some(digit) = key.to_digit(10) {
                let next = count.unwrap_or(0).checked_mul(10).and_then(|c| c.checked_add(digit));
                count = Some(next.ok_or_else(|| {
                    UndercrawlError::InvalidState(format!(
                        "Repeat count too large at line {}, column {}",
                        line_number + 1,
                        column + 1
                    ))
                })?);
                continue;
            }
            let input = handler.key_to_input(key).ok_or_else(|| {
                UndercrawlError::InvalidState(format!(
                    "Unknown key '{}' at line {}, column {}",
                    key,
                    line_number + 1,
                    column + 1
                ))
            })?;
            commands.push(Command::new(input, count.take().unwrap_or(1)));
        }
        if count.is_some() {
            return Err(UndercrawlError::InvalidState(format!(
                "Repeat count without a key at the end of line {}",
                line_number + 1
            )));
        }
    }
    Ok(commands)
}

/// Parses a script straight into the flat input sequence.
pub fn parse_inputs(script: &str, handler: &InputHandler) -> UndercrawlResult<Vec<PlayerInput>> {
    Ok(parse_commands(script, handler)?
        .iter()
        .flat_map(|c| c.expand())
        .collect())
}
