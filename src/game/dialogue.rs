//! # Dialogue
//!
//! Linear conversation scripts. Each talk speaks the line under the cursor and
//! advances it; the cursor stops on the last line, which then repeats forever.

use serde::{Deserialize, Serialize};

/// Side effect fired when a line is spoken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueTrigger {
    /// The speaker drops the first item it carries at the listener's feet
    DropGift,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub text: String,
    pub trigger: Option<DialogueTrigger>,
}

impl DialogueLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            trigger: None,
        }
    }

    pub fn with_trigger(mut self, trigger: DialogueTrigger) -> Self {
        self.trigger = Some(trigger);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialogue {
    lines: Vec<DialogueLine>,
    talk_count: usize,
}

impl Dialogue {
    pub fn new(lines: Vec<DialogueLine>) -> Self {
        Self {
            lines,
            talk_count: 0,
        }
    }

    pub fn talk_count(&self) -> usize {
        self.talk_count
    }

    /// Returns the current line and moves the cursor forward, clamped at the last line.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercrawl::{Dialogue, DialogueLine};
    ///
    /// let mut talk = Dialogue::new(vec![DialogueLine::new("Hi."), DialogueLine::new("Bye.")]);
    /// assert_eq!(talk.advance().unwrap().text, "Hi.");
    /// assert_eq!(talk.advance().unwrap().text, "Bye.");
    /// assert_eq!(talk.advance().unwrap().text, "Bye.");
    /// ```
    pub fn advance(&mut self) -> Option<DialogueLine> {
        let last = self.lines.len().checked_sub(1)?;
        let index = self.talk_count.min(last);
        self.talk_count = (index + 1).min(last);
        self.lines.get(index).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_dialogue_says_nothing() {
        let mut talk = Dialogue::new(Vec::new());
        assert!(talk.advance().is_none());
        assert_eq!(talk.talk_count(), 0);
    }

    #[test]
    fn test_trigger_line_fires_once() {
        let mut talk = Dialogue::new(vec![
            DialogueLine::new("One"),
            DialogueLine::new("Two").with_trigger(DialogueTrigger::DropGift),
            DialogueLine::new("Three"),
        ]);
        let triggers: Vec<Option<DialogueTrigger>> = (0..5).map(|_| talk.advance().unwrap().trigger).collect();
        assert_eq!(
            triggers,
            vec![None, Some(DialogueTrigger::DropGift), None, None, None]
        );
        assert_eq!(talk.talk_count(), 2);
    }
}
