//! # Message Log
//!
//! Bounded history of player-facing messages. Consecutive identical messages
//! stack into one entry with a repeat count.

use crate::config::MESSAGE_LOG_CAPACITY;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Category of a message, used by front ends for coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageTag {
    Welcome,
    PlayerAttack,
    EnemyAttack,
    PlayerDie,
    EnemyDie,
    Impossible,
    Error,
    HealthRecovered,
    StatusEffect,
    Descend,
    Dialogue,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub tag: MessageTag,
    pub count: u32,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count > 1 {
            write!(f, "{} (x{})", self.text, self.count)
        } else {
            f.write_str(&self.text)
        }
    }
}

/// Ring buffer of messages; the oldest entries are dropped first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLog {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new(MESSAGE_LOG_CAPACITY)
    }
}

impl MessageLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Appends a message, stacking it onto the last one when the text and tag match.
    ///
    /// # Examples
    ///
    /// ```
    /// use undercrawl::{MessageLog, MessageTag};
    ///
    /// let mut log = MessageLog::new(10);
    /// log.add("That way is blocked.", MessageTag::Impossible);
    /// log.add("That way is blocked.", MessageTag::Impossible);
    /// assert_eq!(log.len(), 1);
    /// assert_eq!(log.last().unwrap().to_string(), "That way is blocked. (x2)");
    /// ```
    pub fn add(&mut self, text: impl Into<String>, tag: MessageTag) {
        let text = text.into();
        if let Some(last) = self.messages.back_mut() {
            if last.text == text && last.tag == tag {
                last.count += 1;
                return;
            }
        }
        if self.messages.len() >= self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(Message { text, tag, count: 1 });
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Message> {
        self.messages.iter()
    }

    /// The newest `count` messages, oldest first.
    pub fn recent(&self, count: usize) -> Vec<&Message> {
        let skip = self.messages.len().saturating_sub(count);
        self.messages.iter().skip(skip).collect()
    }

    /// Whether any retained message has exactly this text.
    pub fn contains(&self, text: &str) -> bool {
        self.messages.iter().any(|m| m.text == text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_drops_oldest() {
        let mut log = MessageLog::new(3);
        for i in 0..5 {
            log.add(format!("message {}", i), MessageTag::Info);
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.iter().next().unwrap().text, "message 2");
        assert!(!log.contains("message 0"));
    }

    #[test]
    fn test_different_tags_do_not_stack() {
        let mut log = MessageLog::new(5);
        log.add("Hello", MessageTag::Info);
        log.add("Hello", MessageTag::Dialogue);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_recent_returns_tail_in_order() {
        let mut log = MessageLog::new(10);
        log.add("a", MessageTag::Info);
        log.add("b", MessageTag::Info);
        log.add("c", MessageTag::Info);
        let recent: Vec<&str> = log.recent(2).iter().map(|m| m.text.as_str()).collect();
        assert_eq!(recent, vec!["b", "c"]);
    }
}
