//! Bounded record of prior user turns.

use std::collections::VecDeque;

/// Default number of turns kept.
pub const DEFAULT_HISTORY_SIZE: usize = 10;

/// The most recent user turns, oldest first.
///
/// Owned by whoever runs the conversation and passed to the model
/// explicitly. Pushing beyond capacity evicts the oldest turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationHistory {
    turns: VecDeque<String>,
    capacity: usize,
}

impl ConversationHistory {
    /// Creates an empty history. A capacity of zero keeps nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Appends a turn, evicting the oldest when full.
    pub fn push(&mut self, turn: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        while self.turns.len() >= self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn.into());
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.turns.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_first() {
        let mut history = ConversationHistory::new(3);
        for turn in ["a", "b", "c", "d", "e"] {
            history.push(turn);
        }
        assert_eq!(history.iter().collect::<Vec<_>>(), vec!["c", "d", "e"]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut history = ConversationHistory::new(0);
        history.push("hello");
        assert!(history.is_empty());
    }

    #[test]
    fn default_capacity() {
        let history = ConversationHistory::default();
        assert_eq!(history.capacity(), DEFAULT_HISTORY_SIZE);
        assert!(history.is_empty());
    }

    #[test]
    fn clear() {
        let mut history = ConversationHistory::new(2);
        history.push("a");
        history.clear();
        assert_eq!(history.len(), 0);
        assert_eq!(history.capacity(), 2);
    }
}
