//! Command history and input parsing.

use std::collections::VecDeque;

/// Previously dispatched commands, oldest first.
///
/// Consecutive duplicates are stored once. Recall walks backwards with
/// [`CommandHistory::previous`] and forwards again with
/// [`CommandHistory::next`]; walking past the newest entry returns to the
/// operator's current input.
#[derive(Debug, Clone)]
pub struct CommandHistory {
    entries: VecDeque<String>,
    limit: usize,
    cursor: Option<usize>,
}

impl CommandHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
            cursor: None,
        }
    }

    pub fn push(&mut self, command: &str) {
        self.cursor = None;
        if self.limit == 0 || self.entries.back().is_some_and(|last| last == command) {
            return;
        }
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(command.to_string());
    }

    pub fn previous(&mut self) -> Option<&str> {
        let index = match self.cursor {
            None => self.entries.len().checked_sub(1)?,
            Some(i) => i.saturating_sub(1),
        };
        self.cursor = Some(index);
        self.entries.get(index).map(String::as_str)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&str> {
        let index = self.cursor? + 1;
        if index < self.entries.len() {
            self.cursor = Some(index);
            self.entries.get(index).map(String::as_str)
        } else {
            self.cursor = None;
            None
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

/// Pull the command out of raw console input.
///
/// Takes the last non-blank line, trims it and strips a leading `prompt`.
pub fn extract_command(raw: &str, prompt: &str) -> String {
    let line = raw
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or_default()
        .trim();

    match line.strip_prefix(prompt) {
        Some(rest) if !prompt.is_empty() => rest.trim().to_string(),
        _ => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_strips_prompt() {
        assert_eq!(extract_command("(dlv) next", "(dlv)"), "next");
        assert_eq!(extract_command("  (dlv)   step  ", "(dlv)"), "step");
        assert_eq!(extract_command("(dlv)", "(dlv)"), "");
    }

    #[test]
    fn extract_uses_last_non_blank_line() {
        let raw = "(dlv) break main.go:10\nBreakpoint 1 set\n(dlv) continue\n\n   \n";
        assert_eq!(extract_command(raw, "(dlv)"), "continue");
        assert_eq!(extract_command("\n \n", "(dlv)"), "");
    }

    #[test]
    fn extract_without_prompt() {
        assert_eq!(extract_command("print x", "(dlv)"), "print x");
    }

    #[test]
    fn consecutive_duplicates_stored_once() {
        let mut history = CommandHistory::new(10);
        history.push("next");
        history.push("next");
        history.push("step");
        history.push("next");

        assert_eq!(history.entries().collect::<Vec<_>>(), ["next", "step", "next"]);
    }

    #[test]
    fn oldest_entries_are_dropped() {
        let mut history = CommandHistory::new(2);
        history.push("a");
        history.push("b");
        history.push("c");

        assert_eq!(history.entries().collect::<Vec<_>>(), ["b", "c"]);
    }

    #[test]
    fn recall_walks_back_and_forth() {
        let mut history = CommandHistory::new(10);
        history.push("a");
        history.push("b");
        history.push("c");

        assert_eq!(history.previous(), Some("c"));
        assert_eq!(history.previous(), Some("b"));
        assert_eq!(history.previous(), Some("a"));
        // stays on the oldest entry
        assert_eq!(history.previous(), Some("a"));
        assert_eq!(history.next(), Some("b"));
        assert_eq!(history.next(), Some("c"));
        assert_eq!(history.next(), None);
        assert_eq!(history.next(), None);
    }

    #[test]
    fn push_resets_recall() {
        let mut history = CommandHistory::new(10);
        history.push("a");
        history.push("b");
        history.previous();
        history.previous();

        history.push("c");

        assert_eq!(history.previous(), Some("c"));
    }

    #[test]
    fn empty_history_recalls_nothing() {
        let mut history = CommandHistory::new(10);
        assert_eq!(history.previous(), None);
        assert_eq!(history.next(), None);
    }
}
