//! Command history for the terminal prompt
//!
//! Stores previously entered commands newest-first and supports shell-style
//! Up/Down navigation. The line being composed when navigation starts is
//! kept as a draft and restored when the user walks back past the newest
//! entry.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct CommandHistory {
    /// Entered commands, newest first
    entries: VecDeque<String>,
    max_entries: usize,
    /// Index of the entry currently shown, None when not navigating
    position: Option<usize>,
    /// Line that was being typed when navigation began
    saved_line: String,
}

impl CommandHistory {
    /// Maximum number of commands kept by default
    pub const DEFAULT_CAPACITY: usize = 50;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
            position: None,
            saved_line: String::new(),
        }
    }

    /// Record a command, skipping it if it repeats the newest entry.
    pub fn add_command(&mut self, cmd: &str) {
        if self.entries.front().map(String::as_str) == Some(cmd) {
            return;
        }

        self.entries.push_front(cmd.to_string());
        if self.entries.len() > self.max_entries {
            self.entries.pop_back();
        }
    }

    /// Stop navigating without touching the saved draft.
    pub fn reset_navigation(&mut self) {
        self.position = None;
    }

    /// Move one step through the history.
    ///
    /// `current_line` is the line being edited; it is saved as the draft when
    /// an upward walk begins. Returns the line that should replace the input,
    /// or None when there is nowhere further to go.
    pub fn navigate(&mut self, up: bool, current_line: &str) -> Option<String> {
        if up {
            let next = self.position.map_or(0, |p| p + 1);
            if next >= self.entries.len() {
                return None;
            }
            if self.position.is_none() {
                self.saved_line = current_line.to_string();
            }
            self.position = Some(next);
            self.entries.get(next).cloned()
        } else {
            match self.position {
                None => None,
                Some(0) => {
                    self.position = None;
                    Some(self.saved_line.clone())
                }
                Some(p) => {
                    self.position = Some(p - 1);
                    self.entries.get(p - 1).cloned()
                }
            }
        }
    }

    pub fn is_navigating(&self) -> bool {
        self.position.is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries newest first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}
