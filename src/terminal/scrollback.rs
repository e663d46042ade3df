//! Bounded scrollback buffer
//!
//! Lines are stored newest-first; pushing onto a full buffer evicts the
//! oldest line.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct ScrollbackBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl ScrollbackBuffer {
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a line as the newest entry.
    pub fn push(&mut self, line: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_back();
        }
        self.lines.push_front(line.into());
    }

    /// Add lines in order, so the last one ends up newest.
    pub fn extend<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for line in lines {
            self.push(line);
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The newest line, if any
    pub fn newest(&self) -> Option<&str> {
        self.lines.front().map(String::as_str)
    }

    /// Lines newest first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

impl Default for ScrollbackBuffer {
    fn default() -> Self {
        Self::new()
    }
}
