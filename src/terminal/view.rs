//! Render output of the terminal
//!
//! [`TerminalView`] is a plain snapshot of everything the host needs to draw
//! one frame. It holds no references into the terminal, so a renderer can
//! keep it around or compare frames in tests.

use super::style::StyledLine;
use crate::countdown::CountdownView;

/// One rendered frame
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalView {
    /// Lines to draw upward from the baseline, newest first. For a text
    /// terminal the first entry is the input line.
    pub lines: Vec<StyledLine>,
    pub cursor: Option<CursorView>,
    /// None when a graphical program skips the bezel
    pub bezel: Option<BezelView>,
    /// Whether the lines come from a graphical program's own drawing
    pub graphical: bool,
}

impl TerminalView {
    /// The text of the input line, when this is a text frame.
    pub fn input_line(&self) -> Option<&str> {
        if self.graphical {
            return None;
        }
        self.lines.first().map(|line| line.text.as_str())
    }

    /// Line texts, newest first.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.text.as_str())
    }
}

/// Text cursor drawn after the input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorView {
    /// Character column after the input line's text
    pub column: usize,
    /// Filled when the window has focus, outlined otherwise
    pub filled: bool,
}

/// Monitor frame around the screen
#[derive(Debug, Clone, PartialEq)]
pub struct BezelView {
    /// Terminal id shown on the frame label
    pub id: String,
    pub power: Bezel,
    pub countdown: CountdownView,
}

/// Bezel image selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bezel {
    Powered,
    Off,
}
