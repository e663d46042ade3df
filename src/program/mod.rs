//! Puzzle program contract
//!
//! Every hacking challenge the terminal can launch implements
//! [`PuzzleProgram`]. A program owns its private state machine; the terminal
//! drives it through text input, raw events and per-frame ticks, and hands it
//! a [`ProgramHost`] so it can write output or impose penalties without
//! holding a reference back to the terminal.

pub mod hexedit;

use crossterm::event::{KeyEvent, MouseButton};
use ratatui::layout::Position;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use hexedit::DataEditor;

/// Invalid player entry; the program's state is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct BadInput {
    reason: String,
}

impl BadInput {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Upper-case the first character of `s`.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Independent capability flags of a program
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgramProperties {
    /// The program draws itself instead of the scrollback
    pub is_graphical: bool,
    /// Don't draw the monitor bezel over a graphical program
    pub skip_bezel: bool,
    pub hide_cursor: bool,
    /// The program supplies its own output buffer
    pub alternate_buf: bool,
    /// The program reports its own success, so the terminal stays quiet
    pub suppress_success: bool,
    pub allow_ctrl_c: bool,
    /// Raw keypresses go to the program instead of the input line
    pub intercept_keypress: bool,
}

impl ProgramProperties {
    /// Text-driven program that may be aborted with ctrl+c
    pub const fn text() -> Self {
        Self {
            is_graphical: false,
            skip_bezel: false,
            hide_cursor: false,
            alternate_buf: false,
            suppress_success: false,
            allow_ctrl_c: true,
            intercept_keypress: false,
        }
    }
}

/// Callbacks a running program may make into the terminal
pub trait ProgramHost {
    /// Append lines to the terminal output, oldest first.
    fn output(&mut self, lines: Vec<String>);

    /// Reject keyboard input for `duration_ms` as a penalty.
    fn freeze(&mut self, duration_ms: u64);

    /// Shorten the lock-out countdown.
    fn reduce_time(&mut self, secs: u64);

    /// Current terminal time in milliseconds.
    fn time(&self) -> u64;
}

/// One hacking challenge
pub trait PuzzleProgram: fmt::Debug {
    /// Descriptive label, used in blocked/completed messages
    fn label(&self) -> &str;

    /// One-line help shown by the `help` command
    fn help(&self) -> &str;

    fn properties(&self) -> ProgramProperties {
        ProgramProperties::text()
    }

    /// Prompt shown before the input line, or None for no decoration.
    fn prompt(&self) -> Option<String> {
        Some("> ".to_string())
    }

    /// Line written to the terminal when the program exits completed.
    fn success_syslog(&self) -> String {
        format!("<c w>[SYSLOG] {} disabled.", capitalize(self.label()))
    }

    /// Prefix for lines reporting a failed attempt.
    fn failure_prefix(&self) -> String {
        "<c r>[ERROR] ".to_string()
    }

    /// (Re)start the program, resetting its puzzle state.
    fn start(&mut self, host: &mut dyn ProgramHost);

    /// Handle a submitted line of input.
    fn text_input(&mut self, _line: &str, _host: &mut dyn ProgramHost) -> Result<(), BadInput> {
        Ok(())
    }

    fn completed(&self) -> bool;

    fn exited(&self) -> bool;

    /// Per-frame tick while the program is active.
    fn run(&mut self, _host: &mut dyn ProgramHost) {}

    /// Lines to display, newest first, for graphical programs.
    fn draw(&self) -> Vec<String> {
        Vec::new()
    }

    /// The program's own output buffer, newest first, when it uses one.
    fn alternate_buffer(&self) -> Vec<String> {
        Vec::new()
    }

    fn on_keypress(&mut self, _key: KeyEvent, _host: &mut dyn ProgramHost) {}

    fn on_mouseclick(&mut self, _button: MouseButton, _pos: Position, _host: &mut dyn ProgramHost) {
    }

    fn on_mousemove(&mut self, _pos: Position, _host: &mut dyn ProgramHost) {}

    /// Called when the player aborts the program with ctrl+c.
    fn on_abort(&mut self, _host: &mut dyn ProgramHost) {}
}

/// Constructor for a program instance
pub type ProgramFactory = Box<dyn Fn() -> Box<dyn PuzzleProgram>>;

/// Built-in programs that a level file can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramKind {
    #[serde(alias = "dataeditor")]
    HexEdit,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 1] = [ProgramKind::HexEdit];

    pub fn name(self) -> &'static str {
        match self {
            ProgramKind::HexEdit => "hexedit",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Create a fresh instance of this program.
    pub fn build(self) -> Box<dyn PuzzleProgram> {
        match self {
            ProgramKind::HexEdit => Box::new(DataEditor::new()),
        }
    }

    pub fn factory(self) -> ProgramFactory {
        Box::new(move || self.build())
    }
}

impl fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
