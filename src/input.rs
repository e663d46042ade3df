//! Keyboard event helpers
//!
//! The terminal consumes crossterm key events directly. These helpers decide
//! which events count as typed text and which trigger the abort shortcut.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Characters that may be typed into the input line: ASCII letters, digits,
/// punctuation and space.
pub fn is_accepted_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_ascii_punctuation() || c == ' '
}

/// The character a keypress types, if it types an accepted one.
///
/// Presses holding Control or Alt never type text.
pub fn typed_char(event: &KeyEvent) -> Option<char> {
    if event
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }
    match event.code {
        KeyCode::Char(c) if is_accepted_char(c) => Some(c),
        _ => None,
    }
}

/// Whether the event is Control+C.
pub fn is_ctrl_c(event: &KeyEvent) -> bool {
    matches!(event.code, KeyCode::Char('c') | KeyCode::Char('C'))
        && event.modifiers.contains(KeyModifiers::CONTROL)
}

/// Whether the event navigates command history.
pub fn is_history_key(event: &KeyEvent) -> bool {
    matches!(event.code, KeyCode::Up | KeyCode::Down)
}
