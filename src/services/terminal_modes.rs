//! Terminal mode management
//!
//! The game takes over the whole terminal: raw mode, the alternate screen,
//! mouse capture, focus change reporting and, where supported, keyboard
//! enhancement so that key releases are reported. `TerminalModes` records
//! what was enabled so `undo()` can restore exactly that.

use anyhow::Result;
use crossterm::{
    cursor::{Hide, Show},
    event::{
        DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    ExecutableCommand,
};
use std::io::{stdout, Write};

/// Keyboard enhancement flags to request.
#[derive(Debug, Clone)]
pub struct KeyboardConfig {
    /// Enable CSI-u sequences for unambiguous escape code reading.
    pub disambiguate_escape_codes: bool,
    /// Report key repeat and release events.
    pub report_event_types: bool,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            disambiguate_escape_codes: true,
            report_event_types: true,
        }
    }
}

impl KeyboardConfig {
    pub fn to_flags(&self) -> KeyboardEnhancementFlags {
        let mut flags = KeyboardEnhancementFlags::empty();
        if self.disambiguate_escape_codes {
            flags |= KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES;
        }
        if self.report_event_types {
            flags |= KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
        }
        flags
    }

    pub fn any_enabled(&self) -> bool {
        self.disambiguate_escape_codes || self.report_event_types
    }
}

/// Tracks which terminal modes have been enabled and provides cleanup.
#[derive(Debug, Default)]
pub struct TerminalModes {
    raw_mode: bool,
    alternate_screen: bool,
    mouse_capture: bool,
    focus_change: bool,
    keyboard_enhancement: bool,
    cursor_hidden: bool,
    key_release_events: bool,
}

impl TerminalModes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable all terminal modes, checking support for each.
    ///
    /// On error, any partially enabled modes are undone.
    pub fn enable(keyboard_config: &KeyboardConfig) -> Result<Self> {
        let mut modes = Self::new();

        if let Err(e) = enable_raw_mode() {
            tracing::error!("Failed to enable raw mode: {}", e);
            return Err(e.into());
        }
        modes.raw_mode = true;
        tracing::debug!("Enabled raw mode");

        if keyboard_config.any_enabled() {
            match supports_keyboard_enhancement() {
                Ok(true) => {
                    let flags = keyboard_config.to_flags();
                    if let Err(e) = stdout().execute(PushKeyboardEnhancementFlags(flags)) {
                        tracing::warn!("Failed to enable keyboard enhancement: {}", e);
                    } else {
                        modes.keyboard_enhancement = true;
                        modes.key_release_events = keyboard_config.report_event_types;
                        tracing::debug!("Enabled keyboard enhancement flags: {:?}", flags);
                    }
                }
                Ok(false) => {
                    tracing::info!("Keyboard enhancement not supported by terminal");
                }
                Err(e) => {
                    tracing::warn!("Failed to query keyboard enhancement support: {}", e);
                }
            }
        }

        if let Err(e) = stdout().execute(EnterAlternateScreen) {
            tracing::error!("Failed to enter alternate screen: {}", e);
            modes.undo();
            return Err(e.into());
        }
        modes.alternate_screen = true;
        tracing::debug!("Entered alternate screen");

        // The game draws its own cursor
        if stdout().execute(Hide).is_ok() {
            modes.cursor_hidden = true;
        }

        if let Err(e) = stdout().execute(EnableMouseCapture) {
            tracing::warn!("Failed to enable mouse capture: {}", e);
        } else {
            modes.mouse_capture = true;
            tracing::debug!("Enabled mouse capture");
        }

        if let Err(e) = stdout().execute(EnableFocusChange) {
            tracing::warn!("Failed to enable focus change reporting: {}", e);
        } else {
            modes.focus_change = true;
            tracing::debug!("Enabled focus change reporting");
        }

        Ok(modes)
    }

    /// Restore the terminal by disabling every mode that was enabled.
    ///
    /// Safe to call more than once.
    pub fn undo(&mut self) {
        if self.focus_change {
            let _ = stdout().execute(DisableFocusChange);
            self.focus_change = false;
            tracing::debug!("Disabled focus change reporting");
        }

        if self.mouse_capture {
            let _ = stdout().execute(DisableMouseCapture);
            self.mouse_capture = false;
            tracing::debug!("Disabled mouse capture");
        }

        if self.cursor_hidden {
            let _ = stdout().execute(Show);
            self.cursor_hidden = false;
        }

        if self.keyboard_enhancement {
            let _ = stdout().execute(PopKeyboardEnhancementFlags);
            self.keyboard_enhancement = false;
            self.key_release_events = false;
            tracing::debug!("Popped keyboard enhancement flags");
        }

        // Raw mode goes before leaving the alternate screen for cleaner output
        if self.raw_mode {
            let _ = disable_raw_mode();
            self.raw_mode = false;
            tracing::debug!("Disabled raw mode");
        }

        if self.alternate_screen {
            let _ = stdout().execute(LeaveAlternateScreen);
            self.alternate_screen = false;
            tracing::debug!("Left alternate screen");
        }

        let _ = stdout().flush();
    }

    /// True when the terminal reports key releases, so the host need not
    /// synthesise them.
    pub fn key_release_events(&self) -> bool {
        self.key_release_events
    }

    pub fn raw_mode_enabled(&self) -> bool {
        self.raw_mode
    }

    pub fn alternate_screen_enabled(&self) -> bool {
        self.alternate_screen
    }
}

impl Drop for TerminalModes {
    fn drop(&mut self) {
        self.undo();
    }
}

/// Unconditionally restore terminal state without tracking.
///
/// For panic hooks, where the `TerminalModes` instance is out of reach.
pub fn emergency_cleanup() {
    let _ = stdout().execute(DisableFocusChange);
    let _ = stdout().execute(DisableMouseCapture);
    let _ = stdout().execute(Show);
    let _ = stdout().execute(PopKeyboardEnhancementFlags);
    let _ = disable_raw_mode();
    let _ = stdout().execute(LeaveAlternateScreen);
    let _ = stdout().flush();
}
