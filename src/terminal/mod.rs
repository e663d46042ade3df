//! The hacking terminal
//!
//! [`Terminal`] owns the scrollback, the input line, the registered puzzle
//! programs and every timer of a session. The host feeds it input events,
//! calls [`Terminal::run`] once per frame and draws whatever
//! [`Terminal::render`] returns. The session ends when [`Terminal::locked`]
//! or [`Terminal::completed`] becomes true.
//!
//! Programs never hold a reference back to the terminal. The terminal keeps
//! the state programs may touch in a separate [`Console`] and lends that to
//! the active program as its [`ProgramHost`].

pub mod scrollback;
pub mod style;
pub mod view;

use crate::clock::Clock;
use crate::config::TerminalConfig;
use crate::countdown::CountdownTimer;
use crate::history::CommandHistory;
use crate::input;
use crate::level::{Level, LevelError};
use crate::program::{capitalize, ProgramHost, PuzzleProgram};
use crate::services::time_source::{RealTimeSource, SharedTimeSource};
use crossterm::event::{KeyCode, KeyEvent, MouseButton};
use rand::Rng;
use ratatui::layout::Position;
use ratatui::style::Color;
use std::collections::VecDeque;
use thiserror::Error;

use scrollback::ScrollbackBuffer;
use style::{StyledLine, TEXT_COLOUR};
use view::{Bezel, BezelView, CursorView, TerminalView};

pub const CURSOR_ON_MS: u64 = 800;
pub const CURSOR_OFF_MS: u64 = 600;

/// Cells in the freeze progress bar
pub const PROGRESS_BAR_SIZE: usize = 30;

/// Pause between reboot banner lines
const REBOOT_PAUSE_MS: u64 = 20;
const REBOOT_RULE_WIDTH: usize = 60;

const ID_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ID_LEN: usize = 4;

/// Rejected argument to the `colour` command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColourError {
    #[error("expected 3 colour components, got {0}")]
    Arity(usize),

    #[error("invalid colour component {0:?}")]
    Component(String),
}

/// Parse `"r g b"` into a colour; each component must be in 0..=255.
pub fn parse_colour(args: &str) -> Result<Color, ColourError> {
    let parts: Vec<&str> = args.split(' ').collect();
    if parts.len() != 3 {
        return Err(ColourError::Arity(parts.len()));
    }

    let mut rgb = [0u8; 3];
    for (slot, part) in rgb.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| ColourError::Component(part.to_string()))?;
    }
    Ok(Color::Rgb(rgb[0], rgb[1], rgb[2]))
}

/// Longest common prefix of `words`, on character boundaries.
fn common_prefix(words: &[&str]) -> String {
    let Some((first, rest)) = words.split_first() else {
        return String::new();
    };

    let mut prefix: &str = first;
    for word in rest {
        let end = prefix
            .char_indices()
            .zip(word.chars())
            .find(|((_, a), b)| a != b)
            .map(|((idx, _), _)| idx)
            .unwrap_or_else(|| prefix.len().min(word.len()));
        prefix = &prefix[..end];
    }
    prefix.to_string()
}

/// Input penalty window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Freeze {
    start: u64,
    duration: u64,
}

impl Freeze {
    fn expired(&self, now: u64) -> bool {
        now.saturating_sub(self.start) > self.duration
    }

    /// Draining progress bar shown in place of the input line.
    fn progress_bar(&self, now: u64) -> String {
        let remain = if self.duration == 0 {
            0
        } else {
            let done = now.saturating_sub(self.start) as f64 * 100.0 / self.duration as f64;
            let remain = ((100.0 - done) * PROGRESS_BAR_SIZE as f64 / 100.0) as i64;
            remain.clamp(0, PROGRESS_BAR_SIZE as i64) as usize
        };
        format!(
            "[{}{}]",
            "!".repeat(PROGRESS_BAR_SIZE - remain),
            " ".repeat(remain)
        )
    }
}

/// Terminal state that the active program may reach through [`ProgramHost`]
#[derive(Debug)]
struct Console {
    buf: ScrollbackBuffer,
    clock: Clock,
    countdown: CountdownTimer,
    freeze: Option<Freeze>,
}

impl ProgramHost for Console {
    fn output(&mut self, lines: Vec<String>) {
        self.buf.extend(lines);
    }

    fn freeze(&mut self, duration_ms: u64) {
        tracing::debug!(duration_ms, "terminal frozen");
        self.freeze = Some(Freeze {
            start: self.clock.time(),
            duration: duration_ms,
        });
    }

    fn reduce_time(&mut self, secs: u64) {
        tracing::debug!(secs, "countdown reduced");
        self.countdown.update(secs.saturating_mul(1000));
    }

    fn time(&self) -> u64 {
        self.clock.time()
    }
}

#[derive(Debug)]
struct RegisteredProgram {
    command: String,
    program: Box<dyn PuzzleProgram>,
    /// Commands that must be completed first
    depends: Vec<String>,
}

/// Key being held down for auto-repeat
#[derive(Debug, Clone, Copy)]
struct HeldKey {
    event: KeyEvent,
    start: u64,
}

#[derive(Debug)]
pub struct Terminal {
    console: Console,
    /// Sorted by command name
    programs: Vec<RegisteredProgram>,
    /// Index into `programs` of the running program
    current: Option<usize>,

    /// Input line without the prompt
    current_line: String,
    prompt: String,
    history: CommandHistory,

    reboot_queue: VecDeque<(u64, String)>,
    reboot_update_time: u64,

    held_key: Option<HeldKey>,
    key_last_repeat: Option<u64>,

    has_focus: bool,
    locked: bool,
    text_colour: Color,
    id_string: String,
    settings: TerminalConfig,
}

impl Terminal {
    /// Create a terminal for `level` driven by the system clock.
    pub fn new(level: Level, settings: &TerminalConfig) -> Result<Self, LevelError> {
        Self::with_time_source(level, settings, RealTimeSource::shared())
    }

    /// Create a terminal whose clock reads from `source`.
    ///
    /// Every program is built here and the reboot banner starts playing.
    pub fn with_time_source(
        level: Level,
        settings: &TerminalConfig,
        source: SharedTimeSource,
    ) -> Result<Self, LevelError> {
        level.validate()?;

        let Level {
            time,
            programs,
            depends,
        } = level;

        let mut programs: Vec<RegisteredProgram> = programs
            .into_iter()
            .map(|(command, factory)| RegisteredProgram {
                depends: depends.get(&command).cloned().unwrap_or_default(),
                program: factory(),
                command,
            })
            .collect();
        programs.sort_by(|a, b| a.command.cmp(&b.command));

        let mut rng = rand::thread_rng();
        let id_string: String = (0..ID_LEN)
            .map(|_| ID_CHARS[rng.gen_range(0..ID_CHARS.len())] as char)
            .collect();

        let mut terminal = Self {
            console: Console {
                buf: ScrollbackBuffer::new(),
                clock: Clock::with_source(source),
                countdown: CountdownTimer::new(time, settings.timer_warning_secs),
                freeze: None,
            },
            programs,
            current: None,
            current_line: String::new(),
            prompt: settings.prompt.clone(),
            history: CommandHistory::new(),
            reboot_queue: VecDeque::new(),
            reboot_update_time: 0,
            held_key: None,
            key_last_repeat: None,
            has_focus: true,
            locked: false,
            text_colour: TEXT_COLOUR,
            id_string,
            settings: settings.clone(),
        };

        tracing::debug!(
            id = %terminal.id_string,
            commands = ?terminal.commands().collect::<Vec<_>>(),
            time,
            "terminal created"
        );
        terminal.reboot("");
        Ok(terminal)
    }

    /// Random identifier shown on the bezel label.
    pub fn id_string(&self) -> &str {
        &self.id_string
    }

    /// Registered command names, sorted.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.programs.iter().map(|entry| entry.command.as_str())
    }

    /// The program registered under `command`.
    pub fn program(&self, command: &str) -> Option<&dyn PuzzleProgram> {
        self.find(command).map(|id| self.programs[id].program.as_ref())
    }

    /// Command name of the running program.
    pub fn active_command(&self) -> Option<&str> {
        self.current.map(|id| self.programs[id].command.as_str())
    }

    /// True once the countdown has run out.
    pub fn locked(&self) -> bool {
        self.locked
    }

    /// True when every registered program is completed.
    pub fn completed(&self) -> bool {
        self.programs.iter().all(|entry| entry.program.completed())
    }

    pub fn paused(&self) -> bool {
        self.console.clock.paused()
    }

    pub fn set_paused(&mut self, paused: bool) {
        tracing::debug!(paused, "pause toggled");
        self.console.clock.set_paused(paused);
    }

    /// Terminal time in milliseconds.
    pub fn time(&self) -> u64 {
        self.console.clock.time()
    }

    pub fn rebooting(&self) -> bool {
        !self.reboot_queue.is_empty()
    }

    pub fn frozen(&self) -> bool {
        self.console.freeze.is_some()
    }

    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    pub fn text_colour(&self) -> Color {
        self.text_colour
    }

    pub fn countdown(&self) -> &CountdownTimer {
        &self.console.countdown
    }

    pub fn scrollback(&self) -> &ScrollbackBuffer {
        &self.console.buf
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    /// The input line, optionally decorated with the active prompt.
    pub fn current_line(&self, include_prompt: bool) -> String {
        if !include_prompt {
            return self.current_line.clone();
        }

        let prompt = match self.current {
            Some(id) => self.programs[id].program.prompt(),
            None => Some(self.prompt.clone()),
        };
        match prompt {
            Some(prompt) => format!("{}{}", prompt, self.current_line),
            None => self.current_line.clone(),
        }
    }

    /// Replace the input line. The prompt is added on display.
    pub fn set_current_line(&mut self, line: impl Into<String>) {
        self.current_line = line.into();
    }

    /// Append lines to the scrollback, oldest first.
    pub fn output<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.console.buf.extend(lines);
    }

    /// Ignore keyboard input for `duration_ms`.
    pub fn freeze(&mut self, duration_ms: u64) {
        self.console.freeze(duration_ms);
    }

    /// Take `secs` off the countdown.
    pub fn reduce_time(&mut self, secs: u64) {
        self.console.reduce_time(secs);
    }

    /// Clear the screen and play the boot banner, followed by `msg` if given.
    ///
    /// A banner that is still playing is replaced.
    pub fn reboot(&mut self, msg: &str) {
        self.console.buf.clear();
        self.reboot_update_time = self.time();

        let rule = "-".repeat(REBOOT_RULE_WIDTH);
        let mut queue: Vec<(u64, String)> = vec![
            (REBOOT_PAUSE_MS, rule.clone()),
            (REBOOT_PAUSE_MS, "Mainframe terminal".to_string()),
            (REBOOT_PAUSE_MS, String::new()),
            (
                REBOOT_PAUSE_MS,
                format!(
                    "You have {}s to login before terminal is locked down.",
                    self.console.countdown.secs_left()
                ),
            ),
            (REBOOT_PAUSE_MS, String::new()),
            (
                REBOOT_PAUSE_MS,
                "Tip of the day: press ctrl+c to cancel current command.".to_string(),
            ),
            (REBOOT_PAUSE_MS, rule),
        ];

        if !msg.is_empty() {
            queue.push((REBOOT_PAUSE_MS * 25, String::new()));
            queue.push((REBOOT_PAUSE_MS * 50, msg.to_string()));
        }

        let trailer = if self.find("login").is_some() {
            "Type 'login' to log in, or 'help' to list available commands"
        } else {
            "Type 'help' to list available commands"
        };

        // Fill the screen, leaving room for the trailer and the input line
        let blanks = self.settings.visible_lines.saturating_sub(queue.len() + 2);
        queue.extend(std::iter::repeat((REBOOT_PAUSE_MS, String::new())).take(blanks));
        queue.push((REBOOT_PAUSE_MS, trailer.to_string()));

        tracing::debug!(lines = queue.len(), %msg, "rebooting");
        self.reboot_queue = queue.into();
    }

    pub fn on_keypress(&mut self, key: KeyEvent) {
        // A fresh press restarts the repeat delay
        self.key_last_repeat = None;
        self.handle_keypress(key);
    }

    pub fn on_keyrelease(&mut self) {
        self.held_key = None;
        self.key_last_repeat = None;
    }

    pub fn on_mouseclick(&mut self, button: MouseButton, pos: Position) {
        if let Some(id) = self.current {
            self.programs[id]
                .program
                .on_mouseclick(button, pos, &mut self.console);
        }
    }

    pub fn on_mousemove(&mut self, pos: Position) {
        if let Some(id) = self.current {
            self.programs[id].program.on_mousemove(pos, &mut self.console);
        }
    }

    pub fn on_focus_change(&mut self, gained: bool) {
        self.has_focus = gained;
    }

    /// Advance every timer by one frame.
    pub fn run(&mut self) {
        self.console.clock.update();
        if self.console.clock.paused() {
            return;
        }

        self.run_reboot();
        self.handle_program_exit();

        let frametime = self.console.clock.frametime();
        self.console.countdown.update(frametime);
        if self.console.countdown.ended() && !self.locked {
            tracing::info!(id = %self.id_string, "terminal locked out");
            self.locked = true;
        }

        let now = self.time();
        if self.console.freeze.is_some_and(|freeze| freeze.expired(now)) {
            tracing::debug!("freeze expired");
            self.console.freeze = None;
            self.reset_prompt();
        }

        self.run_key_repeat();

        if let Some(id) = self.current {
            self.programs[id].program.run(&mut self.console);
        }
    }

    /// Snapshot of what should be on screen now.
    pub fn render(&self) -> TerminalView {
        let active = self.current.map(|id| self.programs[id].program.as_ref());
        let props = active.map(|program| program.properties()).unwrap_or_default();

        if let Some(program) = active.filter(|_| props.is_graphical) {
            return TerminalView {
                lines: program
                    .draw()
                    .iter()
                    .map(|line| StyledLine::parse(line, self.text_colour))
                    .collect(),
                cursor: None,
                bezel: (!props.skip_bezel).then(|| self.bezel(Bezel::Powered)),
                graphical: true,
            };
        }

        let now = self.time();
        let input_line = if self.rebooting() {
            String::new()
        } else if let Some(freeze) = self.console.freeze {
            freeze.progress_bar(now)
        } else {
            self.current_line(true)
        };

        let buf: Vec<String> = match active {
            Some(program) if props.alternate_buf => program.alternate_buffer(),
            _ => self.console.buf.iter().map(str::to_string).collect(),
        };

        let lines: Vec<StyledLine> = std::iter::once(input_line)
            .chain(buf)
            .take(self.settings.visible_lines)
            .map(|line| StyledLine::parse(&line, self.text_colour))
            .collect();

        let cursor_on = !props.hide_cursor
            && !self.rebooting()
            && now % (CURSOR_ON_MS + CURSOR_OFF_MS) < CURSOR_ON_MS;
        let cursor = cursor_on.then(|| CursorView {
            column: lines.first().map_or(0, |line| line.text.chars().count()),
            filled: self.has_focus,
        });

        TerminalView {
            lines,
            cursor,
            bezel: Some(self.bezel(Bezel::Powered)),
            graphical: false,
        }
    }

    /// The monitor frame with the countdown, for the given power state.
    pub fn bezel(&self, power: Bezel) -> BezelView {
        BezelView {
            id: self.id_string.clone(),
            power,
            countdown: self.console.countdown.view(),
        }
    }

    fn find(&self, command: &str) -> Option<usize> {
        self.programs
            .binary_search_by(|entry| entry.command.as_str().cmp(command))
            .ok()
    }

    fn reset_prompt(&mut self) {
        self.current_line.clear();
    }

    fn handle_keypress(&mut self, key: KeyEvent) {
        if self.frozen() || self.rebooting() {
            return;
        }

        if !input::is_history_key(&key) {
            self.history.reset_navigation();
        }

        if input::is_ctrl_c(&key) {
            self.abort();
            return;
        }

        if let Some(id) = self.current {
            let props = self.programs[id].program.properties();
            if props.is_graphical || props.intercept_keypress {
                self.programs[id].program.on_keypress(key, &mut self.console);
                return;
            }
        }

        let mut repeat_on_hold = false;
        match key.code {
            KeyCode::Enter => {
                if !self.current_line(true).is_empty() {
                    self.complete_input();
                }
            }
            KeyCode::Backspace => {
                self.current_line.pop();
                repeat_on_hold = true;
            }
            KeyCode::Up | KeyCode::Down => {
                if self.current.is_none() {
                    let up = key.code == KeyCode::Up;
                    if let Some(line) = self.history.navigate(up, &self.current_line) {
                        self.current_line = line;
                    }
                }
            }
            KeyCode::Tab => self.tab_complete(),
            _ => {
                if let Some(c) = input::typed_char(&key) {
                    self.current_line.push(c);
                    repeat_on_hold = true;
                }
            }
        }

        if repeat_on_hold {
            self.held_key = Some(HeldKey {
                event: key,
                start: self.time(),
            });
        }
    }

    fn abort(&mut self) {
        let line = self.current_line(true);

        if let Some(id) = self.current {
            let entry = &mut self.programs[id];
            if !entry.program.properties().allow_ctrl_c {
                return;
            }
            tracing::debug!(command = %entry.command, "program aborted");
            entry.program.on_abort(&mut self.console);
            self.current = None;
        }

        self.console.output(vec![format!("{}^C", line)]);
        self.reset_prompt();
    }

    fn complete_input(&mut self) {
        let echoed = self.current_line(true);
        self.console.output(vec![echoed]);

        let line = self.current_line.trim().to_string();
        if let Some(id) = self.current {
            let entry = &mut self.programs[id];
            if let Err(err) = entry.program.text_input(&line, &mut self.console) {
                tracing::debug!(command = %entry.command, reason = %err, "bad input");
                self.console.output(vec![format!("Error: {}", err)]);
            }
        } else {
            if !line.is_empty() {
                self.history.add_command(&line);
            }
            self.process_command(&line);
        }

        self.reset_prompt();
    }

    fn process_command(&mut self, cmd: &str) {
        if let Some(id) = self.find(cmd) {
            let blocked = self.blocked_on(id);
            if !blocked.is_empty() {
                tracing::debug!(%cmd, ?blocked, "command blocked");
                self.console.output(vec![format!(
                    "{} currently blocked by: {}",
                    cmd,
                    blocked.join(", ")
                )]);
                return;
            }

            let entry = &mut self.programs[id];
            if entry.program.completed() {
                let msg = format!("{} already completed!", entry.program.label());
                self.console.output(vec![capitalize(&msg)]);
            } else {
                tracing::debug!(%cmd, "starting program");
                self.current = Some(id);
                entry.program.start(&mut self.console);
            }
        } else if cmd == "help" || cmd == "?" {
            let mut lines = vec!["Available commands:".to_string()];
            lines.extend(
                self.programs
                    .iter()
                    .map(|entry| format!("  {:10}   {}", entry.command, entry.program.help())),
            );
            self.console.output(lines);
        } else if let Some(args) = cmd.strip_prefix("colour ") {
            let reply = match parse_colour(args) {
                Ok(colour) => {
                    self.text_colour = colour;
                    "Enjoy your new colour!"
                }
                Err(err) => {
                    tracing::debug!(%err, "colour rejected");
                    "I am not familiar with that colour code."
                }
            };
            self.console.output(vec![reply.to_string()]);
        } else if let Some(arg) = cmd.strip_prefix("freeze ") {
            match arg.split(' ').next().and_then(|t| t.parse::<u64>().ok()) {
                Some(duration) => self.console.freeze(duration),
                None => self.console.output(vec!["Invalid time".to_string()]),
            }
        } else if !cmd.is_empty() {
            self.console
                .output(vec![format!("Unknown command '{}'.", cmd)]);
        }
    }

    /// Labels of the uncompleted prerequisites of a program.
    fn blocked_on(&self, id: usize) -> Vec<String> {
        self.programs[id]
            .depends
            .iter()
            .filter_map(|dep| self.find(dep))
            .filter(|&dep| !self.programs[dep].program.completed())
            .map(|dep| self.programs[dep].program.label().to_string())
            .collect()
    }

    fn tab_complete(&mut self) {
        if self.current.is_some() {
            return;
        }

        let partial = self.current_line.clone();
        let matches: Vec<String> = self
            .commands()
            .chain(std::iter::once("help"))
            .filter(|cmd| cmd.starts_with(partial.as_str()))
            .map(str::to_string)
            .collect();

        match matches.as_slice() {
            [] => {}
            [only] => self.current_line = only.clone(),
            _ => {
                let refs: Vec<&str> = matches.iter().map(String::as_str).collect();
                let prefix = common_prefix(&refs);
                if prefix != partial {
                    self.current_line = prefix;
                } else {
                    let echoed = self.current_line(true);
                    self.console.output(vec![echoed, refs.join("  ")]);
                }
            }
        }
    }

    fn run_reboot(&mut self) {
        if self.reboot_queue.is_empty() || self.reboot_update_time > self.time() {
            return;
        }

        if let Some((pause, line)) = self.reboot_queue.pop_front() {
            self.console.output(vec![line]);
            if self.reboot_queue.is_empty() {
                tracing::debug!("reboot finished");
            } else {
                // Lateness carries over, so a late line shortens the next pause
                self.reboot_update_time += pause;
            }
        }
    }

    fn handle_program_exit(&mut self) {
        let Some(id) = self.current else {
            return;
        };
        let entry = &self.programs[id];
        if !entry.program.exited() {
            return;
        }

        let completed = entry.program.completed();
        tracing::debug!(command = %entry.command, completed, "program exited");
        if completed && !entry.program.properties().suppress_success {
            let syslog = entry.program.success_syslog();
            self.console.output(vec![syslog]);
        }

        self.current = None;
        self.reset_prompt();

        if self.completed() {
            tracing::info!(id = %self.id_string, "all programs completed");
        }
    }

    fn run_key_repeat(&mut self) {
        let Some(held) = self.held_key else {
            return;
        };

        let now = self.time();
        let (last, delay) = match self.key_last_repeat {
            None => (held.start, self.settings.key_repeat_initial_delay_ms),
            Some(last) => (last, self.settings.key_repeat_delay_ms),
        };

        if now.saturating_sub(last) > delay {
            self.key_last_repeat = Some(now);
            self.handle_keypress(held.event);
        }
    }
}
