//! Shared harness for terminal scenario tests

#![allow(dead_code)]

pub mod tracing;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use mainframe::config::TerminalConfig;
use mainframe::level::Level;
use mainframe::program::{BadInput, ProgramFactory, ProgramHost, ProgramProperties, PuzzleProgram};
use mainframe::services::time_source::TestTimeSource;
use mainframe::terminal::Terminal;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Calls made to a fake program, in order
pub type CallLog = Rc<RefCell<Vec<String>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Scriptable program that records every call it receives.
///
/// Text input drives it: `win` completes and exits, `lose` exits with a
/// freeze penalty, `bad` is rejected, `slow` takes ten seconds off the clock.
#[derive(Debug)]
pub struct FakeProgram {
    label: String,
    props: ProgramProperties,
    log: CallLog,
    completed: bool,
    exited: bool,
}

impl FakeProgram {
    pub fn factory(label: &str, log: &CallLog) -> ProgramFactory {
        Self::factory_with(label, log, ProgramProperties::text())
    }

    pub fn factory_with(label: &str, log: &CallLog, props: ProgramProperties) -> ProgramFactory {
        let label = label.to_string();
        let log = Rc::clone(log);
        Box::new(move || {
            Box::new(FakeProgram {
                label: label.clone(),
                props,
                log: Rc::clone(&log),
                completed: false,
                exited: false,
            })
        })
    }

    fn record(&self, call: impl Into<String>) {
        self.log.borrow_mut().push(call.into());
    }
}

impl PuzzleProgram for FakeProgram {
    fn label(&self) -> &str {
        &self.label
    }

    fn help(&self) -> &str {
        "Fake program."
    }

    fn properties(&self) -> ProgramProperties {
        self.props
    }

    fn start(&mut self, host: &mut dyn ProgramHost) {
        self.record("start");
        self.exited = false;
        host.output(vec![format!("{} engaged", self.label)]);
    }

    fn text_input(&mut self, line: &str, host: &mut dyn ProgramHost) -> Result<(), BadInput> {
        self.record(format!("input:{}", line));
        match line {
            "win" => {
                self.completed = true;
                self.exited = true;
            }
            "lose" => {
                self.exited = true;
                host.freeze(1000);
            }
            "bad" => return Err(BadInput::new("bad thing")),
            "slow" => host.reduce_time(10),
            _ => {}
        }
        Ok(())
    }

    fn completed(&self) -> bool {
        self.completed
    }

    fn exited(&self) -> bool {
        self.exited
    }

    fn draw(&self) -> Vec<String> {
        vec!["<c r>graphic".to_string()]
    }

    fn alternate_buffer(&self) -> Vec<String> {
        vec!["private".to_string()]
    }

    fn on_keypress(&mut self, key: KeyEvent, _host: &mut dyn ProgramHost) {
        self.record(format!("key:{:?}", key.code));
    }

    fn on_abort(&mut self, _host: &mut dyn ProgramHost) {
        self.record("abort");
    }
}

/// A terminal on a manual clock
pub struct Harness {
    pub terminal: Terminal,
    pub time: Arc<TestTimeSource>,
}

impl Harness {
    pub fn new(level: Level) -> Self {
        Self::with_config(level, &TerminalConfig::default())
    }

    pub fn with_config(level: Level, config: &TerminalConfig) -> Self {
        tracing::init_tracing_from_env();
        let time = TestTimeSource::shared();
        let terminal = Terminal::with_time_source(level, config, time.clone()).unwrap();
        Self { terminal, time }
    }

    /// Harness with the boot banner already played.
    pub fn booted(level: Level) -> Self {
        let mut harness = Self::new(level);
        harness.finish_reboot();
        harness
    }

    /// Advance the clock by `ms` and run one frame.
    pub fn step(&mut self, ms: u64) {
        self.time.advance_ms(ms);
        self.terminal.run();
    }

    pub fn finish_reboot(&mut self) {
        for _ in 0..1000 {
            if !self.terminal.rebooting() {
                return;
            }
            self.step(20);
        }
        panic!("reboot never finished");
    }

    /// Press and release a key.
    pub fn press(&mut self, code: KeyCode) {
        self.terminal.on_keypress(KeyEvent::new(code, KeyModifiers::NONE));
        self.terminal.on_keyrelease();
    }

    pub fn ctrl_c(&mut self) {
        self.terminal
            .on_keypress(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        self.terminal.on_keyrelease();
    }

    pub fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.press(KeyCode::Char(c));
        }
    }

    /// Type a line and press Enter.
    pub fn enter(&mut self, text: &str) {
        self.type_text(text);
        self.press(KeyCode::Enter);
    }

    /// Scrollback lines, newest first.
    pub fn output(&self) -> Vec<String> {
        self.terminal
            .scrollback()
            .iter()
            .map(str::to_string)
            .collect()
    }

    pub fn newest(&self) -> String {
        self.terminal
            .scrollback()
            .newest()
            .unwrap_or_default()
            .to_string()
    }
}
