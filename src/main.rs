use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use crossterm::event::{
    poll as event_poll, read as event_read, Event as CrosstermEvent, KeyCode, KeyEventKind,
    MouseEventKind,
};
use mainframe::config::Config;
use mainframe::services::terminal_modes::{self, KeyboardConfig, TerminalModes};
use mainframe::services::tracing_setup;
use mainframe::terminal::view::Bezel;
use mainframe::terminal::Terminal;
use mainframe::ui;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Position;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::time::Duration;

const FRAME_DURATION: Duration = Duration::from_millis(16);

/// How long the final screen stays up before the game exits
const END_SCREEN: Duration = Duration::from_millis(1500);

/// Hack into the mainframe before the countdown locks you out
#[derive(Parser, Debug)]
#[command(name = "mainframe")]
#[command(about = "A timed terminal hacking game", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Level to play (default: the first level in the configuration)
    #[arg(long, value_name = "NAME")]
    level: Option<String>,

    /// Override the level's time budget, in seconds
    #[arg(long, value_name = "SECS")]
    time: Option<u64>,

    /// Path to log file (default: system temp dir)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    LockedOut,
    Granted,
}

impl Outcome {
    fn message(self) -> &'static str {
        match self {
            Outcome::LockedOut => "You have been locked out",
            Outcome::Granted => "Access Granted",
        }
    }
}

fn load_config(args: &Args) -> AnyhowResult<Config> {
    let config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn build_terminal(args: &Args, config: &Config) -> AnyhowResult<Terminal> {
    let mut level = match &args.level {
        Some(name) => config
            .level(name)
            .with_context(|| format!("No level named {:?}", name))?
            .clone(),
        None => config
            .levels
            .first()
            .context("Configuration has no levels")?
            .clone(),
    };
    if let Some(time) = args.time {
        level.time = time;
    }

    tracing::info!(level = %level.name, time = level.time, "starting level");
    let terminal = Terminal::new(level.to_level(), &config.terminal)
        .with_context(|| format!("Invalid level {:?}", level.name))?;
    Ok(terminal)
}

fn run_game(
    terminal: &mut Terminal,
    screen: &mut ratatui::Terminal<CrosstermBackend<io::Stdout>>,
    key_release_events: bool,
) -> AnyhowResult<Outcome> {
    loop {
        while event_poll(Duration::ZERO)? {
            handle_event(terminal, event_read()?, key_release_events);
        }

        terminal.run();

        if terminal.locked() {
            return Ok(Outcome::LockedOut);
        }
        if terminal.completed() {
            return Ok(Outcome::Granted);
        }

        let view = terminal.render();
        screen.draw(|frame| ui::draw(frame, &view))?;

        // Waits for the next event or the end of the frame
        event_poll(FRAME_DURATION)?;
    }
}

fn handle_event(terminal: &mut Terminal, event: CrosstermEvent, key_release_events: bool) {
    match event {
        CrosstermEvent::Key(key) => match key.kind {
            KeyEventKind::Press => {
                if key.code == KeyCode::Esc {
                    let paused = !terminal.paused();
                    terminal.set_paused(paused);
                    return;
                }
                if terminal.paused() {
                    return;
                }
                terminal.on_keypress(key);
                if !key_release_events {
                    // Without release reports every press counts as released
                    terminal.on_keyrelease();
                }
            }
            KeyEventKind::Release => terminal.on_keyrelease(),
            KeyEventKind::Repeat => {}
        },
        CrosstermEvent::Mouse(mouse) => {
            let pos = Position::new(mouse.column, mouse.row);
            match mouse.kind {
                MouseEventKind::Down(button) => terminal.on_mouseclick(button, pos),
                MouseEventKind::Moved | MouseEventKind::Drag(_) => terminal.on_mousemove(pos),
                _ => {}
            }
        }
        CrosstermEvent::FocusGained => terminal.on_focus_change(true),
        CrosstermEvent::FocusLost => terminal.on_focus_change(false),
        _ => {}
    }
}

fn show_end_screen(
    terminal: &Terminal,
    screen: &mut ratatui::Terminal<CrosstermBackend<io::Stdout>>,
    outcome: Outcome,
) -> AnyhowResult<()> {
    let power = match outcome {
        Outcome::LockedOut => Bezel::Off,
        Outcome::Granted => Bezel::Powered,
    };
    let bezel = terminal.bezel(power);
    screen.draw(|frame| ui::draw_message(frame, &bezel, outcome.message()))?;
    std::thread::sleep(END_SCREEN);
    Ok(())
}

fn main() -> AnyhowResult<()> {
    let args = Args::parse();

    let config = load_config(&args)?;

    if args.dump_config {
        let json = serde_json::to_string_pretty(&config)?;
        println!("{}", json);
        return Ok(());
    }

    let log_file = args
        .log_file
        .clone()
        .unwrap_or_else(tracing_setup::default_log_path);
    if let Err(e) = tracing_setup::init_global(&log_file) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    let mut terminal = build_terminal(&args, &config)?;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        terminal_modes::emergency_cleanup();
        original_hook(panic);
    }));

    let mut modes = TerminalModes::enable(&KeyboardConfig::default())?;
    let mut screen = ratatui::Terminal::new(CrosstermBackend::new(stdout()))?;
    screen.clear()?;

    let result = run_game(&mut terminal, &mut screen, modes.key_release_events()).and_then(
        |outcome| {
            show_end_screen(&terminal, &mut screen, outcome)?;
            Ok(outcome)
        },
    );

    modes.undo();

    let outcome = result?;
    tracing::info!(?outcome, "session ended");
    println!("{}", outcome.message());
    Ok(())
}
