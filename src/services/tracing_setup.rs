//! Tracing subscriber setup
//!
//! The game runs in raw mode on the alternate screen, so logs never go to the
//! terminal. Everything is written to a log file instead.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Log file used when none is given on the command line.
pub fn default_log_path() -> PathBuf {
    std::env::temp_dir().join("mainframe.log")
}

/// Initialize the global tracing subscriber, logging to `log_file_path`.
///
/// Filtering follows `RUST_LOG`, with DEBUG as the default level.
pub fn init_global(log_file_path: &Path) -> anyhow::Result<()> {
    let log_file = File::create(log_file_path)?;
    build_subscriber(log_file).try_init()?;
    Ok(())
}

/// Build a subscriber that writes formatted events to `log_file`.
pub fn build_subscriber(log_file: File) -> impl tracing::Subscriber + Send + Sync {
    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into());

    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_events_are_written_to_log_file() {
        let log_file = NamedTempFile::new().unwrap();
        let subscriber = build_subscriber(log_file.reopen().unwrap());

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(command = "hexedit", "starting program");
            tracing::info!("terminal locked out");
        });

        let contents = std::fs::read_to_string(log_file.path()).unwrap();
        assert!(contents.contains("DEBUG"));
        assert!(contents.contains("starting program"));
        assert!(contents.contains("command=\"hexedit\""));
        assert!(contents.contains("terminal locked out"));
    }

    #[test]
    fn test_default_log_path_is_in_temp_dir() {
        let path = default_log_path();
        assert!(path.starts_with(std::env::temp_dir()));
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("mainframe.log"));
    }
}
