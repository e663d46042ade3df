use crate::level::{Level, LevelConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Game configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub terminal: TerminalConfig,

    /// Playable levels, in menu order
    #[serde(default = "default_levels")]
    pub levels: Vec<LevelConfig>,
}

/// Terminal behaviour settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Prompt shown before the input line when no program is running
    #[serde(default = "default_prompt")]
    pub prompt: String,

    /// The countdown turns red and starts flashing at this many seconds
    #[serde(default = "default_timer_warning_secs")]
    pub timer_warning_secs: u64,

    /// Delay before a held key starts repeating (ms)
    #[serde(default = "default_key_repeat_initial_delay")]
    pub key_repeat_initial_delay_ms: u64,

    /// Delay between repeats of a held key (ms)
    #[serde(default = "default_key_repeat_delay")]
    pub key_repeat_delay_ms: u64,

    /// Number of lines on screen, including the input line
    #[serde(default = "default_visible_lines")]
    pub visible_lines: usize,
}

fn default_prompt() -> String {
    "$ ".to_string()
}

fn default_timer_warning_secs() -> u64 {
    30
}

fn default_key_repeat_initial_delay() -> u64 {
    500
}

fn default_key_repeat_delay() -> u64 {
    50
}

fn default_visible_lines() -> usize {
    29
}

fn default_levels() -> Vec<LevelConfig> {
    vec![LevelConfig::default_level()]
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            timer_warning_secs: default_timer_warning_secs(),
            key_repeat_initial_delay_ms: default_key_repeat_initial_delay(),
            key_repeat_delay_ms: default_key_repeat_delay(),
            visible_lines: default_visible_lines(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            terminal: TerminalConfig::default(),
            levels: default_levels(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: Config =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path.as_ref(), contents).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Look up a level by name.
    pub fn level(&self, name: &str) -> Option<&LevelConfig> {
        self.levels.iter().find(|level| level.name == name)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.terminal.visible_lines < 2 {
            return Err(ConfigError::ValidationError(
                "visible_lines must be at least 2".to_string(),
            ));
        }

        if self.terminal.key_repeat_delay_ms == 0 {
            return Err(ConfigError::ValidationError(
                "key_repeat_delay_ms must be greater than 0".to_string(),
            ));
        }

        if self.levels.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one level is required".to_string(),
            ));
        }

        for level in &self.levels {
            let live: Level = level.to_level();
            live.validate().map_err(|e| {
                ConfigError::ValidationError(format!("level {:?}: {}", level.name, e))
            })?;
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::ProgramKind;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.terminal.prompt, "$ ");
        assert_eq!(config.terminal.timer_warning_secs, 30);
        assert_eq!(config.terminal.key_repeat_initial_delay_ms, 500);
        assert_eq!(config.terminal.key_repeat_delay_ms, 50);
        assert_eq!(config.terminal.visible_lines, 29);
        assert_eq!(config.levels.len(), 1);
        assert_eq!(config.levels[0].time, 300);
        assert_eq!(config.levels[0].programs["hexedit"], ProgramKind::HexEdit);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.terminal.visible_lines = 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.levels[0].depends.insert(
            "hexedit".to_string(),
            vec!["login".to_string()],
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        let mut config = Config::default();
        config.levels.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str(r##"{ "terminal": { "prompt": "# " } }"##).unwrap();
        assert_eq!(config.terminal.prompt, "# ");
        assert_eq!(config.terminal.visible_lines, 29);
        assert_eq!(config.levels, default_levels());
    }

    #[test]
    fn test_save_and_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mainframe.json");

        let mut config = Config::default();
        config.terminal.prompt = "> ".to_string();
        config.levels[0].time = 90;
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.level("mainframe").map(|l| l.time), Some(90));
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            Config::load_from_file(&missing),
            Err(ConfigError::IoError(_))
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            Config::load_from_file(&broken),
            Err(ConfigError::ParseError(_))
        ));
    }
}
