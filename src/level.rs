//! Level descriptors
//!
//! A level names the commands the terminal offers, the program each command
//! launches, which commands must be completed before others can run, and the
//! time budget. [`Level`] holds live program factories; [`LevelConfig`] is
//! its serialisable form that picks programs from the built-in catalog.

use crate::program::{ProgramFactory, ProgramKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Reasons a level is rejected at terminal construction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("level has no programs")]
    NoPrograms,

    #[error("level time must be greater than zero")]
    NoTime,

    #[error("invalid command name {0:?}")]
    InvalidCommand(String),

    #[error("command {0:?} is registered twice")]
    DuplicateCommand(String),

    #[error("{command} depends on unknown command {missing:?}")]
    UnknownDependency { command: String, missing: String },
}

/// A playable level
pub struct Level {
    /// Time budget in seconds
    pub time: u64,
    pub(crate) programs: Vec<(String, ProgramFactory)>,
    pub(crate) depends: BTreeMap<String, Vec<String>>,
}

impl Level {
    pub fn new(time: u64) -> Self {
        Self {
            time,
            programs: Vec::new(),
            depends: BTreeMap::new(),
        }
    }

    /// Register the program launched by `command`.
    pub fn program(mut self, command: impl Into<String>, factory: ProgramFactory) -> Self {
        self.programs.push((command.into(), factory));
        self
    }

    /// Require every command in `prerequisites` to be completed before `command` runs.
    pub fn depends<I, S>(mut self, command: impl Into<String>, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends
            .entry(command.into())
            .or_default()
            .extend(prerequisites.into_iter().map(Into::into));
        self
    }

    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.programs.iter().map(|(command, _)| command.as_str())
    }

    /// Check the descriptor before any program is built.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.programs.is_empty() {
            return Err(LevelError::NoPrograms);
        }
        if self.time == 0 {
            return Err(LevelError::NoTime);
        }

        for (idx, (command, _)) in self.programs.iter().enumerate() {
            if command.is_empty() || command.contains(char::is_whitespace) {
                return Err(LevelError::InvalidCommand(command.clone()));
            }
            if self.programs[..idx].iter().any(|(other, _)| other == command) {
                return Err(LevelError::DuplicateCommand(command.clone()));
            }
        }

        for (command, prerequisites) in &self.depends {
            if !self.commands().any(|c| c == command) {
                return Err(LevelError::InvalidCommand(command.clone()));
            }
            if let Some(missing) = prerequisites
                .iter()
                .find(|p| !self.commands().any(|c| c == p.as_str()))
            {
                tracing::warn!(%command, %missing, "level dependency names an unknown command");
                return Err(LevelError::UnknownDependency {
                    command: command.clone(),
                    missing: missing.clone(),
                });
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Level")
            .field("time", &self.time)
            .field("commands", &self.commands().collect::<Vec<_>>())
            .field("depends", &self.depends)
            .finish()
    }
}

/// Serialisable level description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    #[serde(default)]
    pub name: String,

    /// Time budget in seconds
    #[serde(default = "default_level_time")]
    pub time: u64,

    /// Command name to built-in program
    pub programs: BTreeMap<String, ProgramKind>,

    /// Command name to the commands it waits on
    #[serde(default)]
    pub depends: BTreeMap<String, Vec<String>>,
}

fn default_level_time() -> u64 {
    300
}

impl LevelConfig {
    /// The level used when no configuration is supplied.
    pub fn default_level() -> Self {
        Self {
            name: "mainframe".to_string(),
            time: default_level_time(),
            programs: BTreeMap::from([("hexedit".to_string(), ProgramKind::HexEdit)]),
            depends: BTreeMap::new(),
        }
    }

    /// Build the live level.
    pub fn to_level(&self) -> Level {
        let mut level = Level::new(self.time);
        for (command, kind) in &self.programs {
            level = level.program(command.clone(), kind.factory());
        }
        for (command, prerequisites) in &self.depends {
            level = level.depends(command.clone(), prerequisites.iter().cloned());
        }
        level
    }
}
