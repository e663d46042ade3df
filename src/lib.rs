//! Mainframe: a timed terminal hacking game
//!
//! The library holds the whole game engine; the `mainframe` binary is a thin
//! crossterm host around [`terminal::Terminal`].

pub mod clock;
pub mod config;
pub mod countdown;
pub mod history;
pub mod input;
pub mod level;
pub mod program;
pub mod services;
pub mod terminal;
pub mod ui;
