pub mod time_source;

#[cfg(feature = "runtime")]
pub mod terminal_modes;
#[cfg(feature = "runtime")]
pub mod tracing_setup;
