/// MCP tools for habits, moods, sessions and stats
///
/// This module contains all the MCP tools that external clients can call to
/// interact with the tracker. Each tool takes the state holder it works on
/// and returns a response with a human-readable `message`.

pub mod habits;
pub mod log;
pub mod mood;
pub mod settings;
pub mod stats;
pub mod timer;

// Re-export tool functions for easy access
pub use habits::*;
pub use log::*;
pub use mood::*;
pub use settings::*;
pub use stats::*;
pub use timer::*;
