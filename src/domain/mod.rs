/// Domain module containing core business logic and data types
///
/// This module defines the core entities (Habit, Mood, LogEntry), the rules
/// that turn user interactions into log rows, and the derived views
/// computed from them.

pub mod habit;
pub mod mood;
pub mod entry;
pub mod stats;
pub mod types;

// Re-export public types for easy access
pub use habit::*;
pub use mood::*;
pub use entry::*;
pub use stats::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid habit name: {0}")]
    InvalidHabitName(String),

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },
}
