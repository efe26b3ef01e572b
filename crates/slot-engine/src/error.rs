//! Error types for slot-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// A time string, date, or range failed structural parsing.
    #[error("Invalid format: {0}")]
    Format(String),

    /// Static configuration handed to the codec or planner is unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
