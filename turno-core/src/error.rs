//! Error types for turno.

use thiserror::Error;

/// Errors that can occur while computing availability or booking a meeting.
#[derive(Error, Debug)]
pub enum TurnoError {
    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid time '{0}'. Expected HH:mm (24-hour)")]
    InvalidTime(String),

    #[error("Invalid booking request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Calendar error: {0}")]
    Calendar(String),

    #[error("Calendar request timed out after {0}s")]
    CalendarTimeout(u64),

    #[error("Calendar is unavailable: {0}")]
    CalendarUnavailable(String),

    #[error("Event already exists: {0}")]
    DuplicateEvent(String),
}

/// Result type alias for turno operations.
pub type TurnoResult<T> = Result<T, TurnoError>;
