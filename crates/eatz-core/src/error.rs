//! Typed errors for event date and clock parsing.

use thiserror::Error;

/// Raised when a record's `DATE`, `STARTTIME` or `ENDTIME` cannot be turned
/// into an instant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("clock time is empty")]
    Empty,

    #[error("clock time '{0}' is missing an AM/PM modifier")]
    MissingModifier(String),

    #[error("clock time '{input}' has unknown modifier '{modifier}'")]
    UnknownModifier { input: String, modifier: String },

    #[error("clock time '{0}' is not in H:MM form")]
    MissingColon(String),

    #[error("clock time '{0}' has a non-numeric hour")]
    InvalidHour(String),

    #[error("clock time '{input}' has hour {hour} outside 1..=12")]
    HourOutOfRange { input: String, hour: u32 },

    #[error("clock time '{0}' has an invalid minute")]
    InvalidMinute(String),

    #[error("event date '{0}' is not a YYYY-MM-DD calendar date")]
    InvalidDate(String),

    #[error("{date} {time} does not exist in timezone {zone}")]
    NonexistentLocalTime {
        date: String,
        time: String,
        zone: String,
    },
}
