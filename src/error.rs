//! Error types for u-tournament

use thiserror::Error;

use crate::config::SchedulingMethod;
use crate::validation::ValidationError;

/// Result type for tournament scheduling operations
pub type Result<T> = std::result::Result<T, ScheduleError>;

/// Errors that can occur while building a timetable
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Configuration or roster failed validation
    #[error("invalid configuration: {}", join_errors(.0))]
    InvalidConfig(Vec<ValidationError>),

    /// The requested scheduling method is recognized but not implemented
    #[error("unsupported scheduling method: {0:?}")]
    UnsupportedMethod(SchedulingMethod),

    /// Seat list handed to the assignment solver has odd length
    #[error("seat list must have even length, got {len}")]
    OddSeatCount { len: usize },

    /// A phase cannot finish inside the event day
    #[error("{phase} is infeasible: {reason}")]
    Infeasible { phase: &'static str, reason: String },

    /// Configuration text could not be decoded
    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ScheduleError {
    pub(crate) fn infeasible(phase: &'static str, reason: impl Into<String>) -> Self {
        ScheduleError::Infeasible {
            phase,
            reason: reason.into(),
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
