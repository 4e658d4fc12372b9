//! Error types for timer operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading, changing or saving timers.
#[derive(Debug, Error)]
pub enum TimerError {
    #[error("malformed timer record on line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("timer {label} doesn't exist")]
    NotFound { label: String },

    #[error("timer {label} (id {id}) {reason}")]
    InvalidState {
        label: String,
        id: u32,
        reason: &'static str,
    },

    #[error("timer {label} (id {id}) is unfinished, finish it before creating a new one")]
    Conflict { label: String, id: u32 },

    #[error("invalid time format {format:?}")]
    InvalidFormat { format: String },

    #[error("failed to read a selection")]
    Input(#[source] std::io::Error),

    #[error("failed to access timers file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read or write timer records")]
    Csv(#[from] csv::Error),
}

impl TimerError {
    /// Errors caused by a request that doesn't fit the current timer state. Data on disk is fine
    /// in this case.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            TimerError::NotFound { .. }
                | TimerError::InvalidState { .. }
                | TimerError::Conflict { .. }
        )
    }
}
