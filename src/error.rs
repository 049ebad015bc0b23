//! Unified error types for Multiplay.
//!
//! Errors that reach the caller are the ones a caller can act on: an unknown
//! fact id, a filter that leaves nothing to ask, or a persistence failure.
//! Storage errors propagate unmodified; the engine does no retries and no
//! partial-state repair.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::FactStatus;

/// The main error type for Multiplay operations.
#[derive(Error, Debug)]
pub enum MultiplayError {
    /// `submit_answer` was called with an id absent from the fact table.
    #[error("fact not found: {fact_id}")]
    FactNotFound { fact_id: String },

    /// No non-locked fact matches the current table/max-factor filters.
    #[error("no facts available for the selected tables")]
    NoEligibleFacts,

    /// I/O errors from the file-backed store.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON or TOML parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// A status change outside LOCKED → ACTIVE → MASTERED.
    #[error("invalid transition for {fact_id}: {from:?} -> {to:?}")]
    InvalidTransition {
        fact_id: String,
        from: FactStatus,
        to: FactStatus,
    },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },
}

/// A specialized Result type for Multiplay operations.
pub type Result<T> = std::result::Result<T, MultiplayError>;

impl MultiplayError {
    /// Create a fact not found error.
    pub fn fact_not_found(fact_id: impl Into<String>) -> Self {
        Self::FactNotFound {
            fact_id: fact_id.into(),
        }
    }

    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create an invalid transition error.
    pub fn invalid_transition(fact_id: impl Into<String>, from: FactStatus, to: FactStatus) -> Self {
        Self::InvalidTransition {
            fact_id: fact_id.into(),
            from,
            to,
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the error reflects caller configuration rather than a fault.
    ///
    /// `NoEligibleFacts` means no table is enabled within the max factor;
    /// the caller should enable at least one table.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::NoEligibleFacts | Self::Config { .. })
    }
}

impl From<io::Error> for MultiplayError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for MultiplayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Fallback handling for recoverable-by-design conditions.
///
/// Used where a bad value has an obvious safe substitute, such as a stored
/// setting that no longer deserializes. Never used on persistence writes.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}

/// Exit codes for the Multiplay CLI.
pub mod exit_codes {
    /// Command completed.
    pub const SUCCESS: i32 = 0;

    /// Command failed (storage, config, unknown fact).
    pub const ERROR: i32 = 1;

    /// No facts are eligible under the current settings.
    pub const NO_ELIGIBLE_FACTS: i32 = 2;
}
