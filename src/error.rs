//! Error types for netcarve.
//!
//! Every failure in the aggregation pipeline is strongly typed using thiserror,
//! grouped by the stage that raises it. Configuration errors are fatal and
//! surface before any input file is touched; update errors are reported by the
//! intake worker and never abort a run.

use std::path::PathBuf;

use thiserror::Error;

use crate::run::RunState;
use crate::update::CallField;

/// Errors raised while validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No modules selected")]
    NoModulesSelected,

    #[error("Only one of an input file list and an input directory can be given in a single run")]
    ConflictingInputMode,

    #[error("No input files or input directory given")]
    NoInput,

    #[error("{} is not a valid directory path: {reason}", path.display())]
    InvalidDirectory {
        path: PathBuf,
        reason: String,
    },
}

/// Errors raised while applying a property update to a stored call.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Unknown call field '{name}'")]
    UnknownField {
        name: String,
    },

    #[error("Field '{field}' expects a {expected} value, got {found}")]
    TypeMismatch {
        field: CallField,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid value for field '{field}': {reason}")]
    InvalidValue {
        field: CallField,
        reason: String,
    },
}

/// Errors raised by an exporter.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize export: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExportError {
    /// Wraps an I/O failure with the path that was being written.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by a packet processor while a run is in progress.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Event intake is closed")]
    SinkClosed,

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: malformed event: {reason}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Processor worker panicked")]
    WorkerPanicked,

    #[error("Processing engine failure: {message}")]
    Engine {
        message: String,
    },
}

/// Errors raised by out-of-order run lifecycle calls.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Run is {actual}, expected {expected}")]
    InvalidState {
        expected: RunState,
        actual: RunState,
    },
}

/// Top-level error type for netcarve.
#[derive(Debug, Error)]
pub enum CarveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Update error: {0}")]
    Update(#[from] UpdateError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Processor error: {0}")]
    Processor(#[from] ProcessorError),

    #[error("Run error: {0}")]
    Run(#[from] RunError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl CarveError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this is an export error.
    #[must_use]
    pub const fn is_export(&self) -> bool {
        matches!(self, Self::Export(_))
    }

    /// Returns true if this is a processor error.
    #[must_use]
    pub const fn is_processor(&self) -> bool {
        matches!(self, Self::Processor(_))
    }

    /// Returns true if this error ends the run.
    ///
    /// Update errors are logged by the intake worker and processing continues.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Update(_))
    }
}

/// Result type alias for netcarve operations.
pub type CarveResult<T> = Result<T, CarveError>;
