//! Events flowing from a packet processor into the aggregator.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::value::PropertyValue;

/// Per-file processing status reported by a processor.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileProcessingStatus {
    Started,
    Finished,
    Failed,
}

impl fmt::Display for FileProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "Started"),
            Self::Finished => write!(f, "Finished"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Everything a processor can tell the aggregator.
///
/// Events for one identity must be emitted in the order they happened; the
/// intake queue keeps that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProcessorEvent {
    /// An artifact was extracted.
    ParsedItemDetected {
        /// The extracted artifact.
        item: Artifact,
    },
    /// A property of a previously reported artifact changed.
    UpdatedItemProperty {
        /// The artifact as currently known to the engine.
        item: Artifact,
        /// Name of the changed property.
        field: String,
        /// The property's new value.
        value: PropertyValue,
    },
    /// A file started, finished or failed processing.
    FileProcessingStatusChanged {
        /// The input file.
        path: PathBuf,
        /// Its new status.
        status: FileProcessingStatus,
    },
    /// All files are done.
    ProcessingFinished,
}

impl ProcessorEvent {
    /// Shorthand for a detection event.
    #[must_use]
    pub const fn detected(item: Artifact) -> Self {
        Self::ParsedItemDetected { item }
    }

    /// Shorthand for a property update event.
    pub fn updated(item: Artifact, field: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self::UpdatedItemProperty {
            item,
            field: field.into(),
            value: value.into(),
        }
    }

    /// Shorthand for a file status event.
    pub fn file_status(path: impl Into<PathBuf>, status: FileProcessingStatus) -> Self {
        Self::FileProcessingStatusChanged {
            path: path.into(),
            status,
        }
    }
}
