//! User-facing notifications emitted during a run.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::event::FileProcessingStatus;
use crate::export::ExportKind;

/// A human-readable notice about run progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A first-seen artifact (connections never produce one).
    Found(String),
    /// An input file changed processing status.
    FileStatus {
        /// The input file.
        path: PathBuf,
        /// Its new status.
        status: FileProcessingStatus,
    },
    /// A store was exported.
    Exported {
        /// What was exported.
        kind: ExportKind,
        /// Where it was written.
        path: PathBuf,
    },
    /// Processing and export are done.
    Finished,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(text) => write!(f, "Found: {text}"),
            Self::FileStatus { path, status } => {
                let name = path
                    .file_name()
                    .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
                write!(f, "File : {name} Processing {status}")
            }
            Self::Exported { kind, path } => {
                write!(f, "Successfully exported {kind} to: {}", path.display())
            }
            Self::Finished => write!(f, "Finished processing"),
        }
    }
}

/// Receives notices from the intake worker and export coordinator.
pub trait Notifier: Send + Sync {
    /// Handles one notice.
    fn notify(&self, notice: Notice);
}

/// Writes notices to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match &notice {
            Notice::FileStatus {
                status: FileProcessingStatus::Failed,
                ..
            } => tracing::warn!("{notice}"),
            _ => tracing::info!("{notice}"),
        }
    }
}

/// Keeps notices in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectingNotifier {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl CollectingNotifier {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All notices received so far.
    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    /// Texts of the `Found` notices received so far.
    #[must_use]
    pub fn found(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|n| match n {
                Notice::Found(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_status_shows_file_name_only() {
        let notice = Notice::FileStatus {
            path: PathBuf::from("/captures/day1/a.pcap"),
            status: FileProcessingStatus::Started,
        };
        assert_eq!(notice.to_string(), "File : a.pcap Processing Started");
    }

    #[test]
    fn collector_is_shared_between_clones() {
        let collector = CollectingNotifier::new();
        let clone = collector.clone();
        clone.notify(Notice::Found("x".to_string()));
        clone.notify(Notice::Finished);

        assert_eq!(collector.notices().len(), 2);
        assert_eq!(collector.found(), vec!["x".to_string()]);
    }
}
