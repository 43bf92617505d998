//! Export of aggregated artifacts at the end of a run.
//!
//! The [`Exporter`] trait is the boundary to whatever writes results to disk;
//! [`JsonExporter`] is the bundled writer. [`ExportCoordinator`] decides which
//! stores get exported and in what order.

/// Store-to-exporter sequencing.
pub mod coordinator;
/// JSON/text file writer.
pub mod json;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::artifact::{DnsNameMapping, NetworkConnection, NetworkFile, NetworkHash, VoipCallPresentation};
use crate::error::ExportError;

pub use coordinator::ExportCoordinator;
pub use json::JsonExporter;

/// The exportable store kinds. Passwords are kept in memory only.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    NetworkMap,
    Hashes,
    Files,
    DnsMappings,
    VoipCalls,
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkMap => write!(f, "network map"),
            Self::Hashes => write!(f, "hashes"),
            Self::Files => write!(f, "extracted files"),
            Self::DnsMappings => write!(f, "DNS mappings"),
            Self::VoipCalls => write!(f, "VoIP calls"),
        }
    }
}

/// Writes store snapshots to an output directory.
///
/// Every method returns the file or directory it wrote.
pub trait Exporter: Send {
    /// Writes the network map built from all connections.
    fn export_network_map(&self, out_dir: &Path, connections: &[NetworkConnection]) -> Result<PathBuf, ExportError>;

    /// Writes the captured hashes.
    fn export_hashes(&self, out_dir: &Path, hashes: &[NetworkHash]) -> Result<PathBuf, ExportError>;

    /// Writes the carved files.
    fn export_files(&self, out_dir: &Path, files: &[NetworkFile]) -> Result<PathBuf, ExportError>;

    /// Writes the DNS mappings.
    fn export_dns_mappings(&self, out_dir: &Path, mappings: &[DnsNameMapping]) -> Result<PathBuf, ExportError>;

    /// Writes the VoIP calls.
    fn export_voip_calls(&self, out_dir: &Path, calls: &[VoipCallPresentation]) -> Result<PathBuf, ExportError>;
}

/// One written export.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedArtifact {
    pub kind: ExportKind,
    pub path: PathBuf,
}

/// Outcome of the export step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    /// Output directory, if one was configured.
    pub output_dir: Option<PathBuf>,
    /// Exports written, in export order.
    pub exported: Vec<ExportedArtifact>,
}

impl ExportReport {
    /// True if no output directory was configured.
    #[must_use]
    pub const fn skipped(&self) -> bool {
        self.output_dir.is_none()
    }

    /// Kinds that were exported, in export order.
    #[must_use]
    pub fn kinds(&self) -> Vec<ExportKind> {
        self.exported.iter().map(|e| e.kind).collect()
    }

    /// Path written for a kind, if it was exported.
    #[must_use]
    pub fn path_of(&self, kind: ExportKind) -> Option<&Path> {
        self.exported
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.path.as_path())
    }
}
