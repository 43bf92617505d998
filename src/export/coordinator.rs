use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ExportError;
use crate::notify::{Notice, Notifier};
use crate::store::ArtifactStores;

use super::{ExportKind, ExportReport, ExportedArtifact, Exporter};

/// Exports every non-empty store once processing has finished.
pub struct ExportCoordinator {
    exporter: Box<dyn Exporter>,
    output_dir: Option<PathBuf>,
    notifier: Arc<dyn Notifier>,
}

impl ExportCoordinator {
    /// Create a coordinator writing to `output_dir`, or skipping export if `None`.
    pub fn new(exporter: Box<dyn Exporter>, output_dir: Option<PathBuf>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            exporter,
            output_dir,
            notifier,
        }
    }

    /// The configured export destination.
    #[must_use]
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// Exports network map, hashes, files, DNS mappings and calls, in that
    /// order, skipping empty stores.
    ///
    /// The first exporter failure stops the remaining exports.
    pub fn export(&self, stores: &ArtifactStores) -> Result<ExportReport, ExportError> {
        let mut report = ExportReport {
            output_dir: self.output_dir.clone(),
            exported: Vec::new(),
        };

        let Some(out_dir) = self.output_dir.as_deref() else {
            tracing::debug!("no output directory configured, skipping export");
            self.notifier.notify(Notice::Finished);
            return Ok(report);
        };

        fs::create_dir_all(out_dir).map_err(|e| ExportError::io(out_dir, e))?;

        if !stores.connections.is_empty() {
            let path = self.exporter.export_network_map(out_dir, &stores.connections.all())?;
            self.record(&mut report, ExportKind::NetworkMap, path);
        }
        if !stores.hashes.is_empty() {
            let path = self.exporter.export_hashes(out_dir, &stores.hashes.all())?;
            self.record(&mut report, ExportKind::Hashes, path);
        }
        if !stores.files.is_empty() {
            let path = self.exporter.export_files(out_dir, &stores.files.all())?;
            self.record(&mut report, ExportKind::Files, path);
        }
        if !stores.dns_mappings.is_empty() {
            let path = self.exporter.export_dns_mappings(out_dir, &stores.dns_mappings.all())?;
            self.record(&mut report, ExportKind::DnsMappings, path);
        }
        if !stores.calls.is_empty() {
            let path = self.exporter.export_voip_calls(out_dir, &stores.calls.all())?;
            self.record(&mut report, ExportKind::VoipCalls, path);
        }

        self.notifier.notify(Notice::Finished);
        Ok(report)
    }

    fn record(&self, report: &mut ExportReport, kind: ExportKind, path: PathBuf) {
        tracing::debug!(%kind, path = %path.display(), "export written");
        self.notifier.notify(Notice::Exported {
            kind,
            path: path.clone(),
        });
        report.exported.push(ExportedArtifact { kind, path });
    }
}
