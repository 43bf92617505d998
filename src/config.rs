//! Run configuration and its validation.
//!
//! A [`RunConfig`] is what the user asked for. [`RunConfig::resolve`] turns it
//! into a [`RunPlan`]: the analyzer modules to load and the concrete list of
//! files that exist.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactKind;
use crate::error::ConfigError;

/// Analysis modules of the packet engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnalyzerModule {
    /// Carves transferred files.
    FileExtracting,
    /// Collects connections for the network map.
    NetworkMap,
    /// Extracts passwords and hashes.
    Credentials,
    /// Reconstructs VoIP calls.
    Voip,
    /// Collects DNS answers.
    Dns,
}

/// External short name to module, in the engine's registration order.
const MODULE_NAMES: [(&str, AnalyzerModule); 5] = [
    ("FileExtracting", AnalyzerModule::FileExtracting),
    ("NetworkMap", AnalyzerModule::NetworkMap),
    ("Credentials", AnalyzerModule::Credentials),
    ("Voip", AnalyzerModule::Voip),
    ("DNS", AnalyzerModule::Dns),
];

impl AnalyzerModule {
    /// Every module.
    pub const ALL: [Self; 5] = [
        Self::FileExtracting,
        Self::NetworkMap,
        Self::Credentials,
        Self::Voip,
        Self::Dns,
    ];

    /// Looks up a module by its external short name (exact match).
    #[must_use]
    pub fn from_cli_name(name: &str) -> Option<Self> {
        MODULE_NAMES
            .iter()
            .find(|(cli, _)| *cli == name)
            .map(|(_, module)| *module)
    }

    /// The external short name.
    #[must_use]
    pub fn cli_name(&self) -> &'static str {
        MODULE_NAMES
            .iter()
            .find(|(_, module)| module == self)
            .map_or("", |(cli, _)| *cli)
    }

    /// The name the analysis engine registers the module under.
    #[must_use]
    pub const fn analyzer_name(&self) -> &'static str {
        match self {
            Self::FileExtracting => "File Extracting",
            Self::NetworkMap => "Network Map",
            Self::Credentials => "Credentials Extractor (Passwords, Hashes)",
            Self::Voip => "Voip Calls",
            Self::Dns => "DNS",
        }
    }

    /// The module that produces artifacts of `kind`.
    #[must_use]
    pub const fn producing(kind: ArtifactKind) -> Self {
        match kind {
            ArtifactKind::Password | ArtifactKind::Hash => Self::Credentials,
            ArtifactKind::File => Self::FileExtracting,
            ArtifactKind::Connection => Self::NetworkMap,
            ArtifactKind::DnsMapping => Self::Dns,
            ArtifactKind::Call => Self::Voip,
        }
    }
}

impl fmt::Display for AnalyzerModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.analyzer_name())
    }
}

/// Translates external module names, dropping names that are not in the table.
///
/// Unrecognized names do not fail the run. They are returned separately so
/// callers can report them.
#[must_use]
pub fn translate_module_names<S: AsRef<str>>(names: &[S]) -> (Vec<AnalyzerModule>, Vec<String>) {
    let mut modules = Vec::new();
    let mut dropped = Vec::new();
    for name in names {
        let name = name.as_ref();
        match AnalyzerModule::from_cli_name(name) {
            Some(module) if !modules.contains(&module) => modules.push(module),
            Some(_) => {}
            None => dropped.push(name.to_string()),
        }
    }
    (modules, dropped)
}

/// User-facing run configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// External module short names.
    pub modules: Vec<String>,
    /// Explicit input files.
    #[serde(default)]
    pub input_files: Vec<PathBuf>,
    /// Input directory, mutually exclusive with `input_files`.
    #[serde(default)]
    pub input_dir: Option<PathBuf>,
    /// Where to export results. Without one, export is skipped.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// A validated run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    /// Modules to load.
    pub modules: Vec<AnalyzerModule>,
    /// Module names that were not recognized and were dropped.
    pub dropped_modules: Vec<String>,
    /// Existing input files, in input order.
    pub files: Vec<PathBuf>,
    /// Input paths that did not exist and were skipped.
    pub missing_files: Vec<PathBuf>,
    /// Export destination.
    pub output_dir: Option<PathBuf>,
}

impl RunConfig {
    /// Validates the configuration and resolves the input file list.
    ///
    /// # Errors
    /// - `NoModulesSelected` if no module name was given
    /// - `ConflictingInputMode` if both files and a directory were given
    /// - `NoInput` if neither was given
    /// - `InvalidDirectory` if the directory cannot be listed
    ///
    /// Missing input files are logged and skipped.
    pub fn resolve(&self) -> Result<RunPlan, ConfigError> {
        if self.modules.is_empty() {
            return Err(ConfigError::NoModulesSelected);
        }
        let (modules, dropped_modules) = translate_module_names(self.modules.as_slice());
        for name in &dropped_modules {
            tracing::debug!(module = %name, "unrecognized module name dropped");
        }

        let candidates = match (self.input_files.is_empty(), self.input_dir.as_deref()) {
            (false, Some(_)) => return Err(ConfigError::ConflictingInputMode),
            (false, None) => self.input_files.clone(),
            (true, Some(dir)) => list_directory(dir)?,
            (true, None) => return Err(ConfigError::NoInput),
        };

        let (files, missing_files): (Vec<PathBuf>, Vec<PathBuf>) =
            candidates.into_iter().partition(|path| path.is_file());
        for path in &missing_files {
            tracing::warn!("File does not exist - {}", path.display());
        }

        Ok(RunPlan {
            modules,
            dropped_modules,
            files,
            missing_files,
            output_dir: self.output_dir.clone(),
        })
    }
}

/// Regular files directly inside `dir`, sorted by path.
fn list_directory(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidDirectory {
        path: dir.to_path_buf(),
        reason,
    };

    let meta = fs::metadata(dir).map_err(|e| invalid(e.to_string()))?;
    if !meta.is_dir() {
        return Err(invalid("not a directory".to_string()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| invalid(e.to_string()))? {
        let entry = entry.map_err(|e| invalid(e.to_string()))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
