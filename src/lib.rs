//! # netcarve - live aggregation of network forensics artifacts
//!
//! A packet analysis engine reports what it extracts from capture files as a
//! stream of events: passwords, hashes, carved files, connections, DNS
//! answers and VoIP calls, plus later property changes of calls it already
//! reported. netcarve serializes that stream, deduplicates every artifact by
//! its identity, keeps calls up to date and exports the results once
//! processing is done.
//!
//! ## Core Concepts
//!
//! - **Artifact**: a closed set of extracted record kinds
//! - **Identity**: the key an artifact is deduplicated by (full value, or the
//!   call id for VoIP calls)
//! - **Aggregator**: the single intake worker that owns all stores
//! - **RunController**: configure, process, export
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use netcarve::{JsonExporter, JsonLinesProcessor, RunConfig, RunController, TracingNotifier};
//!
//! # fn main() -> netcarve::CarveResult<()> {
//! let config = RunConfig {
//!     modules: vec!["Credentials".into(), "Voip".into()],
//!     input_dir: Some("captures/".into()),
//!     output_dir: Some("results/".into()),
//!     ..RunConfig::default()
//! };
//!
//! let mut controller = RunController::default();
//! controller.configure(&config)?;
//! let summary = controller.run(
//!     &mut JsonLinesProcessor::default(),
//!     Box::new(JsonExporter::new()),
//!     Arc::new(TracingNotifier),
//! )?;
//! println!("{} artifacts", summary.counts.total());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// Data model
pub mod artifact;
pub mod error;
pub mod event;
pub mod identity;
pub mod value;

// Aggregation
pub mod aggregator;
pub mod notify;
pub mod router;
pub mod store;
pub mod update;

// Run lifecycle and output
pub mod config;
pub mod export;
pub mod processor;
pub mod run;

pub use aggregator::{Aggregator, AggregatorConfig, AggregatorOutcome, Completion, EventSink, FileTally, IntakeStats};
pub use artifact::{
    Artifact, ArtifactKind, CallId, CallState, DnsNameMapping, NetworkConnection, NetworkFile, NetworkHash,
    NetworkPassword, VoipCall, VoipCallPresentation,
};
pub use config::{AnalyzerModule, RunConfig, RunPlan};
pub use error::{CarveError, CarveResult, ConfigError, ExportError, ProcessorError, RunError, UpdateError};
pub use event::{FileProcessingStatus, ProcessorEvent};
pub use export::{ExportCoordinator, ExportKind, ExportReport, Exporter, JsonExporter};
pub use identity::Identity;
pub use notify::{CollectingNotifier, Notice, Notifier, TracingNotifier};
pub use processor::{JsonLinesProcessor, PacketProcessor};
pub use router::EventRouter;
pub use run::{RunController, RunId, RunState, RunSummary};
pub use store::{ArtifactStore, ArtifactStores, StoreCounts};
pub use update::{ApplyOutcome, CallField, CallUpdate};
pub use value::PropertyValue;
