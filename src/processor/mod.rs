//! The boundary to the packet analysis engine.
//!
//! A [`PacketProcessor`] turns input files into [`ProcessorEvent`]s and pushes
//! them into an [`EventSink`]. It may use as many threads as it likes; the
//! aggregator serializes whatever arrives.
//!
//! [`ProcessorEvent`]: crate::event::ProcessorEvent

/// Processor reading pre-decoded analyzer output.
pub mod jsonl;

use std::path::PathBuf;

use crate::aggregator::EventSink;
use crate::config::AnalyzerModule;
use crate::error::ProcessorError;

pub use jsonl::JsonLinesProcessor;

/// A packet analysis engine.
pub trait PacketProcessor {
    /// Enables one analysis module for the coming run.
    fn load_module(&mut self, module: AnalyzerModule);

    /// Processes `files`, emitting per-file status events and artifact events
    /// into `sink`, followed by a final `ProcessingFinished`.
    ///
    /// Events concerning one artifact identity must be emitted in order.
    fn process(&mut self, files: &[PathBuf], sink: EventSink) -> Result<(), ProcessorError>;
}
