//! A processor that replays analyzer output recorded as JSON lines.
//!
//! Each input file holds one [`ProcessorEvent`] per line. Only detections and
//! property updates are replayed; file status and completion are produced by
//! the processor itself. Files are spread over a small worker pool, and every
//! file is replayed start to finish by one worker so the events of one
//! identity keep their order.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{bounded, Receiver};

use crate::aggregator::EventSink;
use crate::config::AnalyzerModule;
use crate::error::ProcessorError;
use crate::event::{FileProcessingStatus, ProcessorEvent};

use super::PacketProcessor;

/// Replays recorded analyzer events from `.jsonl` files.
#[derive(Debug, Clone)]
pub struct JsonLinesProcessor {
    modules: BTreeSet<AnalyzerModule>,
    workers: usize,
}

impl Default for JsonLinesProcessor {
    fn default() -> Self {
        Self::new(
            thread::available_parallelism()
                .map(std::num::NonZeroUsize::get)
                .unwrap_or(1),
        )
    }
}

impl JsonLinesProcessor {
    /// Create a processor with `workers` file workers and no modules loaded.
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Self {
            modules: BTreeSet::new(),
            workers: workers.max(1),
        }
    }

    /// Modules loaded so far.
    #[must_use]
    pub fn loaded_modules(&self) -> Vec<AnalyzerModule> {
        self.modules.iter().copied().collect()
    }

    fn accepts(modules: &BTreeSet<AnalyzerModule>, event: &ProcessorEvent) -> bool {
        match event {
            ProcessorEvent::ParsedItemDetected { item } | ProcessorEvent::UpdatedItemProperty { item, .. } => {
                modules.contains(&AnalyzerModule::producing(item.kind()))
            }
            _ => false,
        }
    }
}

impl PacketProcessor for JsonLinesProcessor {
    fn load_module(&mut self, module: AnalyzerModule) {
        tracing::debug!(%module, "module loaded");
        self.modules.insert(module);
    }

    fn process(&mut self, files: &[PathBuf], sink: EventSink) -> Result<(), ProcessorError> {
        let (job_tx, job_rx) = bounded::<PathBuf>(files.len().max(1));
        for path in files {
            job_tx
                .send(path.clone())
                .map_err(|_| ProcessorError::Engine {
                    message: "job queue closed".to_string(),
                })?;
        }
        drop(job_tx);

        let workers = self.workers.min(files.len()).max(1);
        let modules = &self.modules;

        let results: Vec<Result<(), ProcessorError>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let jobs = job_rx.clone();
                    let sink = sink.clone();
                    scope.spawn(move || file_worker(modules, &jobs, &sink))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or(Err(ProcessorError::WorkerPanicked)))
                .collect()
        });

        for result in results {
            result?;
        }
        sink.emit(ProcessorEvent::ProcessingFinished)
    }
}

fn file_worker(
    modules: &BTreeSet<AnalyzerModule>,
    jobs: &Receiver<PathBuf>,
    sink: &EventSink,
) -> Result<(), ProcessorError> {
    for path in jobs.iter() {
        sink.emit(ProcessorEvent::file_status(path.clone(), FileProcessingStatus::Started))?;

        let status = match replay_file(modules, &path, sink) {
            Ok(replayed) => {
                tracing::debug!(path = %path.display(), replayed, "file replayed");
                FileProcessingStatus::Finished
            }
            Err(ProcessorError::SinkClosed) => return Err(ProcessorError::SinkClosed),
            Err(err) => {
                tracing::warn!("{err}");
                FileProcessingStatus::Failed
            }
        };
        sink.emit(ProcessorEvent::file_status(path, status))?;
    }
    Ok(())
}

/// Emits the accepted events of one file, returning how many were emitted.
///
/// Events before a malformed line are still delivered.
fn replay_file(
    modules: &BTreeSet<AnalyzerModule>,
    path: &Path,
    sink: &EventSink,
) -> Result<usize, ProcessorError> {
    let io_err = |source| ProcessorError::Io {
        path: path.to_path_buf(),
        source,
    };
    let reader = BufReader::new(File::open(path).map_err(io_err)?);

    let mut replayed = 0;
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }
        let event: ProcessorEvent = serde_json::from_str(&line).map_err(|e| ProcessorError::Malformed {
            path: path.to_path_buf(),
            line: idx + 1,
            reason: e.to_string(),
        })?;
        if JsonLinesProcessor::accepts(modules, &event) {
            sink.emit(event)?;
            replayed += 1;
        }
    }
    Ok(replayed)
}
