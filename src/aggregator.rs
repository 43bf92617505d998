//! Serialized event intake.
//!
//! Processors may run many workers at once. All of them feed one bounded
//! queue, and a single dedicated worker thread drains it and owns every
//! artifact store, so store mutation is single-threaded. Events from one
//! producer are consumed in the order that producer sent them, which keeps a
//! call's detection ahead of the updates that follow it.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::error::{CarveError, CarveResult, ExportError, ProcessorError};
use crate::event::{FileProcessingStatus, ProcessorEvent};
use crate::export::{ExportCoordinator, ExportReport};
use crate::notify::{Notice, Notifier};
use crate::router::{EventRouter, UpdateDisposition};
use crate::store::ArtifactStores;
use crate::update::ApplyOutcome;

/// Intake queue configuration.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Max queued events before producers block.
    pub queue_capacity: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 4096,
        }
    }
}

/// Producer handle onto the intake queue.
///
/// Cloning is cheap; hand one clone to each processor worker. Sending blocks
/// while the queue is full, so events are never dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<ProcessorEvent>,
}

impl EventSink {
    /// Enqueue one event.
    pub fn emit(&self, event: ProcessorEvent) -> Result<(), ProcessorError> {
        self.tx.send(event).map_err(|_| ProcessorError::SinkClosed)
    }
}

/// Per-file status tally.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTally {
    pub started: Vec<PathBuf>,
    pub finished: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

impl FileTally {
    fn record(&mut self, path: PathBuf, status: FileProcessingStatus) {
        match status {
            FileProcessingStatus::Started => self.started.push(path),
            FileProcessingStatus::Finished => self.finished.push(path),
            FileProcessingStatus::Failed => self.failed.push(path),
        }
    }
}

/// How the intake loop ended.
#[derive(Debug)]
pub enum Completion {
    /// The processor signalled completion and the export step ran.
    Finished(Result<ExportReport, ExportError>),
    /// Every sink was dropped before completion was signalled. No export ran.
    Aborted,
}

/// Counters for events that did not change any store.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntakeStats {
    pub events: u64,
    pub duplicates: u64,
    pub updates_applied: u64,
    pub updates_dropped: u64,
    pub updates_ignored: u64,
    pub updates_rejected: u64,
}

/// Everything the intake worker hands back when it stops.
#[allow(missing_docs)]
#[derive(Debug)]
pub struct AggregatorOutcome {
    pub stores: ArtifactStores,
    pub files: FileTally,
    pub stats: IntakeStats,
    pub completion: Completion,
}

/// The running intake worker.
pub struct Aggregator {
    sink: EventSink,
    join: JoinHandle<AggregatorOutcome>,
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator").finish_non_exhaustive()
    }
}

impl Aggregator {
    /// Start the intake worker with fresh stores.
    pub fn spawn(
        cfg: &AggregatorConfig,
        notifier: Arc<dyn Notifier>,
        exporter: ExportCoordinator,
    ) -> CarveResult<Self> {
        let (tx, rx) = bounded::<ProcessorEvent>(cfg.queue_capacity.max(1));
        let router = EventRouter::new(Arc::clone(&notifier));

        let join = thread::Builder::new()
            .name("netcarve-intake".to_string())
            .spawn(move || worker_loop(router, notifier, exporter, &rx))
            .map_err(|e| CarveError::internal(format!("failed to spawn intake worker: {e}")))?;

        Ok(Self {
            sink: EventSink { tx },
            join,
        })
    }

    /// A new producer handle.
    #[must_use]
    pub fn sink(&self) -> EventSink {
        self.sink.clone()
    }

    /// Closes this handle's sink and waits for the worker to stop.
    ///
    /// The worker stops once completion is signalled or every other sink has
    /// been dropped, so callers must drop the sinks they handed out.
    pub fn finish(self) -> CarveResult<AggregatorOutcome> {
        let Self { sink, join } = self;
        drop(sink);
        join.join()
            .map_err(|_| CarveError::internal("intake worker panicked"))
    }
}

fn worker_loop(
    mut router: EventRouter,
    notifier: Arc<dyn Notifier>,
    exporter: ExportCoordinator,
    rx: &Receiver<ProcessorEvent>,
) -> AggregatorOutcome {
    let mut files = FileTally::default();
    let mut stats = IntakeStats::default();

    // Loop ends on ProcessingFinished or when all senders are gone.
    let completion = loop {
        let Ok(event) = rx.recv() else {
            tracing::warn!("event intake closed before processing finished, skipping export");
            break Completion::Aborted;
        };
        stats.events += 1;

        match event {
            ProcessorEvent::ParsedItemDetected { item } => {
                if !router.on_detected(item) {
                    stats.duplicates += 1;
                }
            }
            ProcessorEvent::UpdatedItemProperty { item, field, value } => {
                match router.on_updated(&item, &field, &value) {
                    Ok(UpdateDisposition::Routed(ApplyOutcome::Applied)) => {
                        stats.updates_applied += 1;
                    }
                    Ok(UpdateDisposition::Routed(ApplyOutcome::NotFound)) => {
                        stats.updates_dropped += 1;
                    }
                    Ok(UpdateDisposition::Ignored(_)) => stats.updates_ignored += 1,
                    Err(err) => {
                        stats.updates_rejected += 1;
                        tracing::warn!(kind = %item.kind(), %field, "ignoring property update: {err}");
                    }
                }
            }
            ProcessorEvent::FileProcessingStatusChanged { path, status } => {
                notifier.notify(Notice::FileStatus {
                    path: path.clone(),
                    status,
                });
                files.record(path, status);
            }
            ProcessorEvent::ProcessingFinished => {
                let result = exporter.export(router.stores());
                break Completion::Finished(result);
            }
        }
    };

    tracing::debug!(?stats, "intake worker stopped");
    AggregatorOutcome {
        stores: router.into_stores(),
        files,
        stats,
        completion,
    }
}
