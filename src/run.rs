//! Run lifecycle: validate the configuration, drive the processor, collect results.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregator::{Aggregator, AggregatorConfig, Completion, FileTally, IntakeStats};
use crate::config::{RunConfig, RunPlan};
use crate::error::{CarveError, CarveResult, RunError};
use crate::export::{ExportCoordinator, ExportReport, Exporter};
use crate::notify::Notifier;
use crate::processor::PacketProcessor;
use crate::store::{ArtifactStores, StoreCounts};

/// Unique identifier of one run.
///
/// # Examples
///
/// ```
/// use netcarve::RunId;
///
/// let id = RunId::new();
/// assert_ne!(id, RunId::new());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Creates a new random run ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a run ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a [`RunController`] is in its lifecycle.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Unconfigured,
    Configured,
    Running,
    Finished,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconfigured => write!(f, "unconfigured"),
            Self::Configured => write!(f, "configured"),
            Self::Running => write!(f, "running"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// The run's identifier.
    pub run_id: RunId,
    /// The validated plan the run executed.
    pub plan: RunPlan,
    /// Records per store at the end of the run.
    pub counts: StoreCounts,
    /// Per-file status reports.
    pub files: FileTally,
    /// Intake counters.
    pub stats: IntakeStats,
    /// The export report, or `None` when processing never signalled completion.
    pub export: Option<ExportReport>,
}

/// Drives one analysis run from configuration to export.
///
/// ```text
/// Unconfigured --configure--> Configured --run--> Running --> Finished
/// ```
///
/// A failed `configure` leaves the controller unconfigured. Results stay in
/// memory after the run and can be read through [`RunController::stores`].
#[derive(Debug)]
pub struct RunController {
    intake: AggregatorConfig,
    state: RunState,
    plan: Option<RunPlan>,
    stores: Option<ArtifactStores>,
}

impl Default for RunController {
    fn default() -> Self {
        Self::new(AggregatorConfig::default())
    }
}

impl RunController {
    /// Create an unconfigured controller.
    #[must_use]
    pub fn new(intake: AggregatorConfig) -> Self {
        Self {
            intake,
            state: RunState::Unconfigured,
            plan: None,
            stores: None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// The validated plan, once configured.
    #[must_use]
    pub const fn plan(&self) -> Option<&RunPlan> {
        self.plan.as_ref()
    }

    /// The aggregated stores of the finished run.
    #[must_use]
    pub const fn stores(&self) -> Option<&ArtifactStores> {
        self.stores.as_ref()
    }

    fn expect_state(&self, expected: RunState) -> Result<(), RunError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RunError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    /// Validates `config` and resolves its input files.
    ///
    /// Nothing is processed and no processor is touched when this fails.
    pub fn configure(&mut self, config: &RunConfig) -> CarveResult<&RunPlan> {
        self.expect_state(RunState::Unconfigured)?;
        let plan = config.resolve()?;
        self.state = RunState::Configured;
        Ok(self.plan.insert(plan))
    }

    /// Loads the planned modules into `processor`, processes every input file
    /// and exports the results.
    ///
    /// # Errors
    /// - `Run` if the controller is not configured
    /// - `Processor` if the processor fails; intake is shut down first
    /// - `Export` if writing the results fails
    pub fn run(
        &mut self,
        processor: &mut dyn PacketProcessor,
        exporter: Box<dyn Exporter>,
        notifier: Arc<dyn Notifier>,
    ) -> CarveResult<RunSummary> {
        self.expect_state(RunState::Configured)?;
        let plan = self
            .plan
            .clone()
            .ok_or_else(|| CarveError::internal("configured run has no plan"))?;
        self.state = RunState::Running;

        let run_id = RunId::new();
        let span = tracing::info_span!("run", %run_id);
        let _enter = span.enter();

        for module in &plan.modules {
            processor.load_module(*module);
        }

        let coordinator = ExportCoordinator::new(exporter, plan.output_dir.clone(), Arc::clone(&notifier));
        let aggregator = match Aggregator::spawn(&self.intake, notifier, coordinator) {
            Ok(aggregator) => aggregator,
            Err(err) => {
                self.state = RunState::Finished;
                return Err(err);
            }
        };

        tracing::info!("Started analyzing {} files", plan.files.len());
        let processed = processor.process(&plan.files, aggregator.sink());
        let outcome = aggregator.finish();
        self.state = RunState::Finished;

        if let Err(err) = processed {
            tracing::error!("processing failed: {err}");
            match outcome {
                Ok(outcome) => self.stores = Some(outcome.stores),
                Err(intake) => tracing::error!("intake shutdown also failed: {intake}"),
            }
            return Err(err.into());
        }
        let outcome = outcome?;

        let export = match outcome.completion {
            Completion::Finished(Ok(report)) => Some(report),
            Completion::Finished(Err(err)) => {
                tracing::error!("export failed: {err}");
                self.stores = Some(outcome.stores);
                return Err(err.into());
            }
            Completion::Aborted => {
                tracing::warn!("processor returned without signalling completion, results not exported");
                None
            }
        };

        let counts = outcome.stores.counts();
        tracing::info!(
            total = counts.total(),
            files = outcome.files.finished.len(),
            failed = outcome.files.failed.len(),
            "run finished"
        );
        self.stores = Some(outcome.stores);

        Ok(RunSummary {
            run_id,
            plan,
            counts,
            files: outcome.files,
            stats: outcome.stats,
            export,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use crate::aggregator::EventSink;
    use crate::artifact::{Artifact, DnsNameMapping};
    use crate::config::AnalyzerModule;
    use crate::error::ProcessorError;
    use crate::event::ProcessorEvent;
    use crate::export::JsonExporter;
    use crate::notify::CollectingNotifier;

    #[derive(Default)]
    struct ScriptedProcessor {
        loaded: Vec<AnalyzerModule>,
        events: Vec<ProcessorEvent>,
        fail: bool,
    }

    impl PacketProcessor for ScriptedProcessor {
        fn load_module(&mut self, module: AnalyzerModule) {
            self.loaded.push(module);
        }

        fn process(&mut self, _files: &[PathBuf], sink: EventSink) -> Result<(), ProcessorError> {
            for event in self.events.drain(..) {
                sink.emit(event)?;
            }
            if self.fail {
                return Err(ProcessorError::Engine {
                    message: "decoder crashed".to_string(),
                });
            }
            Ok(())
        }
    }

    fn configured(dir: &std::path::Path, modules: &[&str]) -> RunController {
        let mut controller = RunController::default();
        let config = RunConfig {
            modules: modules.iter().map(|m| (*m).to_string()).collect(),
            input_dir: Some(dir.to_path_buf()),
            ..RunConfig::default()
        };
        controller.configure(&config).unwrap();
        controller
    }

    fn dns(q: &str) -> Artifact {
        Artifact::DnsMapping(DnsNameMapping {
            query: q.to_string(),
            destination: "9.9.9.9".to_string(),
        })
    }

    fn notifier() -> Arc<dyn Notifier> {
        Arc::new(CollectingNotifier::new())
    }

    #[test]
    fn run_before_configure_is_rejected() {
        let mut controller = RunController::default();
        let err = controller
            .run(&mut ScriptedProcessor::default(), Box::new(JsonExporter::new()), notifier())
            .unwrap_err();
        assert!(matches!(
            err,
            CarveError::Run(RunError::InvalidState {
                expected: RunState::Configured,
                actual: RunState::Unconfigured
            })
        ));
        assert_eq!(controller.state(), RunState::Unconfigured);
    }

    #[test]
    fn failed_configure_stays_unconfigured() {
        let mut controller = RunController::default();
        let err = controller.configure(&RunConfig::default()).unwrap_err();
        assert!(err.is_config());
        assert_eq!(controller.state(), RunState::Unconfigured);
        assert!(controller.plan().is_none());
    }

    #[test]
    fn successful_run_finishes_and_keeps_results() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = configured(dir.path(), &["DNS", "Bogus"]);
        assert_eq!(controller.state(), RunState::Configured);

        let mut processor = ScriptedProcessor {
            events: vec![
                ProcessorEvent::detected(dns("a.com")),
                ProcessorEvent::detected(dns("a.com")),
                ProcessorEvent::ProcessingFinished,
            ],
            ..ScriptedProcessor::default()
        };
        let summary = controller
            .run(&mut processor, Box::new(JsonExporter::new()), notifier())
            .unwrap();

        assert_eq!(processor.loaded, vec![AnalyzerModule::Dns]);
        assert_eq!(summary.plan.dropped_modules, vec!["Bogus".to_string()]);
        assert_eq!(summary.counts.dns_mappings, 1);
        assert_eq!(summary.stats.duplicates, 1);
        assert!(summary.export.unwrap().skipped());
        assert_eq!(controller.state(), RunState::Finished);
        assert_eq!(controller.stores().unwrap().dns_mappings.len(), 1);
    }

    #[test]
    fn second_run_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = configured(dir.path(), &["DNS"]);
        let mut processor = ScriptedProcessor {
            events: vec![ProcessorEvent::ProcessingFinished],
            ..ScriptedProcessor::default()
        };
        controller
            .run(&mut processor, Box::new(JsonExporter::new()), notifier())
            .unwrap();

        let err = controller
            .run(&mut processor, Box::new(JsonExporter::new()), notifier())
            .unwrap_err();
        assert!(matches!(err, CarveError::Run(_)));
    }

    #[test]
    fn processor_failure_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = configured(dir.path(), &["DNS"]);
        let mut processor = ScriptedProcessor {
            events: vec![ProcessorEvent::detected(dns("a.com"))],
            fail: true,
            ..ScriptedProcessor::default()
        };

        let err = controller
            .run(&mut processor, Box::new(JsonExporter::new()), notifier())
            .unwrap_err();
        assert!(err.is_processor());
        assert_eq!(controller.state(), RunState::Finished);
        assert_eq!(controller.stores().unwrap().dns_mappings.len(), 1);
    }

    #[test]
    fn processor_failure_with_dead_intake_still_reports_processor_error() {
        struct PanickingNotifier;

        impl Notifier for PanickingNotifier {
            fn notify(&self, _notice: crate::notify::Notice) {
                panic!("notifier exploded");
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let mut controller = configured(dir.path(), &["DNS"]);
        let mut processor = ScriptedProcessor {
            events: vec![ProcessorEvent::detected(dns("a.com"))],
            fail: true,
            ..ScriptedProcessor::default()
        };

        let err = controller
            .run(&mut processor, Box::new(JsonExporter::new()), Arc::new(PanickingNotifier))
            .unwrap_err();
        assert!(err.is_processor());
        assert_eq!(controller.state(), RunState::Finished);
        assert!(controller.stores().is_none());
    }

    #[test]
    fn missing_completion_skips_export() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let mut controller = RunController::default();
        controller
            .configure(&RunConfig {
                modules: vec!["DNS".to_string()],
                input_dir: Some(dir.path().to_path_buf()),
                output_dir: Some(out.clone()),
                ..RunConfig::default()
            })
            .unwrap();

        let mut processor = ScriptedProcessor {
            events: vec![ProcessorEvent::detected(dns("a.com"))],
            ..ScriptedProcessor::default()
        };
        let summary = controller
            .run(&mut processor, Box::new(JsonExporter::new()), notifier())
            .unwrap();

        assert!(summary.export.is_none());
        assert!(!out.exists());
    }

    #[test]
    fn run_state_display_is_lowercase() {
        assert_eq!(RunState::Running.to_string(), "running");
    }
}
