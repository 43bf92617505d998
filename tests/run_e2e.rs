use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use netcarve::{
    AnalyzerModule, Artifact, CarveError, CollectingNotifier, ConfigError, ExportKind, JsonExporter,
    JsonLinesProcessor, NetworkFile, NetworkHash, PacketProcessor, ProcessorEvent, PropertyValue, RunConfig,
    RunController, RunState, VoipCall,
};

fn write_events(dir: &Path, name: &str, events: &[ProcessorEvent]) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    for event in events {
        writeln!(file, "{}", serde_json::to_string(event).unwrap()).unwrap();
    }
    path
}

fn carved_file(name: &str) -> Artifact {
    Artifact::File(NetworkFile {
        source: "10.0.0.5".to_string(),
        destination: "10.0.0.9".to_string(),
        protocol: "HTTP".to_string(),
        extension: "png".to_string(),
        name: name.to_string(),
        data: vec![0x89, b'P', b'N', b'G'],
    })
}

fn ntlm(user: &str) -> Artifact {
    Artifact::Hash(NetworkHash {
        source: "10.0.0.5".to_string(),
        destination: "10.0.0.1".to_string(),
        protocol: "SMB".to_string(),
        hash_type: "NTLMv2".to_string(),
        username: user.to_string(),
        hash: "aad3b435b51404ee".to_string(),
    })
}

#[test]
fn unknown_module_names_do_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_events(
        dir.path(),
        "capture.jsonl",
        &[ProcessorEvent::detected(carved_file("logo")), ProcessorEvent::detected(ntlm("alice"))],
    );

    let mut controller = RunController::default();
    let plan = controller
        .configure(&RunConfig {
            modules: vec!["FileExtracting".to_string(), "Bogus".to_string()],
            input_files: vec![input],
            ..RunConfig::default()
        })
        .unwrap();
    assert_eq!(plan.modules, vec![AnalyzerModule::FileExtracting]);

    let mut processor = JsonLinesProcessor::new(2);
    let summary = controller
        .run(&mut processor, Box::new(JsonExporter::new()), Arc::new(CollectingNotifier::new()))
        .unwrap();

    assert_eq!(processor.loaded_modules(), vec![AnalyzerModule::FileExtracting]);
    assert_eq!(summary.counts.files, 1);
    assert_eq!(summary.counts.hashes, 0);
    assert_eq!(controller.state(), RunState::Finished);
}

#[test]
fn conflicting_input_aborts_before_processing() {
    struct UntouchableProcessor;

    impl PacketProcessor for UntouchableProcessor {
        fn load_module(&mut self, _module: AnalyzerModule) {
            panic!("no module may be loaded");
        }

        fn process(&mut self, _files: &[PathBuf], _sink: netcarve::EventSink) -> Result<(), netcarve::ProcessorError> {
            panic!("no file may be processed");
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let input = write_events(dir.path(), "capture.jsonl", &[]);

    let mut controller = RunController::default();
    let err = controller
        .configure(&RunConfig {
            modules: vec!["DNS".to_string()],
            input_files: vec![input],
            input_dir: Some(dir.path().to_path_buf()),
            output_dir: Some(dir.path().join("out")),
        })
        .unwrap_err();
    assert!(matches!(err, CarveError::Config(ConfigError::ConflictingInputMode)));

    let err = controller
        .run(
            &mut UntouchableProcessor,
            Box::new(JsonExporter::new()),
            Arc::new(CollectingNotifier::new()),
        )
        .unwrap_err();
    assert!(matches!(err, CarveError::Run(_)));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn directory_run_exports_results() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = dir.path().join("captures");
    fs::create_dir(&inputs).unwrap();
    let out = dir.path().join("results");

    let call = Artifact::Call(VoipCall::new("3c2f@pbx", "alice", "bob"));
    write_events(
        &inputs,
        "a.jsonl",
        &[
            ProcessorEvent::detected(ntlm("alice")),
            ProcessorEvent::detected(call.clone()),
            ProcessorEvent::updated(call.clone(), "Status", "InCall"),
            ProcessorEvent::updated(call, "Duration", PropertyValue::Int(42)),
        ],
    );
    write_events(&inputs, "b.jsonl", &[ProcessorEvent::detected(ntlm("alice")), ProcessorEvent::detected(ntlm("bob"))]);
    fs::write(inputs.join("c.jsonl"), "this is not an event\n").unwrap();

    let mut controller = RunController::default();
    controller
        .configure(&RunConfig {
            modules: vec!["Credentials".to_string(), "Voip".to_string()],
            input_dir: Some(inputs.clone()),
            output_dir: Some(out.clone()),
            ..RunConfig::default()
        })
        .unwrap();

    let notifier = CollectingNotifier::new();
    let summary = controller
        .run(&mut JsonLinesProcessor::new(3), Box::new(JsonExporter::new()), Arc::new(notifier.clone()))
        .unwrap();

    assert_eq!(summary.counts.hashes, 2);
    assert_eq!(summary.counts.calls, 1);
    assert_eq!(summary.files.finished.len(), 2);
    assert_eq!(summary.files.failed, vec![inputs.join("c.jsonl")]);

    let report = summary.export.unwrap();
    assert_eq!(report.kinds(), vec![ExportKind::Hashes, ExportKind::VoipCalls]);

    let hashes = fs::read_to_string(out.join("hashes").join(format!("{}.txt", JsonExporter::file_stem("NTLMv2")))).unwrap();
    assert_eq!(hashes.lines().count(), 2);

    let exported: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("voip_calls").join(format!("{}.json", JsonExporter::file_stem("3c2f@pbx")))).unwrap()).unwrap();
    assert_eq!(exported["duration_secs"], 42);
    assert_eq!(exported["participants"][0], "alice");

    assert_eq!(notifier.found().len(), 3);
}

#[test]
fn missing_input_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let present = write_events(dir.path(), "present.jsonl", &[ProcessorEvent::detected(ntlm("carol"))]);
    let missing = dir.path().join("missing.jsonl");

    let mut controller = RunController::default();
    controller
        .configure(&RunConfig {
            modules: vec!["Credentials".to_string()],
            input_files: vec![missing.clone(), present.clone()],
            ..RunConfig::default()
        })
        .unwrap();
    let summary = controller
        .run(&mut JsonLinesProcessor::new(1), Box::new(JsonExporter::new()), Arc::new(CollectingNotifier::new()))
        .unwrap();

    assert_eq!(summary.plan.missing_files, vec![missing]);
    assert_eq!(summary.files.started, vec![present]);
    assert_eq!(summary.counts.hashes, 1);
    assert!(summary.export.unwrap().skipped());
}
