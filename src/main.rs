//! netcarve - aggregate and export artifacts extracted from network captures.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use netcarve::{
    AggregatorConfig, JsonExporter, JsonLinesProcessor, RunConfig, RunController, RunSummary, TracingNotifier,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "netcarve")]
#[command(version)]
#[command(about = "Aggregate passwords, hashes, files, DNS and VoIP calls carved from network captures")]
struct Cli {
    /// Analysis modules to load (FileExtracting, NetworkMap, Credentials, Voip, DNS)
    #[arg(short, long, value_delimiter = ',')]
    modules: Vec<String>,

    /// Input file, may be repeated
    #[arg(short, long = "input")]
    inputs: Vec<PathBuf>,

    /// Directory whose files are all processed
    #[arg(short = 'd', long)]
    input_dir: Option<PathBuf>,

    /// Export directory; nothing is exported without one
    #[arg(short, long, env = "NETCARVE_OUTPUT")]
    output: Option<PathBuf>,

    /// Number of file workers (defaults to available parallelism)
    #[arg(long)]
    workers: Option<usize>,

    /// Max queued events before processing blocks
    #[arg(long, default_value_t = AggregatorConfig::default().queue_capacity)]
    queue_capacity: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("netcarve={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(cli) {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<RunSummary> {
    let config = RunConfig {
        modules: cli.modules,
        input_files: cli.inputs,
        input_dir: cli.input_dir,
        output_dir: cli.output,
    };

    let mut controller = RunController::new(AggregatorConfig {
        queue_capacity: cli.queue_capacity,
    });
    let plan = controller.configure(&config)?;
    if plan.modules.is_empty() {
        tracing::warn!("none of the requested modules are known, nothing will be extracted");
    }

    let mut processor = cli
        .workers
        .map_or_else(JsonLinesProcessor::default, JsonLinesProcessor::new);
    let summary = controller.run(&mut processor, Box::new(JsonExporter::new()), Arc::new(TracingNotifier))?;
    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    let counts = &summary.counts;
    println!("Run {}", summary.run_id);
    println!(
        "  files: {} processed, {} failed",
        summary.files.finished.len(),
        summary.files.failed.len()
    );
    println!("  passwords:    {}", counts.passwords);
    println!("  hashes:       {}", counts.hashes);
    println!("  files:        {}", counts.files);
    println!("  connections:  {}", counts.connections);
    println!("  dns mappings: {}", counts.dns_mappings);
    println!("  voip calls:   {}", counts.calls);
    match &summary.export {
        Some(report) if !report.skipped() => {
            for exported in &report.exported {
                println!("  exported {} -> {}", exported.kind, exported.path.display());
            }
        }
        Some(_) => println!("  no output directory given, results were not exported"),
        None => println!("  processing did not complete, results were not exported"),
    }
}
