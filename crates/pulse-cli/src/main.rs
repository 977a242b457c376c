//! pulse - progress printer demo driver
//!
//! Simulates `--jobs` concurrent jobs of `--steps` steps each. Jobs share
//! step trace ids, so only one job's log lines are shown per step; the rest
//! lose the log-source arbitration and skip their output.
//!
//! # Configuration
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`PULSE_PROGRESS_BUFFER`; `PULSE_PROGRESS` over `auto`)
//! 3. Config file given with `--config`
//! 4. Default values (lowest priority)
//!
//! Progress goes to stdout; logs go to stderr and are held while a cycle
//! renders (disable with `hold_logs = false`).

mod tracing_writer;

use anyhow::{bail, Context, Result};
use clap::Parser;
use pulse_printer::{
    ConfigLoader, ConsoleTarget, LogGate, PlainRenderer, Printer, PrinterBuilder, PrinterMode,
};
use pulse_types::{StatusEvent, TraceId, VertexState, VertexWarning};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// pulse - pausable progress printer demo
#[derive(Parser, Debug)]
#[command(name = "pulse")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Progress mode: auto, tty, plain or quiet (overrides config)
    #[arg(long, value_name = "MODE")]
    progress: Option<PrinterMode>,

    /// Phase label shown above the progress output
    #[arg(long)]
    phase: Option<String>,

    /// Printer config file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Pause the printer after the first batch and resume for a second one
    #[arg(long)]
    pause_after_first: bool,

    /// Make the job with this index fail its last step
    #[arg(long, value_name = "JOB")]
    fail: Option<usize>,

    /// Number of concurrent jobs
    #[arg(long, default_value_t = 3)]
    jobs: usize,

    /// Steps per job
    #[arg(long, default_value_t = 3)]
    steps: usize,
}

type DemoPrinter = Arc<Printer<PlainRenderer>>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(ref path) = args.config {
        loader = loader.with_file(path);
    }
    let mut config = loader
        .load()
        .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;
    if let Some(mode) = args.progress {
        config.mode = mode;
    }
    if let Some(ref phase) = args.phase {
        config.phase = Some(phase.clone());
    }

    // Terminal filter: --debug > --verbose > RUST_LOG env > default "warn"
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else if args.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let gate = config.hold_logs.then(LogGate::new);
    let writer = tracing_writer::GatedMakeWriter::new(gate.clone());
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(writer)
                .with_filter(filter),
        )
        .init();

    // Ctrl-C before a cycle starts rendering cancels it.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling progress display");
            let _ = shutdown_tx.send(true);
        }
    });

    let mut builder = PrinterBuilder::from_config(PlainRenderer::new(), &config)
        .sink(std::io::stdout())
        .console(ConsoleTarget::Stdout)
        .shutdown(shutdown_rx);
    if config.description.is_none() {
        builder = builder.description(
            format!("Running {} jobs of {} steps", args.jobs, args.steps),
            "pulse",
        );
    }
    if let Some(gate) = gate {
        builder = builder.log_gate(gate);
    }
    let printer: DemoPrinter = Arc::new(builder.build().await.context("failed to start printer")?);
    info!(mode = %printer.mode(), jobs = args.jobs, steps = args.steps, "Printer ready");

    let mut warnings = Vec::new();
    let mut failed = run_batch(&printer, &args, 1).await;

    if args.pause_after_first {
        printer.pause().await.context("progress display failed")?;
        warnings.extend(printer.warnings());
        println!("Printer paused after batch 1");
        printer.unpause().await.context("failed to resume printer")?;
        failed.extend(run_batch(&printer, &args, 2).await);
    }

    let result = printer.wait().await;
    warnings.extend(printer.warnings());
    if !warnings.is_empty() {
        println!("{} warnings", warnings.len());
        for warning in &warnings {
            println!(" - {}: {}", warning.vertex, warning.message);
        }
    }
    result.context("progress display failed")?;

    if !failed.is_empty() {
        bail!("{} job(s) failed: {:?}", failed.len(), failed);
    }
    Ok(())
}

/// Runs every job of one batch concurrently and returns the failed job
/// indexes.
async fn run_batch(printer: &DemoPrinter, args: &Args, batch: usize) -> Vec<usize> {
    let mut handles = Vec::with_capacity(args.jobs);
    for job in 0..args.jobs {
        let printer = Arc::clone(printer);
        let steps = args.steps;
        let fail = args.fail == Some(job);
        handles.push(tokio::spawn(async move {
            run_job(&printer, batch, job, steps, fail).await
        }));
    }

    let mut failed = Vec::new();
    for (job, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => failed.push(job),
            Ok(Err(e)) => {
                warn!(job, error = %e, "Job could not report progress");
                failed.push(job);
            }
            Err(e) => {
                warn!(job, error = %e, "Job task panicked");
                failed.push(job);
            }
        }
    }
    failed
}

/// Returns `Ok(false)` when the job failed one of its steps.
async fn run_job(
    printer: &DemoPrinter,
    batch: usize,
    job: usize,
    steps: usize,
    fail: bool,
) -> Result<bool, pulse_printer::PrinterError> {
    let op = printer.operation(format!("batch{batch}-job{job}"));

    for step in 0..steps {
        let id = step_id(batch, step);
        op.write(StatusEvent::vertex(
            id.clone(),
            format!("[batch {batch}] step {step}"),
            VertexState::Started,
        ))
        .await?;

        let shown = op
            .write_log(
                &id,
                StatusEvent::stdout(id.clone(), format!("job {job}: running step {step}")),
            )
            .await?;
        debug!(batch, job, step, shown, "Step log submitted");
        tokio::task::yield_now().await;

        if fail && step + 1 == steps {
            op.write(StatusEvent::vertex(
                id,
                format!("[batch {batch}] step {step}"),
                VertexState::Failed {
                    error: format!("job {job} failed"),
                },
            ))
            .await?;
            return Ok(false);
        }

        if job == 0 && step == 0 {
            op.write(StatusEvent::warning(
                VertexWarning::new(id.clone(), "step ran without a cache")
                    .with_detail(format!("batch {batch}")),
            ))
            .await?;
        }
        op.write(StatusEvent::vertex(
            id,
            format!("[batch {batch}] step {step}"),
            VertexState::Completed,
        ))
        .await?;
    }

    let released = op.finish();
    debug!(batch, job, released, "Job finished");
    Ok(true)
}

/// Trace id shared by every job running `step` in `batch`.
fn step_id(batch: usize, step: usize) -> TraceId {
    TraceId::new(format!("sha256:{:064x}", batch * 1000 + step))
}
