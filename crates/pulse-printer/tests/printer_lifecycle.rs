//! Integration tests for the printer lifecycle.
//!
//! Covers:
//! - draining and error propagation on wait
//! - pause/resume round trips and per-cycle isolation
//! - wait/pause/unpause calls dropped before they resolve
//! - log-source arbitration across operations
//! - mode selection (quiet, tty, auto)
//! - close hook, shutdown and log gate interplay

#![allow(clippy::expect_used)]

use async_trait::async_trait;
use pulse_printer::testing::{RecordingRenderer, SharedBuffer};
use pulse_printer::{
    ConsoleTarget, DisplayOptions, GateResult, LogGate, PlainRenderer, Printer, PrinterError,
    PrinterMode, RenderContext, RenderError, RenderOutcome, Renderer,
};
use pulse_printer::status::StatusReceiver;
use pulse_types::{ClaimantId, ErrorCode, StatusEvent, TraceId, VertexState, VertexWarning};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

// =============================================================================
// Test Fixtures
// =============================================================================

fn trace(n: u8) -> TraceId {
    TraceId::new(format!("sha256:{n:02x}"))
}

async fn recording_printer(
    renderer: RecordingRenderer<u32>,
) -> Printer<RecordingRenderer<u32>> {
    Printer::builder(renderer)
        .mode(PrinterMode::Plain)
        .sink(std::io::sink())
        .console(ConsoleTarget::Detached)
        .skip_env()
        .build()
        .await
        .expect("build printer")
}

async fn plain_printer(out: &SharedBuffer) -> Arc<Printer<PlainRenderer>> {
    Arc::new(
        Printer::builder(PlainRenderer::new())
            .mode(PrinterMode::Plain)
            .sink(out.clone())
            .console(ConsoleTarget::Detached)
            .skip_env()
            .build()
            .await
            .expect("build printer"),
    )
}

/// Renderer that panics as soon as it sees an event.
struct PanickingRenderer;

#[async_trait]
impl Renderer for PanickingRenderer {
    type Event = u32;
    type Warning = String;

    async fn render(
        &self,
        _ctx: RenderContext<'_>,
        mut events: StatusReceiver<u32>,
        _options: &DisplayOptions,
    ) -> RenderOutcome<String> {
        if events.recv().await.is_some() {
            panic!("renderer blew up");
        }
        RenderOutcome::ok(Vec::new())
    }
}

// =============================================================================
// Draining
// =============================================================================

#[tokio::test]
async fn wait_drains_every_event_in_order() {
    let renderer = RecordingRenderer::new();
    let cycles = renderer.cycles();
    let printer = recording_printer(renderer).await;

    for i in 0..50 {
        printer.write(i).await.expect("write");
    }
    printer.wait().await.expect("wait");

    assert_eq!(cycles.events(1), (0..50).collect::<Vec<_>>());
}

#[tokio::test]
async fn wait_returns_renderer_error_verbatim() {
    let renderer = RecordingRenderer::new();
    let cycles = renderer.cycles();
    renderer.fail_next("solve failed: exit code 2");
    let printer = recording_printer(renderer).await;

    printer.write(1).await.expect("write");
    printer.write(2).await.expect("write");
    printer.write(3).await.expect("write");
    let err = printer.wait().await.expect_err("renderer error");

    assert_eq!(cycles.events(1), vec![1, 2, 3]);
    assert_eq!(err.to_string(), "solve failed: exit code 2");
    assert_eq!(err.code(), "PRINTER_RENDER_FAILED");
    assert!(matches!(err, PrinterError::Render(RenderError::Failed(_))));
}

#[tokio::test]
async fn warnings_reflect_last_completed_cycle() {
    let renderer = RecordingRenderer::new();
    renderer.warn_next(vec!["first".into(), "second".into()]);
    renderer.warn_next(vec!["third".into()]);
    let printer = recording_printer(renderer).await;

    assert!(printer.warnings().is_empty());
    printer.pause().await.expect("pause");
    assert_eq!(printer.warnings(), vec!["first", "second"]);

    printer.unpause().await.expect("unpause");
    assert_eq!(printer.warnings(), vec!["first", "second"]);
    printer.wait().await.expect("wait");
    assert_eq!(printer.warnings(), vec!["third"]);
}

#[tokio::test]
async fn small_buffer_applies_backpressure_without_losing_events() {
    let renderer = RecordingRenderer::new();
    let cycles = renderer.cycles();
    let printer = Arc::new(
        Printer::builder(renderer)
            .mode(PrinterMode::Quiet)
            .buffer(1)
            .skip_env()
            .build()
            .await
            .expect("build"),
    );

    let mut tasks = Vec::new();
    for worker in 0..4u32 {
        let printer = Arc::clone(&printer);
        tasks.push(tokio::spawn(async move {
            for step in 0..10 {
                printer.write(worker * 100 + step).await.expect("write");
            }
        }));
    }
    for task in tasks {
        task.await.expect("producer");
    }
    printer.wait().await.expect("wait");

    let events = cycles.events(1);
    assert_eq!(events.len(), 40);
    for worker in 0..4u32 {
        let own: Vec<_> = events.iter().filter(|e| **e / 100 == worker).collect();
        assert!(own.windows(2).all(|w| w[0] < w[1]), "per-producer order kept");
    }
}

// =============================================================================
// Pause / Resume
// =============================================================================

#[tokio::test]
async fn pause_resume_round_trip_starts_a_fresh_cycle() {
    let renderer = RecordingRenderer::new();
    let cycles = renderer.cycles();
    renderer.succeed_next();
    renderer.fail_next("second cycle failed");
    let printer = recording_printer(renderer).await;

    printer.write(1).await.expect("write");
    printer.write(2).await.expect("write");
    printer.pause().await.expect("pause");
    assert!(printer.is_paused());

    printer.unpause().await.expect("unpause");
    printer.write(3).await.expect("writable right after unpause");
    let err = printer.wait().await.expect_err("second cycle error");

    assert_eq!(err.to_string(), "second cycle failed");
    assert_eq!(cycles.len(), 2);
    assert_eq!(cycles.events(1), vec![1, 2]);
    assert_eq!(cycles.events(2), vec![3]);
    assert_eq!(printer.cycle(), 2);
}

#[tokio::test]
async fn repeated_pauses_keep_cycles_separate() {
    let renderer = RecordingRenderer::new();
    let cycles = renderer.cycles();
    let printer = recording_printer(renderer).await;

    for round in 0..5u32 {
        printer.write(round).await.expect("write");
        printer.pause().await.expect("pause");
        printer.unpause().await.expect("unpause");
    }
    printer.wait().await.expect("wait");

    let records = cycles.records();
    assert_eq!(records.len(), 6);
    for (i, record) in records.iter().take(5).enumerate() {
        assert_eq!(record.cycle, i as u64 + 1);
        assert_eq!(record.events, vec![i as u32]);
    }
    assert!(records[5].events.is_empty());
}

#[tokio::test]
async fn claims_do_not_survive_a_pause() {
    let printer = recording_printer(RecordingRenderer::new()).await;
    let a = ClaimantId::new("a");
    let b = ClaimantId::new("b");
    let h1 = trace(1);

    assert!(printer.validate_log_source(&h1, &a));
    assert!(!printer.validate_log_source(&h1, &b));

    printer.pause().await.expect("pause");
    printer.unpause().await.expect("unpause");

    assert!(printer.validate_log_source(&h1, &b));
    assert!(!printer.validate_log_source(&h1, &a));
    printer.wait().await.expect("wait");
}

// =============================================================================
// Interrupted calls
// =============================================================================

#[tokio::test]
async fn interrupted_wait_is_completed_by_the_next_call() {
    let renderer = RecordingRenderer::new();
    let cycles = renderer.cycles();
    renderer.fail_next("drain failed");
    let printer = recording_printer(renderer).await;
    printer.write(1).await.expect("write");

    // One poll closes the cycle; the renderer has not finished yet.
    tokio::select! {
        biased;
        _ = printer.wait() => panic!("drained within a single poll"),
        () = std::future::ready(()) => {}
    }
    assert!(format!("{printer:?}").contains("draining"));
    assert!(matches!(printer.write(2).await, Err(PrinterError::NotWritable)));

    let err = printer.wait().await.expect_err("renderer error kept");
    assert_eq!(err.to_string(), "drain failed");
    assert_eq!(cycles.events(1), vec![1]);
    assert!(matches!(printer.wait().await, Err(PrinterError::NotWritable)));
}

#[tokio::test]
async fn interrupted_pause_keeps_the_printer_resumable() {
    let renderer = RecordingRenderer::new();
    let cycles = renderer.cycles();
    renderer.warn_next(vec!["first cycle".into()]);
    let printer = recording_printer(renderer).await;
    printer.write(1).await.expect("write");

    tokio::select! {
        biased;
        _ = printer.pause() => panic!("paused within a single poll"),
        () = std::future::ready(()) => {}
    }

    // The interrupted pause decides what follows the drain.
    printer.wait().await.expect("drain completes");
    assert!(printer.is_paused());
    assert_eq!(printer.warnings(), vec!["first cycle".to_string()]);

    printer.unpause().await.expect("unpause");
    printer.write(2).await.expect("writable");
    printer.wait().await.expect("wait");
    assert_eq!(cycles.events(1), vec![1]);
    assert_eq!(cycles.events(2), vec![2]);
}

// =============================================================================
// Log-source arbitration
// =============================================================================

#[tokio::test]
async fn ownership_scenario() {
    let printer = recording_printer(RecordingRenderer::new()).await;
    let a = ClaimantId::new("a");
    let b = ClaimantId::new("b");
    let h1 = trace(1);

    assert!(printer.validate_log_source(&h1, &a));
    assert!(printer.validate_log_source(&h1, &a));
    assert!(!printer.validate_log_source(&h1, &b));
    assert_eq!(printer.clear_log_source(&a), 1);
    assert!(printer.validate_log_source(&h1, &b));
    printer.wait().await.expect("wait");
}

#[tokio::test]
async fn operations_arbitrate_shared_trace_ids() {
    let out = SharedBuffer::new();
    let printer = plain_printer(&out).await;
    let shared = trace(7);

    let first = printer.operation("first");
    let second = printer.operation("second");
    assert_ne!(first.claimant(), second.claimant());

    assert!(first
        .write_log(&shared, StatusEvent::stdout(shared.clone(), "from first"))
        .await
        .expect("write"));
    assert!(!second
        .write_log(&shared, StatusEvent::stdout(shared.clone(), "from second"))
        .await
        .expect("write"));

    drop(first);
    assert!(second
        .write_log(&shared, StatusEvent::stdout(shared.clone(), "second again"))
        .await
        .expect("write"));
    assert_eq!(second.finish(), 1);

    printer.wait().await.expect("wait");
    assert_eq!(out.contents(), "#1 from first\n#1 second again\n");
}

#[tokio::test]
async fn rejected_write_log_gives_back_only_a_fresh_claim() {
    let out = SharedBuffer::new();
    let printer = plain_printer(&out).await;
    let held = trace(3);
    let fresh = trace(4);
    let other = ClaimantId::new("other");

    let job = printer.operation("job");
    assert!(job
        .write_log(&held, StatusEvent::stdout(held.clone(), "kept"))
        .await
        .expect("write"));
    printer.pause().await.expect("pause");

    let err = job
        .write_log(&fresh, StatusEvent::stdout(fresh.clone(), "late"))
        .await
        .expect_err("paused");
    assert!(matches!(err, PrinterError::NotWritable));
    assert!(printer.validate_log_source(&fresh, &other));

    assert!(job
        .write_log(&held, StatusEvent::stdout(held.clone(), "late"))
        .await
        .is_err());
    assert!(!printer.validate_log_source(&held, &other));

    printer.unpause().await.expect("unpause");
    drop(job);
    printer.wait().await.expect("wait");
    assert_eq!(out.contents(), "#1 kept\n");
}

#[tokio::test]
async fn vertex_events_are_never_arbitrated() {
    let out = SharedBuffer::new();
    let printer = plain_printer(&out).await;
    let shared = trace(9);

    let first = printer.operation("first");
    let second = printer.operation("second");
    first
        .write_log(&shared, StatusEvent::stdout(shared.clone(), "owned"))
        .await
        .expect("write");
    second
        .write(StatusEvent::vertex(shared.clone(), "build", VertexState::Started))
        .await
        .expect("write");
    second
        .write(StatusEvent::warning(VertexWarning::new(shared.clone(), "slow")))
        .await
        .expect("write");
    drop((first, second));

    printer.wait().await.expect("wait");
    assert_eq!(out.contents(), "#1 owned\n#1 build\nWARNING: slow\n");
    assert_eq!(printer.warnings().len(), 1);
}

// =============================================================================
// Mode selection
// =============================================================================

#[tokio::test]
async fn quiet_mode_discards_output() {
    let out = SharedBuffer::new();
    let renderer = RecordingRenderer::new();
    let cycles = renderer.cycles();
    let printer = Printer::builder(renderer)
        .mode(PrinterMode::Quiet)
        .sink(out.clone())
        .skip_env()
        .build()
        .await
        .expect("build");

    printer.write(1).await.expect("write");
    printer.write(2).await.expect("write");
    printer.wait().await.expect("quiet wait succeeds");

    assert_eq!(cycles.events(1), vec![1, 2]);
    assert!(out.is_empty());
    assert_eq!(printer.mode(), PrinterMode::Quiet);
}

#[tokio::test]
async fn tty_without_terminal_fails_construction() {
    let err = Printer::builder(RecordingRenderer::<u32>::new())
        .mode(PrinterMode::Tty)
        .console(ConsoleTarget::Detached)
        .skip_env()
        .build()
        .await
        .expect_err("no terminal");

    assert!(matches!(err, PrinterError::TerminalUnavailable { .. }));
    assert!(err.to_string().starts_with("failed to get console"));
}

#[tokio::test]
async fn auto_without_terminal_degrades_to_plain() {
    let out = SharedBuffer::new();
    let renderer = RecordingRenderer::new();
    let cycles = renderer.cycles();
    let printer = Printer::builder(renderer)
        .sink(out.clone())
        .console(ConsoleTarget::Detached)
        .skip_env()
        .build()
        .await
        .expect("auto never fails");

    printer.write(5).await.expect("write");
    printer.wait().await.expect("wait");

    assert_eq!(printer.mode(), PrinterMode::Auto);
    assert!(!cycles.records()[0].had_console);
    assert_eq!(out.contents(), "5\n");
}

// =============================================================================
// Hooks, shutdown, failures
// =============================================================================

#[tokio::test]
async fn close_hook_runs_once_per_cycle() {
    let closed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&closed);
    let printer = Printer::builder(RecordingRenderer::<u32>::new())
        .mode(PrinterMode::Quiet)
        .on_close(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .skip_env()
        .build()
        .await
        .expect("build");

    assert_eq!(closed.load(Ordering::SeqCst), 0);
    printer.pause().await.expect("pause");
    printer.unpause().await.expect("unpause");
    assert_eq!(closed.load(Ordering::SeqCst), 1);

    printer.wait().await.expect("wait");
    tokio::time::timeout(Duration::from_secs(5), async {
        while closed.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("hook after final cycle");
    assert_eq!(closed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn shutdown_before_rendering_cancels_the_cycle() {
    let (tx, rx) = watch::channel(false);
    let out = SharedBuffer::new();
    let printer = Printer::builder(PlainRenderer::new())
        .mode(PrinterMode::Plain)
        .sink(out.clone())
        .console(ConsoleTarget::Detached)
        .phase("building")
        .shutdown(rx)
        .skip_env()
        .build()
        .await
        .expect("build");

    printer.pause().await.expect("first cycle unaffected");
    assert_eq!(out.contents(), "[+] building\n");

    tx.send(true).expect("receiver alive");
    printer.unpause().await.expect("unpause");
    printer
        .write(StatusEvent::stdout(trace(1), "dropped"))
        .await
        .expect("events are still drained");
    let err = printer.wait().await.expect_err("cancelled");

    assert!(matches!(err, PrinterError::Render(RenderError::Cancelled)));
    assert_eq!(out.contents(), "[+] building\n");
}

#[tokio::test]
async fn panicking_renderer_surfaces_as_loop_exit() {
    let printer = Printer::builder(PanickingRenderer)
        .mode(PrinterMode::Quiet)
        .skip_env()
        .build()
        .await
        .expect("build");

    // The write may race with the panic; either outcome is acceptable.
    let _ = printer.write(1).await;
    let err = printer.wait().await.expect_err("loop gone");
    assert!(matches!(err, PrinterError::LoopExited));
    assert!(matches!(printer.write(2).await, Err(PrinterError::NotWritable)));
}

// =============================================================================
// Log gate
// =============================================================================

#[tokio::test]
async fn log_gate_holds_while_rendering_and_flushes_after() {
    let logs = SharedBuffer::new();
    let gate = LogGate::with_writer(logs.clone());
    let printer = Printer::builder(RecordingRenderer::<u32>::new())
        .mode(PrinterMode::Quiet)
        .log_gate(gate.clone())
        .skip_env()
        .build()
        .await
        .expect("build");

    assert!(gate.is_paused());
    assert_eq!(gate.submit(b"during cycle 1\n".to_vec()), GateResult::Held);
    printer.pause().await.expect("pause");

    assert!(!gate.is_paused());
    assert_eq!(logs.contents(), "during cycle 1\n");
    assert_eq!(gate.submit(b"while paused\n".to_vec()), GateResult::Passed);

    printer.unpause().await.expect("unpause");
    assert_eq!(gate.submit(b"during cycle 2\n".to_vec()), GateResult::Held);
    printer.wait().await.expect("wait");

    assert_eq!(
        logs.contents(),
        "during cycle 1\nwhile paused\nduring cycle 2\n"
    );
}
