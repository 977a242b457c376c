//! `PULSE_PROGRESS` handling at construction time.
//!
//! Kept in its own test binary, and in a single test, because it mutates
//! the process environment.

#![allow(clippy::expect_used)]

use pulse_printer::testing::RecordingRenderer;
use pulse_printer::{ConsoleTarget, Printer, PrinterError, PrinterMode};
use pulse_types::ErrorCode;

async fn build(mode: PrinterMode, skip_env: bool) -> Result<Printer<RecordingRenderer<u8>>, PrinterError> {
    let builder = Printer::builder(RecordingRenderer::new())
        .mode(mode)
        .sink(std::io::sink())
        .console(ConsoleTarget::Detached);
    let builder = if skip_env { builder.skip_env() } else { builder };
    builder.build().await
}

#[tokio::test]
async fn progress_env_overrides_only_auto() {
    std::env::set_var("PULSE_PROGRESS", "quiet");

    let printer = build(PrinterMode::Auto, false).await.expect("auto");
    assert_eq!(printer.mode(), PrinterMode::Quiet);
    printer.wait().await.expect("wait");

    let printer = build(PrinterMode::Plain, false).await.expect("plain");
    assert_eq!(printer.mode(), PrinterMode::Plain);
    printer.wait().await.expect("wait");

    let printer = build(PrinterMode::Auto, true).await.expect("skip env");
    assert_eq!(printer.mode(), PrinterMode::Auto);
    printer.wait().await.expect("wait");

    std::env::set_var("PULSE_PROGRESS", "sparkly");
    let err = build(PrinterMode::Auto, false).await.expect_err("unknown mode");
    assert_eq!(err.code(), "PRINTER_CONFIG");
    assert!(err.to_string().contains("PULSE_PROGRESS"));

    std::env::set_var("PULSE_PROGRESS", "");
    let printer = build(PrinterMode::Auto, false).await.expect("empty ignored");
    assert_eq!(printer.mode(), PrinterMode::Auto);
    printer.wait().await.expect("wait");

    std::env::remove_var("PULSE_PROGRESS");
}
