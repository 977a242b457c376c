//! Shared E2E test helpers for `pulse` binary tests.

use assert_cmd::cargo::cargo_bin_cmd;
use std::time::Duration;

/// Default timeout for CLI tests.
pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Variables that change printer behaviour and must not leak in from the
/// developer's shell.
const PRINTER_ENV_VARS: &[&str] = &["PULSE_PROGRESS", "PULSE_PROGRESS_BUFFER", "RUST_LOG"];

/// Build a Command for the `pulse` binary with a clean printer environment.
pub fn pulse_cmd() -> assert_cmd::Command {
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("pulse");
    cmd.timeout(TIMEOUT);
    for var in PRINTER_ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// Run `pulse` with `args` and return stdout, asserting success.
pub fn stdout_of(args: &[&str]) -> String {
    let output = pulse_cmd().args(args).output().expect("run pulse");
    assert!(
        output.status.success(),
        "pulse {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}
