//! E2E integration tests for the `pulse` binary.
//!
//! Progress output goes to stdout; logs and errors go to stderr.

#![allow(clippy::expect_used)]

mod common;

use common::{pulse_cmd, stdout_of};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::io::Write;

// ─── Progress Modes ────────────────────────────────────────────────

#[test]
fn plain_progress_shows_steps_and_warnings() {
    pulse_cmd()
        .args(["--progress", "plain", "--phase", "demo"])
        .assert()
        .success()
        .stdout(contains("[+] demo"))
        .stdout(contains("Running 3 jobs of 3 steps"))
        .stdout(contains("[batch 1] step 0"))
        .stdout(contains("[batch 1] step 2"))
        .stdout(contains("running step 0"))
        .stdout(contains("DONE"))
        .stdout(contains("WARNING: step ran without a cache"))
        .stdout(contains("1 warnings"));
}

#[test]
fn quiet_progress_prints_only_the_summary() {
    pulse_cmd()
        .args(["--progress", "quiet"])
        .assert()
        .success()
        .stdout(contains("#1").not())
        .stdout(contains("step 0").not())
        .stdout(contains("1 warnings"));
}

#[test]
fn auto_progress_without_terminal_falls_back_to_plain() {
    pulse_cmd()
        .args(["--jobs", "1", "--steps", "1"])
        .assert()
        .success()
        .stdout(contains("#1 [batch 1] step 0"));
}

#[test]
fn tty_progress_without_terminal_fails() {
    pulse_cmd()
        .args(["--progress", "tty"])
        .assert()
        .failure()
        .stderr(contains("failed to get console"));
}

#[test]
fn unknown_progress_flag_is_rejected() {
    pulse_cmd()
        .args(["--progress", "fancy"])
        .assert()
        .failure()
        .stderr(contains("unknown progress mode"));
}

// ─── Environment ───────────────────────────────────────────────────

#[test]
fn progress_env_overrides_auto() {
    pulse_cmd()
        .env("PULSE_PROGRESS", "quiet")
        .assert()
        .success()
        .stdout(contains("#1").not());
}

#[test]
fn progress_env_does_not_override_explicit_mode() {
    pulse_cmd()
        .env("PULSE_PROGRESS", "quiet")
        .args(["--progress", "plain"])
        .assert()
        .success()
        .stdout(contains("#1"));
}

#[test]
fn invalid_progress_env_fails_startup() {
    pulse_cmd()
        .env("PULSE_PROGRESS", "sparkly")
        .assert()
        .failure()
        .stderr(contains("PULSE_PROGRESS"));
}

// ─── Pause / Resume ────────────────────────────────────────────────

#[test]
fn pause_after_first_runs_two_cycles() {
    let stdout = stdout_of(&["--progress", "plain", "--pause-after-first"]);

    let paused = stdout
        .find("Printer paused after batch 1")
        .expect("pause message");
    let first = stdout.find("[batch 1] step 0").expect("batch 1 output");
    let second = stdout.find("[batch 2] step 0").expect("batch 2 output");
    assert!(first < paused && paused < second, "{stdout}");
    assert!(stdout.contains("2 warnings"));
}

// ─── Failures ──────────────────────────────────────────────────────

#[test]
fn failing_job_exits_non_zero() {
    pulse_cmd()
        .args(["--progress", "plain", "--fail", "1"])
        .assert()
        .failure()
        .stdout(contains("ERROR: job 1 failed"))
        .stderr(contains("1 job(s) failed"));
}

// ─── Configuration ─────────────────────────────────────────────────

#[test]
fn config_file_sets_phase_and_mode() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(
        file,
        "mode = \"plain\"\nphase = \"from-file\"\n\n[description]\ntext = \"Configured run\""
    )
    .expect("write config");

    pulse_cmd()
        .args(["--config", file.path().to_str().expect("utf8 path")])
        .assert()
        .success()
        .stdout(contains("[+] from-file"))
        .stdout(contains("Configured run"))
        .stdout(contains("Running 3 jobs").not());
}

#[test]
fn invalid_config_fails_startup() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "buffer = 0").expect("write config");

    pulse_cmd()
        .args(["--config", file.path().to_str().expect("utf8 path")])
        .assert()
        .failure()
        .stderr(contains("Config error"));
}

#[test]
fn invalid_buffer_env_fails_startup() {
    pulse_cmd()
        .env("PULSE_PROGRESS_BUFFER", "lots")
        .assert()
        .failure()
        .stderr(contains("PULSE_PROGRESS_BUFFER"));
}

// ─── Logging ───────────────────────────────────────────────────────

#[test]
fn debug_logs_go_to_stderr() {
    pulse_cmd()
        .args(["-d", "--progress", "plain", "--jobs", "1"])
        .assert()
        .success()
        .stderr(contains("Printer ready"))
        .stderr(contains("Reporting cycle drained"))
        .stdout(contains("Printer ready").not());
}
