//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against the dev data
//! directory and verify outputs.

use std::process::Command;
use std::sync::Mutex;

// Tests share the dev data directory; serialize the ones that mutate
// the persisted scheduler.
static TIMER_LOCK: Mutex<()> = Mutex::new(());

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "studycycle-cli", "--quiet", "--"])
        .args(args)
        .env("STUDYCYCLE_ENV", "dev")
        .output()
        .expect("failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_config_list() {
    let (stdout, _, code) = run_cli(&["config", "list"]);
    assert_eq!(code, 0, "config list failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("config list not JSON");
    assert!(parsed.get("cycle").is_some());
    assert!(parsed.get("theme").is_some());
}

#[test]
fn test_config_get_theme() {
    let (stdout, _, code) = run_cli(&["config", "get", "theme"]);
    assert_eq!(code, 0, "config get failed");
    let theme = stdout.trim();
    assert!(theme == "light" || theme == "dark", "unexpected theme: {theme}");
}

#[test]
fn test_config_get_unknown_key_fails() {
    let (_, stderr, code) = run_cli(&["config", "get", "no.such.key"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_set_rejects_invalid_value() {
    let (_, _, code) = run_cli(&["config", "set", "cycle.ready_secs", "0"]);
    assert_ne!(code, 0, "zero ready duration must be rejected");
}

#[test]
fn test_timer_status_is_snapshot_json() {
    let (stdout, _, code) = run_cli(&["timer", "status"]);
    assert_eq!(code, 0, "timer status failed");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("status not JSON");
    assert_eq!(parsed["type"], "StateSnapshot");
    assert!(parsed.get("remaining_secs").is_some());
}

#[test]
fn test_timer_reset() {
    let _guard = TIMER_LOCK.lock().unwrap();
    let (stdout, _, code) = run_cli(&["timer", "reset", "--yes"]);
    assert_eq!(code, 0, "timer reset failed");
    assert!(stdout.contains("Reset"));
}

#[test]
fn test_timer_run_refuses_to_discard_active_run() {
    let _guard = TIMER_LOCK.lock().unwrap();
    let (_, _, code) = run_cli(&["timer", "start"]);
    assert_eq!(code, 0, "timer start failed");
    let (_, stderr, code) = run_cli(&["timer", "run", "--sets", "1"]);
    assert_ne!(code, 0, "run must not clobber an active run without --yes");
    assert!(stderr.contains("--yes"));
    let (_, _, code) = run_cli(&["timer", "reset", "--yes"]);
    assert_eq!(code, 0, "cleanup reset failed");
}

#[test]
fn test_log_list() {
    let (_, _, code) = run_cli(&["log", "list"]);
    assert_eq!(code, 0, "log list failed");
}

#[test]
fn test_log_comment_unknown_id_is_noop() {
    let (stdout, _, code) = run_cli(&["log", "comment", "no-such-id", "note"]);
    assert_eq!(code, 0, "comment on missing id must not fail");
    assert!(stdout.contains("ok"));
}

#[test]
fn test_log_rm_unknown_id_is_noop() {
    let (_, _, code) = run_cli(&["log", "rm", "no-such-id"]);
    assert_eq!(code, 0, "rm on missing id must not fail");
}

#[test]
fn test_preset_list_shows_builtins() {
    let (stdout, _, code) = run_cli(&["config", "preset", "list"]);
    assert_eq!(code, 0, "preset list failed");
    assert!(stdout.contains("pomodoro"));
    assert!(stdout.contains("deep-work"));
}

#[test]
fn test_preset_rm_builtin_fails() {
    let (_, stderr, code) = run_cli(&["config", "preset", "rm", "pomodoro", "--yes"]);
    assert_ne!(code, 0, "built-in preset must survive rm");
    assert!(stderr.contains("built-in"));
}

#[test]
fn test_preset_rm_requires_confirmation() {
    let (_, stderr, code) = run_cli(&["config", "preset", "rm", "pomodoro"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("--yes"));
}

#[test]
fn test_preset_add_then_rm() {
    // Leftover from an earlier aborted run is fine to discard.
    let _ = run_cli(&["config", "preset", "rm", "evening", "--yes"]);
    let (_, _, code) = run_cli(&["config", "preset", "add", "evening", "1800"]);
    assert_eq!(code, 0, "preset add failed");
    let (stdout, _, _) = run_cli(&["config", "preset", "list"]);
    assert!(stdout.contains("evening"));
    let (_, _, code) = run_cli(&["config", "preset", "rm", "evening", "--yes"]);
    assert_eq!(code, 0, "preset rm failed");
    let (stdout, _, _) = run_cli(&["config", "preset", "list"]);
    assert!(!stdout.contains("evening"));
}

#[test]
fn test_completions_bash() {
    let (stdout, _, code) = run_cli(&["completions", "bash"]);
    assert_eq!(code, 0, "completions failed");
    assert!(stdout.contains("studycycle"));
}
