//! Integration tests for the `blockvol` CLI binary.
//!
//! These tests run the actual binary and verify its behavior, matching the
//! teacher's `tests/tool_tests.rs` style (binary path resolution relative to
//! the test executable, plain `std::process::Command`).

use std::io::Write;
use std::process::{Command, Stdio};

fn blockvol_binary() -> std::path::PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps
    path.push("blockvol");
    path
}

fn run_cli(args: &[&str], stdin: &str) -> (String, String, bool) {
    let mut child = Command::new(blockvol_binary())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn blockvol binary");

    child
        .stdin
        .as_mut()
        .expect("stdin was piped")
        .write_all(stdin.as_bytes())
        .expect("failed to write to stdin");

    let output = child.wait_with_output().expect("failed to read output");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn csv_input(dim: u16, pblock: u16, tag: &str) -> String {
    let mut out = format!("V,{dim},{dim},{dim},{pblock},{pblock},{pblock}\n");
    for z in 0..dim {
        for y in 0..dim {
            for x in 0..dim {
                out += &format!("{x},{y},{z},'{tag}'\n");
            }
        }
    }
    out
}

/// Writes a small homogeneous volume to a temp file and feeds it through
/// stdin redirected from that file, exercising the `tempfile` dependency the
/// way the teacher's integration tests do for fixture databases.
#[test]
fn cli_reads_volume_from_redirected_tempfile() {
    let mut file = tempfile::NamedTempFile::new().expect("failed to create temp file");
    write!(file, "V,1,1,1,1,1,1\n0,0,0,'Granite'\n").unwrap();

    let output = Command::new(blockvol_binary())
        .stdin(std::fs::File::open(file.path()).unwrap())
        .output()
        .expect("failed to run blockvol");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Granite"));
}

#[test]
fn cli_line_merge_is_the_default_variant() {
    let (stdout, stderr, success) = run_cli(&[], &csv_input(2, 2, "A"));
    assert!(success, "stderr: {stderr}");
    assert!(stdout.contains("A"));
}

#[test]
fn cli_kd_tree_variant_flag() {
    let (stdout, stderr, success) = run_cli(&["--variant", "kd-tree"], &csv_input(2, 2, "A"));
    assert!(success, "stderr: {stderr}");
    assert!(stdout.contains("A"));
}

#[test]
fn cli_rejects_debug_raw_with_line_merge() {
    let (_, stderr, success) = run_cli(
        &["--variant", "line-merge", "--debug-raw"],
        &csv_input(1, 1, "A"),
    );
    assert!(!success, "expected failure, stderr: {stderr}");
    assert!(stderr.contains("only supported for the kd-tree engine"));
}

#[test]
fn cli_debug_raw_dumps_every_voxel() {
    let csv = "V,2,1,1,2,1,1\n0,0,0,'A'\n1,0,0,'B'\n";
    let (stdout, stderr, success) = run_cli(&["--variant", "kd-tree", "--debug-raw"], csv);
    assert!(success, "stderr: {stderr}");
    assert_eq!(stdout.lines().count(), 2, "expected one line per voxel: {stdout}");
}

#[test]
fn cli_malformed_header_exits_nonzero() {
    let (_, stderr, success) = run_cli(&[], "not a header\n");
    assert!(!success);
    assert!(!stderr.is_empty());
}

#[test]
fn cli_verbose_raises_log_level() {
    let (_, stderr, success) = run_cli(&["-v"], &csv_input(1, 1, "A"));
    assert!(success);
    assert!(stderr.contains("starting blockvol"));
}

#[test]
fn cli_quiet_suppresses_startup_log() {
    let (_, stderr, success) = run_cli(&["-q"], &csv_input(1, 1, "A"));
    assert!(success);
    assert!(!stderr.contains("starting blockvol"));
}
