use std::process::Command;

use assert_cmd::cargo::CommandCargoExt;
use insta::assert_yaml_snapshot;
use serde::{Deserialize, Serialize};
use tempfile::tempdir;

#[derive(Serialize, Deserialize)]
struct TestOutput {
    status: i32,
    stdout: Vec<String>,
    stderr: Vec<String>,
}

fn run<I, S>(args: I) -> TestOutput
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let output = Command::cargo_bin(env!("CARGO_PKG_NAME"))
        .unwrap()
        .args(args)
        .output()
        .expect("Failed to run regcolor");

    TestOutput {
        status: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|x| x.to_owned())
            .collect(),
        stderr: String::from_utf8_lossy(&output.stderr)
            .lines()
            .map(|x| x.to_owned())
            .collect(),
    }
}

#[test]
fn scenario_allocation() {
    let test_output = run(["scenario", "-r", "r0,r1,r2,r3"]);
    assert_yaml_snapshot!("scenario", test_output);
}

#[test]
fn pressure_spills_two_values() {
    let output = run(["pressure", "-r", "r0,r1,r2"]);
    assert_eq!(output.status, 0);
    assert_eq!(output.stdout.last().map(String::as_str), Some("2 spilled"));
    assert!(output.stdout.contains(&"t3 literal 1 -> spill".to_string()));
    assert!(output.stdout.contains(&"t4 literal 2 -> spill".to_string()));
}

#[test]
fn linear_scan_is_selectable() {
    let output = run(["pressure", "-r", "r0,r1,r2", "-a", "linear-scan"]);
    assert_eq!(output.status, 0);
    assert!(output.stdout.contains(&"t3 literal 1 -> r0".to_string()));
    assert!(output.stdout.contains(&"t6 literal 4 -> spill".to_string()));
}

#[test]
fn undefined_reference_fails() {
    let output = run(["undefined"]);
    assert_eq!(output.status, 1);
    assert!(output.stdout.is_empty());
    assert!(
        output.stderr.iter().any(|line| line
            .starts_with("Error compiling program: undefined symbol `z`")),
        "{:?}",
        output.stderr
    );
}

#[test]
fn unknown_program_fails() {
    let output = run(["nonexistent"]);
    assert_eq!(output.status, 1);
    assert!(output.stderr[0].contains("unknown program `nonexistent`"));
}

#[test]
fn strict_definitions_reject_shadowing() {
    let relaxed = run(["shadowed"]);
    assert_eq!(relaxed.status, 0);
    assert!(relaxed.stderr.iter().any(|line| line.starts_with("[WARN]")));

    let strict = run(["shadowed", "--strict-definitions"]);
    assert_eq!(strict.status, 1);
    assert!(strict.stderr[0].contains("duplicate definition of `x`"));
}

#[test]
fn pinned_value_stays_in_its_register() {
    let output = run(["pinned"]);
    assert_eq!(output.status, 0);
    assert!(output.stdout.contains(&"t1 assign a = t2 -> rax".to_string()));
}

#[test]
fn verify_prints_program_output() {
    let output = run(["scenario", "--verify"]);
    assert_eq!(output.status, 0);
    let tail: Vec<_> = output.stdout.iter().rev().take(2).rev().cloned().collect();
    assert_eq!(tail, vec!["output 23".to_string(), "21 cycles".to_string()]);
}

#[test]
fn trace_precedes_allocation() {
    let output = run(["original", "--trace"]);
    assert_eq!(output.status, 0);
    assert_eq!(output.stdout[0], "  t1 <- a assign a = t2");
    assert!(output.stdout.iter().any(|line| line.ends_with("<- add t3 t4, [t3, t4]")));
    assert_eq!(output.stdout.last().map(String::as_str), Some("0 spilled"));
}

#[test]
fn dot_file_is_written() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let dot_path = temp_dir.path().join("scenario.dot");
    let dot_arg = dot_path.to_string_lossy().to_string();

    let output = run(["scenario", "--dot", dot_arg.as_str()]);
    assert_eq!(output.status, 0);

    let dot = std::fs::read_to_string(&dot_path).expect("DOT file was not written");
    assert!(dot.starts_with("graph interference {"));
    assert!(dot.contains("t12 -- t11 [dir=forward, style=dashed];"));
}

#[test]
fn render_failure_is_not_fatal() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    // A directory that does not exist makes the renderer fail whether or not
    // Graphviz is installed.
    let image = temp_dir.path().join("missing").join("graph.png");
    let image_arg = image.to_string_lossy().to_string();

    let output = run(["scenario", "--render", image_arg.as_str()]);
    assert_eq!(output.status, 0);
    assert!(output.stderr.iter().any(|line| line.starts_with("[WARN]")));
}
