//! Integration tests for the command-line interface.
//!
//! Drives the compiled binary against TempDir fixtures and asserts on
//! output, exit codes, and on-disk effects.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ast-surgeon"))
}

fn run(args: &[&str]) -> Output {
    bin().args(args).output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// A source tree with one rewrite candidate and one clean file.
fn setup_rewrite_fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("handler.ts"),
        "const msg = e instanceof Error ? e.message : String(e);\n",
    )
    .unwrap();
    fs::write(dir.path().join("clean.ts"), "const n = 1;\n").unwrap();
    dir
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn rewrite_is_dry_run_by_default() {
    let dir = setup_rewrite_fixture();
    let before = fs::read_to_string(dir.path().join("handler.ts")).unwrap();

    let output = run(&[
        "rewrite",
        path_arg(dir.path()),
        "--preset",
        "error-message-ternary",
        "--replace",
        "getErrorMessage(${errorVar})",
    ]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("DRY RUN"));
    assert!(out.contains("Summary:"));
    assert_eq!(
        fs::read_to_string(dir.path().join("handler.ts")).unwrap(),
        before
    );
}

#[test]
fn rewrite_with_write_modifies_the_file() {
    let dir = setup_rewrite_fixture();

    let output = run(&[
        "rewrite",
        path_arg(dir.path()),
        "--preset",
        "error-message-ternary",
        "--replace",
        "getErrorMessage(${errorVar})",
        "--write",
    ]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(!out.contains("DRY RUN"));
    assert!(out.contains("1 changes in 1 files"));

    let after = fs::read_to_string(dir.path().join("handler.ts")).unwrap();
    assert!(after.contains("getErrorMessage(e)"));
    assert!(!after.contains("instanceof Error"));
    assert_eq!(
        fs::read_to_string(dir.path().join("clean.ts")).unwrap(),
        "const n = 1;\n"
    );
}

#[test]
fn failing_removal_target_exits_nonzero_but_siblings_proceed() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("mod.ts");
    fs::write(&file, "function real() {}\nconst keep = 1;\n").unwrap();

    let output = run(&[
        "remove",
        path_arg(&file),
        "--function",
        "ghost",
        "--function",
        "real",
        "--write",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("'ghost' not found"));
    assert!(stdout(&output).contains("1 removed"));
    assert_eq!(fs::read_to_string(&file).unwrap(), "const keep = 1;\n");
}

#[test]
fn query_file_flag_loads_the_query_from_disk() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.ts"), "ping();\npong();\n").unwrap();
    let query_path = dir.path().join("calls.json");
    fs::write(&query_path, r#"{ "kind": "call_expression" }"#).unwrap();

    let output = run(&[
        "search",
        path_arg(dir.path()),
        "--query-file",
        path_arg(&query_path),
    ]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("call_expression"));
    assert!(out.contains("2 matches in 1 of 1 files"));
}

#[test]
fn malformed_query_file_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.ts"), "ping();\n").unwrap();
    let query_path = dir.path().join("bad.json");
    fs::write(&query_path, "{ not json").unwrap();

    let output = run(&[
        "search",
        path_arg(dir.path()),
        "--query-file",
        path_arg(&query_path),
    ]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("malformed query"));
}

#[test]
fn diff_flag_renders_before_and_after_lines() {
    let dir = setup_rewrite_fixture();

    let output = run(&[
        "rewrite",
        path_arg(dir.path()),
        "--preset",
        "error-message-ternary",
        "--replace",
        "getErrorMessage(${errorVar})",
        "--diff",
    ]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("-e instanceof Error ? e.message : String(e)"));
    assert!(out.contains("+getErrorMessage(e)"));
}

#[test]
fn json_flag_emits_machine_readable_report() {
    let dir = setup_rewrite_fixture();

    let output = run(&[
        "rewrite",
        path_arg(dir.path()),
        "--preset",
        "error-message-ternary",
        "--replace",
        "getErrorMessage(${errorVar})",
        "--json",
    ]);

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["mode"], "preset");
    assert_eq!(report["total_matches"], 1);
    assert_eq!(report["changes"][0]["after"], "getErrorMessage(e)");
}

#[test]
fn add_import_merges_and_reports() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("app.ts");
    fs::write(&file, "import { bar } from \"mod\";\nbar();\n").unwrap();

    let output = run(&[
        "add-import",
        path_arg(&file),
        "--from",
        "mod",
        "--named",
        "foo",
        "--write",
    ]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("1 bindings added"));
    assert!(fs::read_to_string(&file)
        .unwrap()
        .starts_with("import { bar, foo } from \"mod\";\n"));
}

#[test]
fn presets_command_lists_builtins() {
    let output = run(&["presets"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("error-message-ternary"));
    assert!(out.contains("console-call"));
}

#[test]
fn unknown_preset_fails_without_touching_files() {
    let dir = setup_rewrite_fixture();
    let before = fs::read_to_string(dir.path().join("handler.ts")).unwrap();

    let output = run(&[
        "rewrite",
        path_arg(dir.path()),
        "--preset",
        "no-such-preset",
        "--replace",
        "x",
        "--write",
    ]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown preset"));
    assert_eq!(
        fs::read_to_string(dir.path().join("handler.ts")).unwrap(),
        before
    );
}
