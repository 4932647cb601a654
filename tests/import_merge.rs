//! Import merging against realistic file shapes.

use ast_surgeon::imports::{add_imports, ImportRequest};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mod.ts");
    fs::write(&path, content).unwrap();
    (dir, path)
}

fn named(from: &str, names: &[&str]) -> ImportRequest {
    ImportRequest {
        from: from.to_string(),
        named: names.iter().map(|s| s.to_string()).collect(),
        default: None,
    }
}

#[test]
fn merging_into_existing_statement_never_duplicates_the_line() {
    let (_dir, path) = fixture("import { bar } from \"mod\";\nuse(bar);\n");

    add_imports(&path, &[named("mod", &["foo"])], false).unwrap();

    let after = fs::read_to_string(&path).unwrap();
    assert_eq!(after.matches("from \"mod\"").count(), 1);
    assert!(after.starts_with("import { bar, foo } from \"mod\";\n"));
}

#[test]
fn repeated_invocations_are_idempotent() {
    let (_dir, path) = fixture("import { bar } from \"mod\";\n");

    add_imports(&path, &[named("mod", &["foo"])], false).unwrap();
    let once = fs::read_to_string(&path).unwrap();

    let report = add_imports(&path, &[named("mod", &["foo"])], false).unwrap();
    assert!(!report.modified);
    assert_eq!(fs::read_to_string(&path).unwrap(), once);
}

#[test]
fn aliased_specifier_counts_by_its_imported_name() {
    let (_dir, path) = fixture("import { foo as localFoo } from \"mod\";\n");

    let report = add_imports(&path, &[named("mod", &["foo"])], false).unwrap();
    assert!(!report.modified);
    assert_eq!(report.results[0].skipped, vec!["foo"]);
}

#[test]
fn new_import_lands_after_the_leading_import_block() {
    let (_dir, path) = fixture(concat!(
        "// entry point\n",
        "import { a } from \"./a\";\n",
        "import b from \"./b\";\n",
        "\n",
        "a(b);\n",
    ));

    add_imports(&path, &[named("./c", &["c"])], false).unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        concat!(
            "// entry point\n",
            "import { a } from \"./a\";\n",
            "import b from \"./b\";\n",
            "import { c } from \"./c\";\n",
            "\n",
            "a(b);\n",
        )
    );
}

#[test]
fn default_and_named_combine_in_one_new_statement() {
    let (_dir, path) = fixture("go();\n");

    let request = ImportRequest {
        from: "react".to_string(),
        named: vec!["useState".to_string(), "useEffect".to_string()],
        default: Some("React".to_string()),
    };
    add_imports(&path, &[request], false).unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "import React, { useState, useEffect } from \"react\";\ngo();\n"
    );
}

#[test]
fn type_only_import_is_left_alone() {
    let (_dir, path) = fixture("import type { Shape } from \"mod\";\nrender();\n");

    add_imports(&path, &[named("mod", &["draw"])], false).unwrap();
    let after = fs::read_to_string(&path).unwrap();
    assert!(after.contains("import type { Shape } from \"mod\";"));
    assert!(after.contains("import { draw } from \"mod\";"));
}

#[test]
fn multiple_requests_in_one_call() {
    let (_dir, path) = fixture("import { x } from \"./x\";\nmain();\n");

    let requests = [
        named("./x", &["y"]),
        named("./z", &["z"]),
    ];
    let report = add_imports(&path, &requests, false).unwrap();
    assert!(!report.results[0].created);
    assert!(report.results[1].created);
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "import { x, y } from \"./x\";\nimport { z } from \"./z\";\nmain();\n"
    );
}
