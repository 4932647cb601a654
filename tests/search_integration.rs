//! Multi-file search behavior: determinism, limits, globs, failure modes.

use ast_surgeon::query::{resolve_preset, Query};
use ast_surgeon::search::{search, SearchError, SearchOptions};
use std::fs;
use tempfile::TempDir;

fn compile(json: &str) -> ast_surgeon::query::CompiledQuery {
    Query::from_json_str(json).unwrap().compile().unwrap()
}

fn repo_fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src/deep")).unwrap();
    fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
    fs::write(
        dir.path().join("src/a.ts"),
        "console.log(\"a\");\nwork();\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("src/deep/b.tsx"),
        "console.warn(\"b\");\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("node_modules/pkg/index.js"),
        "console.log(\"vendored\");\n",
    )
    .unwrap();
    fs::write(dir.path().join("README.md"), "# docs\n").unwrap();
    dir
}

#[test]
fn same_search_twice_is_identical() {
    let dir = repo_fixture();
    let query = compile(r#"{ "kind": "call_expression" }"#);
    let options = SearchOptions::default();

    let first = search(dir.path(), &query, &options).unwrap();
    let second = search(dir.path(), &query, &options).unwrap();

    assert_eq!(first.matches.len(), second.matches.len());
    for (a, b) in first.matches.iter().zip(&second.matches) {
        assert_eq!(a.file, b.file);
        assert_eq!(a.line, b.line);
        assert_eq!(a.column, b.column);
        assert_eq!(a.kind, b.kind);
    }
}

#[test]
fn results_ordered_by_file_then_position() {
    let dir = repo_fixture();
    let query = compile(r#"{ "kind": "call_expression" }"#);
    let outcome = search(dir.path(), &query, &SearchOptions::default()).unwrap();

    let keys: Vec<_> = outcome
        .matches
        .iter()
        .map(|m| (m.file.clone(), m.line, m.column))
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[test]
fn exclude_glob_skips_vendored_code() {
    let dir = repo_fixture();
    let query = compile(r#"{ "kind": "call_expression" }"#);
    let options = SearchOptions {
        exclude: vec!["node_modules/**".to_string()],
        ..SearchOptions::default()
    };
    let outcome = search(dir.path(), &query, &options).unwrap();
    assert_eq!(outcome.total_files, 2);
    assert!(outcome
        .matches
        .iter()
        .all(|m| !m.file.to_string_lossy().contains("node_modules")));
}

#[test]
fn include_glob_narrows_to_one_subtree() {
    let dir = repo_fixture();
    let query = compile(r#"{ "kind": "call_expression" }"#);
    let options = SearchOptions {
        include: vec!["src/deep/**".to_string()],
        ..SearchOptions::default()
    };
    let outcome = search(dir.path(), &query, &options).unwrap();
    assert_eq!(outcome.total_files, 1);
    assert_eq!(outcome.matches.len(), 1);
}

#[test]
fn invalid_glob_is_rejected_before_walking() {
    let dir = repo_fixture();
    let query = compile(r#"{ "kind": "call_expression" }"#);
    let options = SearchOptions {
        include: vec!["src/[".to_string()],
        ..SearchOptions::default()
    };
    assert!(matches!(
        search(dir.path(), &query, &options),
        Err(SearchError::InvalidGlob { .. })
    ));
}

#[test]
fn limit_is_exact_not_approximate() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.ts"), "one();\ntwo();\nthree();\n").unwrap();

    let query = compile(r#"{ "kind": "call_expression" }"#);

    for limit in 1..=2 {
        let options = SearchOptions {
            limit: Some(limit),
            ..SearchOptions::default()
        };
        let outcome = search(dir.path(), &query, &options).unwrap();
        assert_eq!(outcome.matches.len(), limit);
        assert!(outcome.truncated);
    }

    let options = SearchOptions {
        limit: Some(3),
        ..SearchOptions::default()
    };
    let outcome = search(dir.path(), &query, &options).unwrap();
    assert_eq!(outcome.matches.len(), 3);
    assert!(!outcome.truncated);
}

#[test]
fn missing_explicit_file_is_an_error_but_empty_dir_is_not() {
    let dir = TempDir::new().unwrap();
    let query = compile(r#"{ "kind": "call_expression" }"#);

    let missing = dir.path().join("nope.ts");
    assert!(matches!(
        search(&missing, &query, &SearchOptions::default()),
        Err(SearchError::NotFound(_))
    ));

    let outcome = search(dir.path(), &query, &SearchOptions::default()).unwrap();
    assert_eq!(outcome.total_files, 0);
    assert!(outcome.matches.is_empty());
}

#[test]
fn captures_carry_text_and_position() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("a.ts"),
        "const m = cause instanceof Error ? cause.message : String(cause);\n",
    )
    .unwrap();

    let query = resolve_preset("error-message-ternary")
        .unwrap()
        .compile()
        .unwrap();
    let outcome = search(dir.path(), &query, &SearchOptions::default()).unwrap();
    assert_eq!(outcome.matches.len(), 1);

    let capture = &outcome.matches[0].captures["errorVar"];
    assert_eq!(capture.text, "cause");
    assert_eq!(capture.line, 1);
    assert_eq!(capture.column, 11);
}

#[test]
fn nested_query_rejects_structural_near_misses() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("a.ts"),
        concat!(
            // Hit: the full shape.
            "const a = e instanceof Error ? e.message : String(e);\n",
            // Miss: wrong consequence (not a member expression).
            "const b = e instanceof Error ? \"err\" : String(e);\n",
            // Miss: wrong condition operator.
            "const c = e === null ? e.message : String(e);\n",
        ),
    )
    .unwrap();

    let query = resolve_preset("error-message-ternary")
        .unwrap()
        .compile()
        .unwrap();
    let outcome = search(dir.path(), &query, &SearchOptions::default()).unwrap();
    assert_eq!(outcome.matches.len(), 1);
    assert_eq!(outcome.matches[0].line, 1);
}
