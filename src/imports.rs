//! Import statement merging.
//!
//! Adding an import is text-surgical: an existing statement for the same
//! module is extended in place (named specifiers merged into its braces, a
//! default binding prepended only when none exists), and a brand-new
//! statement is inserted after the file's leading import block. Specifiers
//! already present are reported as skipped, never duplicated.
//!
//! Requests are applied one at a time with a re-parse in between, so two
//! requests against the same module see each other's specifiers.

use crate::edit::{write_file, Edit, EditError, EditPlan};
use crate::pool::with_parser;
use crate::tree::{ParseError, SourceFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tree_sitter::Node;

/// One requested import: a module specifier plus the bindings to ensure.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRequest {
    /// Module specifier, e.g. `"./util"` or `"node:path"`.
    pub from: String,
    /// Named specifiers to ensure inside the braces.
    #[serde(default)]
    pub named: Vec<String>,
    /// Default binding to ensure, added only when the statement has none.
    #[serde(default)]
    pub default: Option<String>,
}

/// Outcome for one request.
#[derive(Debug, Clone, Serialize)]
pub struct ImportChange {
    pub from: String,
    pub added: Vec<String>,
    /// Bindings that were already present and left untouched.
    pub skipped: Vec<String>,
    /// True when no statement for the module existed and one was created.
    pub created: bool,
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub file: PathBuf,
    pub results: Vec<ImportChange>,
    pub modified: bool,
}

impl ImportReport {
    /// Total bindings added across all requests.
    pub fn added_count(&self) -> usize {
        self.results.iter().map(|r| r.added.len()).sum()
    }
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("import request for '{from}' names no bindings")]
    EmptyRequest { from: String },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Ensure the requested imports exist in one file.
pub fn add_imports(
    path: &Path,
    requests: &[ImportRequest],
    dry_run: bool,
) -> Result<ImportReport, ImportError> {
    for request in requests {
        if request.named.is_empty() && request.default.is_none() {
            return Err(ImportError::EmptyRequest {
                from: request.from.clone(),
            });
        }
    }

    let original = std::fs::read_to_string(path).map_err(|e| ParseError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut text = original.clone();
    let mut results = Vec::with_capacity(requests.len());
    for request in requests {
        let source = with_parser(|parser| parser.parse(path, text.as_str()))??;
        let (next, change) = apply_request(&source, request)?;
        text = next;
        results.push(change);
    }

    let modified = text != original;
    if modified && !dry_run {
        write_file(path, &text)?;
    }

    Ok(ImportReport {
        file: path.to_path_buf(),
        results,
        modified,
    })
}

fn apply_request(
    source: &SourceFile,
    request: &ImportRequest,
) -> Result<(String, ImportChange), EditError> {
    let mut change = ImportChange {
        from: request.from.clone(),
        added: Vec::new(),
        skipped: Vec::new(),
        created: false,
    };

    match find_import(source, &request.from) {
        Some(statement) => {
            let edits = merge_into(source, statement, request, &mut change);
            let applied = EditPlan::new(edits).apply(source.text())?;
            Ok((applied.text, change))
        }
        None => {
            change.created = true;
            change.added.extend(request.default.iter().cloned());
            change.added.extend(dedup(&request.named));

            let offset = insertion_offset(source);
            let statement = render_statement(request);
            let edit = Edit::new(offset, offset, statement, "");
            let applied = EditPlan::new(vec![edit]).apply(source.text())?;
            Ok((applied.text, change))
        }
    }
}

/// Find a mergeable import statement for `module`. Type-only and namespace
/// imports are never merge targets; a second plain statement may coexist.
fn find_import<'t>(source: &'t SourceFile, module: &str) -> Option<Node<'t>> {
    let mut cursor = source.root().walk();
    for node in source.root().named_children(&mut cursor) {
        if node.kind() != "import_statement" {
            continue;
        }
        let Some(src) = node.child_by_field_name("source") else {
            continue;
        };
        if unquote(source.node_text(src)) != module {
            continue;
        }
        if source.node_text(node).starts_with("import type") {
            continue;
        }
        let Some(clause) = import_clause(node) else {
            // Side-effect import: `import "mod";` has no bindings to merge.
            continue;
        };
        if find_child(clause, "namespace_import").is_some() {
            continue;
        }
        return Some(node);
    }
    None
}

fn merge_into(
    source: &SourceFile,
    statement: Node<'_>,
    request: &ImportRequest,
    change: &mut ImportChange,
) -> Vec<Edit> {
    let clause = import_clause(statement).expect("merge targets carry a clause");
    let named_imports = find_child(clause, "named_imports");
    let default_binding = find_child(clause, "identifier");

    let existing: Vec<String> = named_imports
        .map(|ni| {
            let mut cursor = ni.walk();
            ni.named_children(&mut cursor)
                .filter(|c| c.kind() == "import_specifier")
                .filter_map(|spec| spec.child_by_field_name("name"))
                .map(|n| source.node_text(n).to_string())
                .collect()
        })
        .unwrap_or_default();

    let mut to_add = Vec::new();
    for name in dedup(&request.named) {
        if existing.iter().any(|e| *e == name) {
            change.skipped.push(name);
        } else {
            to_add.push(name);
        }
    }

    let mut edits = Vec::new();

    if let Some(default) = &request.default {
        match default_binding {
            Some(_) => change.skipped.push(default.clone()),
            None => {
                // Clause starts with the braces; the default goes in front.
                let offset = clause.start_byte();
                edits.push(Edit::new(offset, offset, format!("{default}, "), ""));
                change.added.push(default.clone());
            }
        }
    }

    if !to_add.is_empty() {
        let insertion = to_add.join(", ");
        match named_imports {
            Some(ni) => {
                let last_spec = {
                    let mut cursor = ni.walk();
                    ni.named_children(&mut cursor)
                        .filter(|c| c.kind() == "import_specifier")
                        .last()
                };
                let edit = match last_spec {
                    Some(spec) => {
                        let offset = spec.end_byte();
                        Edit::new(offset, offset, format!(", {insertion}"), "")
                    }
                    None => {
                        // Empty braces: `import {} from "mod";`
                        let offset = ni.start_byte() + 1;
                        Edit::new(offset, offset, format!(" {insertion} "), "")
                    }
                };
                edits.push(edit);
            }
            None => {
                // Default-only clause gains a named group.
                let offset = clause.end_byte();
                edits.push(Edit::new(offset, offset, format!(", {{ {insertion} }}"), ""));
            }
        }
        change.added.extend(to_add);
    }

    edits
}

/// Where a brand-new import statement goes: after the file's *leading*
/// import block, otherwise before the first non-comment top-level node,
/// otherwise at the end of the file. Imports buried below code do not
/// extend the leading block, so a new statement never lands mid-file.
fn insertion_offset(source: &SourceFile) -> usize {
    let root = source.root();
    let mut cursor = root.walk();

    let mut last_import_end = None;
    let mut first_code_start = None;
    for node in root.named_children(&mut cursor) {
        match node.kind() {
            "import_statement" => last_import_end = Some(node.end_byte()),
            "comment" => {}
            _ => {
                first_code_start = Some(node.start_byte());
                break;
            }
        }
    }

    if let Some(end) = last_import_end {
        return past_line_terminator(source.text(), end);
    }
    if let Some(start) = first_code_start {
        let (line, _) = source.line_col(start);
        return source.line_start(line).unwrap_or(start);
    }
    source.text().len()
}

fn past_line_terminator(text: &str, mut offset: usize) -> usize {
    let bytes = text.as_bytes();
    if offset < bytes.len() && bytes[offset] == b'\r' {
        offset += 1;
    }
    if offset < bytes.len() && bytes[offset] == b'\n' {
        offset += 1;
    }
    offset
}

fn render_statement(request: &ImportRequest) -> String {
    let named = dedup(&request.named);
    let mut clause = String::new();
    if let Some(default) = &request.default {
        clause.push_str(default);
    }
    if !named.is_empty() {
        if !clause.is_empty() {
            clause.push_str(", ");
        }
        clause.push_str("{ ");
        clause.push_str(&named.join(", "));
        clause.push_str(" }");
    }
    format!("import {clause} from \"{}\";\n", request.from)
}

fn import_clause(statement: Node<'_>) -> Option<Node<'_>> {
    find_child(statement, "import_clause")
}

fn find_child<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find(|c| c.kind() == kind);
    found
}

fn unquote(text: &str) -> &str {
    if text.len() >= 2 {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

fn dedup(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(name) {
            out.push(name.clone());
        }
    }
    out
}
