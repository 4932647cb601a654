//! Structural node removal.
//!
//! Removal is a specialization of replacement: an edit with empty
//! replacement text whose span covers the full declaration plus its leading
//! indentation/comment block and trailing line terminator, so removal
//! leaves no blank-line artifact.
//!
//! For N targets in one invocation: every target's span is resolved against
//! the pre-removal text first, removal happens in descending original-line
//! order, and results are reported ascending by original line. A target
//! that cannot be resolved is an individual failure; the rest proceed.

use crate::cache;
use crate::edit::{write_file, Edit, EditError, EditPlan, EditStatus};
use crate::report::Mode;
use crate::search::open_file;
use crate::tree::{ParseError, SourceFile};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tree_sitter::Node;

/// Category of a named declaration removal target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeclCategory {
    Function,
    Class,
    Interface,
    TypeAlias,
    Variable,
    Enum,
}

impl DeclCategory {
    fn node_kinds(self) -> &'static [&'static str] {
        match self {
            DeclCategory::Function => &["function_declaration", "generator_function_declaration"],
            DeclCategory::Class => &["class_declaration"],
            DeclCategory::Interface => &["interface_declaration"],
            DeclCategory::TypeAlias => &["type_alias_declaration"],
            DeclCategory::Variable => &["lexical_declaration", "variable_declaration"],
            DeclCategory::Enum => &["enum_declaration"],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DeclCategory::Function => "function",
            DeclCategory::Class => "class",
            DeclCategory::Interface => "interface",
            DeclCategory::TypeAlias => "type alias",
            DeclCategory::Variable => "variable",
            DeclCategory::Enum => "enum",
        }
    }
}

/// One removal target.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RemoveTarget {
    /// A named declaration of a given category, matched by exact name.
    Declaration { category: DeclCategory, name: String },
    /// A raw statement identified by its 1-based source line.
    Statement { line: usize },
    /// A call expression used as a grouping construct, identified by callee
    /// name plus an exact or regex match on its first argument.
    CallBlock {
        callee: String,
        #[serde(default)]
        arg: Option<String>,
        #[serde(default, rename = "argPattern")]
        arg_pattern: Option<String>,
    },
}

impl fmt::Display for RemoveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoveTarget::Declaration { category, name } => {
                write!(f, "{} '{}'", category.label(), name)
            }
            RemoveTarget::Statement { line } => write!(f, "statement at line {line}"),
            RemoveTarget::CallBlock {
                callee,
                arg,
                arg_pattern,
            } => match (arg, arg_pattern) {
                (Some(a), _) => write!(f, "call block {callee}({a})"),
                (_, Some(p)) => write!(f, "call block {callee}(/{p}/)"),
                _ => write!(f, "call block {callee}(...)"),
            },
        }
    }
}

/// Outcome for one target, tagged with its original (pre-removal) line.
#[derive(Debug, Clone, Serialize)]
pub struct RemovalItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub target: String,
    pub removed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RemovalReport {
    pub mode: Mode,
    pub file: PathBuf,
    pub removed_count: usize,
    pub failed_count: usize,
    /// Sorted ascending by original line; unresolved targets last.
    pub results: Vec<RemovalItem>,
}

#[derive(Error, Debug)]
pub enum RemoveError {
    #[error("call block target must give exactly one of 'arg' or 'argPattern'")]
    AmbiguousArgMatch,

    #[error("invalid argPattern '{pattern}': {message}")]
    InvalidArgPattern { pattern: String, message: String },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Remove the given targets from one file.
///
/// All spans are resolved before any mutation; the whole set is applied as
/// one atomic in-memory pass and written back once (unless dry-run).
pub fn remove_targets(
    path: &Path,
    targets: &[RemoveTarget],
    dry_run: bool,
) -> Result<RemovalReport, RemoveError> {
    // Target shape validation is configuration-level: abort before I/O.
    for target in targets {
        if let RemoveTarget::CallBlock {
            arg, arg_pattern, ..
        } = target
        {
            match (arg, arg_pattern) {
                (Some(_), None) | (None, Some(_)) => {}
                _ => return Err(RemoveError::AmbiguousArgMatch),
            }
            if let Some(pattern) = arg_pattern {
                cache::get_or_compile_regex(pattern).map_err(|e| {
                    RemoveError::InvalidArgPattern {
                        pattern: pattern.clone(),
                        message: e.to_string(),
                    }
                })?;
            }
        }
    }

    let source = open_file(path)?;

    // Resolve every span against the pre-removal text first; never
    // interleave resolution and mutation.
    struct Resolved {
        target_index: usize,
        line: usize,
        span: (usize, usize),
    }
    let mut resolved: Vec<Resolved> = Vec::new();
    let mut items: Vec<RemovalItem> = Vec::new();

    for (target_index, target) in targets.iter().enumerate() {
        match resolve_target(&source, target) {
            Ok(span) => {
                let (line, _) = source.line_col(span.0);
                resolved.push(Resolved {
                    target_index,
                    line,
                    span,
                });
            }
            Err(reason) => items.push(RemovalItem {
                line: None,
                target: target.to_string(),
                removed: false,
                reason: Some(reason),
            }),
        }
    }

    // Remove in descending original-line order.
    resolved.sort_by(|a, b| b.line.cmp(&a.line));

    let edits: Vec<Edit> = resolved
        .iter()
        .map(|r| Edit::removal(r.span.0, r.span.1, &source.text()[r.span.0..r.span.1]))
        .collect();
    let applied = EditPlan::new(edits).apply(source.text())?;

    let mut removed_count = 0;
    for (r, status) in resolved.iter().zip(&applied.statuses) {
        let target = targets[r.target_index].to_string();
        match status {
            EditStatus::Applied | EditStatus::AlreadyApplied => {
                removed_count += 1;
                items.push(RemovalItem {
                    line: Some(r.line),
                    target,
                    removed: true,
                    reason: None,
                });
            }
            EditStatus::SkippedOverlap { .. } => items.push(RemovalItem {
                line: Some(r.line),
                target,
                removed: false,
                reason: Some("span overlaps another removal target".to_string()),
            }),
            EditStatus::SkippedVerification { .. } => items.push(RemovalItem {
                line: Some(r.line),
                target,
                removed: false,
                reason: Some("before-text verification failed".to_string()),
            }),
        }
    }

    if removed_count > 0 && !dry_run {
        write_file(path, &applied.text)?;
    }

    // Report ascending by original line for readability.
    items.sort_by_key(|item| item.line.unwrap_or(usize::MAX));
    let failed_count = items.iter().filter(|i| !i.removed).count();

    Ok(RemovalReport {
        mode: Mode::Removal,
        file: path.to_path_buf(),
        removed_count,
        failed_count,
        results: items,
    })
}

fn resolve_target(source: &SourceFile, target: &RemoveTarget) -> Result<(usize, usize), String> {
    match target {
        RemoveTarget::Declaration { category, name } => {
            let node = find_declaration(source, *category, name)
                .ok_or_else(|| format!("{} '{}' not found", category.label(), name))?;
            Ok(removal_span(source, node))
        }
        RemoveTarget::Statement { line } => {
            let node = find_statement_at_line(source, *line)
                .ok_or_else(|| format!("no statement starts at line {line}"))?;
            Ok(removal_span(source, node))
        }
        RemoveTarget::CallBlock {
            callee,
            arg,
            arg_pattern,
        } => {
            let node = find_call_block(source, callee, arg.as_deref(), arg_pattern.as_deref())
                .ok_or_else(|| format!("no call to '{callee}' with a matching first argument"))?;
            Ok(removal_span(source, node))
        }
    }
}

fn find_declaration<'t>(
    source: &'t SourceFile,
    category: DeclCategory,
    name: &str,
) -> Option<Node<'t>> {
    let kinds = category.node_kinds();
    for node in source.named_nodes() {
        if !kinds.contains(&node.kind()) {
            continue;
        }
        let found = match category {
            DeclCategory::Variable => declared_variable_names(source, node)
                .any(|n| n == name),
            _ => node
                .child_by_field_name("name")
                .is_some_and(|n| source.node_text(n) == name),
        };
        if found {
            return Some(lift_export(node));
        }
    }
    None
}

fn declared_variable_names<'t>(
    source: &'t SourceFile,
    declaration: Node<'t>,
) -> impl Iterator<Item = &'t str> {
    let mut names = Vec::new();
    let mut cursor = declaration.walk();
    for child in declaration.named_children(&mut cursor) {
        if child.kind() == "variable_declarator" {
            if let Some(name_node) = child.child_by_field_name("name") {
                names.push(source.node_text(name_node));
            }
        }
    }
    names.into_iter()
}

fn find_statement_at_line<'t>(source: &'t SourceFile, line: usize) -> Option<Node<'t>> {
    source.line_start(line)?;
    source.named_nodes().find(|node| {
        let (node_line, _) = source.line_col(node.start_byte());
        node_line == line && is_statement(*node)
    })
}

fn is_statement(node: Node<'_>) -> bool {
    node.parent()
        .is_some_and(|p| matches!(p.kind(), "program" | "statement_block"))
}

fn find_call_block<'t>(
    source: &'t SourceFile,
    callee: &str,
    arg: Option<&str>,
    arg_pattern: Option<&str>,
) -> Option<Node<'t>> {
    for node in source.named_nodes() {
        if node.kind() != "call_expression" {
            continue;
        }
        let callee_node = node.child_by_field_name("function")?;
        if source.node_text(callee_node) != callee {
            continue;
        }
        let args = node.child_by_field_name("arguments")?;
        let Some(first) = args.named_child(0) else {
            continue;
        };
        if !first_arg_matches(source, first, arg, arg_pattern) {
            continue;
        }
        // A call-block used as a statement removes the whole statement.
        let target = match node.parent() {
            Some(p) if p.kind() == "expression_statement" => p,
            _ => node,
        };
        return Some(lift_export(target));
    }
    None
}

fn first_arg_matches(
    source: &SourceFile,
    first: Node<'_>,
    arg: Option<&str>,
    arg_pattern: Option<&str>,
) -> bool {
    let raw = source.node_text(first);
    // String arguments also match against their unquoted content.
    let unquoted = if first.kind() == "string" && raw.len() >= 2 {
        Some(&raw[1..raw.len() - 1])
    } else {
        None
    };

    if let Some(want) = arg {
        return raw == want || unquoted == Some(want);
    }
    if let Some(pattern) = arg_pattern {
        // Validated before resolution began.
        if let Ok(re) = cache::get_or_compile_regex(pattern) {
            return re.is_match(raw) || unquoted.is_some_and(|u| re.is_match(u));
        }
    }
    false
}

/// When a declaration is export-wrapped, the export statement is the
/// removal unit.
fn lift_export(node: Node<'_>) -> Node<'_> {
    match node.parent() {
        Some(p) if p.kind() == "export_statement" => p,
        _ => node,
    }
}

/// Compute the removal span: leading own-line comments, leading
/// indentation, the node itself, and the trailing line terminator plus any
/// now-orphaned blank lines.
fn removal_span(source: &SourceFile, node: Node<'_>) -> (usize, usize) {
    let text = source.text();

    // Fold contiguous leading comments that sit on their own lines.
    let mut first = node;
    while let Some(prev) = first.prev_sibling() {
        if prev.kind() != "comment" {
            break;
        }
        if !text[prev.end_byte()..first.start_byte()].trim().is_empty() {
            break;
        }
        if !on_own_line(source, prev) {
            break;
        }
        first = prev;
    }

    let mut start = first.start_byte();
    let (line, _) = source.line_col(start);
    let line_start = source
        .line_start(line)
        .expect("start offset lies on a known line");
    let at_line_start = text[line_start..start].trim().is_empty();
    if at_line_start {
        start = line_start;
    }

    let mut end = node.end_byte();
    if at_line_start {
        let bytes = text.as_bytes();
        // Trailing whitespace and the line terminator.
        end = consume_line_end(bytes, end);
        // Any blank lines the removal would orphan.
        loop {
            let mut probe = end;
            while probe < bytes.len() && (bytes[probe] == b' ' || bytes[probe] == b'\t') {
                probe += 1;
            }
            if probe < bytes.len() && (bytes[probe] == b'\n' || bytes[probe] == b'\r') {
                end = consume_line_end(bytes, probe);
            } else {
                break;
            }
        }
        // Nothing but whitespace follows: the blank separator above the node
        // would dangle at end of file, so fold it into the span too.
        if text[end..].trim().is_empty() {
            while start > 0 && bytes[start - 1] == b'\n' {
                let line_end = start - 1;
                let prev_start = text[..line_end].rfind('\n').map(|i| i + 1).unwrap_or(0);
                if text[prev_start..line_end].trim().is_empty() {
                    start = prev_start;
                } else {
                    break;
                }
            }
        }
    }

    (start, end)
}

fn consume_line_end(bytes: &[u8], mut end: usize) -> usize {
    while end < bytes.len() && (bytes[end] == b' ' || bytes[end] == b'\t') {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'\r' {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'\n' {
        end += 1;
    }
    end
}

fn on_own_line(source: &SourceFile, node: Node<'_>) -> bool {
    let (line, _) = source.line_col(node.start_byte());
    let line_start = match source.line_start(line) {
        Some(offset) => offset,
        None => return false,
    };
    source.text()[line_start..node.start_byte()].trim().is_empty()
}
