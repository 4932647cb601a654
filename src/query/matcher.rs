//! Recursive pattern matcher.
//!
//! Evaluates a [`CompiledQuery`] against a single node, producing a capture
//! map on success. Capture maps are built per attempt; a failed attempt
//! never leaks partial captures into sibling attempts.

use crate::query::schema::CompiledQuery;
use crate::tree::{resolve_role, SourceFile};
use serde::Serialize;
use std::collections::BTreeMap;
use tree_sitter::Node;

/// A captured sub-node: its rendered text and 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureValue {
    pub text: String,
    pub line: usize,
    pub column: usize,
}

/// Label -> captured value, ordered for deterministic output.
pub type CaptureMap = BTreeMap<String, CaptureValue>;

/// Attempt to match `query` against `node`.
///
/// Returns the accumulated capture map on success (possibly empty), `None`
/// on any failure. Evaluation order: kind, textPattern, roles (in declared
/// order), then this node's own capture.
pub fn match_node(file: &SourceFile, node: Node<'_>, query: &CompiledQuery) -> Option<CaptureMap> {
    if !query.match_any {
        if let Some(kind) = &query.kind {
            // Fail fast on kind mismatch; nothing else is evaluated.
            if node.kind() != kind.as_str() {
                return None;
            }
        }
    }

    if let Some(re) = &query.text_pattern {
        if !re.is_match(file.node_text(node)) {
            return None;
        }
    }

    let mut captures = CaptureMap::new();
    for (role, sub) in &query.roles {
        let child = resolve_role(node, role)?;
        let child_captures = match_node(file, child, sub)?;
        captures.extend(child_captures);
    }

    if let Some(label) = &query.capture {
        let (line, column) = file.line_col(node.start_byte());
        captures.insert(
            label.clone(),
            CaptureValue {
                text: file.node_text(node).to_string(),
                line,
                column,
            },
        );
    }

    Some(captures)
}
