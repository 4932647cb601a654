//! Node Accessor Layer: maps a (node kind, semantic role) pair to a child
//! node. This is the only part of the engine coupled to the concrete shape
//! of the TypeScript grammar.
//!
//! Unknown (kind, role) combinations return `None` rather than an error, so
//! the matcher treats "role doesn't apply to this node" the same way as
//! "role didn't match". Extending support for a new kind or role means
//! adding a row; existing rows are never altered.

use tree_sitter::Node;

/// Matches any node kind. Used for roles whose tree-sitter field name is
/// the same across every kind that carries it.
const ANY_KIND: &str = "*";

/// Dispatch table: (node kind, role name) -> tree-sitter field name.
///
/// Kind-specific rows take precedence over `ANY_KIND` rows.
const ROLE_TABLE: &[(&str, &str, &str)] = &[
    // Kind-specific roles where the grammar field name differs from the role
    ("call_expression", "callee", "function"),
    ("call_expression", "arguments", "arguments"),
    ("new_expression", "callee", "constructor"),
    ("new_expression", "arguments", "arguments"),
    ("unary_expression", "operand", "argument"),
    ("await_expression", "operand", "argument"),
    ("member_expression", "object", "object"),
    ("member_expression", "property", "property"),
    ("subscript_expression", "object", "object"),
    ("subscript_expression", "index", "index"),
    ("import_statement", "source", "source"),
    ("pair", "key", "key"),
    ("arrow_function", "parameters", "parameters"),
    ("function_declaration", "parameters", "parameters"),
    ("method_definition", "parameters", "parameters"),
    // Grammar-universal field names
    (ANY_KIND, "left", "left"),
    (ANY_KIND, "right", "right"),
    (ANY_KIND, "operator", "operator"),
    (ANY_KIND, "condition", "condition"),
    (ANY_KIND, "consequence", "consequence"),
    (ANY_KIND, "alternative", "alternative"),
    (ANY_KIND, "name", "name"),
    (ANY_KIND, "value", "value"),
    (ANY_KIND, "body", "body"),
    (ANY_KIND, "type", "type"),
];

/// Resolve a semantic role to a child node.
///
/// Returns `None` when the role is unknown for this kind or when the node
/// has no child in the mapped field.
pub fn resolve_role<'t>(node: Node<'t>, role: &str) -> Option<Node<'t>> {
    let kind = node.kind();
    let field = ROLE_TABLE
        .iter()
        .find(|(k, r, _)| *r == role && *k == kind)
        .or_else(|| {
            ROLE_TABLE
                .iter()
                .find(|(k, r, _)| *r == role && *k == ANY_KIND)
        })
        .map(|(_, _, f)| *f)?;
    node.child_by_field_name(field)
}
