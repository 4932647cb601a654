//! Declarative query model.
//!
//! A [`Query`] is a nested pattern describing a node to find. Reserved keys
//! (`kind`, `matchAny`, `textPattern`, `capture`) configure the node itself;
//! every other key is a semantic role name whose value is a nested query
//! tested against the child the Node Accessor Layer resolves for that role.

use crate::cache;
use crate::query::errors::QueryError;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Query {
    /// Exact node kind tag to require, e.g. `"ternary_expression"`.
    #[serde(default)]
    pub kind: Option<String>,

    /// Wildcard: skip the kind check entirely.
    #[serde(default, rename = "matchAny")]
    pub match_any: bool,

    /// Regular expression tested against the node's rendered source text.
    #[serde(default, rename = "textPattern")]
    pub text_pattern: Option<String>,

    /// Label to record this node under on a successful match.
    #[serde(default)]
    pub capture: Option<String>,

    /// Semantic-role constraints, keyed by role name ("left", "condition",
    /// ...). Ordered map so evaluation order is stable.
    #[serde(flatten)]
    pub roles: BTreeMap<String, Query>,
}

impl Query {
    /// Parse a query from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, QueryError> {
        serde_json::from_str(json).map_err(|e| QueryError::InvalidShape {
            message: e.to_string(),
        })
    }

    /// Parse a query from a JSON file.
    pub fn from_json_path(path: &Path) -> Result<Self, QueryError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Compile into a [`CompiledQuery`], hoisting all regex compilation so
    /// traversal never compiles patterns per node.
    ///
    /// The root query must carry a `kind`; nested queries may rely on
    /// `matchAny` or role position alone.
    pub fn compile(&self) -> Result<CompiledQuery, QueryError> {
        if self.kind.is_none() {
            return Err(QueryError::MissingRootKind);
        }
        self.compile_node()
    }

    fn compile_node(&self) -> Result<CompiledQuery, QueryError> {
        if let Some(label) = &self.capture {
            if label.trim().is_empty() {
                return Err(QueryError::EmptyCapture);
            }
        }

        let text_pattern = match &self.text_pattern {
            Some(pattern) => Some(cache::get_or_compile_regex(pattern).map_err(|e| {
                QueryError::InvalidTextPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                }
            })?),
            None => None,
        };

        let mut roles = Vec::with_capacity(self.roles.len());
        for (role, sub) in &self.roles {
            roles.push((role.clone(), sub.compile_node()?));
        }

        Ok(CompiledQuery {
            kind: self.kind.clone(),
            match_any: self.match_any,
            text_pattern,
            capture: self.capture.clone(),
            roles,
        })
    }
}

/// A query with regexes compiled and role order fixed, ready for traversal.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub kind: Option<String>,
    pub match_any: bool,
    pub text_pattern: Option<Regex>,
    pub capture: Option<String>,
    pub roles: Vec<(String, CompiledQuery)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_keys_and_roles_separate() {
        let q = Query::from_json_str(
            r#"{
                "kind": "ternary_expression",
                "capture": "whole",
                "condition": { "kind": "binary_expression" },
                "alternative": { "matchAny": true, "textPattern": "^String" }
            }"#,
        )
        .unwrap();

        assert_eq!(q.kind.as_deref(), Some("ternary_expression"));
        assert_eq!(q.capture.as_deref(), Some("whole"));
        assert_eq!(q.roles.len(), 2);
        assert!(q.roles.contains_key("condition"));
        assert!(q.roles["alternative"].match_any);
    }

    #[test]
    fn root_without_kind_rejected() {
        let q = Query::from_json_str(r#"{ "textPattern": "foo" }"#).unwrap();
        assert!(matches!(q.compile(), Err(QueryError::MissingRootKind)));
    }

    #[test]
    fn bad_regex_rejected_at_compile() {
        let q = Query::from_json_str(r#"{ "kind": "call_expression", "textPattern": "(" }"#)
            .unwrap();
        assert!(matches!(
            q.compile(),
            Err(QueryError::InvalidTextPattern { .. })
        ));
    }

    #[test]
    fn malformed_json_is_invalid_shape() {
        assert!(matches!(
            Query::from_json_str("{ not json"),
            Err(QueryError::InvalidShape { .. })
        ));
    }

    #[test]
    fn role_order_is_stable() {
        let q = Query::from_json_str(
            r#"{ "kind": "binary_expression", "right": {"matchAny": true}, "left": {"matchAny": true} }"#,
        )
        .unwrap();
        let compiled = q.compile().unwrap();
        let roles: Vec<_> = compiled.roles.iter().map(|(r, _)| r.as_str()).collect();
        assert_eq!(roles, vec!["left", "right"]);
    }
}
