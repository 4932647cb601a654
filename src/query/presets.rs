//! Named, reusable queries for common patterns.
//!
//! Presets are constant JSON query definitions resolved by name. An unknown
//! name is a configuration error reported before any file is touched.

use crate::query::errors::QueryError;
use crate::query::schema::Query;

/// A named built-in query.
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    json: &'static str,
}

/// The preset table. Adding a preset is additive; names are stable.
pub const PRESETS: &[Preset] = &[
    Preset {
        name: "error-message-ternary",
        description: "x instanceof Error ? x.message : String(x), capturing the variable as 'errorVar'",
        json: r#"{
            "kind": "ternary_expression",
            "condition": {
                "kind": "binary_expression",
                "textPattern": "instanceof\\s+Error",
                "left": { "matchAny": true, "capture": "errorVar" }
            },
            "consequence": {
                "kind": "member_expression",
                "property": { "kind": "property_identifier", "textPattern": "^message$" }
            },
            "alternative": { "kind": "call_expression", "textPattern": "^String\\(" }
        }"#,
    },
    Preset {
        name: "console-call",
        description: "console.log/debug/warn/error calls, capturing the whole call as 'call'",
        json: r#"{
            "kind": "call_expression",
            "capture": "call",
            "callee": {
                "kind": "member_expression",
                "textPattern": "^console\\.(log|debug|warn|error)$"
            }
        }"#,
    },
    Preset {
        name: "any-cast",
        description: "expressions cast with 'as any', capturing the cast expression as 'expr'",
        json: r#"{
            "kind": "as_expression",
            "textPattern": "as\\s+any$",
            "capture": "expr"
        }"#,
    },
    Preset {
        name: "todo-comment",
        description: "TODO/FIXME comments, capturing the comment as 'comment'",
        json: r#"{
            "kind": "comment",
            "textPattern": "TODO|FIXME",
            "capture": "comment"
        }"#,
    },
];

/// Resolve a preset by name.
pub fn resolve(name: &str) -> Result<Query, QueryError> {
    let preset = PRESETS
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| QueryError::UnknownPreset {
            name: name.to_string(),
        })?;
    Query::from_json_str(preset.json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_presets_parse_and_compile() {
        for preset in PRESETS {
            let query = resolve(preset.name).unwrap();
            query
                .compile()
                .unwrap_or_else(|e| panic!("preset '{}' failed to compile: {e}", preset.name));
        }
    }

    #[test]
    fn unknown_preset_is_configuration_error() {
        assert!(matches!(
            resolve("no-such-preset"),
            Err(QueryError::UnknownPreset { .. })
        ));
    }

    #[test]
    fn preset_names_unique() {
        for (i, a) in PRESETS.iter().enumerate() {
            for b in &PRESETS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }
}
