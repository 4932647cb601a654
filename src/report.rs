//! Shared result-reporting shapes: change records, per-unit failures, and
//! preview truncation. Everything is serializable for `--json` output.

use serde::Serialize;
use std::path::PathBuf;

/// Maximum characters in a match preview before truncation.
pub const PREVIEW_MAX_CHARS: usize = 200;

/// Operation mode reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Query,
    Preset,
    Removal,
}

/// One accepted change: before/after are the full, untruncated span texts so
/// a dry-run report can be verified against a later real run.
#[derive(Debug, Clone, Serialize)]
pub struct Change {
    pub file: PathBuf,
    pub line: usize,
    pub before: String,
    pub after: String,
}

/// One itemized failure among multiple independent units of work.
#[derive(Debug, Clone, Serialize)]
pub struct UnitFailure {
    pub file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub reason: String,
}

/// Truncate text to [`PREVIEW_MAX_CHARS`] characters for display, flagging
/// the cut with a trailing ellipsis. Always cuts on a character boundary.
pub fn preview(text: &str) -> String {
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == PREVIEW_MAX_CHARS {
            let mut out = text[..idx].to_string();
            out.push('…');
            return out;
        }
        count += 1;
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_untouched() {
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn long_text_truncated_with_marker() {
        let long = "a".repeat(500);
        let p = preview(&long);
        assert_eq!(p.chars().count(), PREVIEW_MAX_CHARS + 1);
        assert!(p.ends_with('…'));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "é".repeat(300);
        let p = preview(&long);
        assert!(p.ends_with('…'));
        assert_eq!(p.chars().count(), PREVIEW_MAX_CHARS + 1);
    }
}
