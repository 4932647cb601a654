//! Template substitution for replacement strings.
//!
//! Templates contain `${label}` placeholders. Each placeholder is replaced
//! with the exact captured source text, verbatim: no re-escaping, no
//! re-parsing. A placeholder with no corresponding capture is a per-match
//! error; the caller drops that one change and keeps the rest.

use crate::cache;
use crate::query::CaptureMap;
use thiserror::Error;

const PLACEHOLDER_PATTERN: &str = r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template references capture '{label}' which this match did not produce")]
    UnknownLabel { label: String },
}

/// Render a replacement string from a template and one match's captures.
pub fn render(template: &str, captures: &CaptureMap) -> Result<String, TemplateError> {
    let re = cache::get_or_compile_regex(PLACEHOLDER_PATTERN)
        .expect("placeholder pattern is a valid regex");

    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in re.captures_iter(template) {
        let whole = caps.get(0).expect("group 0 always present");
        let label = &caps[1];
        let value = captures
            .get(label)
            .ok_or_else(|| TemplateError::UnknownLabel {
                label: label.to_string(),
            })?;
        out.push_str(&template[last..whole.start()]);
        out.push_str(&value.text);
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}
