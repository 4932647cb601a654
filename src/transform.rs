//! Query/preset transform orchestration.
//!
//! Pipeline: resolve the query (configuration errors abort here, before any
//! file is touched) -> per file: match, render templates, plan edits, apply
//! in one atomic in-memory pass -> write back unless dry-run. Failures at
//! the match/file level are itemized and never abort sibling work.

use crate::edit::{Edit, EditPlan, EditStatus};
use crate::query::{resolve_preset, CompiledQuery, Query, QueryError};
use crate::report::{Change, Mode, UnitFailure};
use crate::search::{collect_matches, open_file, resolve_files, SearchError, SearchOptions};
use crate::template::{render, TemplateError};
use crate::{edit, tree};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// What to search for: an ad-hoc query or a named preset.
#[derive(Debug, Clone)]
pub enum QuerySource {
    Inline(Query),
    Preset(String),
}

/// Parameters for one transform invocation.
#[derive(Debug, Clone)]
pub struct TransformRequest {
    pub source: QuerySource,
    pub path: PathBuf,
    pub options: SearchOptions,
    /// Template string with `${label}` placeholders. Required.
    pub replacement: Option<String>,
    /// When true (the default), compute and report changes without writing.
    pub dry_run: bool,
}

/// Configuration errors abort the whole operation before any file I/O.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("transform requires a 'replacement' template")]
    MissingReplacement,
}

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Parse(#[from] tree::ParseError),

    #[error(transparent)]
    Edit(#[from] edit::EditError),
}

#[derive(Debug, Serialize)]
pub struct TransformReport {
    pub mode: Mode,
    pub changes: Vec<Change>,
    pub total_matches: usize,
    pub files_modified: usize,
    pub truncated: bool,
    /// Per-match and per-file failures (placeholder errors, overlap
    /// conflicts, write errors). Sibling work continues past these.
    pub failed: Vec<UnitFailure>,
}

impl TransformReport {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// Resolve the request's query source into a compiled query.
///
/// This performs all configuration validation: unknown preset names,
/// malformed query shapes, and a missing replacement template are all
/// reported here, before any file is opened.
fn resolve_query(request: &TransformRequest) -> Result<(Mode, CompiledQuery), ConfigError> {
    let (mode, query) = match &request.source {
        QuerySource::Inline(query) => (Mode::Query, query.clone()),
        QuerySource::Preset(name) => (Mode::Preset, resolve_preset(name)?),
    };
    if request.replacement.is_none() {
        return Err(ConfigError::MissingReplacement);
    }
    Ok((mode, query.compile()?))
}

/// Run a transform. Honors `dry_run`; the reported before/after strings are
/// exactly what a non-dry-run invocation writes at the reported locations.
pub fn run(request: &TransformRequest) -> Result<TransformReport, TransformError> {
    let (mode, query) = resolve_query(request)?;
    let template = request
        .replacement
        .as_deref()
        .expect("checked by resolve_query");

    let files = resolve_files(&request.path, &request.options)?;
    let single_file = request.path.is_file();
    let limit = request.options.limit.unwrap_or(usize::MAX);

    let mut report = TransformReport {
        mode,
        changes: Vec::new(),
        total_matches: 0,
        files_modified: 0,
        truncated: false,
        failed: Vec::new(),
    };

    for file_path in &files {
        let remaining = limit - report.total_matches;
        let source = match open_file(file_path) {
            Ok(source) => source,
            Err(e) if single_file => return Err(e.into()),
            Err(e) => {
                report.failed.push(UnitFailure {
                    file: file_path.clone(),
                    line: None,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let (matches, truncated) = collect_matches(&source, &query, remaining);
        report.total_matches += matches.len();

        // Render each match's replacement; a placeholder failure drops only
        // that one change. The edit plan indexes surviving edits, so each
        // carries its originating match number for conflict reporting.
        let mut edits = Vec::new();
        let mut edit_meta: Vec<(usize, usize, String, String)> = Vec::new(); // (match #, line, before, after)
        for (match_index, sm) in matches.iter().enumerate() {
            let before = source.text()[sm.byte_start..sm.byte_end].to_string();
            match render(template, &sm.matched.captures) {
                Ok(after) => {
                    edits.push(Edit::new(sm.byte_start, sm.byte_end, after.clone(), &before));
                    edit_meta.push((match_index, sm.matched.line, before, after));
                }
                Err(TemplateError::UnknownLabel { label }) => {
                    report.failed.push(UnitFailure {
                        file: file_path.clone(),
                        line: Some(sm.matched.line),
                        reason: format!("missing capture '{label}' for template"),
                    });
                }
            }
        }

        if !edits.is_empty() {
            let plan = EditPlan::new(edits);
            let applied = plan.apply(source.text())?;

            for (status, (_, line, before, after)) in applied.statuses.iter().zip(&edit_meta) {
                match status {
                    EditStatus::Applied | EditStatus::AlreadyApplied => {
                        report.changes.push(Change {
                            file: file_path.clone(),
                            line: *line,
                            before: before.clone(),
                            after: after.clone(),
                        });
                    }
                    EditStatus::SkippedOverlap { winner } => {
                        report.failed.push(UnitFailure {
                            file: file_path.clone(),
                            line: Some(*line),
                            reason: format!(
                                "edit overlaps an earlier match (kept match #{})",
                                edit_meta[*winner].0 + 1
                            ),
                        });
                    }
                    EditStatus::SkippedVerification { .. } => {
                        report.failed.push(UnitFailure {
                            file: file_path.clone(),
                            line: Some(*line),
                            reason: "before-text verification failed".to_string(),
                        });
                    }
                }
            }

            if applied.changed() {
                report.files_modified += 1;
                if !request.dry_run {
                    if let Err(e) = edit::write_file(file_path, &applied.text) {
                        // Write errors are per-file; siblings proceed.
                        report.files_modified -= 1;
                        report.failed.push(UnitFailure {
                            file: file_path.clone(),
                            line: None,
                            reason: format!("write failed: {e}"),
                        });
                    }
                }
            }
        }

        if truncated {
            report.truncated = true;
            break;
        }
    }

    Ok(report)
}
