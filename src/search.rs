//! Tree walker / searcher: enumerates candidate files and nodes, invokes
//! the matcher, and aggregates bounded results.
//!
//! Files are processed strictly sequentially; each file's tree is parsed,
//! matched, and released before the next file is opened, so peak memory is
//! one open tree regardless of repository size.

use crate::pool::with_parser;
use crate::query::{match_node, CaptureMap, CompiledQuery};
use crate::report::{preview, UnitFailure};
use crate::tree::{ParseError, SourceFile};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Extensions scanned in directory mode when no include globs are given.
const DEFAULT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Include globs, matched against paths relative to the search root.
    /// Empty means "any source file with a known extension".
    pub include: Vec<String>,
    /// Exclude globs, applied after includes.
    pub exclude: Vec<String>,
    /// Global cap on returned matches across all files.
    pub limit: Option<usize>,
}

/// A successful match at one node.
#[derive(Debug, Clone, Serialize)]
pub struct Match {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub kind: String,
    /// Truncated text preview of the matched node.
    pub preview: String,
    pub captures: CaptureMap,
}

/// A match plus its byte span, for edit planning within the same pass.
#[derive(Debug, Clone)]
pub struct SpannedMatch {
    pub byte_start: usize,
    pub byte_end: usize,
    pub matched: Match,
}

#[derive(Debug, Default, Serialize)]
pub struct SearchOutcome {
    pub matches: Vec<Match>,
    pub total_files: usize,
    pub files_with_matches: usize,
    pub truncated: bool,
    /// Files that could not be read or parsed (directory mode only).
    pub failures: Vec<UnitFailure>,
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>, SearchError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| SearchError::InvalidGlob {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    let set = builder.build().map_err(|e| SearchError::InvalidGlob {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })?;
    Ok(Some(set))
}

fn has_default_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| DEFAULT_EXTENSIONS.contains(&e))
}

/// Resolve the search input into a concrete, sorted file list.
///
/// A single file passes through verbatim (and must exist); a directory is
/// expanded with include/exclude filters. A directory that matches zero
/// files is not an error.
pub fn resolve_files(path: &Path, options: &SearchOptions) -> Result<Vec<PathBuf>, SearchError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(SearchError::NotFound(path.to_path_buf()));
    }

    let include = build_globset(&options.include)?;
    let exclude = build_globset(&options.exclude)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(path).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(path).unwrap_or(entry.path());
        match &include {
            Some(set) => {
                if !set.is_match(rel) {
                    continue;
                }
            }
            None => {
                if !has_default_extension(entry.path()) {
                    continue;
                }
            }
        }
        if let Some(set) = &exclude {
            if set.is_match(rel) {
                continue;
            }
        }
        files.push(entry.path().to_path_buf());
    }
    files.sort();
    Ok(files)
}

/// Parse one file using the pooled parser.
pub fn open_file(path: &Path) -> Result<SourceFile, ParseError> {
    with_parser(|parser| parser.parse_file(path))?
}

/// Match every named node of one parsed file, in document order, up to
/// `remaining` results. The second return value is true when one more true
/// match existed beyond the cap.
pub fn collect_matches(
    file: &SourceFile,
    query: &CompiledQuery,
    remaining: usize,
) -> (Vec<SpannedMatch>, bool) {
    let mut out = Vec::new();
    for node in file.named_nodes() {
        if let Some(captures) = match_node(file, node, query) {
            if out.len() == remaining {
                return (out, true);
            }
            let (line, column) = file.line_col(node.start_byte());
            out.push(SpannedMatch {
                byte_start: node.start_byte(),
                byte_end: node.end_byte(),
                matched: Match {
                    file: file.path().to_path_buf(),
                    line,
                    column,
                    kind: node.kind().to_string(),
                    preview: preview(file.node_text(node)),
                    captures,
                },
            });
        }
    }
    (out, false)
}

/// Search a file or directory for nodes matching `query`.
///
/// Running the same search twice against unchanged files yields identical
/// match counts and positions.
pub fn search(
    path: &Path,
    query: &CompiledQuery,
    options: &SearchOptions,
) -> Result<SearchOutcome, SearchError> {
    let files = resolve_files(path, options)?;
    let single_file = path.is_file();
    let limit = options.limit.unwrap_or(usize::MAX);

    let mut outcome = SearchOutcome {
        total_files: files.len(),
        ..SearchOutcome::default()
    };

    for file_path in &files {
        let remaining = limit - outcome.matches.len();
        let source = match open_file(file_path) {
            Ok(source) => source,
            Err(e) if single_file => return Err(e.into()),
            Err(e) => {
                outcome.failures.push(UnitFailure {
                    file: file_path.clone(),
                    line: None,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let (matches, truncated) = collect_matches(&source, query, remaining);
        if !matches.is_empty() {
            outcome.files_with_matches += 1;
        }
        outcome
            .matches
            .extend(matches.into_iter().map(|sm| sm.matched));
        if truncated {
            outcome.truncated = true;
            break;
        }
        // SourceFile dropped here; only one tree is ever open.
    }

    Ok(outcome)
}
