//! AST Surgeon: structure-aware search and transformation for TypeScript
//!
//! Queries describe syntax-tree shapes (node kind, typed wildcards, text
//! patterns, named captures over role-addressed children); matches feed
//! `${label}` templates whose rendered replacements compile down to a single
//! primitive: [`Edit`], a verified byte-span replacement. Intelligence lives
//! in span acquisition (the matcher, structural removal, import merging),
//! not in the application logic.
//!
//! # Safety
//!
//! - All edits verify expected before-text before applying
//! - Atomic file writes (tempfile + fsync + rename)
//! - Multi-edit plans are validated for overlap before any splice
//! - Idempotent operations
//!
//! # Example
//!
//! ```no_run
//! use ast_surgeon::{search, Query, SearchOptions};
//! use std::path::Path;
//!
//! let query = Query::from_json_str(r#"{ "kind": "call_expression" }"#)?;
//! let outcome = search(Path::new("src"), &query.compile()?, &SearchOptions::default())?;
//! for m in &outcome.matches {
//!     println!("{}:{} {}", m.file.display(), m.line, m.preview);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cache;
pub mod edit;
pub mod imports;
pub mod pool;
pub mod query;
pub mod remove;
pub mod report;
pub mod search;
pub mod template;
pub mod transform;
pub mod tree;

// Re-exports
pub use edit::{write_file, AppliedPlan, Edit, EditError, EditPlan, EditStatus, EditVerification};
pub use imports::{add_imports, ImportChange, ImportError, ImportReport, ImportRequest};
pub use query::{
    match_node, resolve_preset, CaptureMap, CaptureValue, CompiledQuery, Preset, Query,
    QueryError, PRESETS,
};
pub use remove::{remove_targets, DeclCategory, RemovalReport, RemoveError, RemoveTarget};
pub use report::{Change, Mode, UnitFailure};
pub use search::{search, Match, SearchError, SearchOptions, SearchOutcome};
pub use transform::{
    run as run_transform, ConfigError, QuerySource, TransformError, TransformReport,
    TransformRequest,
};
pub use tree::{ParseError, SourceFile, TsParser};
