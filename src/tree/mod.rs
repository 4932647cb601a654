//! Tree-sitter integration for TypeScript sources.
//!
//! This module owns parsing, the per-file [`SourceFile`] value (immutable
//! text plus tree plus offset/line conversion), and the Node Accessor Layer
//! that maps semantic roles to grammar fields.

pub mod accessor;
pub mod errors;
pub mod parser;

pub use accessor::resolve_role;
pub use errors::ParseError;
pub use parser::{NamedNodes, SourceFile, TsParser};
