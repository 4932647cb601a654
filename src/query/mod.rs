//! Declarative structural queries: schema, recursive matcher, and presets.

pub mod errors;
pub mod matcher;
pub mod presets;
pub mod schema;

pub use errors::QueryError;
pub use matcher::{match_node, CaptureMap, CaptureValue};
pub use presets::{resolve as resolve_preset, Preset, PRESETS};
pub use schema::{CompiledQuery, Query};
