//! Streaming Module
//!
//! Stream plumbing for structured output:
//! - Tolerant parsing of incomplete JSON text
//! - A splicer that attaches inner streams to an outer stream handed out early
//! - Stream type aliases shared by the pipeline

mod partial_json;
mod stitchable;
mod types;

pub use partial_json::*;
pub use stitchable::*;
pub use types::*;
