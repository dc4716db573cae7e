//! siumai-object
//!
//! Incremental structured output for LLM text streams.
//!
//! The model is asked for JSON (through a JSON response format or a single
//! forced tool). While the text streams in, a tolerant parser turns the
//! growing buffer into best-effort partial values; an output strategy decides
//! which of them may be published; when the provider finishes, the full text
//! is strictly parsed and validated, with one optional repair pass.
//!
//! Output modes:
//! - `object`: a value matching a JSON schema
//! - `array`: elements matching a schema, streamed element by element
//! - `enum`: one of a fixed set of strings
//! - `no-schema`: any JSON
//!
//! ## Example
//!
//! ```rust,ignore
//! use siumai_object::prelude::*;
//! use serde_json::json;
//!
//! let options = StreamObjectOptions::array(json!({
//!     "type": "object",
//!     "properties": { "name": { "type": "string" } },
//!     "required": ["name"]
//! }));
//! let result = stream_object(model, "List three heroes.", options)?;
//! let mut heroes = result.element_stream()?;
//! while let Some(hero) = heroes.next().await {
//!     println!("{hero}");
//! }
//! ```
//!
//! ## Features
//!
//! - `telemetry`: tracing subscriber setup helpers
#![deny(unsafe_code)]

pub mod error;
pub mod highlevel;
pub mod output;
pub mod streaming;
#[cfg(feature = "telemetry")]
pub mod telemetry;
pub mod traits;
pub mod types;
pub mod utils;

pub use error::LlmError;
pub use highlevel::object::{StreamObjectOptions, StreamObjectResult, stream_object};

/// Common imports.
pub mod prelude {
    pub use crate::error::{ErrorCategory, LlmError, NoObjectGeneratedError};
    pub use crate::highlevel::object::{
        ObjectFinishEvent, StreamObjectOptions, StreamObjectResult, stream_object,
    };
    pub use crate::output::{GenerateMode, OutputKind, RepairFn};
    pub use crate::streaming::{ModelStream, ObjectStream};
    pub use crate::traits::{LanguageModel, StreamResponse};
    pub use crate::types::{
        CallOptions, ChatMessage, FinishReason, ModelStreamPart, ObjectStreamPart, Prompt,
        ResponseMetadata, Usage, Warning,
    };
    pub use crate::utils::{CancelHandle, DeferredResult};
    pub use futures::StreamExt;
}
