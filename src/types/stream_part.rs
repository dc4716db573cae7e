//! Stream part vocabularies.
//!
//! Two closed unions live here:
//! - [`ModelStreamPart`]: what a provider adapter yields (the boundary
//!   vocabulary every vendor format is translated into)
//! - [`ObjectStreamPart`]: what the structured-output pipeline emits to the
//!   caller
//!
//! Both are matched exhaustively; adding a variant is a compile error at
//! every consumer.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::common::{FinishReason, ProviderMetadata, ResponseMetadata, Usage, Warning};
use crate::error::LlmError;

/// Raw stream part produced by a provider adapter.
#[derive(Debug, Clone)]
pub enum ModelStreamPart {
    /// First part of a stream; carries call warnings.
    StreamStart { warnings: Vec<Warning> },
    /// A slice of generated text.
    TextDelta { delta: String },
    /// A slice of tool-call arguments (used in tool mode).
    ToolInputDelta { id: String, delta: String },
    /// Response metadata; fields may arrive over several parts.
    ResponseMetadata {
        id: Option<String>,
        timestamp: Option<DateTime<Utc>>,
        model_id: Option<String>,
    },
    /// Terminal part of a successful stream.
    Finish {
        finish_reason: FinishReason,
        usage: Usage,
        provider_metadata: Option<ProviderMetadata>,
    },
    /// Terminal failure of this stream.
    Error { error: LlmError },
}

impl ModelStreamPart {
    /// Convenience constructor for a text delta.
    pub fn text(delta: impl Into<String>) -> Self {
        Self::TextDelta {
            delta: delta.into(),
        }
    }

    /// Convenience constructor for a finish part without provider metadata.
    pub fn finish(finish_reason: FinishReason, usage: Usage) -> Self {
        Self::Finish {
            finish_reason,
            usage,
            provider_metadata: None,
        }
    }
}

/// Part of the structured-output stream handed to the caller.
#[derive(Debug, Clone)]
pub enum ObjectStreamPart {
    /// Call warnings, forwarded as soon as the provider reports them.
    StreamStart { warnings: Vec<Warning> },
    /// A new partial value; never deep-equal to the previous one.
    Object { object: Value },
    /// Text belonging to the last published partial value.
    TextDelta { text_delta: String },
    /// Response metadata merged so far.
    ResponseMetadata { response: ResponseMetadata },
    /// The provider finished.
    Finish {
        finish_reason: FinishReason,
        usage: Usage,
        response: ResponseMetadata,
        provider_metadata: Option<ProviderMetadata>,
    },
    /// A failure; terminal for the stream that produced it.
    Error { error: LlmError },
}

impl ObjectStreamPart {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StreamStart { .. } => "stream-start",
            Self::Object { .. } => "object",
            Self::TextDelta { .. } => "text-delta",
            Self::ResponseMetadata { .. } => "response-metadata",
            Self::Finish { .. } => "finish",
            Self::Error { .. } => "error",
        }
    }

    /// Whether this is an error part.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}
