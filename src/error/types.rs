//! Core error types.

use serde_json::Value;
use thiserror::Error;

use crate::types::{FinishReason, ResponseMetadata, Usage};

/// Errors produced while requesting, streaming and decoding structured output.
///
/// The type is `Clone` because a single failure is fanned out: it is emitted
/// as an `error` stream part and also rejects every deferred handle that has
/// not settled yet.
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    /// The model output could not be turned into a valid result.
    #[error(transparent)]
    NoObjectGenerated(Box<NoObjectGeneratedError>),

    /// Text could not be parsed as JSON.
    #[error("JSON parsing failed: {message}")]
    JsonParse {
        /// The text that failed to parse.
        text: String,
        /// Parser diagnostic.
        message: String,
    },

    /// A parsed value does not match the expected shape or schema.
    #[error("Type validation failed: {cause}")]
    TypeValidation {
        /// The offending value.
        value: Value,
        /// Why validation failed.
        cause: String,
    },

    /// The requested operation is not available in this configuration.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Transport-level stream failure reported by the provider adapter.
    #[error("Stream error: {0}")]
    StreamError(String),

    /// The request was aborted through its cancel handle.
    #[error("Request cancelled: {0}")]
    Cancelled(String),

    /// Invalid request input.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// An operation was attempted in a state that does not allow it.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A JSON schema could not be compiled.
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Generic JSON (de)serialization error.
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Error reported by the provider itself.
    #[error("Provider error ({provider}): {message}")]
    ProviderError {
        /// Provider name.
        provider: String,
        /// Provider message.
        message: String,
    },

    /// Anything else.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Output failed parsing or validation.
    Validation,
    /// JSON could not be read.
    Parsing,
    /// The stream failed or was cancelled.
    Stream,
    /// Caller supplied invalid input.
    Client,
    /// Provider-side failure.
    Server,
    /// Operation not supported.
    Unsupported,
    /// Internal invariant broken.
    Internal,
}

impl LlmError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NoObjectGenerated(_) | Self::TypeValidation { .. } => ErrorCategory::Validation,
            Self::JsonParse { .. } | Self::JsonError(_) => ErrorCategory::Parsing,
            Self::StreamError(_) | Self::Cancelled(_) => ErrorCategory::Stream,
            Self::InvalidParameter(_) | Self::InvalidState(_) | Self::SchemaError(_) => {
                ErrorCategory::Client
            }
            Self::ProviderError { .. } => ErrorCategory::Server,
            Self::UnsupportedOperation(_) => ErrorCategory::Unsupported,
            Self::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// Transport failures, including cancellation.
    pub fn is_stream_failure(&self) -> bool {
        matches!(self, Self::StreamError(_) | Self::Cancelled(_))
    }

    /// Whether this is a `NoObjectGenerated` error.
    pub fn is_no_object_generated(&self) -> bool {
        matches!(self, Self::NoObjectGenerated(_))
    }

    /// Access the `NoObjectGenerated` payload, if any.
    pub fn as_no_object_generated(&self) -> Option<&NoObjectGeneratedError> {
        match self {
            Self::NoObjectGenerated(err) => Some(err),
            _ => None,
        }
    }

    /// Whether a caller-supplied repair function may be offered this error.
    pub fn is_repairable(&self) -> bool {
        matches!(self, Self::JsonParse { .. } | Self::TypeValidation { .. })
    }

    /// Shorthand for a type validation failure.
    pub fn type_validation(value: Value, cause: impl Into<String>) -> Self {
        Self::TypeValidation {
            value,
            cause: cause.into(),
        }
    }
}

/// Diagnostic payload for a request that finished without a usable result.
///
/// Always carries whatever was known when the failure was detected so that
/// the caller can inspect the raw model output.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct NoObjectGeneratedError {
    /// Human-readable summary.
    pub message: String,
    /// Raw text produced by the model.
    pub text: Option<String>,
    /// Response metadata at the time of failure.
    pub response: Option<ResponseMetadata>,
    /// Token usage reported for the request.
    pub usage: Option<Usage>,
    /// Finish reason reported by the provider.
    pub finish_reason: Option<FinishReason>,
    /// Underlying parse or validation failure.
    pub cause: Option<Box<LlmError>>,
}

impl NoObjectGeneratedError {
    /// Create an error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            text: None,
            response: None,
            usage: None,
            finish_reason: None,
            cause: None,
        }
    }

    /// Attach the underlying cause.
    pub fn with_cause(mut self, cause: LlmError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Attach the raw text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Attach response metadata, usage and finish reason.
    pub fn with_context(
        mut self,
        response: ResponseMetadata,
        usage: Usage,
        finish_reason: FinishReason,
    ) -> Self {
        self.response = Some(response);
        self.usage = Some(usage);
        self.finish_reason = Some(finish_reason);
        self
    }
}
