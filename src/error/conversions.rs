//! Type Conversions for LlmError
//!
//! From implementations for error types the engine touches directly.

use super::types::{LlmError, NoObjectGeneratedError};

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<NoObjectGeneratedError> for LlmError {
    fn from(err: NoObjectGeneratedError) -> Self {
        Self::NoObjectGenerated(Box::new(err))
    }
}
