//! Error Handling Module
//!
//! Error types shared by every part of the structured-output engine:
//! - Core error type (`LlmError`) and its coarse `ErrorCategory`
//! - The diagnostic payload carried when no object could be produced
//! - Conversions from common error types
//!
//! # Example
//!
//! ```rust,ignore
//! use siumai_object::error::{ErrorCategory, LlmError};
//!
//! let error = LlmError::UnsupportedOperation("element streams in enum mode".into());
//! assert_eq!(error.category(), ErrorCategory::Unsupported);
//! assert!(!error.is_stream_failure());
//! ```

mod conversions;
pub mod types;

pub use types::*;
