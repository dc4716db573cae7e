//! High-level APIs
//!
//! Entry points that tie a [`LanguageModel`](crate::traits::LanguageModel),
//! an output strategy and the streaming plumbing together.

pub mod object;

pub use object::{
    ErrorCallback, FinishCallback, ObjectFinishEvent, StreamObjectOptions, StreamObjectResult,
    stream_object,
};
