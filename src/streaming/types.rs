//! Core Streaming Types

use futures::Stream;
use serde_json::Value;
use std::pin::Pin;

use crate::error::LlmError;
use crate::types::{ModelStreamPart, ObjectStreamPart};

/// Raw part stream produced by a provider adapter.
///
/// An `Err` item is treated exactly like a `ModelStreamPart::Error`.
pub type ModelStream = Pin<Box<dyn Stream<Item = Result<ModelStreamPart, LlmError>> + Send>>;

/// Full structured-output stream handed to the caller.
pub type ObjectStream = Pin<Box<dyn Stream<Item = ObjectStreamPart> + Send>>;

/// Stream of partial values.
pub type PartialObjectStream = Pin<Box<dyn Stream<Item = Value> + Send>>;

/// Stream of raw text deltas.
pub type TextStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Stream of completed array elements.
pub type ElementStream = Pin<Box<dyn Stream<Item = Value> + Send>>;
