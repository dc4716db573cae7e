//! Core Types
//!
//! Data types exchanged between the caller, the engine and the provider
//! adapter.

mod call_options;
mod common;
mod prompt;
mod stream_part;

pub use call_options::*;
pub use common::*;
pub use prompt::*;
pub use stream_part::*;
