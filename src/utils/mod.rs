//! Utility modules
//!
//! Small building blocks used by the structured-output pipeline.

pub mod cancel;
pub mod deferred;
pub mod id;

pub use cancel::CancelHandle;
pub use deferred::DeferredResult;
pub use id::{Clock, IdGenerator, create_id_generator, fixed_clock, fixed_id, system_clock};
