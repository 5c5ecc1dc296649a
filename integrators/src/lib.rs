//! Integrators

#[macro_use]
extern crate log;

mod orchestrator;
mod sampler;

// Re-export.
pub use orchestrator::*;
pub use sampler::*;
