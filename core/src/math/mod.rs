//! Common math shared across the workspace.

mod axis;
mod common;

// Re-export
pub use axis::*;
pub use common::*;
