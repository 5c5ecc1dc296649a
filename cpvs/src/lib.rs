//! Compressed potentially visible set (CPVS) files.
//!
//! Each room's visibility is stored as a 2-bit-per-room bitset, run-length encoded, and indexed by an offset
//! table.

#[macro_use]
extern crate log;

pub mod bitset;
pub mod container;
pub mod error;
pub mod rle;

// Re-export
pub use bitset::*;
pub use container::*;
pub use error::*;
