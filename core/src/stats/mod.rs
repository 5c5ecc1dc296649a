//! Statistics

mod counters;

pub use counters::*;
