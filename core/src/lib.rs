//! Core

extern crate bitflags;
#[macro_use]
extern crate log;
#[macro_use]
extern crate pest_derive;

pub mod app;
pub mod config;
pub mod fileutil;
pub mod geometry;
pub mod level;
pub mod math;
pub mod query;
pub mod rng;
pub mod sampling;
pub mod stats;
pub mod stl;
