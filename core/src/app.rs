//! Application related stuff

use crate::config::SamplerConfig;
use crate::fileutil::sibling_with_suffix;
use crate::math::Float;
use clap::Parser;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::PathBuf;

/// Command line options.
#[derive(Parser, Clone, Debug)]
#[clap(author, version, about = "Generates a potentially visible set (CPVS) for a level.", long_about = None)]
pub struct Options {
    /// Path to the level description.
    #[clap(value_name = "LEVEL", help = "Level description file")]
    pub level: PathBuf,

    /// Number of rays cast per room.
    #[clap(
        long = "samples",
        value_name = "NUM",
        default_value_t = 1_000_000,
        help = "Number of rays to cast per room. Higher numbers increase accuracy at the cost of time."
    )]
    pub samples: u64,

    /// Minimum ray hits for a room to be considered visible.
    #[clap(
        long = "minrayhits",
        value_name = "NUM",
        default_value_t = 0,
        help = "Minimum number of ray hits for a room to be considered visible."
    )]
    pub min_ray_hits: u64,

    /// Maximum number of rooms visible from any room.
    #[clap(
        long = "maxvisiblerooms",
        value_name = "NUM",
        default_value_t = 9999,
        help = "Maximum number of rooms visible from any given room. Pruned by ray hit count."
    )]
    pub max_visible_rooms: usize,

    /// Maximum ray distance.
    #[clap(
        long = "maxdist",
        value_name = "FLOAT",
        default_value_t = 1500.0,
        help = "Maximum ray travel distance."
    )]
    pub max_distance: Float,

    /// Maximum camera height above the floor.
    #[clap(
        long = "cameraheight",
        value_name = "FLOAT",
        default_value_t = 15.0,
        help = "Maximum camera height above the floor."
    )]
    pub camera_height: Float,

    /// Maximum camera height above the floor in subterranean rooms.
    #[clap(
        long = "undergroundcameraheight",
        value_name = "FLOAT",
        default_value_t = 5.0,
        help = "Maximum camera height above the floor in underground rooms."
    )]
    pub underground_camera_height: Float,

    /// Room id (1-based) whose rays are exported.
    #[clap(
        long = "debugroom",
        value_name = "ID",
        help = "Export the raycast results of a room to an STL file."
    )]
    pub debug_room: Option<usize>,

    /// Export the collision geometry.
    #[clap(
        long = "exportphysicsworld",
        help = "Export the collision geometry to an STL file."
    )]
    pub export_physics_world: bool,

    /// Number of threads to use.
    #[clap(
        long = "nthreads",
        short = 't',
        value_name = "NUM",
        help = "Use specified number of threads. Defaults to all logical CPUs."
    )]
    n_threads: Option<usize>,

    /// Path to the output file.
    #[clap(
        long = "outfile",
        short = 'o',
        value_name = "FILE",
        help = "Write the CPVS to the given filename."
    )]
    pub out_file: Option<PathBuf>,

    /// Suppress all text output other than error messages.
    #[clap(long, help = "Suppress all text output other than error messages.")]
    pub quiet: bool,
}

impl Options {
    /// Returns the number of threads to use.
    pub fn threads(&self) -> usize {
        let max_threads = num_cpus::get();
        match self.n_threads {
            None => max_threads,
            Some(0) => {
                warn!("Invalid nthreads");
                1
            }
            Some(n) if n > max_threads => {
                warn!("Num threads > max logical CPUs {}", max_threads);
                max_threads
            }
            Some(n) => n,
        }
    }

    /// Returns the 0-based index of the debug room, if a valid one was requested.
    pub fn debug_room_index(&self) -> Option<usize> {
        match self.debug_room {
            Some(0) => {
                warn!("Room id 0 is reserved; ignoring --debugroom");
                None
            }
            Some(id) => Some(id - 1),
            None => None,
        }
    }

    /// Returns the sampler configuration.
    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            samples_per_room: self.samples,
            min_ray_hits: self.min_ray_hits,
            max_visible_rooms: self.max_visible_rooms,
            max_distance: self.max_distance,
            max_camera_height: self.camera_height,
            max_camera_height_subterranean: self.underground_camera_height,
            debug_room: self.debug_room_index(),
            ..SamplerConfig::default()
        }
    }

    /// Returns the CPVS output path.
    pub fn output_path(&self) -> PathBuf {
        self.out_file
            .clone()
            .unwrap_or_else(|| sibling_with_suffix(&self.level, ".cpvs"))
    }
}

/// Create a progress bar.
///
/// * `len`   - Total number of steps.
/// * `quiet` - Hide the bar.
pub fn create_progress_bar(len: u64, quiet: bool) -> ProgressBar {
    let progress = ProgressBar::new(len);
    if quiet {
        progress.set_draw_target(ProgressDrawTarget::hidden());
    }
    let style = ProgressStyle::with_template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    progress.set_style(style);
    progress
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
