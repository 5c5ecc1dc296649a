#[macro_use]
extern crate log;

use clap::Parser;
use pvs_accelerators::*;
use pvs_core::app::*;
use pvs_core::fileutil::*;
use pvs_core::level::Level;
use pvs_core::stl::*;
use pvs_integrators::*;
use std::process::ExitCode;

#[cfg(all(feature = "dhat-rs", feature = "jemalloc"))]
compile_error!("feature 'dhat-rs' and feature 'jemalloc' cannot be enabled at the same time");

#[cfg(feature = "dhat-rs")]
use dhat::{Dhat, DhatAlloc};

#[cfg(feature = "dhat-rs")]
#[global_allocator]
static ALLOCATOR: DhatAlloc = DhatAlloc;

#[cfg(feature = "jemalloc")]
#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(feature = "jemalloc")]
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static ALLOCATOR: Jemalloc = Jemalloc;

/// Maximum number of triangles in a BVH leaf.
const MAX_PRIMS_IN_NODE: u8 = 4;

fn main() -> ExitCode {
    #[cfg(feature = "dhat-rs")]
    let _dhat = Dhat::start_heap_profiling();

    let options = Options::parse();

    // Initialize `env_logger`; `RUST_LOG` overrides the default level.
    let default_level = if options.quiet { "error" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(options: &Options) -> Result<(), String> {
    let level = Level::load(&options.level).map_err(|e| e.to_string())?;

    if options.export_physics_world {
        let path = sibling_with_suffix(&options.level, "_physics.stl");
        export_stl(&path, &collision_facets(&level.triangles))
            .map_err(|e| format!("Unable to write '{}'. {e}", path.display()))?;
        info!("Exported collision geometry to '{}'", path.display());
    }

    let mut config = options.sampler_config();
    if let Some(room) = config.debug_room {
        if room >= level.room_count() {
            warn!(
                "Debug room {} does not exist; the level has {} rooms",
                room + 1,
                level.room_count()
            );
            config.debug_room = None;
        }
    }

    let out_path = options.output_path();
    if !has_extension(&out_path, "cpvs") {
        warn!("Output file '{}' does not have a .cpvs extension", out_path.display());
    }

    let bvh = BVHAccel::new(&level.triangles, MAX_PRIMS_IN_NODE, SplitMethod::SAH);
    let report = generate(&level, &bvh, &config, options.threads(), &out_path, options.quiet)
        .map_err(|e| format!("Unable to generate '{}'. {e}", out_path.display()))?;

    if let Some(room) = config.debug_room {
        let mut mesh = RayMeshBuilder::new();
        mesh.add_rays(&report.visibility.debug_rays);
        let path = sibling_with_suffix(&options.level, &format!("_room_{}_rays.stl", room + 1));
        export_stl(&path, &mesh.facets)
            .map_err(|e| format!("Unable to write '{}'. {e}", path.display()))?;
        info!(
            "Exported {} rays of room {} to '{}'",
            report.visibility.debug_rays.len(),
            room + 1,
            path.display()
        );
    }

    if !options.quiet {
        report.visibility.stats.print();
    }
    Ok(())
}
