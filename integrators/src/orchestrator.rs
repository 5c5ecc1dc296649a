//! Run Orchestrator
//!
//! Samples every room in parallel, compresses the resulting visibility relation into a CPVS container, writes it
//! and verifies the file by reading it back.

use crate::sampler::*;
use cpvs::rle::{encode, CpvsLayout};
use cpvs::*;
use pvs_core::app::create_progress_bar;
use pvs_core::config::SamplerConfig;
use pvs_core::level::Level;
use pvs_core::query::*;
use pvs_core::stats::*;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Interval between progress bar updates.
const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Maximum number of queued room jobs.
const JOB_QUEUE_SIZE: usize = 4096;

/// Visibility of all rooms of a level.
#[derive(Clone, Debug, Default)]
pub struct VisibilityResult {
    /// Rooms visible from each room, indexed by room.
    pub relation: Vec<BTreeSet<usize>>,

    /// Ray counts over all rooms.
    pub stats: RayStatistics,

    /// Wall clock time spent sampling.
    pub elapsed: Duration,

    /// Hit rays of the debug room, if one was selected.
    pub debug_rays: Vec<DebugRay>,
}

impl VisibilityResult {
    /// Returns true if every room sees every room, in which case the PVS culls nothing.
    pub fn is_redundant(&self) -> bool {
        let n = self.relation.len();
        self.relation.iter().all(|visible| visible.len() == n)
    }
}

/// A slot whose decompressed value differs from the relation it was built from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ValidationMismatch {
    /// 0-based source room index.
    pub room: usize,

    /// Destination slot (room index + 1).
    pub slot: usize,

    /// Value in the relation.
    pub expected: bool,

    /// Value read back from the container.
    pub actual: bool,
}

/// Outcome of a full generation run.
#[derive(Clone, Debug)]
pub struct GenerationReport {
    /// The sampled visibility.
    pub visibility: VisibilityResult,

    /// Size of the written file's payload in bytes.
    pub payload_len: usize,

    /// Differences found by the read-back verification.
    pub mismatches: Vec<ValidationMismatch>,
}

/// Estimate the visibility of every room using a pool of worker threads.
///
/// * `level`     - The level.
/// * `query`     - Geometry queries.
/// * `config`    - Sampler tunables.
/// * `n_threads` - Number of worker threads.
/// * `quiet`     - Hide the progress bar.
pub fn compute_visibility<Q: SpatialQuery + ?Sized>(
    level: &Level,
    query: &Q,
    config: &SamplerConfig,
    n_threads: usize,
    quiet: bool,
) -> VisibilityResult {
    let room_count = level.room_count();
    let n_threads = n_threads.max(1);
    info!(
        "Sampling {} rooms with {} samples per room on {} threads",
        room_count, config.samples_per_room, n_threads
    );

    let counters = RayCounters::new();
    let completed = AtomicUsize::new(0);
    let finished = AtomicBool::new(false);
    let sampler = RoomSampler::new(level, query, config, &counters);
    let mut results = vec![RoomVisibility::default(); room_count];

    let progress = create_progress_bar(room_count as u64, quiet);
    progress.set_message("Computing PVS");

    let start = Instant::now();
    thread::scope(|scope| {
        let (tx_worker, rx_worker) = crossbeam_channel::bounded::<(usize, &mut RoomVisibility)>(JOB_QUEUE_SIZE);

        // Spawn supervisor thread.
        let progress = &progress;
        let completed = &completed;
        let finished = &finished;
        scope.spawn(move || {
            while !finished.load(Ordering::Acquire) {
                progress.set_position(completed.load(Ordering::Relaxed) as u64);
                thread::sleep(PROGRESS_POLL_INTERVAL);
            }
            progress.set_position(completed.load(Ordering::Relaxed) as u64);
        });

        // Spawn worker threads.
        let workers: Vec<_> = (0..n_threads)
            .map(|_| {
                let rx_worker = rx_worker.clone();
                let sampler = &sampler;
                scope.spawn(move || {
                    for (room_index, slot) in rx_worker.iter() {
                        *slot = sampler.sample(room_index);
                        completed.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        drop(rx_worker);

        for job in results.iter_mut().enumerate() {
            if tx_worker.send(job).is_err() {
                break;
            }
        }
        drop(tx_worker);

        let panicked = workers.into_iter().find_map(|worker| worker.join().err());
        finished.store(true, Ordering::Release);
        if let Some(payload) = panicked {
            std::panic::resume_unwind(payload);
        }
    });
    let elapsed = start.elapsed();
    progress.finish_with_message("PVS computed");

    let debug_rays = config
        .debug_room
        .and_then(|room| results.get_mut(room))
        .map(|r| std::mem::take(&mut r.debug_rays))
        .unwrap_or_default();
    let relation = results.into_iter().map(|r| r.visible).collect();

    info!("Sampling took {:.2}s", elapsed.as_secs_f32());
    VisibilityResult {
        relation,
        stats: counters.snapshot(),
        elapsed,
        debug_rays,
    }
}

/// Compress a visibility relation into a CPVS container.
///
/// * `relation` - Rooms visible from each room, indexed by room.
pub fn build_container(relation: &[BTreeSet<usize>]) -> Result<Cpvs> {
    let room_count = relation.len();
    let spans = relation
        .iter()
        .map(|visible| encode::<CpvsLayout>(&pack_visibility(visible.iter().copied(), room_count)));
    let cpvs = Cpvs::from_spans(spans)?;
    debug!(
        "Compressed {} rooms into {} bytes ({} bytes raw)",
        room_count,
        cpvs.payload().len(),
        room_count * raw_bitset_len(room_count)
    );
    Ok(cpvs)
}

/// Compare every room of a container against the relation it should hold. Each mismatch is logged.
///
/// * `cpvs`     - The container.
/// * `relation` - Rooms visible from each room, indexed by room.
pub fn verify_container(cpvs: &Cpvs, relation: &[BTreeSet<usize>]) -> Result<Vec<ValidationMismatch>> {
    let mut mismatches = vec![];
    for (room, visible) in relation.iter().enumerate() {
        let slots = cpvs.decompress(room)?;
        for (slot, &actual) in slots.iter().enumerate() {
            let expected = slot > 0 && visible.contains(&(slot - 1));
            if expected != actual {
                error!(
                    "Room {} slot {}: expected {}, found {}",
                    room + 1,
                    slot,
                    expected,
                    actual
                );
                mismatches.push(ValidationMismatch {
                    room,
                    slot,
                    expected,
                    actual,
                });
            }
        }
    }
    Ok(mismatches)
}

/// Compute the PVS of a level, write it to a CPVS file and verify the file.
///
/// * `level`     - The level.
/// * `query`     - Geometry queries.
/// * `config`    - Sampler tunables.
/// * `n_threads` - Number of worker threads.
/// * `out_path`  - Output file.
/// * `quiet`     - Hide the progress bar.
pub fn generate<Q: SpatialQuery + ?Sized, P: AsRef<Path>>(
    level: &Level,
    query: &Q,
    config: &SamplerConfig,
    n_threads: usize,
    out_path: P,
    quiet: bool,
) -> Result<GenerationReport> {
    let out_path = out_path.as_ref();
    let visibility = compute_visibility(level, query, config, n_threads, quiet);
    if visibility.is_redundant() {
        warn!("Every room can see every other room; the PVS will not cull anything");
    }

    let cpvs = build_container(&visibility.relation)?;
    cpvs.save(out_path)?;
    info!("Wrote '{}'", out_path.display());

    let written = Cpvs::open(out_path)?;
    let mismatches = verify_container(&written, &visibility.relation)?;
    if mismatches.is_empty() {
        info!("Verified {} rooms", visibility.relation.len());
    } else {
        error!("Verification found {} mismatches", mismatches.len());
    }

    Ok(GenerationReport {
        payload_len: written.payload().len(),
        visibility,
        mismatches,
    })
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
