//! Ray Counters

use crate::math::percentage;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide ray counters shared by all room tasks. Statistics only; they never influence the output.
#[derive(Debug, Default)]
pub struct RayCounters {
    /// Visibility rays fired.
    rays: AtomicU64,

    /// Ground probes fired.
    ground_probes: AtomicU64,

    /// Visibility rays that hit a room already hit from the same source room.
    already_occluded: AtomicU64,

    /// Visibility rays that hit anything.
    hits: AtomicU64,
}

impl RayCounters {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a batch of counts gathered by one room task.
    ///
    /// * `stats` - Counts to add.
    pub fn add(&self, stats: &RayStatistics) {
        self.rays.fetch_add(stats.rays, Ordering::Relaxed);
        self.ground_probes
            .fetch_add(stats.ground_probes, Ordering::Relaxed);
        self.already_occluded
            .fetch_add(stats.already_occluded, Ordering::Relaxed);
        self.hits.fetch_add(stats.hits, Ordering::Relaxed);
    }

    /// Returns the current counts.
    pub fn snapshot(&self) -> RayStatistics {
        RayStatistics {
            rays: self.rays.load(Ordering::Relaxed),
            ground_probes: self.ground_probes.load(Ordering::Relaxed),
            already_occluded: self.already_occluded.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of the ray counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RayStatistics {
    /// Visibility rays fired.
    pub rays: u64,

    /// Ground probes fired.
    pub ground_probes: u64,

    /// Visibility rays that hit a room already hit from the same source room.
    pub already_occluded: u64,

    /// Visibility rays that hit anything.
    pub hits: u64,
}

impl RayStatistics {
    /// Returns the number of visibility rays that hit nothing.
    pub fn misses(&self) -> u64 {
        self.rays.saturating_sub(self.hits)
    }

    /// Returns the percentage of rays that hit something. 0 when no rays were fired.
    pub fn hit_percentage(&self) -> u64 {
        percentage(self.hits, self.rays)
    }

    /// Returns the percentage of rays that hit nothing. 0 when no rays were fired.
    pub fn miss_percentage(&self) -> u64 {
        percentage(self.misses(), self.rays)
    }

    /// Prints the report.
    pub fn print(&self) {
        println!("{}", self);
    }
}

impl fmt::Display for RayStatistics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Statistics:")?;
        writeln!(f, "  Visibility")?;
        writeln!(f, "    {:<42}{:12}", "Rays tested", self.rays)?;
        writeln!(f, "    {:<42}{:12}", "Ground tests", self.ground_probes)?;
        writeln!(f, "    {:<42}{:12}", "Hits on known occluders", self.already_occluded)?;
        writeln!(
            f,
            "    {:<42}{:12} / {:12} ({}%)",
            "Hit",
            self.hits,
            self.rays,
            self.hit_percentage()
        )?;
        write!(
            f,
            "    {:<42}{:12} / {:12} ({}%)",
            "Missed",
            self.misses(),
            self.rays,
            self.miss_percentage()
        )
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn percentages_guard_against_zero_rays() {
        let s = RayStatistics::default();
        assert_eq!(s.hit_percentage(), 0);
        assert_eq!(s.miss_percentage(), 0);
        assert_eq!(s.misses(), 0);
    }

    #[test]
    fn percentages_of_fired_rays() {
        let s = RayStatistics {
            rays: 200,
            ground_probes: 250,
            already_occluded: 10,
            hits: 50,
        };
        assert_eq!(s.hit_percentage(), 25);
        assert_eq!(s.miss_percentage(), 75);
        assert_eq!(s.misses(), 150);
        let text = s.to_string();
        assert!(text.contains("Rays tested"));
        assert!(text.contains("(25%)"));
    }

    #[test]
    fn concurrent_adds_are_exact() {
        let counters = Arc::new(RayCounters::new());
        let batch = RayStatistics {
            rays: 3,
            ground_probes: 4,
            already_occluded: 1,
            hits: 2,
        };
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&counters);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        c.add(&batch);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let s = counters.snapshot();
        assert_eq!(s.rays, 24000);
        assert_eq!(s.ground_probes, 32000);
        assert_eq!(s.already_occluded, 8000);
        assert_eq!(s.hits, 16000);
    }
}
