//! Sampler Configuration

use crate::math::Float;

/// Tunables of the visibility sampler. `Default` reproduces the stock generator settings.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SamplerConfig {
    /// Number of samples drawn per room.
    pub samples_per_room: u64,

    /// Rooms hit by fewer rays are dropped.
    pub min_ray_hits: u64,

    /// Maximum number of rooms kept per source room; least-hit rooms are dropped first.
    pub max_visible_rooms: usize,

    /// Maximum visibility ray length.
    pub max_distance: Float,

    /// Smallest camera lift above the floor.
    pub height_pad_min: Float,

    /// Largest camera lift above the floor.
    pub max_camera_height: Float,

    /// Largest camera lift above the floor in subterranean rooms.
    pub max_camera_height_subterranean: Float,

    /// Ground probes start this far above the room's highest point.
    pub ground_probe_height: Float,

    /// Maximum ground probe length.
    pub ground_probe_distance: Float,

    /// 0-based index of a room whose hit rays are collected for debug export.
    pub debug_room: Option<usize>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            samples_per_room: 1_000_000,
            min_ray_hits: 0,
            max_visible_rooms: 9999,
            max_distance: 1500.0,
            height_pad_min: 0.01,
            max_camera_height: 15.0,
            max_camera_height_subterranean: 5.0,
            ground_probe_height: 512.0,
            ground_probe_distance: 1000.0,
            debug_room: None,
        }
    }
}

impl SamplerConfig {
    /// Returns the largest camera lift for a room.
    ///
    /// * `subterranean` - Whether the room is below ground.
    pub fn camera_height(&self, subterranean: bool) -> Float {
        if subterranean {
            self.max_camera_height_subterranean
        } else {
            self.max_camera_height
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_height_depends_on_room_kind() {
        let config = SamplerConfig::default();
        assert_eq!(config.camera_height(false), 15.0);
        assert_eq!(config.camera_height(true), 5.0);
    }
}
