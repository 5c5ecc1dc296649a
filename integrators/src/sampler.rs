//! Room Visibility Sampler
//!
//! Estimates which rooms can be seen from a room by casting random rays from random camera positions inside it.

use itertools::Itertools;
use pvs_core::config::SamplerConfig;
use pvs_core::geometry::*;
use pvs_core::level::*;
use pvs_core::query::*;
use pvs_core::rng::RNG;
use pvs_core::sampling::*;
use pvs_core::stats::*;
use std::collections::{BTreeMap, BTreeSet};

/// Visibility estimated for one room.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoomVisibility {
    /// Indices of the rooms considered visible.
    pub visible: BTreeSet<usize>,

    /// Visibility rays that hit each room, before pruning.
    pub hit_counts: BTreeMap<usize, u64>,

    /// Hit rays collected when this room is the debug room.
    pub debug_rays: Vec<DebugRay>,

    /// Ray counts of this room.
    pub stats: RayStatistics,
}

/// Samples the visibility of rooms of a level.
pub struct RoomSampler<'a, Q: SpatialQuery + ?Sized> {
    /// The level.
    level: &'a Level,

    /// Geometry queries.
    query: &'a Q,

    /// Tunables.
    config: &'a SamplerConfig,

    /// Shared counters updated after every room.
    counters: &'a RayCounters,
}

impl<'a, Q: SpatialQuery + ?Sized> RoomSampler<'a, Q> {
    /// Create a new sampler.
    ///
    /// * `level`    - The level.
    /// * `query`    - Geometry queries.
    /// * `config`   - Tunables.
    /// * `counters` - Shared counters.
    pub fn new(level: &'a Level, query: &'a Q, config: &'a SamplerConfig, counters: &'a RayCounters) -> Self {
        Self {
            level,
            query,
            config,
            counters,
        }
    }

    /// Estimate the rooms visible from a room. The result depends only on the room index, the level and the
    /// configuration.
    ///
    /// * `room_index` - 0-based room index.
    pub fn sample(&self, room_index: usize) -> RoomVisibility {
        let room = &self.level.rooms[room_index];
        let config = self.config;
        let bounds = room.bounds;
        let extent = bounds.diagonal();

        let mut result = RoomVisibility::default();
        if extent.x.abs() < f32::EPSILON || extent.z.abs() < f32::EPSILON {
            debug!("Room {} has no floor area; skipping", room.id());
            return result;
        }

        let mut rng = RNG::for_room(room_index);
        let room_filter = if room.is_instance() { None } else { Some(room_index) };
        let max_height = config.camera_height(room.is_subterranean());
        let debug = config.debug_room == Some(room_index);

        for _ in 0..config.samples_per_room {
            let p = uniform_sample_footprint(&mut rng, &bounds);
            let origin = Point3f::new(p.x, p.y + config.ground_probe_height, p.z);

            result.stats.ground_probes += 1;
            let Some(ground) = self.query.probe_down(&origin, config.ground_probe_distance, room_filter) else {
                continue;
            };

            let lift = rng.uniform_range(config.height_pad_min, max_height);
            let eye = ground.point + ground.normal * lift;
            let direction = uniform_sample_sphere(rng.uniform_float(), rng.uniform_float());

            result.stats.rays += 1;
            let hit_room = if debug {
                self.query
                    .trace_direction(&eye, &direction, config.max_distance)
                    .map(|hit| {
                        result.debug_rays.push(DebugRay {
                            origin: eye,
                            hit: hit.point,
                            room: hit.room,
                        });
                        hit.room
                    })
            } else {
                self.query.probe_direction(&eye, &direction, config.max_distance)
            };

            if let Some(hit_room) = hit_room {
                result.stats.hits += 1;
                let count = result.hit_counts.entry(hit_room).or_insert(0);
                if *count > 0 {
                    result.stats.already_occluded += 1;
                }
                *count += 1;
            }
        }

        result.visible = prune(&result.hit_counts, config.max_visible_rooms, config.min_ray_hits);
        result.visible.insert(room_index);
        result.visible.extend(room.connections());

        debug!(
            "Room {}: {} rooms hit, {} visible, {} rays fired",
            room.id(),
            result.hit_counts.len(),
            result.visible.len(),
            result.stats.rays
        );
        self.counters.add(&result.stats);
        result
    }
}

/// Returns the rooms kept after pruning. First the least-hit rooms are dropped until at most `max_visible_rooms`
/// remain (among equal counts the higher room index goes first), then rooms hit fewer than `min_ray_hits` times
/// are dropped.
///
/// * `hit_counts`        - Hits per room.
/// * `max_visible_rooms` - Maximum number of rooms kept.
/// * `min_ray_hits`      - Minimum hits for a room to be kept.
pub fn prune(hit_counts: &BTreeMap<usize, u64>, max_visible_rooms: usize, min_ray_hits: u64) -> BTreeSet<usize> {
    hit_counts
        .iter()
        .sorted_by(|(ra, ca), (rb, cb)| cb.cmp(ca).then(ra.cmp(rb)))
        .take(max_visible_rooms)
        .filter(|(_, &count)| count >= min_ray_hits)
        .map(|(&room, _)| room)
        .collect()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pvs_accelerators::*;
    use pvs_core::math::Float;
    use std::sync::Mutex;

    /// Spatial query with a flat floor everywhere that reports a fixed sequence of rooms.
    struct ScriptedQuery {
        floor_y: Float,
        rooms: Vec<Option<usize>>,
        next: Mutex<usize>,
        ground_filters: Mutex<Vec<Option<usize>>>,
        eyes: Mutex<Vec<Point3f>>,
    }

    impl ScriptedQuery {
        fn new(rooms: Vec<Option<usize>>) -> Self {
            Self {
                floor_y: 0.0,
                rooms,
                next: Mutex::new(0),
                ground_filters: Mutex::new(vec![]),
                eyes: Mutex::new(vec![]),
            }
        }
    }

    impl SpatialQuery for ScriptedQuery {
        fn probe_down(&self, origin: &Point3f, _max: Float, room_filter: Option<usize>) -> Option<SurfaceHit> {
            self.ground_filters.lock().unwrap().push(room_filter);
            Some(SurfaceHit {
                point: Point3f::new(origin.x, self.floor_y, origin.z),
                normal: Vector3f::new(0.0, 1.0, 0.0),
                room: 0,
            })
        }

        fn trace_direction(&self, origin: &Point3f, direction: &Vector3f, _max: Float) -> Option<RoomHit> {
            self.eyes.lock().unwrap().push(*origin);
            let mut next = self.next.lock().unwrap();
            let room = self.rooms.get(*next).copied().flatten();
            *next += 1;
            room.map(|room| RoomHit {
                room,
                point: *origin + *direction,
            })
        }
    }

    fn square_room(index: usize, x0: Float, flags: RoomFlags, connected: Option<usize>) -> Room {
        let p = |x, z| Point3f::new(x, 0.0, z);
        let perimeter = vec![
            PerimeterPoint::new(p(x0, 0.0), connected),
            PerimeterPoint::new(p(x0 + 10.0, 0.0), None),
            PerimeterPoint::new(p(x0 + 10.0, 10.0), None),
            PerimeterPoint::new(p(x0, 10.0), None),
        ];
        Room::new(index, flags, perimeter).unwrap()
    }

    fn config(samples: u64) -> SamplerConfig {
        SamplerConfig {
            samples_per_room: samples,
            ..SamplerConfig::default()
        }
    }

    fn level(rooms: Vec<Room>) -> Level {
        Level::new(rooms, vec![]).unwrap()
    }

    #[test]
    fn prune_caps_by_hit_count_with_lowest_index_winning_ties() {
        let hits = BTreeMap::from([(0, 5), (1, 2), (2, 5), (3, 2), (4, 9)]);
        assert_eq!(prune(&hits, 3, 0), BTreeSet::from([0, 2, 4]));
        assert_eq!(prune(&hits, 4, 0), BTreeSet::from([0, 1, 2, 4]));
        assert_eq!(prune(&hits, 9999, 5), BTreeSet::from([0, 2, 4]));
        assert_eq!(prune(&hits, 2, 6), BTreeSet::from([4]));
    }

    #[test]
    fn adjacency_is_included_without_hits() {
        let level = level(vec![
            square_room(0, 0.0, RoomFlags::empty(), Some(1)),
            square_room(1, 10.0, RoomFlags::empty(), Some(0)),
            square_room(2, 20.0, RoomFlags::empty(), None),
        ]);
        let query = ScriptedQuery::new(vec![]);
        let counters = RayCounters::new();
        let config = config(20);
        let result = RoomSampler::new(&level, &query, &config, &counters).sample(0);
        assert_eq!(result.visible, BTreeSet::from([0, 1]));
        assert_eq!(result.stats.rays, 20);
        assert_eq!(result.stats.hits, 0);
    }

    #[test]
    fn hits_are_counted_and_pruned() {
        let level = level(vec![
            square_room(0, 0.0, RoomFlags::empty(), None),
            square_room(1, 10.0, RoomFlags::empty(), None),
            square_room(2, 20.0, RoomFlags::empty(), None),
            square_room(3, 30.0, RoomFlags::empty(), None),
        ]);
        let script = vec![Some(2), Some(3), None, Some(2), Some(1), Some(2), Some(3)];
        let query = ScriptedQuery::new(script);
        let counters = RayCounters::new();
        let config = SamplerConfig {
            samples_per_room: 7,
            max_visible_rooms: 2,
            ..SamplerConfig::default()
        };
        let result = RoomSampler::new(&level, &query, &config, &counters).sample(0);

        assert_eq!(result.hit_counts, BTreeMap::from([(1, 1), (2, 3), (3, 2)]));
        assert_eq!(result.visible, BTreeSet::from([0, 2, 3]));
        let stats = counters.snapshot();
        assert_eq!(stats.rays, 7);
        assert_eq!(stats.ground_probes, 7);
        assert_eq!(stats.hits, 6);
        assert_eq!(stats.already_occluded, 3);
        assert!(result.debug_rays.is_empty());
    }

    #[test]
    fn min_ray_hits_drops_rarely_seen_rooms() {
        let level = level(vec![
            square_room(0, 0.0, RoomFlags::empty(), None),
            square_room(1, 10.0, RoomFlags::empty(), None),
            square_room(2, 20.0, RoomFlags::empty(), None),
        ]);
        let query = ScriptedQuery::new(vec![Some(1), Some(2), Some(2)]);
        let counters = RayCounters::new();
        let config = SamplerConfig {
            samples_per_room: 3,
            min_ray_hits: 2,
            ..SamplerConfig::default()
        };
        let result = RoomSampler::new(&level, &query, &config, &counters).sample(0);
        assert_eq!(result.visible, BTreeSet::from([0, 2]));
    }

    #[test]
    fn degenerate_room_is_empty() {
        let p = |x, z| PerimeterPoint::new(Point3f::new(x, 0.0, z), Some(1));
        let flat = Room::new(0, RoomFlags::empty(), vec![p(0.0, 0.0), p(10.0, 0.0)]).unwrap();
        let level = level(vec![flat, square_room(1, 10.0, RoomFlags::empty(), None)]);
        let query = ScriptedQuery::new(vec![Some(1)]);
        let counters = RayCounters::new();
        let config = config(10);
        let result = RoomSampler::new(&level, &query, &config, &counters).sample(0);
        assert!(result.visible.is_empty());
        assert_eq!(counters.snapshot(), RayStatistics::default());
    }

    #[test]
    fn ground_filter_depends_on_instance_flag() {
        let level = level(vec![
            square_room(0, 0.0, RoomFlags::empty(), None),
            square_room(1, 10.0, RoomFlags::INSTANCE, None),
        ]);
        let counters = RayCounters::new();
        let config = config(2);

        let query = ScriptedQuery::new(vec![]);
        RoomSampler::new(&level, &query, &config, &counters).sample(0);
        assert_eq!(*query.ground_filters.lock().unwrap(), vec![Some(0), Some(0)]);

        let query = ScriptedQuery::new(vec![]);
        RoomSampler::new(&level, &query, &config, &counters).sample(1);
        assert_eq!(*query.ground_filters.lock().unwrap(), vec![None, None]);
    }

    #[test]
    fn camera_height_respects_room_kind() {
        let level = level(vec![
            square_room(0, 0.0, RoomFlags::empty(), None),
            square_room(1, 10.0, RoomFlags::SUBTERRANEAN, None),
        ]);
        let counters = RayCounters::new();
        let config = config(500);

        for (room, limit) in [(0, 15.0), (1, 5.0)] {
            let query = ScriptedQuery::new(vec![]);
            RoomSampler::new(&level, &query, &config, &counters).sample(room);
            let eyes = query.eyes.lock().unwrap();
            assert_eq!(eyes.len(), 500);
            for eye in eyes.iter() {
                assert!(eye.y >= 0.01 - 1e-5 && eye.y <= limit + 1e-5);
            }
            assert!(eyes.iter().any(|e| e.y > limit * 0.9));
        }
    }

    #[test]
    fn debug_room_collects_hit_rays() {
        let level = level(vec![
            square_room(0, 0.0, RoomFlags::empty(), None),
            square_room(1, 10.0, RoomFlags::empty(), None),
        ]);
        let query = ScriptedQuery::new(vec![Some(1), None, Some(0)]);
        let counters = RayCounters::new();
        let config = SamplerConfig {
            samples_per_room: 3,
            debug_room: Some(0),
            ..SamplerConfig::default()
        };
        let result = RoomSampler::new(&level, &query, &config, &counters).sample(0);
        assert_eq!(result.debug_rays.len(), 2);
        assert_eq!(result.debug_rays[0].room, 1);
        assert_eq!(result.debug_rays[1].room, 0);
    }

    /// Two open-top rooms side by side, separated by a wall with a gap at the bottom.
    fn two_room_level() -> Level {
        let text = "
            room 1 { perimeter { (0 0 0) (10 0 0) -> 2 (10 0 10) (0 0 10) }
                tri (0 0 0) (10 0 0) (10 0 10)   tri (0 0 0) (10 0 10) (0 0 10)
                tri (0 0 0) (0 20 0) (0 20 10)   tri (0 0 0) (0 20 10) (0 0 10)
                tri (0 0 0) (10 0 0) (10 20 0)   tri (0 0 0) (10 20 0) (0 20 0)
                tri (0 0 10) (10 20 10) (10 0 10)   tri (0 0 10) (0 20 10) (10 20 10)
                tri (10 5 0) (10 20 0) (10 20 10)   tri (10 5 0) (10 20 10) (10 5 10)
            }
            room 2 { perimeter { (10 0 0) (20 0 0) (20 0 10) (10 0 10) }
                tri (10 0 0) (20 0 0) (20 0 10)   tri (10 0 0) (20 0 10) (10 0 10)
                tri (20 0 0) (20 20 0) (20 20 10)   tri (20 0 0) (20 20 10) (20 0 10)
                tri (10 0 0) (20 0 0) (20 20 0)   tri (10 0 0) (20 20 0) (10 20 0)
                tri (10 0 10) (20 20 10) (20 0 10)   tri (10 0 10) (10 20 10) (20 20 10)
            }
        ";
        text.parse::<Level>().unwrap()
    }

    #[test]
    fn sampling_through_a_bvh_is_deterministic() {
        let level = two_room_level();
        let bvh = BVHAccel::new(&level.triangles, 4, SplitMethod::SAH);
        let config = config(2000);

        let counters = RayCounters::new();
        let sampler = RoomSampler::new(&level, &bvh, &config, &counters);
        let a = sampler.sample(0);
        let b = sampler.sample(0);
        assert_eq!(a, b);
        assert_eq!(a.visible, BTreeSet::from([0, 1]));
        assert!(a.hit_counts.contains_key(&1));
        assert!(a.hit_counts[&0] > a.hit_counts[&1]);

        let stats = counters.snapshot();
        assert_eq!(stats.ground_probes, 4000);
        assert_eq!(stats.rays, 4000);
        assert!(stats.hits > 0 && stats.hits < stats.rays);
    }
}
