//! Spatial Queries
//!
//! The ray queries the visibility sampler needs from a geometry engine, and the hit handlers that filter and
//! record intersections during traversal.

use crate::geometry::*;
use crate::math::*;

/// Direction of the ground probe (Y-up world).
pub const DOWN: Vector3f = Vector3f {
    x: 0.0,
    y: -1.0,
    z: 0.0,
};

/// Nearest surface found by a ground probe.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SurfaceHit {
    /// Intersection point.
    pub point: Point3f,

    /// Unit surface normal oriented against the probe direction.
    pub normal: Vector3f,

    /// Index of the room owning the surface.
    pub room: usize,
}

/// Nearest collidable found along an arbitrary direction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RoomHit {
    /// Index of the room owning the collidable.
    pub room: usize,

    /// Intersection point.
    pub point: Point3f,
}

/// A visibility ray that hit something, kept for debug export.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DebugRay {
    /// Ray origin.
    pub origin: Point3f,

    /// Intersection point.
    pub hit: Point3f,

    /// Index of the room that was hit.
    pub room: usize,
}

/// Receives candidate intersections while a ray traverses the geometry.
pub trait RayHitHandler {
    /// Returns true if the candidate triangle should be tested at all.
    ///
    /// * `candidate` - The triangle about to be tested.
    fn allow(&self, candidate: &Triangle) -> bool;

    /// Called for every intersection closer than any reported so far.
    ///
    /// * `candidate` - The triangle that was hit.
    /// * `t`         - Parametric distance along the ray.
    /// * `point`     - Intersection point.
    /// * `normal`    - Geometric normal of the triangle.
    fn on_hit(&mut self, candidate: &Triangle, t: Float, point: Point3f, normal: Vector3f);
}

/// Ray queries against the level geometry. Implementations are immutable once built and shared by all workers.
pub trait SpatialQuery: Sync {
    /// Returns the nearest surface straight below `origin`.
    ///
    /// * `origin`       - Probe origin.
    /// * `max_distance` - Maximum probe length.
    /// * `room_filter`  - Only surfaces owned by this room are considered when set.
    fn probe_down(&self, origin: &Point3f, max_distance: Float, room_filter: Option<usize>) -> Option<SurfaceHit>;

    /// Returns the nearest collidable along `direction` with its intersection point.
    ///
    /// * `origin`       - Ray origin.
    /// * `direction`    - Unit direction.
    /// * `max_distance` - Maximum ray length.
    fn trace_direction(&self, origin: &Point3f, direction: &Vector3f, max_distance: Float) -> Option<RoomHit>;

    /// Returns the owning room of the nearest collidable along `direction`.
    ///
    /// * `origin`       - Ray origin.
    /// * `direction`    - Unit direction.
    /// * `max_distance` - Maximum ray length.
    fn probe_direction(&self, origin: &Point3f, direction: &Vector3f, max_distance: Float) -> Option<usize> {
        self.trace_direction(origin, direction, max_distance)
            .map(|hit| hit.room)
    }
}

/// Records the nearest floor surface, optionally restricted to one room.
#[derive(Copy, Clone, Debug, Default)]
pub struct GroundHitHandler {
    /// Only triangles owned by this room are tested when set.
    pub room_filter: Option<usize>,

    /// Nearest hit so far and its distance.
    nearest: Option<(Float, SurfaceHit)>,
}

impl GroundHitHandler {
    /// Create a new handler.
    ///
    /// * `room_filter` - Restrict hits to this room.
    pub fn new(room_filter: Option<usize>) -> Self {
        Self {
            room_filter,
            nearest: None,
        }
    }

    /// Returns the nearest hit, with its normal oriented against `direction`.
    ///
    /// * `direction` - Direction of the probe ray.
    pub fn into_hit(self, direction: &Vector3f) -> Option<SurfaceHit> {
        self.nearest.map(|(_, hit)| SurfaceHit {
            normal: hit.normal.face_against(direction),
            ..hit
        })
    }
}

impl RayHitHandler for GroundHitHandler {
    fn allow(&self, candidate: &Triangle) -> bool {
        self.room_filter.map_or(true, |room| candidate.room == room)
    }

    fn on_hit(&mut self, candidate: &Triangle, t: Float, point: Point3f, normal: Vector3f) {
        if self.nearest.map_or(true, |(best, _)| t < best) {
            self.nearest = Some((
                t,
                SurfaceHit {
                    point,
                    normal,
                    room: candidate.room,
                },
            ));
        }
    }
}

/// Records the owning room of the nearest collidable.
#[derive(Copy, Clone, Debug, Default)]
pub struct RoomIdHitHandler {
    /// Nearest hit so far and its distance.
    nearest: Option<(Float, RoomHit)>,
}

impl RoomIdHitHandler {
    /// Create a new handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the nearest hit.
    pub fn into_hit(self) -> Option<RoomHit> {
        self.nearest.map(|(_, hit)| hit)
    }

    /// Returns the nearest hit as a debug ray starting at `origin`.
    ///
    /// * `origin` - Origin of the traced ray.
    pub fn into_debug_ray(self, origin: Point3f) -> Option<DebugRay> {
        self.into_hit().map(|hit| DebugRay {
            origin,
            hit: hit.point,
            room: hit.room,
        })
    }
}

impl RayHitHandler for RoomIdHitHandler {
    fn allow(&self, _candidate: &Triangle) -> bool {
        true
    }

    fn on_hit(&mut self, candidate: &Triangle, t: Float, point: Point3f, _normal: Vector3f) {
        if self.nearest.map_or(true, |(best, _)| t < best) {
            self.nearest = Some((
                t,
                RoomHit {
                    room: candidate.room,
                    point,
                },
            ));
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn floor(y: Float, room: usize) -> Triangle {
        Triangle::new(
            Point3f::new(0.0, y, 0.0),
            Point3f::new(1.0, y, 0.0),
            Point3f::new(0.0, y, 1.0),
            room,
        )
    }

    #[test]
    fn ground_handler_filters_rooms() {
        let h = GroundHitHandler::new(Some(2));
        assert!(h.allow(&floor(0.0, 2)));
        assert!(!h.allow(&floor(0.0, 1)));
        assert!(GroundHitHandler::new(None).allow(&floor(0.0, 1)));
    }

    #[test]
    fn ground_handler_keeps_nearest_and_orients_normal() {
        let mut h = GroundHitHandler::new(None);
        let up = Vector3f::new(0.0, 1.0, 0.0);
        h.on_hit(&floor(1.0, 0), 9.0, Point3f::new(0.0, 1.0, 0.0), up);
        h.on_hit(&floor(3.0, 1), 7.0, Point3f::new(0.0, 3.0, 0.0), -up);
        h.on_hit(&floor(2.0, 2), 8.0, Point3f::new(0.0, 2.0, 0.0), up);
        let hit = h.into_hit(&DOWN).unwrap();
        assert_eq!(hit.room, 1);
        assert_eq!(hit.point, Point3f::new(0.0, 3.0, 0.0));
        assert_eq!(hit.normal, up);
    }

    #[test]
    fn room_handler_reports_nearest_room() {
        let mut h = RoomIdHitHandler::new();
        assert!(h.allow(&floor(0.0, 4)));
        h.on_hit(&floor(0.0, 4), 5.0, Point3f::new(1.0, 0.0, 0.0), DOWN);
        h.on_hit(&floor(0.0, 3), 2.0, Point3f::new(2.0, 0.0, 0.0), DOWN);
        let ray = h.into_debug_ray(Point3f::new(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(ray.room, 3);
        assert_eq!(ray.hit, Point3f::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn empty_handlers_report_nothing() {
        assert!(GroundHitHandler::new(None).into_hit(&DOWN).is_none());
        assert!(RoomIdHitHandler::new().into_hit().is_none());
    }
}
